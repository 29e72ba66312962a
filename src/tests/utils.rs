use crate::domain::normalize::normalize;
use crate::domain::{Listing, RawRecord, SourceId};

pub const SITE: &str = "https://www.olx.in";

pub fn raw(pairs: &[(&str, &str)]) -> RawRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Two listings with a rupee price and a missing date.
pub fn sample_listings() -> Vec<Listing> {
    let records = [
        raw(&[
            ("title", "Waterproof Car Cover"),
            ("price", "₹1,499"),
            ("location", "Andheri, Mumbai"),
            ("date", "today"),
            ("link", "https://www.olx.in/item/1"),
            ("image_url", "https://img.olx/1.jpg"),
        ]),
        raw(&[
            ("name", "SUV Body Cover, triple stitched"),
            ("amount", "Rs. 899"),
            ("url", "https://www.olx.in/item/2"),
        ]),
    ];

    records
        .iter()
        .map(|r| normalize(r, &SourceId::default()).expect("fixture is valid"))
        .collect()
}

/// Search results page in the classifieds markup; items are (id, title).
pub fn olx_page(items: &[(&str, &str)]) -> String {
    let cards: String = items
        .iter()
        .map(|(id, title)| {
            format!(
                r#"<li data-aut-id="itemBox">
                     <a href="/item/{id}-iid-{id}">
                       <img src="https://apollo.olx.in/{id}.jpg">
                       <span data-aut-id="itemTitle">{title}</span>
                       <span data-aut-id="itemPrice">₹1,{id}00</span>
                       <span data-aut-id="item-location">Kothrud, Pune</span>
                       <span>2 days ago</span>
                     </a>
                   </li>"#
            )
        })
        .collect();

    format!("<html><body><ul>{cards}</ul></body></html>")
}

pub fn amazon_page() -> String {
    r#"<html><body>
        <div data-component-type="s-search-result">
          <img class="s-image" src="https://m.media-amazon.com/1.jpg">
          <h2 class="a-size-mini"><a href="/dp/B01"><span>Autofurnish Car Body Cover</span></a></h2>
          <span class="a-price-whole">1,299.</span>
        </div>
        <div data-component-type="s-search-result">
          <h2><a href="https://www.amazon.in/dp/B02"><span>Generic Sedan Cover</span></a></h2>
        </div>
        <div data-component-type="s-search-result">
          <span>Sponsored block without a title</span>
        </div>
    </body></html>"#
        .to_string()
}

pub fn flipkart_page() -> String {
    r#"<html><body>
        <div data-id="CVR1">
          <a href="/p/itm1"><img src="https://rukminim.flixcart.com/1.jpg"></a>
          <a title="Fly Wings Car Cover" href="/p/itm1">Fly Wings Car...</a>
          <div class="Nx9bqj">₹549</div>
        </div>
        <div data-id="CVR2">
          <a href="/p/itm2"><div class="KzDlHZ">Autoretail Body Cover</div></a>
        </div>
    </body></html>"#
        .to_string()
}
