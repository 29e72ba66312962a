// selectors.rs
use crate::domain::RawRecord;
use crate::scraper::ScraperError;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Titles shorter than this are treated as noise.
pub const MIN_TITLE_CHARS: usize = 5;

lazy_static! {
    static ref PRICE_RE: Regex = Regex::new(r"₹[\d,]+|Rs\.?\s*[\d,]+").expect("price regex");
    static ref LOCATION_RE: Regex =
        Regex::new(r"\b[A-Z][a-z]+,\s*[A-Z][a-z]+\b").expect("location regex");
    static ref DATE_RE: Regex =
        Regex::new(r"(?i)today|yesterday|\d+\s*(day|hour)s?\s*ago").expect("date regex");
    static ref ANCHOR: Selector = Selector::parse("a[href]").expect("anchor selector");
    static ref HEADING: Selector =
        Selector::parse("h2, h3, h4, span[title]").expect("heading selector");
    static ref IMAGE: Selector = Selector::parse("img").expect("img selector");
}

pub fn parse_selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(format!("selector {css:?}: {e}")))
}

pub fn parse_selectors(rules: &[&str]) -> Result<Vec<Selector>, ScraperError> {
    rules.iter().map(|css| parse_selector(css)).collect()
}

/// Tries each rule in order and returns the matches of the first rule that
/// finds anything, with that rule's index. Matches are never mixed across rules.
pub fn select_with_fallback<'a>(
    document: &'a Html,
    rules: &[Selector],
) -> Option<(usize, Vec<ElementRef<'a>>)> {
    rules.iter().enumerate().find_map(|(i, rule)| {
        let found: Vec<_> = document.select(rule).collect();
        (!found.is_empty()).then_some((i, found))
    })
}

/// Non-empty text nodes of `el`, trimmed, one per line.
pub fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn first_text(el: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel)
        .map(|e| element_text(&e))
        .find(|t| !t.is_empty())
}

pub fn first_attr(el: &ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .filter_map(|e| e.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolves `href` against `base`; absolute hrefs pass through.
pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(String::from)
}

pub fn find_price(text: &str) -> Option<&str> {
    PRICE_RE.find(text).map(|m| m.as_str())
}

pub fn find_location(text: &str) -> Option<&str> {
    LOCATION_RE.find(text).map(|m| m.as_str())
}

pub fn find_posted(text: &str) -> Option<&str> {
    DATE_RE.find(text).map(|m| m.as_str())
}

/// Extracts one classified-ad card.
///
/// The card must lead to a detail page (`/item/` in the link), either by being
/// an anchor itself or by containing one. The title is the first line of the
/// card text, falling back to the first heading when that line is too short.
/// Price, location and post date are pattern matches over the card text.
pub fn extract_item_card(el: &ElementRef<'_>, base: &Url) -> Option<RawRecord> {
    let href = match el.value().name() {
        "a" => el.value().attr("href").map(str::to_string),
        _ => first_attr(el, &ANCHOR, "href"),
    }?;

    let link = absolutize(base, &href)?;
    if !link.contains("/item/") {
        return None;
    }

    let text = element_text(el);

    let mut title = text.lines().next().unwrap_or("").trim().to_string();
    if title.chars().count() < MIN_TITLE_CHARS {
        title = first_text(el, &HEADING).unwrap_or_default();
    }
    if title.chars().count() < MIN_TITLE_CHARS {
        return None;
    }

    let mut record = RawRecord::new();
    record.insert("link".into(), link);
    record.insert("title".into(), title);

    if let Some(price) = find_price(&text) {
        record.insert("price".into(), price.to_string());
    }
    if let Some(location) = find_location(&text) {
        record.insert("location".into(), location.to_string());
    }
    if let Some(posted) = find_posted(&text) {
        record.insert("date".into(), posted.to_string());
    }
    if let Some(src) = first_attr(el, &IMAGE, "src") {
        record.insert("image_url".into(), src);
    }

    Some(record)
}

/// Drops records whose link repeats an earlier one.
pub fn dedupe_raw(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|r| match r.get("link") {
            Some(link) if !link.is_empty() => seen.insert(link.clone()),
            _ => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.olx.in").unwrap()
    }

    #[test]
    fn fallback_uses_first_matching_rule_only() {
        let html = Html::parse_document(
            r#"<div class="b">one</div><div class="c">two</div><div class="c">three</div>"#,
        );
        let rules = parse_selectors(&[".a", ".c", ".b"]).unwrap();

        let (idx, found) = select_with_fallback(&html, &rules).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn fallback_none_when_nothing_matches() {
        let html = Html::parse_document("<p>nothing</p>");
        let rules = parse_selectors(&[".a", ".b"]).unwrap();
        assert!(select_with_fallback(&html, &rules).is_none());
    }

    #[test]
    fn bad_selector_is_parse_error() {
        assert!(matches!(
            parse_selector("div[[["),
            Err(ScraperError::HtmlParse(_))
        ));
    }

    #[test]
    fn patterns_match_expected_tokens() {
        assert_eq!(find_price("Price ₹1,499 only"), Some("₹1,499"));
        assert_eq!(find_price("Rs. 2,000"), Some("Rs. 2,000"));
        assert_eq!(find_price("free"), None);
        assert_eq!(find_location("Seen in Kothrud, Pune today"), Some("Kothrud, Pune"));
        assert_eq!(find_posted("Posted YESTERDAY"), Some("YESTERDAY"));
        assert_eq!(find_posted("3 days ago"), Some("3 days ago"));
        assert_eq!(find_posted("1 hour ago"), Some("1 hour ago"));
        assert_eq!(find_posted("last week"), None);
    }

    #[test]
    fn extracts_card_fields() {
        let html = Html::parse_fragment(
            r#"<li data-aut-id="itemBox">
                 <a href="/item/car-cover-iid-123">
                   <img src="https://img.olx/1.jpg">
                   <span>Waterproof Car Cover</span>
                   <span>₹1,200</span>
                   <span>Andheri, Mumbai</span>
                   <span>2 days ago</span>
                 </a>
               </li>"#,
        );
        let sel = parse_selector("li").unwrap();
        let card = html.select(&sel).next().unwrap();

        let rec = extract_item_card(&card, &base()).unwrap();
        assert_eq!(rec["link"], "https://www.olx.in/item/car-cover-iid-123");
        assert_eq!(rec["title"], "Waterproof Car Cover");
        assert_eq!(rec["price"], "₹1,200");
        assert_eq!(rec["location"], "Andheri, Mumbai");
        assert_eq!(rec["date"], "2 days ago");
        assert_eq!(rec["image_url"], "https://img.olx/1.jpg");
    }

    #[test]
    fn short_first_line_falls_back_to_heading() {
        let html = Html::parse_fragment(
            r#"<a href="https://www.olx.in/item/9"><span>New</span><h3>Bike Body Cover</h3></a>"#,
        );
        let sel = parse_selector("a").unwrap();
        let card = html.select(&sel).next().unwrap();

        let rec = extract_item_card(&card, &base()).unwrap();
        assert_eq!(rec["title"], "Bike Body Cover");
        assert!(!rec.contains_key("price"));
    }

    #[test]
    fn rejects_cards_without_item_link_or_title() {
        let html = Html::parse_fragment(
            r#"<div class="x"><a href="/help">Help centre page</a></div>
               <div class="x"><a href="/item/1">Hi</a></div>
               <div class="x"><span>No link here at all</span></div>"#,
        );
        let sel = parse_selector("div.x").unwrap();
        let cards: Vec<_> = html.select(&sel).collect();
        assert_eq!(cards.len(), 3);
        assert!(cards.iter().all(|c| extract_item_card(c, &base()).is_none()));
    }

    #[test]
    fn dedupe_raw_keeps_first_link() {
        let mk = |t: &str, l: &str| -> RawRecord {
            [("title", t), ("link", l)]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        let out = dedupe_raw(vec![mk("a", "1"), mk("b", "1"), mk("c", "2"), mk("d", "")]);
        let titles: Vec<_> = out.iter().map(|r| r["title"].as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);
    }
}
