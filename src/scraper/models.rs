use crate::domain::RawRecord;
use serde::Deserialize;
use serde_json::Value;

// Search endpoints seen in the wild answer with one of:
//
// { "data":    [ {...}, ... ], ... }
// { "results": [ {...}, ... ], ... }
// { "ads":     [ {...}, ... ], ... }
//
// Item objects are loosely shaped (title/name, price/amount, url/link, ...)
// so they stay untyped here and get flattened into raw records.

#[derive(Debug, Deserialize)]
pub struct SearchPayload {
    pub data: Option<Value>,
    pub results: Option<Value>,
    pub ads: Option<Value>,
}

impl SearchPayload {
    pub fn has_known_key(&self) -> bool {
        self.data.is_some() || self.results.is_some() || self.ads.is_some()
    }

    /// Items under the first known key present; a non-array there yields nothing.
    pub fn items(&self) -> &[Value] {
        self.data
            .as_ref()
            .or(self.results.as_ref())
            .or(self.ads.as_ref())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.items().iter().filter_map(flatten_item).collect()
    }
}

/// Top-level scalar fields of an item object as strings. Nested objects,
/// arrays and nulls are skipped.
pub fn flatten_item(item: &Value) -> Option<RawRecord> {
    let obj = item.as_object()?;

    let record: RawRecord = obj
        .iter()
        .filter_map(|(k, v)| {
            let s = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k.clone(), s))
        })
        .collect();

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_known_key_wins() {
        let payload: SearchPayload = serde_json::from_value(json!({
            "results": [{"title": "ignored"}],
            "data": [{"title": "Car Cover", "price": 499, "featured": true, "meta": {"x": 1}}]
        }))
        .unwrap();

        assert!(payload.has_known_key());
        let records = payload.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["title"], "Car Cover");
        assert_eq!(records[0]["price"], "499");
        assert_eq!(records[0]["featured"], "true");
        assert!(!records[0].contains_key("meta"));
    }

    #[test]
    fn unknown_shape_has_no_known_key() {
        let payload: SearchPayload = serde_json::from_value(json!({"items": []})).unwrap();
        assert!(!payload.has_known_key());
        assert!(payload.items().is_empty());
    }

    #[test]
    fn non_object_items_are_skipped() {
        let payload: SearchPayload =
            serde_json::from_value(json!({"ads": ["str", 3, {"name": "Cover"}]})).unwrap();
        assert_eq!(payload.into_records().len(), 1);
    }
}
