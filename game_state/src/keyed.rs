//! Normalization of keyed collections at the snapshot boundary.
//!
//! Engines hand over NPCs and locations either as a JSON object keyed by id or
//! as a plain array. Both shapes deserialize into the same ordered map so the
//! rest of the system only ever sees one container type.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// A value that carries its own key.
pub trait Keyed {
    type Key: Ord;

    fn key(&self) -> Self::Key;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapOrSeq<V> {
    Seq(Vec<V>),
    Map(BTreeMap<String, V>),
}

/// Deserialize either an array or an object of values into a map keyed by
/// each value's own key. The outer object keys are ignored; on duplicate ids
/// the later value wins.
pub fn map_or_seq<'de, D, V>(deserializer: D) -> Result<BTreeMap<V::Key, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Keyed + Deserialize<'de>,
{
    let values = match MapOrSeq::<V>::deserialize(deserializer)? {
        MapOrSeq::Seq(values) => values,
        MapOrSeq::Map(map) => map.into_values().collect(),
    };

    Ok(values.into_iter().map(|v| (v.key(), v)).collect())
}

/// Collect values into a keyed map.
pub fn index_by_key<V: Keyed>(values: impl IntoIterator<Item = V>) -> BTreeMap<V::Key, V> {
    values.into_iter().map(|v| (v.key(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Item {
        id: String,
        value: u32,
    }

    impl Keyed for Item {
        type Key = String;

        fn key(&self) -> String {
            self.id.clone()
        }
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "map_or_seq")]
        items: BTreeMap<String, Item>,
    }

    #[test]
    fn test_array_shape() {
        let holder: Holder =
            serde_json::from_str(r#"{"items": [{"id": "b", "value": 2}, {"id": "a", "value": 1}]}"#)
                .unwrap();
        let keys: Vec<_> = holder.items.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_map_shape() {
        let holder: Holder = serde_json::from_str(
            r#"{"items": {"x": {"id": "b", "value": 2}, "y": {"id": "a", "value": 1}}}"#,
        )
        .unwrap();
        assert_eq!(holder.items["a"].value, 1);
        assert_eq!(holder.items["b"].value, 2);
    }

    #[test]
    fn test_missing_field_defaults_to_empty() {
        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert!(holder.items.is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_last() {
        let holder: Holder =
            serde_json::from_str(r#"{"items": [{"id": "a", "value": 1}, {"id": "a", "value": 9}]}"#)
                .unwrap();
        assert_eq!(holder.items.len(), 1);
        assert_eq!(holder.items["a"].value, 9);
    }
}
