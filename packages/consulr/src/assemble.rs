//! Folding transformed pairs into the lookup result.

use std::collections::BTreeMap;

use crate::transform::TransformedValue;

/// The result of a lookup: stripped key to value or entry.
pub type KvMap = BTreeMap<String, TransformedValue>;

/// Collect transformed pairs into a map. When two pairs share a key, the
/// later one wins.
pub fn assemble<I>(pairs: I) -> KvMap
where
    I: IntoIterator<Item = (String, TransformedValue)>,
{
    let mut map = KvMap::new();
    for (key, value) in pairs {
        map.insert(key, value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(v: &str) -> TransformedValue {
        TransformedValue::Value(Some(v.to_string()))
    }

    #[test]
    fn empty_input_gives_empty_map() {
        assert!(assemble(Vec::new()).is_empty());
    }

    #[test]
    fn last_write_wins() {
        let map = assemble(vec![
            ("version".to_string(), value("1")),
            ("role".to_string(), value("web")),
            ("version".to_string(), value("2")),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["version"], value("2"));
        assert_eq!(map["role"], value("web"));
    }
}
