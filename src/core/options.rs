//! Key/value option storage shared by adapters, validators and facades.

use serde_json::Value;
use std::collections::BTreeMap;

use super::adapter::{AdapterError, AdapterResult};

/// Name → value mapping handed to adapters at construction or via `set_options`.
pub type Options = BTreeMap<String, Value>;

/// Converts a JSON object into [`Options`].
///
/// Any other JSON shape is rejected, options are always a name → value mapping.
pub fn options_from_json(value: Value) -> AdapterResult<Options> {
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(AdapterError::InvalidArgument(format!(
            "options must be a name→value mapping, got {other}"
        ))),
    }
}

/// Last-write-wins option store.
///
/// The bag never hands out mutable access to its map, so every write goes
/// through [`OptionsBag::set`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsBag {
    options: Options,
}

impl OptionsBag {
    pub fn new() -> Self {
        Self {
            options: Options::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Applies every entry in order through [`OptionsBag::set`].
    pub fn extend<I, K>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in options {
            self.set(name, value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    /// Returns a copy of the full mapping.
    pub fn to_options(&self) -> Options {
        self.options.clone()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.options.remove(name)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl From<Options> for OptionsBag {
    fn from(options: Options) -> Self {
        Self { options }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn last_write_wins() {
        let mut bag = OptionsBag::new();
        bag.set("timeout", json!(5)).set("timeout", json!(10));
        assert_eq!(bag.get("timeout"), Some(&json!(10)));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn missing_key_is_absent() {
        let bag = OptionsBag::new();
        assert!(bag.get("nope").is_none());
        assert!(bag.get_bool("nope").is_none());
    }

    #[test]
    fn copy_does_not_alias_bag() {
        let mut bag = OptionsBag::new();
        bag.set("a", json!(1));
        let mut copy = bag.to_options();
        copy.insert("b".into(), json!(2));
        assert!(bag.get("b").is_none());
    }

    #[test]
    fn rejects_non_object_options() {
        assert!(matches!(
            options_from_json(json!([1, 2, 3])),
            Err(AdapterError::InvalidArgument(_))
        ));
        let options = options_from_json(json!({"a": true, "b": [1, "x"]})).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options["b"], json!([1, "x"]));
    }
}
