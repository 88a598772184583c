//! Flat property-bag persistence.
//!
//! Scheme and category configuration round-trips through a flat
//! `name -> scalar` bag; an external serializer (XML, project file, ...)
//! owns the actual document format. Nested settings flatten with
//! dot-separated keys. Unknown keys are ignored on load, missing keys fall
//! back to defaults.

use crate::error::{SymbologyError, SymbologyResult};
use serde_json::{Map, Value};

/// Flat name-to-scalar property bag.
pub type PropertyBag = Map<String, Value>;

/// Types that persist through a flat property bag.
pub trait ToPropertyBag {
    fn to_bag(&self) -> SymbologyResult<PropertyBag>;
}

/// Counterpart of [`ToPropertyBag`].
pub trait FromPropertyBag: Sized {
    fn from_bag(bag: &PropertyBag) -> SymbologyResult<Self>;
}

impl<T: serde::Serialize> ToPropertyBag for T {
    fn to_bag(&self) -> SymbologyResult<PropertyBag> {
        let value = serde_json::to_value(self)
            .map_err(|e| SymbologyError::invalid_argument(format!("serialize failed: {}", e)))?;
        let mut bag = PropertyBag::new();
        flatten("", &value, &mut bag);
        Ok(bag)
    }
}

impl<T: serde::de::DeserializeOwned> FromPropertyBag for T {
    fn from_bag(bag: &PropertyBag) -> SymbologyResult<Self> {
        let nested = unflatten(bag);
        serde_json::from_value(nested)
            .map_err(|e| SymbologyError::invalid_argument(format!("deserialize failed: {}", e)))
    }
}

fn flatten(prefix: &str, value: &Value, bag: &mut PropertyBag) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, v, bag);
            }
        }
        Value::Array(_) => {
            // Arrays persist as one JSON-encoded scalar; the bag contract
            // only promises name -> scalar.
            bag.insert(prefix.to_string(), Value::String(value.to_string()));
        }
        _ => {
            bag.insert(prefix.to_string(), value.clone());
        }
    }
}

fn unflatten(bag: &PropertyBag) -> Value {
    let mut root = Map::new();
    for (path, value) in bag {
        let revived = match value {
            Value::String(s) if s.starts_with('[') => serde_json::from_str::<Value>(s)
                .ok()
                .filter(Value::is_array)
                .unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        };
        let mut node = &mut root;
        let parts: Vec<&str> = path.split('.').collect();
        for part in &parts[..parts.len() - 1] {
            node = match node
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(map) => map,
                // A scalar already sits at this path; the deeper key wins.
                slot => {
                    *slot = Value::Object(Map::new());
                    match slot {
                        Value::Object(map) => map,
                        _ => unreachable!("just assigned an object"),
                    }
                }
            };
        }
        if let Some(last) = parts.last() {
            node.insert(last.to_string(), revived);
        }
    }
    Value::Object(root)
}
