// ── Request parameters ──
//
// A plain string-to-value mapping with pure field operations. The
// controller never mutates caller-owned parameter objects: extracting a
// field and stripping paging fields both work on copies.

use serde_json::{Map, Value};

/// An owned parameter object for a single request.
///
/// Thin wrapper over a JSON object map. All derived-parameter operations
/// (`without`, `merged`, `with`) return new values rather than mutating in
/// place, so cached parameter sets never alias a caller's object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Interpret a JSON value as a parameter object.
    ///
    /// Returns `None` unless the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a named field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a named field in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Builder-style `set`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// A copy of these parameters without the named fields.
    pub fn without(&self, fields: &[&str]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| !fields.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// A copy of these parameters overlaid with `other` (other wins on
    /// conflicting fields).
    pub fn merged(&self, other: &Self) -> Self {
        let mut map = self.0.clone();
        for (k, v) in &other.0 {
            map.insert(k.clone(), v.clone());
        }
        Self(map)
    }

    /// Convert into the JSON body sent over the wire.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
