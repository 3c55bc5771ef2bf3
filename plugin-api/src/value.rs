//! Attribute values exchanged with the host.
//!
//! The host sends configuration, plans and state as objects whose attributes
//! may be null (not set), unknown (not computed yet) or known. [`Value`]
//! models all three; [`ObjectValue`] is an attribute map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Attribute is not set.
    #[default]
    Null,
    /// Attribute value will only be known after apply.
    Unknown,
    String(String),
    Bool(bool),
    Number(serde_json::Number),
    List(Vec<Value>),
    Object(ObjectValue),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// Whether the value is fully known (neither null nor unknown).
    ///
    /// Nested lists and objects are not inspected.
    #[inline]
    pub fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unknown => "unknown",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Convert from JSON. JSON has no unknown marker, so every value is
    /// either null or known.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(ObjectValue::from_json_map(map)),
        }
    }

    /// Convert to JSON. Unknown values render as null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Unknown => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(obj) => obj.to_json(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ObjectValue> for Value {
    fn from(obj: ObjectValue) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}

/// An object: the shape of provider configuration, resource plans and state.
///
/// Attributes that are absent read back as [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    attributes: BTreeMap<String, Value>,
}

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Attribute value; absent attributes are null.
    pub fn get(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.attributes.get(name).unwrap_or(&NULL)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Read a string attribute.
    ///
    /// Returns `None` when the attribute holds a non-string known value.
    pub fn get_string(&self, name: &str) -> Option<StringValue> {
        match self.get(name) {
            Value::Null => Some(StringValue::Null),
            Value::Unknown => Some(StringValue::Unknown),
            Value::String(s) => Some(StringValue::Known(s.clone())),
            _ => None,
        }
    }

    pub fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            attributes: map
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect(),
        }
    }

    /// Build from a JSON object; any other JSON shape yields an empty object.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(map) => Self::from_json_map(map),
            _ => Self::default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for ObjectValue {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// A string attribute as read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StringValue {
    #[default]
    Null,
    Unknown,
    Known(String),
}

impl StringValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, StringValue::Null)
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, StringValue::Unknown)
    }

    /// The string value, or the empty string when null or unknown.
    pub fn value_string(&self) -> &str {
        match self {
            StringValue::Known(s) => s.as_str(),
            _ => "",
        }
    }
}
