//! Value representations for generated records.
//!
//! Samplers produce [`SampledValue`]s; the generator assembles them into
//! [`Record`]s, one per generated row. Objects keep their keys sorted so the
//! rendered output is stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered field map used for objects and records.
pub type FieldMap = BTreeMap<String, SampledValue>;

/// A single value produced by a sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampledValue {
    /// Null value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int64(i64),

    /// 64-bit floating point
    Float64(f64),

    /// String value
    String(String),

    /// Array of values
    Array(Vec<SampledValue>),

    /// Object/map of values
    Object(FieldMap),
}

impl SampledValue {
    /// Create an empty object.
    pub fn empty_object() -> Self {
        Self::Object(FieldMap::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64. Integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            Self::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an array slice.
    pub fn as_array(&self) -> Option<&[SampledValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get this value as an object.
    pub fn as_object(&self) -> Option<&FieldMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is an object.
    pub fn get(&self, key: &str) -> Option<&SampledValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    /// Convert from a YAML scalar/sequence/mapping as written in a schema.
    ///
    /// Mapping keys that are not strings are rendered with their YAML text.
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Bool(*b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int64(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float64(f)
                } else {
                    Self::String(n.to_string())
                }
            }
            serde_yaml::Value::String(s) => Self::String(s.clone()),
            serde_yaml::Value::Sequence(seq) => {
                Self::Array(seq.iter().map(Self::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => {
                let fields = map
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            serde_yaml::Value::String(s) => s.clone(),
                            other => serde_yaml::to_string(other)
                                .map(|s| s.trim().to_string())
                                .unwrap_or_default(),
                        };
                        (key, Self::from_yaml(v))
                    })
                    .collect();
                Self::Object(fields)
            }
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
        }
    }

    /// Convert into a `serde_json::Value` for output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int64(i) => serde_json::Value::from(*i),
            Self::Float64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<String> for SampledValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for SampledValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for SampledValue {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<f64> for SampledValue {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<bool> for SampledValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One generated record.
///
/// `index` is the position of the record within its table, starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Table name
    pub table: String,

    /// Record index within the table
    pub index: u64,

    /// Field values
    pub fields: FieldMap,
}

impl Record {
    /// Create a new record.
    pub fn new(table: impl Into<String>, index: u64, fields: FieldMap) -> Self {
        Self {
            table: table.into(),
            index,
            fields,
        }
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&SampledValue> {
        self.fields.get(name)
    }

    /// Render the record's fields as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Insert `value` under `name`, or merge its entries when `flat` is set and
/// the value is an object. Non-object values are never merged.
pub fn insert_field(target: &mut FieldMap, name: &str, value: SampledValue, flat: bool) {
    match value {
        SampledValue::Object(inner) if flat => target.extend(inner),
        other => {
            target.insert(name.to_string(), other);
        }
    }
}
