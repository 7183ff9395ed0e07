//! # Property Values
//!
//! Entities are schema-flexible: every property holds one variant of
//! [`Value`]. Comparison follows the store's ordering rules: numbers
//! compare numerically across int/float, values of the same type compare
//! naturally, and values of different types order by type rank.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate};

use super::key::Key;

/// A geographical point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPt {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPt {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A single property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Short indexed string
    Str(String),
    /// Long unindexed text blob
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    GeoPt(GeoPt),
    Key(Key),
    List(Vec<Value>),
}

impl Value {
    /// Rank used when comparing values of different types
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Bool(_) => 2,
            Value::Str(_) | Value::Text(_) => 3,
            Value::Date(_) | Value::DateTime(_) => 4,
            Value::GeoPt(_) => 5,
            Value::Key(_) => 6,
            Value::List(_) => 7,
        }
    }

    /// Name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::GeoPt(_) => "geopoint",
            Value::Key(_) => "key",
            Value::List(_) => "list",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Total ordering over all values
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a) | Value::Text(a), Value::Str(b) | Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Date(a), Value::DateTime(b)) => a.cmp(&b.date_naive()).then(Ordering::Less),
            (Value::DateTime(a), Value::Date(b)) => a.date_naive().cmp(b).then(Ordering::Greater),
            (Value::GeoPt(a), Value::GeoPt(b)) => {
                a.lat.total_cmp(&b.lat).then(a.lon.total_cmp(&b.lon))
            }
            (Value::Key(a), Value::Key(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Key> for Value {
    fn from(v: Key) -> Self {
        Value::Key(v)
    }
}
