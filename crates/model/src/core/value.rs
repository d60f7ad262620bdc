use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) if *v >= 0 => Some(*v as u64),
            Value::Uint(v) => Some(*v),
            Value::Float(v) if *v >= 0.0 => Some(*v as u64),
            Value::String(v) => v.trim().parse::<u64>().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Uint(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.trim().parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Canonical field rendering used for batch objects and validation
    /// samples. The extractor and the validator MUST agree on this form,
    /// otherwise sample comparison reports false drift.
    pub fn to_field(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Uint(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Boolean(v) => v.to_string(),
            Value::Json(v) => v.to_string(),
            Value::Uuid(v) => v.to_string(),
            Value::Bytes(v) => v.iter().map(|b| format!("{b:02x}")).collect(),
            Value::Date(v) => v.format("%Y-%m-%d").to_string(),
            Value::Timestamp(v) => v.to_rfc3339(),
            Value::Null => String::new(),
        }
    }

    /// Lossy conversion from a JSON scalar, used by inline (in-memory)
    /// datasets in migration plans.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::Json(other.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.to_field()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_rendering_is_stable() {
        assert_eq!(Value::Int(-7).to_field(), "-7");
        assert_eq!(Value::Boolean(true).to_field(), "true");
        assert_eq!(Value::Null.to_field(), "");
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).to_field(),
            "2024-03-01"
        );
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_field(), "dead");
    }

    #[test]
    fn numeric_accessors_parse_strings() {
        assert_eq!(Value::String(" 42 ".into()).as_u64(), Some(42));
        assert_eq!(Value::String("3.5".into()).as_f64(), Some(3.5));
        assert_eq!(Value::Int(-1).as_u64(), None);
    }

    #[test]
    fn json_scalars_map_to_native_values() {
        assert_eq!(Value::from_json(&serde_json::json!(3)), Value::Int(3));
        assert_eq!(
            Value::from_json(&serde_json::json!("a")),
            Value::String("a".into())
        );
        assert_eq!(Value::from_json(&serde_json::Value::Null), Value::Null);
    }
}
