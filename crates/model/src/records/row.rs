use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Field {
            name: name.into(),
            value,
        }
    }
}

/// One source row: the owning entity (table) plus its fields in cursor
/// order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub fields: Vec<Field>,
}

impl RowData {
    pub fn new(entity: &str, fields: Vec<Field>) -> Self {
        RowData {
            entity: entity.to_string(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_is_case_insensitive() {
        let row = RowData::new(
            "orders",
            vec![Field::new("OrderId", Value::Int(7))],
        );
        assert_eq!(row.get_value("orderid"), Value::Int(7));
        assert_eq!(row.get_value("missing"), Value::Null);
    }
}
