//! Dynamic object graph
//!
//! [`Record`] is a `Node` without a Rust type behind it: an ordered map from
//! member id to a value, a nested record or a list. It is what program
//! definitions loaded at runtime marshal from and unmarshal into, and it
//! converts to and from JSON.

use crate::accessor::{AccessError, Element, Node, Sequence};
use progcall_interface::ParamValue;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// One member of a [`Record`]
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(ParamValue),
    Record(Record),
    List(Vec<Slot>),
}

impl Slot {
    fn kind(&self) -> &'static str {
        match self {
            Slot::Value(_) => "scalar",
            Slot::Record(_) => "structure",
            Slot::List(_) => "array",
        }
    }

    fn from_json(value: &Value) -> Result<Option<Slot>, AccessError> {
        let slot = match value {
            Value::Null => return Ok(None),
            Value::Bool(_) => {
                return Err(AccessError::TypeMismatch {
                    expected: "parameter value",
                    found: "boolean",
                })
            }
            Value::Number(n) => match n.as_i64() {
                Some(i) => Slot::Value(ParamValue::Int(i)),
                None => Slot::Value(ParamValue::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => Slot::Value(ParamValue::Text(s.clone())),
            Value::Array(items) => {
                // Elements are positional; a hole would shift every later index.
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    let slot = Slot::from_json(item)?.ok_or(AccessError::TypeMismatch {
                        expected: "array element",
                        found: "null",
                    })?;
                    list.push(slot);
                }
                Slot::List(list)
            }
            Value::Object(_) => Slot::Record(Record::from_json(value)?),
        };
        Ok(Some(slot))
    }

    fn to_json(&self) -> Value {
        match self {
            Slot::Value(ParamValue::Int(i)) => Value::from(*i),
            Slot::Value(ParamValue::Float(f)) => {
                Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null)
            }
            Slot::Value(ParamValue::Text(s)) => Value::String(s.clone()),
            Slot::Value(ParamValue::Bytes(b)) => Value::from(b.clone()),
            Slot::Record(record) => record.to_json(),
            Slot::List(items) => Value::Array(items.iter().map(Slot::to_json).collect()),
        }
    }
}

macro_rules! value_slot {
    ($($ty:ty),+) => {$(
        impl From<$ty> for Slot {
            fn from(value: $ty) -> Self {
                Slot::Value(value.into())
            }
        }
    )+};
}

value_slot!(ParamValue, i64, i32, f64, &str, String, Vec<u8>);

impl From<Record> for Slot {
    fn from(record: Record) -> Self {
        Slot::Record(record)
    }
}

/// A schemaless object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Slot>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, slot: impl Into<Slot>) -> Self {
        self.insert(field, slot);
        self
    }

    /// Builder-style insert of a list member
    pub fn with_list(mut self, field: impl Into<String>, items: Vec<Slot>) -> Self {
        self.insert(field, Slot::List(items));
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, slot: impl Into<Slot>) {
        self.fields.insert(field.into(), slot.into());
    }

    pub fn get(&self, field: &str) -> Option<&Slot> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from a JSON object
    ///
    /// `null` members are left out. A `null` array element is an error.
    pub fn from_json(value: &Value) -> Result<Self, AccessError> {
        let object = value.as_object().ok_or(AccessError::KindMismatch {
            expected: "structure",
            found: json_kind(value),
        })?;
        let mut record = Record::new();
        for (field, member) in object {
            if let Some(slot) = Slot::from_json(member)? {
                record.fields.insert(field.clone(), slot);
            }
        }
        Ok(record)
    }

    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .fields
            .iter()
            .map(|(field, slot)| (field.clone(), slot.to_json()))
            .collect();
        Value::Object(object)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Object(_) => "structure",
        _ => "scalar",
    }
}

impl Node for Record {
    fn value(&self, field: &str) -> Result<ParamValue, AccessError> {
        match self.fields.get(field) {
            Some(Slot::Value(value)) => Ok(value.clone()),
            Some(other) => Err(AccessError::KindMismatch {
                expected: "scalar",
                found: other.kind(),
            }),
            None => Err(AccessError::NoSuchField(field.to_string())),
        }
    }

    fn set_value(&mut self, field: &str, value: ParamValue) -> Result<(), AccessError> {
        self.fields.insert(field.to_string(), Slot::Value(value));
        Ok(())
    }

    fn child(&self, field: &str) -> Result<&dyn Node, AccessError> {
        match self.fields.get(field) {
            Some(Slot::Record(record)) => Ok(record),
            Some(other) => Err(AccessError::KindMismatch {
                expected: "structure",
                found: other.kind(),
            }),
            None => Err(AccessError::NoSuchField(field.to_string())),
        }
    }

    fn child_mut(&mut self, field: &str) -> Result<&mut dyn Node, AccessError> {
        let slot = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Slot::Record(Record::new()));
        match slot {
            Slot::Record(record) => Ok(record),
            other => Err(AccessError::KindMismatch {
                expected: "structure",
                found: other.kind(),
            }),
        }
    }

    fn sequence(&self, field: &str) -> Result<&dyn Sequence, AccessError> {
        match self.fields.get(field) {
            Some(Slot::List(items)) => Ok(items),
            Some(other) => Err(AccessError::KindMismatch {
                expected: "array",
                found: other.kind(),
            }),
            None => Err(AccessError::NoSuchField(field.to_string())),
        }
    }

    fn sequence_mut(&mut self, field: &str) -> Result<&mut dyn Sequence, AccessError> {
        let slot = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Slot::List(Vec::new()));
        match slot {
            Slot::List(items) => Ok(items),
            other => Err(AccessError::KindMismatch {
                expected: "array",
                found: other.kind(),
            }),
        }
    }
}

impl Element for Slot {
    fn to_item(&self) -> Result<ParamValue, AccessError> {
        match self {
            Slot::Value(value) => Ok(value.clone()),
            other => Err(AccessError::KindMismatch {
                expected: "scalar",
                found: other.kind(),
            }),
        }
    }

    fn from_item(value: ParamValue) -> Result<Self, AccessError> {
        Ok(Slot::Value(value))
    }

    fn as_node(&self) -> Option<&dyn Node> {
        match self {
            Slot::Record(record) => Some(record),
            _ => None,
        }
    }

    fn as_node_mut(&mut self) -> Option<&mut dyn Node> {
        match self {
            Slot::Record(record) => Some(record),
            _ => None,
        }
    }

    fn blank() -> Option<Self> {
        Some(Slot::Record(Record::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip() {
        let value = json!({
            "count": 5,
            "rate": 1.5,
            "name": "ACME",
            "header": { "key": "K1" },
            "items": [ { "id": 1 }, { "id": 2 } ],
            "codes": ["A", "B"]
        });
        let record = Record::from_json(&value).unwrap();
        assert_eq!(record.len(), 6);
        assert_eq!(record.to_json(), value);
    }

    #[test]
    fn test_null_members_are_skipped_and_booleans_rejected() {
        let record = Record::from_json(&json!({ "a": null, "b": 1 })).unwrap();
        assert!(record.get("a").is_none());
        assert!(Record::from_json(&json!({ "flag": true })).is_err());
        assert!(Record::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_null_array_elements_are_rejected() {
        let err = Record::from_json(&json!({ "codes": [null, "B"] })).unwrap_err();
        assert_eq!(
            err,
            AccessError::TypeMismatch {
                expected: "array element",
                found: "null"
            }
        );
        assert!(Record::from_json(&json!({ "lines": [{ "id": 1 }, null] })).is_err());
    }

    #[test]
    fn test_missing_members_are_materialised_on_mutation() {
        let mut record = Record::new();
        assert!(record.child("header").is_err());
        record
            .child_mut("header")
            .unwrap()
            .set_value("key", ParamValue::from("K"))
            .unwrap();
        record
            .sequence_mut("items")
            .unwrap()
            .push_blank()
            .unwrap()
            .set_value("id", ParamValue::Int(3))
            .unwrap();

        assert_eq!(
            record,
            Record::new()
                .with("header", Record::new().with("key", "K"))
                .with_list("items", vec![Record::new().with("id", 3).into()])
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let mut record = Record::new().with("count", 1);
        assert!(matches!(
            record.child_mut("count"),
            Err(AccessError::KindMismatch {
                expected: "structure",
                found: "scalar"
            })
        ));
        assert!(matches!(
            record.sequence("count"),
            Err(AccessError::KindMismatch { .. })
        ));
    }
}
