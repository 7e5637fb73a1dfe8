use serde::{Deserialize, Serialize};

use super::DataValue;

/// Data type of values
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum DataType {
    Utf8String,
    Binary,
    Boolean,
    Int32,
    Int64,
    Float64,
    Decimal,
    JSON,
    Date,
    Time,
    DateTime,
    DateTimeWithTZ,
    Null,
}

impl DataType {
    /// Whether a value of this type can be held in a field of type `target`
    pub fn is_assignable_to(&self, target: &DataType) -> bool {
        match (self, target) {
            (DataType::Null, _) => true,
            (DataType::Int32, DataType::Int64) => true,
            (a, b) => a == b,
        }
    }
}

impl From<&DataValue> for DataType {
    fn from(v: &DataValue) -> Self {
        match v {
            DataValue::Null => DataType::Null,
            DataValue::Utf8String(_) => DataType::Utf8String,
            DataValue::Binary(_) => DataType::Binary,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::Int32(_) => DataType::Int32,
            DataValue::Int64(_) => DataType::Int64,
            DataValue::Float64(_) => DataType::Float64,
            DataValue::Decimal(_) => DataType::Decimal,
            DataValue::JSON(_) => DataType::JSON,
            DataValue::Date(_) => DataType::Date,
            DataValue::Time(_) => DataType::Time,
            DataValue::DateTime(_) => DataType::DateTime,
            DataValue::DateTimeWithTZ(_) => DataType::DateTimeWithTZ,
        }
    }
}
