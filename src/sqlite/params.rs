use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};

use crate::types::WireValue;

impl ToSql for WireValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            WireValue::Null => ValueRef::Null,
            WireValue::Integer(i) => ValueRef::Integer(*i),
            WireValue::Real(f) => ValueRef::Real(*f),
            // Bytes go to SQLite as-is; they are UTF-8 whenever they came from `Value::Text`.
            WireValue::Text(bytes) => ValueRef::Text(bytes),
            WireValue::Blob(bytes) => ValueRef::Blob(bytes),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

/// Copy a `SQLite` cell onto the wire without interpreting text.
#[must_use]
pub(crate) fn extract_wire_value(value: ValueRef<'_>) -> WireValue {
    match value {
        ValueRef::Null => WireValue::Null,
        ValueRef::Integer(i) => WireValue::Integer(i),
        ValueRef::Real(f) => WireValue::Real(f),
        ValueRef::Text(bytes) => WireValue::Text(bytes.to_vec()),
        ValueRef::Blob(bytes) => WireValue::Blob(bytes.to_vec()),
    }
}
