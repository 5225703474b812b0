//! Conversion between [`Value`] and the backend wire representation.

use crate::error::SqlParamsError;
use crate::types::{Value, WireValue};

const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// Encode a bound value for the wire.
#[must_use]
pub fn encode(value: &Value) -> WireValue {
    match value {
        Value::Int(i) => WireValue::Integer(*i),
        Value::Float(f) => WireValue::Real(*f),
        Value::Text(s) => WireValue::Text(s.as_bytes().to_vec()),
        Value::Bool(b) => WireValue::Integer(i64::from(*b)),
        Value::Timestamp(dt) => {
            WireValue::Text(dt.format(TIMESTAMP_FORMAT).to_string().into_bytes())
        }
        Value::Null => WireValue::Null,
        Value::Json(jval) => WireValue::Text(jval.to_string().into_bytes()),
        Value::Blob(bytes) => WireValue::Blob(bytes.clone()),
    }
}

/// Encode an ordered parameter list.
#[must_use]
pub fn encode_all(values: &[Value]) -> Vec<WireValue> {
    values.iter().map(encode).collect()
}

/// Decode a wire cell.
///
/// # Errors
///
/// Returns `SqlParamsError::DecodeError` when text bytes are not valid UTF-8.
pub fn decode(wire: WireValue) -> Result<Value, SqlParamsError> {
    match wire {
        WireValue::Null => Ok(Value::Null),
        WireValue::Integer(i) => Ok(Value::Int(i)),
        WireValue::Real(f) => Ok(Value::Float(f)),
        WireValue::Text(bytes) => String::from_utf8(bytes).map(Value::Text).map_err(|err| {
            SqlParamsError::DecodeError(format!(
                "text cell is not valid UTF-8 (first bad byte at {})",
                err.utf8_error().valid_up_to()
            ))
        }),
        WireValue::Blob(bytes) => Ok(Value::Blob(bytes)),
    }
}
