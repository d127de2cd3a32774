//! Typed parameter values
//!
//! [`Value`] is the closed set of SQL values a statement parameter can hold.
//! Values are built from native Rust types through `From`, from text through
//! [`Value::parse`], or from a raw payload through [`Value::from_raw`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::constants::FieldType;
use crate::error::{Error, Result};
use crate::types::{
    check_datetime_range, decode_datetime, encode_datetime, parse_datetime, BigDecimal,
    BigInteger,
};

/// A single SQL value bound to a statement parameter.
///
/// Exactly one variant is active per value, and the variant determines the
/// [`FieldType`] tag sent on the wire.
///
/// # Example
///
/// ```rust
/// use edb_rs::{FieldType, Value};
///
/// let v: Value = 42i32.into();
/// assert_eq!(v.field_type(), FieldType::Int);
///
/// let v = Value::parse(FieldType::Bool, "yes").unwrap();
/// assert_eq!(v, Value::Bool(true));
///
/// assert!(Value::parse(FieldType::Int, "4x2").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// BOOLEAN
    Bool(bool),
    /// SMALLINT
    Short(i16),
    /// INT
    Int(i32),
    /// BIGINT
    Long(i64),
    /// REAL
    Float(f32),
    /// DOUBLE PRECISION
    Double(f64),
    /// Arbitrary precision integer
    BigInteger(BigInteger),
    /// Arbitrary precision decimal
    Decimal(BigDecimal),
    /// Character data
    String(String),
    /// TIMESTAMP without time zone
    DateTime(NaiveDateTime),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// The wire type tag of this value
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Bool,
            Value::Short(_) => FieldType::Short,
            Value::Int(_) => FieldType::Int,
            Value::Long(_) => FieldType::Long,
            Value::Float(_) => FieldType::Float,
            Value::Double(_) => FieldType::Double,
            Value::BigInteger(_) => FieldType::BigInteger,
            Value::Decimal(_) => FieldType::Decimal,
            Value::String(_) => FieldType::String,
            Value::DateTime(_) => FieldType::DateTime,
            Value::Bytes(_) => FieldType::Bytes,
        }
    }

    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as an integer, widening the smaller integer types
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Short(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            Value::BigInteger(n) => n.to_i64().ok(),
            _ => None,
        }
    }

    /// Try to get as a double
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Decimal(d) => d.to_f64().ok(),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Try to get as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get as a timestamp
    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Parse a textual literal into a value of the given type
    ///
    /// Invalid literals fail with [`Error::Parse`]; nothing is truncated or
    /// clamped. Binary data is given as hex, with an optional `0x` prefix.
    pub fn parse(field_type: FieldType, text: &str) -> Result<Value> {
        let s = text.trim();
        let fail = |reason: String| Error::parse(field_type, text, reason);

        let value = match field_type {
            FieldType::Null => Value::Null,
            FieldType::Bool => Value::Bool(parse_bool(s).ok_or_else(|| {
                fail("expected true/false, t/f, yes/no, y/n or 1/0".to_string())
            })?),
            FieldType::Short => Value::Short(s.parse().map_err(|e| fail(format!("{}", e)))?),
            FieldType::Int => Value::Int(s.parse().map_err(|e| fail(format!("{}", e)))?),
            FieldType::Long => Value::Long(s.parse().map_err(|e| fail(format!("{}", e)))?),
            FieldType::Float => Value::Float(parse_float(s, f32::is_infinite).map_err(fail)?),
            FieldType::Double => Value::Double(parse_float(s, f64::is_infinite).map_err(fail)?),
            FieldType::BigInteger => Value::BigInteger(s.parse()?),
            FieldType::Decimal => Value::Decimal(s.parse()?),
            // text is bound as-is, surrounding whitespace included
            FieldType::String => Value::String(text.to_string()),
            FieldType::DateTime => Value::DateTime(parse_datetime(s)?),
            FieldType::Bytes => {
                let digits = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                Value::Bytes(hex::decode(digits).map_err(|e| fail(e.to_string()))?)
            }
        };
        Ok(value)
    }

    /// Build a value from a raw payload
    ///
    /// Binary data is taken verbatim. Every other type interprets the payload
    /// as a UTF-8 literal of that type. A missing payload is only accepted for
    /// [`FieldType::Null`].
    pub fn from_raw(field_type: FieldType, payload: Option<&[u8]>) -> Result<Value> {
        let Some(data) = payload else {
            return match field_type {
                FieldType::Null => Ok(Value::Null),
                _ => Err(Error::InvalidArgument(format!(
                    "missing payload for {} parameter",
                    field_type
                ))),
            };
        };

        match field_type {
            FieldType::Null => Ok(Value::Null),
            FieldType::Bytes => Ok(Value::Bytes(data.to_vec())),
            _ => {
                let text = std::str::from_utf8(data).map_err(|e| {
                    Error::parse(field_type, String::from_utf8_lossy(data), e.to_string())
                })?;
                Value::parse(field_type, text)
            }
        }
    }

    /// Check that the value can be sent on the wire
    ///
    /// Only timestamps can hold values outside the wire range; they fail
    /// with [`Error::InvalidArgument`].
    pub fn check_encodable(&self) -> Result<()> {
        match self {
            Value::DateTime(dt) => check_datetime_range(dt),
            _ => Ok(()),
        }
    }

    /// Encode the wire payload of this value
    ///
    /// Returns `None` for NULL, which is sent as the null indicator.
    pub fn encode_payload(&self) -> Result<Option<Vec<u8>>> {
        let payload = match self {
            Value::Null => return Ok(None),
            Value::Bool(b) => vec![*b as u8],
            Value::Short(v) => v.to_be_bytes().to_vec(),
            Value::Int(v) => v.to_be_bytes().to_vec(),
            Value::Long(v) => v.to_be_bytes().to_vec(),
            Value::Float(v) => v.to_bits().to_be_bytes().to_vec(),
            Value::Double(v) => v.to_bits().to_be_bytes().to_vec(),
            Value::BigInteger(n) => n.as_str().as_bytes().to_vec(),
            Value::Decimal(d) => d.as_str().as_bytes().to_vec(),
            Value::String(s) => s.as_bytes().to_vec(),
            Value::DateTime(dt) => encode_datetime(dt)?.to_vec(),
            Value::Bytes(b) => b.clone(),
        };
        Ok(Some(payload))
    }

    /// Decode a value from its wire payload
    pub fn decode_payload(field_type: FieldType, payload: Option<&[u8]>) -> Result<Value> {
        let Some(data) = payload else {
            return Ok(Value::Null);
        };

        if let Some(size) = field_type.fixed_size() {
            // timestamps may also arrive without fractional seconds
            let short_timestamp = field_type == FieldType::DateTime && data.len() == 7;
            if data.len() != size as usize && !short_timestamp {
                return Err(Error::Protocol(format!(
                    "{} payload must be {} bytes, got {}",
                    field_type,
                    size,
                    data.len()
                )));
            }
        }

        let text = || {
            std::str::from_utf8(data)
                .map_err(|e| Error::Protocol(format!("invalid UTF-8 in {} payload: {}", field_type, e)))
        };

        let value = match field_type {
            FieldType::Null => Value::Null,
            FieldType::Bool => Value::Bool(data[0] != 0),
            FieldType::Short => Value::Short(i16::from_be_bytes([data[0], data[1]])),
            FieldType::Int => Value::Int(i32::from_be_bytes([data[0], data[1], data[2], data[3]])),
            FieldType::Long => Value::Long(i64::from_be_bytes(fixed::<8>(data))),
            FieldType::Float => Value::Float(f32::from_bits(u32::from_be_bytes(fixed::<4>(data)))),
            FieldType::Double => {
                Value::Double(f64::from_bits(u64::from_be_bytes(fixed::<8>(data))))
            }
            FieldType::BigInteger => Value::BigInteger(text()?.parse()?),
            FieldType::Decimal => Value::Decimal(text()?.parse()?),
            FieldType::String => Value::String(text()?.to_string()),
            FieldType::DateTime => Value::DateTime(decode_datetime(data)?),
            FieldType::Bytes => Value::Bytes(data.to_vec()),
        };
        Ok(value)
    }
}

/// Copy a length-checked payload into a fixed array
fn fixed<const N: usize>(data: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[..N]);
    out
}

/// Parse a float, rejecting finite literals too large for the type
fn parse_float<T>(s: &str, is_infinite: fn(T) -> bool) -> std::result::Result<T, String>
where
    T: FromStr + Copy,
    T::Err: fmt::Display,
{
    let value: T = s.parse().map_err(|e: T::Err| e.to_string())?;
    if is_infinite(value) && !is_infinity_literal(s) {
        return Err("out of range".to_string());
    }
    Ok(value)
}

fn is_infinity_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<BigInteger> for Value {
    fn from(v: BigInteger) -> Self {
        Value::BigInteger(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::BigInteger(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_native() {
        assert_eq!(Value::from(7i16).field_type(), FieldType::Short);
        assert_eq!(Value::from(7i32).field_type(), FieldType::Int);
        assert_eq!(Value::from(7i64).field_type(), FieldType::Long);
        assert_eq!(Value::from(1.5f32).field_type(), FieldType::Float);
        assert_eq!(Value::from("x").field_type(), FieldType::String);
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3i32)), Value::Int(3));
    }

    #[test]
    fn test_parse_bool_variants() {
        for t in ["true", "TRUE", "t", "Yes", "y", "1"] {
            assert_eq!(Value::parse(FieldType::Bool, t).unwrap(), Value::Bool(true), "{}", t);
        }
        for f in ["false", "F", "no", "N", "0"] {
            assert_eq!(Value::parse(FieldType::Bool, f).unwrap(), Value::Bool(false), "{}", f);
        }
        assert!(Value::parse(FieldType::Bool, "maybe").unwrap_err().is_parse_error());
    }

    #[test]
    fn test_parse_integers_never_truncate() {
        assert_eq!(Value::parse(FieldType::Int, " 42 ").unwrap(), Value::Int(42));
        assert_eq!(Value::parse(FieldType::Short, "-32768").unwrap(), Value::Short(i16::MIN));

        // out of range and trailing garbage are errors, not truncated values
        for (ft, text) in [
            (FieldType::Short, "32768"),
            (FieldType::Int, "42abc"),
            (FieldType::Int, "4.2"),
            (FieldType::Long, ""),
        ] {
            let err = Value::parse(ft, text).unwrap_err();
            assert!(err.is_parse_error(), "{} {:?}", ft, text);
        }
    }

    #[test]
    fn test_parse_floats_reject_overflow() {
        assert_eq!(Value::parse(FieldType::Float, "3.5").unwrap(), Value::Float(3.5));
        assert_eq!(Value::parse(FieldType::Float, "1e38").unwrap(), Value::Float(1e38));

        for (ft, text) in [
            (FieldType::Float, "1e40"),
            (FieldType::Float, "-3.5e38"),
            (FieldType::Double, "1e400"),
            (FieldType::Double, "-1e309"),
        ] {
            let err = Value::parse(ft, text).unwrap_err();
            assert!(err.is_parse_error(), "{} {:?}", ft, text);
            assert!(err.to_string().contains("out of range"), "{}", err);
        }

        // infinity is only accepted when spelled out
        assert_eq!(
            Value::parse(FieldType::Double, "inf").unwrap(),
            Value::Double(f64::INFINITY)
        );
        assert_eq!(
            Value::parse(FieldType::Float, "-Infinity").unwrap(),
            Value::Float(f32::NEG_INFINITY)
        );
    }

    #[test]
    fn test_parse_string_keeps_text() {
        assert_eq!(
            Value::parse(FieldType::String, " padded ").unwrap(),
            Value::String(" padded ".to_string())
        );
    }

    #[test]
    fn test_parse_bytes_as_hex() {
        assert_eq!(
            Value::parse(FieldType::Bytes, "0xDEADbeef").unwrap(),
            Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef])
        );
        assert!(Value::parse(FieldType::Bytes, "xyz").is_err());
    }

    #[test]
    fn test_from_raw_requires_payload() {
        let err = Value::from_raw(FieldType::Bytes, None).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(Value::from_raw(FieldType::Null, None).unwrap(), Value::Null);
        assert_eq!(
            Value::from_raw(FieldType::Bytes, Some(&[])).unwrap(),
            Value::Bytes(Vec::new())
        );
    }

    #[test]
    fn test_from_raw_text_payload() {
        assert_eq!(Value::from_raw(FieldType::Int, Some(b"17")).unwrap(), Value::Int(17));
        let err = Value::from_raw(FieldType::String, Some(&[0xff, 0xfe])).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_payload_encoding() {
        assert_eq!(Value::Null.encode_payload().unwrap(), None);
        assert_eq!(Value::Bool(true).encode_payload().unwrap(), Some(vec![1]));
        assert_eq!(Value::Int(42).encode_payload().unwrap(), Some(vec![0, 0, 0, 42]));
        assert_eq!(Value::Short(-2).encode_payload().unwrap(), Some(vec![0xff, 0xfe]));
        assert_eq!(
            Value::Double(1.0).encode_payload().unwrap(),
            Some(vec![0x3f, 0xf0, 0, 0, 0, 0, 0, 0])
        );
        let d: BigDecimal = "-12.50".parse().unwrap();
        assert_eq!(Value::Decimal(d).encode_payload().unwrap(), Some(b"-12.50".to_vec()));
    }

    #[test]
    fn test_decode_payload() {
        assert_eq!(
            Value::decode_payload(FieldType::Long, Some(&(-9i64).to_be_bytes())).unwrap(),
            Value::Long(-9)
        );
        assert_eq!(Value::decode_payload(FieldType::Int, None).unwrap(), Value::Null);
        assert!(matches!(
            Value::decode_payload(FieldType::Int, Some(&[0, 1])),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
        let dt = parse_datetime("2024-03-15 10:30:45.5").unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-03-15 10:30:45.500");
    }
}
