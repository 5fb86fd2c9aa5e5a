use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use medialink_core::{MediaError, Result};

/// Byte order used to encode and decode multi-byte integers.
///
/// Always explicit: the codec never falls back to the platform order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

/// Semantic type a reply is decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// UTF-8 text.
    String,
    /// Raw byte sequence.
    #[default]
    Bytes,
    /// A single byte.
    Byte,
    Int16,
    Int32,
    Int64,
    UInt16,
    UInt32,
    UInt64,
}

impl DataType {
    /// Encoded width for fixed-size types, `None` for variable-length ones.
    pub fn width(self) -> Option<usize> {
        match self {
            DataType::String | DataType::Bytes => None,
            DataType::Byte => Some(1),
            DataType::Int16 | DataType::UInt16 => Some(2),
            DataType::Int32 | DataType::UInt32 => Some(4),
            DataType::Int64 | DataType::UInt64 => Some(8),
        }
    }
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    String(String),
    Bytes(Bytes),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
}

impl Value {
    /// The semantic type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::String(_) => DataType::String,
            Value::Bytes(_) => DataType::Bytes,
            Value::Byte(_) => DataType::Byte,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt16(_) => DataType::UInt16,
            Value::UInt32(_) => DataType::UInt32,
            Value::UInt64(_) => DataType::UInt64,
        }
    }

    /// Encode this value in `order`.
    pub fn encode(&self, order: ByteOrder) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.data_type().width().unwrap_or(0));
        let le = order == ByteOrder::LittleEndian;
        match self {
            Value::String(text) => dst.put_slice(text.as_bytes()),
            Value::Bytes(bytes) => return bytes.clone(),
            Value::Byte(v) => dst.put_u8(*v),
            Value::Int16(v) if le => dst.put_i16_le(*v),
            Value::Int16(v) => dst.put_i16(*v),
            Value::Int32(v) if le => dst.put_i32_le(*v),
            Value::Int32(v) => dst.put_i32(*v),
            Value::Int64(v) if le => dst.put_i64_le(*v),
            Value::Int64(v) => dst.put_i64(*v),
            Value::UInt16(v) if le => dst.put_u16_le(*v),
            Value::UInt16(v) => dst.put_u16(*v),
            Value::UInt32(v) if le => dst.put_u32_le(*v),
            Value::UInt32(v) => dst.put_u32(*v),
            Value::UInt64(v) if le => dst.put_u64_le(*v),
            Value::UInt64(v) => dst.put_u64(*v),
        }
        dst.freeze()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Integer payloads widened to `i128`; `None` for text and bytes.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Value::Byte(v) => Some(v.into()),
            Value::Int16(v) => Some(v.into()),
            Value::Int32(v) => Some(v.into()),
            Value::Int64(v) => Some(v.into()),
            Value::UInt16(v) => Some(v.into()),
            Value::UInt32(v) => Some(v.into()),
            Value::UInt64(v) => Some(v.into()),
            Value::String(_) | Value::Bytes(_) => None,
        }
    }
}

impl fmt::Display for Value {
    /// Byte sequences render as hex, everything else in its natural form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(text) => f.write_str(text),
            Value::Bytes(bytes) => f.write_str(&to_hex(bytes)),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value.into())
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Byte(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::UInt16(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt32(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt64(value)
    }
}

/// Encode an optional value. `None` encodes to an empty sequence.
pub fn encode(value: Option<&Value>, order: ByteOrder) -> Bytes {
    value.map(|v| v.encode(order)).unwrap_or_default()
}

/// Decode `src` as `data_type`.
///
/// Fixed-width integers read their first `width` bytes and fail with
/// [`MediaError::BufferTooSmall`] on shorter input. Text is decoded as UTF-8,
/// replacing invalid sequences.
pub fn decode(src: &[u8], data_type: DataType, order: ByteOrder) -> Result<Value> {
    if let Some(needed) = data_type.width() {
        if src.len() < needed {
            return Err(MediaError::BufferTooSmall {
                needed,
                available: src.len(),
            });
        }
    }

    let le = order == ByteOrder::LittleEndian;
    let mut buf = src;
    let value = match data_type {
        DataType::String => Value::String(String::from_utf8_lossy(src).into_owned()),
        DataType::Bytes => Value::Bytes(Bytes::copy_from_slice(src)),
        DataType::Byte => Value::Byte(buf.get_u8()),
        DataType::Int16 if le => Value::Int16(buf.get_i16_le()),
        DataType::Int16 => Value::Int16(buf.get_i16()),
        DataType::Int32 if le => Value::Int32(buf.get_i32_le()),
        DataType::Int32 => Value::Int32(buf.get_i32()),
        DataType::Int64 if le => Value::Int64(buf.get_i64_le()),
        DataType::Int64 => Value::Int64(buf.get_i64()),
        DataType::UInt16 if le => Value::UInt16(buf.get_u16_le()),
        DataType::UInt16 => Value::UInt16(buf.get_u16()),
        DataType::UInt32 if le => Value::UInt32(buf.get_u32_le()),
        DataType::UInt32 => Value::UInt32(buf.get_u32()),
        DataType::UInt64 if le => Value::UInt64(buf.get_u64_le()),
        DataType::UInt64 => Value::UInt64(buf.get_u64()),
    };
    Ok(value)
}

/// Render bytes as uppercase hex pairs separated by single spaces.
///
/// `[0x0A, 0xFF]` renders as `"0A FF"`; empty input renders as `""`.
pub fn to_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

    let mut out = String::with_capacity(bytes.len().saturating_mul(3));
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(DIGITS[usize::from(byte >> 4)] as char);
        out.push(DIGITS[usize::from(byte & 0x0F)] as char);
    }
    out
}

/// Parse hex text as produced by [`to_hex`]. Whitespace between pairs is optional.
pub fn from_hex(text: &str) -> Result<Bytes> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(MediaError::invalid(format!("odd number of hex digits in {text:?}")));
    }

    let mut out = BytesMut::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        out.put_u8((hi << 4) | lo);
    }
    Ok(out.freeze())
}

fn hex_digit(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(MediaError::invalid(format!(
            "invalid hex digit {:?}",
            other as char
        ))),
    }
}
