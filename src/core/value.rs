//! Attribute values
//!
//! [`Value`] is a closed set of wire-representable kinds. The render pipeline
//! dispatches on the variant, so only [`Value::Opaque`] ever goes through
//! generic `Debug` formatting.

use super::attr::{Attr, Attrs};
use super::buffer::Buffer;
use super::error::Result;
use super::output_format::FormatMode;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// A value that writes its own wire representation
///
/// Implementations append bytes that are valid for `mode` (for example a JSON
/// value in [`FormatMode::Json`]). If `marshal_log` fails, the painter writes
/// an error marker in its place.
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::{Buffer, FormatMode, LogMarshal, Result};
///
/// #[derive(Debug)]
/// struct Point(i32, i32);
///
/// impl LogMarshal for Point {
///     fn marshal_log(&self, mode: FormatMode, buf: &mut Buffer) -> Result<()> {
///         match mode {
///             FormatMode::Json => buf.push_str(&format!("[{},{}]", self.0, self.1)),
///             _ => buf.push_str(&format!("{}x{}", self.0, self.1)),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait LogMarshal: Send + Sync + fmt::Debug {
    fn marshal_log(&self, mode: FormatMode, buf: &mut Buffer) -> Result<()>;
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Float32(f32),
    Complex { re: f64, im: f64 },
    Complex32 { re: f32, im: f32 },
    Str(String),
    Bytes(Vec<u8>),
    Duration(Duration),
    Time(DateTime<Utc>),
    Strings(Vec<String>),
    Bools(Vec<bool>),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Json(serde_json::Value),
    Custom(Arc<dyn LogMarshal>),
    Opaque(Arc<dyn fmt::Debug + Send + Sync>),
    Group(Attrs),
}

impl Value {
    pub fn complex(re: f64, im: f64) -> Self {
        Value::Complex { re, im }
    }

    pub fn complex32(re: f32, im: f32) -> Self {
        Value::Complex32 { re, im }
    }

    /// Serialize through serde into a [`Value::Json`]
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Value::Json(serde_json::to_value(value)?))
    }

    pub fn custom<T: LogMarshal + 'static>(value: T) -> Self {
        Value::Custom(Arc::new(value))
    }

    /// Catch-all for types with no dedicated variant
    pub fn opaque<T: fmt::Debug + Send + Sync + 'static>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    pub fn group(attrs: Attrs) -> Self {
        Value::Group(attrs)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Value::Group(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Float32(_) => "float32",
            Value::Complex { .. } => "complex",
            Value::Complex32 { .. } => "complex32",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Duration(_) => "duration",
            Value::Time(_) => "time",
            Value::Strings(_) => "strings",
            Value::Bools(_) => "bools",
            Value::Ints(_) => "ints",
            Value::Floats(_) => "floats",
            Value::Json(_) => "json",
            Value::Custom(_) => "custom",
            Value::Opaque(_) => "opaque",
            Value::Group(_) => "group",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Uint(a), Uint(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Float32(a), Float32(b)) => a == b,
            (Complex { re: a, im: b }, Complex { re: c, im: d }) => a == c && b == d,
            (Complex32 { re: a, im: b }, Complex32 { re: c, im: d }) => a == c && b == d,
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Duration(a), Duration(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Strings(a), Strings(b)) => a == b,
            (Bools(a), Bools(b)) => a == b,
            (Ints(a), Ints(b)) => a == b,
            (Floats(a), Floats(b)) => a == b,
            (Json(a), Json(b)) => a == b,
            (Custom(a), Custom(b)) => Arc::ptr_eq(a, b),
            (Opaque(a), Opaque(b)) => Arc::ptr_eq(a, b),
            (Group(a), Group(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! impl_value_from {
    ($($t:ty => |$v:ident| $e:expr),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from($v: $t) -> Self {
                    $e
                }
            }
        )*
    };
}

impl_value_from! {
    bool => |v| Value::Bool(v),
    i8 => |v| Value::Int(v as i64),
    i16 => |v| Value::Int(v as i64),
    i32 => |v| Value::Int(v as i64),
    i64 => |v| Value::Int(v),
    isize => |v| Value::Int(v as i64),
    u8 => |v| Value::Uint(v as u64),
    u16 => |v| Value::Uint(v as u64),
    u32 => |v| Value::Uint(v as u64),
    u64 => |v| Value::Uint(v),
    usize => |v| Value::Uint(v as u64),
    f32 => |v| Value::Float32(v),
    f64 => |v| Value::Float(v),
    char => |v| Value::Str(v.to_string()),
    &str => |v| Value::Str(v.to_string()),
    String => |v| Value::Str(v),
    &String => |v| Value::Str(v.clone()),
    Cow<'_, str> => |v| Value::Str(v.into_owned()),
    &[u8] => |v| Value::Bytes(v.to_vec()),
    Duration => |v| Value::Duration(v),
    DateTime<Utc> => |v| Value::Time(v),
    SystemTime => |v| Value::Time(v.into()),
    Vec<String> => |v| Value::Strings(v),
    Vec<&str> => |v| Value::Strings(v.into_iter().map(String::from).collect()),
    Vec<bool> => |v| Value::Bools(v),
    Vec<i64> => |v| Value::Ints(v),
    Vec<f64> => |v| Value::Floats(v),
    serde_json::Value => |v| Value::Json(v),
    Vec<Attr> => |v| Value::Group(v),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
