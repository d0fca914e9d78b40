//! Key/value attributes and argument-list parsing
//!
//! An argument list is a free-form sequence of [`Arg`]s: pre-built attributes
//! (spliced in place) or alternating string keys and values. Lists are turned
//! into [`Attrs`] either preserving duplicates ([`build_attrs`]) or through a
//! [`KeyIndex`] that overwrites an existing attribute in place on key
//! collision, keeping the position where the key was first seen
//! ([`merge_args`], [`merge_attrs`]).

use super::value::Value;
use std::collections::HashMap;

/// Key used when an argument list has a value where a key was expected, or a
/// trailing key without a value
pub const BAD_KEY: &str = "!BADKEY";

/// One log field: a key with a flat value or a nested group
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub(crate) key: String,
    pub(crate) value: Value,
}

pub type Attrs = Vec<Attr>;

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A named group holding `attrs` in order
    pub fn group(key: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            key: key.into(),
            value: Value::Group(attrs),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Overwrite the value, keeping the key and position
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    pub fn is_group(&self) -> bool {
        self.value.is_group()
    }

    /// Children of a group attribute
    pub fn children(&self) -> Option<&[Attr]> {
        match &self.value {
            Value::Group(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// One element of a free-form argument list
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Attr(Attr),
    Attrs(Attrs),
    Value(Value),
}

impl From<Attr> for Arg {
    fn from(attr: Attr) -> Self {
        Arg::Attr(attr)
    }
}

impl From<Attrs> for Arg {
    fn from(attrs: Attrs) -> Self {
        Arg::Attrs(attrs)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

macro_rules! impl_arg_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_arg_from_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    char,
    &str,
    String,
    &String,
    &[u8],
    std::time::Duration,
    std::time::SystemTime,
    chrono::DateTime<chrono::Utc>,
    Vec<String>,
    Vec<&str>,
    Vec<bool>,
    Vec<i64>,
    Vec<f64>,
    serde_json::Value,
);

/// Position of each key already present in an [`Attrs`] sequence
#[derive(Debug, Default, Clone)]
pub struct KeyIndex {
    positions: HashMap<String, usize>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map each key to its first position in `attrs`
    ///
    /// Values are left untouched; a sequence holding duplicates still has them.
    pub fn of(attrs: &[Attr]) -> Self {
        let mut index = Self::new();
        for (pos, attr) in attrs.iter().enumerate() {
            index.positions.entry(attr.key.clone()).or_insert(pos);
        }
        index
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

/// Append `attr`, or overwrite the value of the attribute already holding its key
pub fn put_attr(dst: &mut Attrs, index: &mut KeyIndex, attr: Attr) {
    match index.positions.get(&attr.key) {
        Some(&pos) => dst[pos].value = attr.value,
        None => {
            index.positions.insert(attr.key.clone(), dst.len());
            dst.push(attr);
        }
    }
}

/// De-duplicating merge of already-built attributes
pub fn merge_attrs<'a, I>(dst: &mut Attrs, index: &mut KeyIndex, src: I)
where
    I: IntoIterator<Item = &'a Attr>,
{
    for attr in src {
        put_attr(dst, index, attr.clone());
    }
}

/// Parse `args` into attributes, preserving duplicate keys
pub fn build_attrs(args: &[Arg]) -> Attrs {
    let mut out = Vec::with_capacity(args.len() / 2 + 1);
    parse_args(args, |attr| out.push(attr));
    out
}

/// Parse `args` and merge them into `dst` through `index`
pub fn merge_args(dst: &mut Attrs, index: &mut KeyIndex, args: &[Arg]) {
    parse_args(args, |attr| put_attr(dst, index, attr));
}

fn parse_args<F: FnMut(Attr)>(args: &[Arg], mut emit: F) {
    let mut pending: Option<&str> = None;

    for arg in args {
        match (pending.take(), arg) {
            (Some(key), Arg::Value(value)) => emit(Attr::new(key, value.clone())),
            // a pre-built attribute in value position becomes a single-entry group
            (Some(key), Arg::Attr(attr)) => emit(Attr::group(key, vec![attr.clone()])),
            (Some(key), Arg::Attrs(attrs)) => emit(Attr::group(key, attrs.clone())),
            (None, Arg::Attr(attr)) => emit(attr.clone()),
            (None, Arg::Attrs(attrs)) => attrs.iter().cloned().for_each(&mut emit),
            (None, Arg::Value(Value::Str(key))) => pending = Some(key.as_str()),
            (None, Arg::Value(value)) => emit(Attr::new(BAD_KEY, value.clone())),
        }
    }

    if let Some(key) = pending {
        emit(Attr::new(BAD_KEY, key));
    }
}

/// Build an argument list from alternating keys and values or pre-built attrs
///
/// ```
/// use rust_structured_logger::args;
///
/// let list = args!["user", "alice", "attempt", 3];
/// assert_eq!(list.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::core::Arg>::new()
    };
    ($($e:expr),+ $(,)?) => {
        ::std::vec![$($crate::core::Arg::from($e)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    fn keys(attrs: &[Attr]) -> Vec<&str> {
        attrs.iter().map(|a| a.key()).collect()
    }

    #[test]
    fn test_build_pairs() {
        let attrs = build_attrs(&args!["a", 1, "b", "two", "c", true]);
        assert_eq!(keys(&attrs), ["a", "b", "c"]);
        assert_eq!(attrs[0].value(), &Value::Int(1));
        assert_eq!(attrs[1].value(), &Value::Str("two".into()));
    }

    #[test]
    fn test_build_keeps_duplicates() {
        let attrs = build_attrs(&args!["a", 1, "a", 2]);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].value(), &Value::Int(2));
    }

    #[test]
    fn test_splices_prebuilt() {
        let prebuilt = vec![Attr::new("x", 1), Attr::new("y", 2)];
        let attrs = build_attrs(&args![Attr::new("w", 0), prebuilt, "z", 3]);
        assert_eq!(keys(&attrs), ["w", "x", "y", "z"]);
    }

    #[test]
    fn test_trailing_key_is_bad_key() {
        let attrs = build_attrs(&args!["a", 1, "dangling"]);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].key(), BAD_KEY);
        assert_eq!(attrs[1].value(), &Value::Str("dangling".into()));
    }

    #[test]
    fn test_value_in_key_position_is_bad_key() {
        let attrs = build_attrs(&args![42, "a", 1]);
        assert_eq!(keys(&attrs), [BAD_KEY, "a"]);
        assert_eq!(attrs[0].value(), &Value::Int(42));
    }

    #[test]
    fn test_attr_in_value_position_groups() {
        let attrs = build_attrs(&args!["req", Attr::new("id", 9)]);
        assert_eq!(attrs.len(), 1);
        assert!(attrs[0].is_group());
        assert_eq!(attrs[0].children().unwrap()[0].key(), "id");
    }

    #[test]
    fn test_merge_overwrites_in_place() {
        let mut dst = Attrs::new();
        let mut index = KeyIndex::new();
        merge_args(&mut dst, &mut index, &args!["a", 1, "b", 2, "a", 3, "c", 4, "b", 5]);
        assert_eq!(keys(&dst), ["a", "b", "c"]);
        assert_eq!(dst[0].value(), &Value::Int(3));
        assert_eq!(dst[1].value(), &Value::Int(5));
        assert_eq!(dst[2].value(), &Value::Int(4));
    }

    #[test]
    fn test_merge_attrs_with_existing_index() {
        let mut dst = vec![Attr::new("svc", "api"), Attr::new("ver", 1)];
        let mut index = KeyIndex::of(&dst);
        merge_attrs(&mut dst, &mut index, &[Attr::new("ver", 2), Attr::new("env", "prod")]);
        assert_eq!(keys(&dst), ["svc", "ver", "env"]);
        assert_eq!(dst[1].value(), &Value::Int(2));
    }

    #[test]
    fn test_index_of_keeps_first_position_only() {
        let attrs = vec![Attr::new("k", 1), Attr::new("j", 2), Attr::new("k", 3)];
        let index = KeyIndex::of(&attrs);
        assert_eq!(index.get("k"), Some(0));
        assert_eq!(index.get("j"), Some(1));
        assert_eq!(index.len(), 2);
        assert_eq!(attrs[0].value(), &Value::Int(1));
    }

    #[test]
    fn test_set_value() {
        let mut attr = Attr::new("k", 1);
        attr.set_value("now a string");
        assert_eq!(attr.key(), "k");
        assert_eq!(attr.value().as_str(), Some("now a string"));
    }

    #[test]
    fn test_empty_args() {
        assert!(build_attrs(&args![]).is_empty());
    }
}
