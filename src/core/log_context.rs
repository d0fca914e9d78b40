//! Call context for the `*_ctx` print methods
//!
//! A [`LogContext`] carries request-scoped values (request ids, tenants,
//! trace ids) alongside a log call. Nothing in it is rendered on its own: a
//! logger lists the keys it extracts with `set_context_keys`, and only those
//! become attributes.

use super::attr::Attr;
use super::value::Value;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct LogContext {
    fields: HashMap<String, Value>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, consuming and returning the context
    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add or replace a field
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Attributes for the listed keys, in `keys` order; missing keys are skipped
    pub fn extract<'a, S>(&'a self, keys: &'a [S]) -> impl Iterator<Item = Attr> + 'a
    where
        S: AsRef<str>,
    {
        keys.iter().filter_map(move |key| {
            let key = key.as_ref();
            self.fields.get(key).map(|value| Attr::new(key, value.clone()))
        })
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.fields.keys().collect();
        keys.sort();
        for (i, key) in keys.into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={:?}", key, self.fields[key])?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for LogContext
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
