//! Form-encoded request bodies with Stripe's nested key syntax.

use crate::ports::Metadata;

/// Ordered `key=value` pairs for a Stripe request.
///
/// Nested objects and arrays are flattened into bracketed keys:
/// `line_items[0][price_data][currency]=usd`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Pushes the value only when present.
    pub fn push_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Pushes `prefix[key]=value` for each metadata entry.
    pub fn push_metadata(&mut self, prefix: &str, metadata: &Metadata) -> &mut Self {
        for (key, value) in metadata {
            self.push(format!("{}[{}]", prefix, key), value);
        }
        self
    }

    /// Pushes `key[]=value` for each entry.
    pub fn push_list<V: ToString>(&mut self, key: &str, values: &[V]) -> &mut Self {
        for value in values {
            self.push(format!("{}[]", key), value.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Builds a nested key: `key(&["line_items", "0", "price"])` is `line_items[0][price]`.
pub fn key(parts: &[&str]) -> String {
    let mut parts = parts.iter();
    let mut out = parts.next().map(|s| s.to_string()).unwrap_or_default();
    for part in parts {
        out.push('[');
        out.push_str(part);
        out.push(']');
    }
    out
}
