//! Query parameters and JSON body values.
//!
//! Query values are a small tagged type instead of arbitrary JSON so the
//! encoding rule for each shape is explicit:
//! - [`ParamValue::Str`] becomes one `key=value` pair
//! - [`ParamValue::List`] becomes one pair per element, all with the same key
//! - [`ParamValue::Json`] is serialized to JSON text and sent as one pair

use std::collections::BTreeMap;

use serde_json::Value;
use url::form_urlencoded;

use crate::error::{KrakenError, KrakenResult};

/// JSON body of a request.
///
/// Serializes with sorted keys and no whitespace.
pub type Body = serde_json::Map<String, Value>;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Plain string, sent as is
    Str(String),
    /// Repeated parameter, one pair per element
    List(Vec<String>),
    /// Any other value, sent as its JSON text
    Json(Value),
}

impl ParamValue {
    /// Append the `key=value` pairs for this value to `out`.
    fn append_pairs(
        &self,
        key: &str,
        out: &mut form_urlencoded::Serializer<'_, String>,
    ) -> KrakenResult<()> {
        match self {
            ParamValue::Str(value) => {
                out.append_pair(key, value);
            }
            ParamValue::List(values) => {
                for value in values {
                    out.append_pair(key, value);
                }
            }
            ParamValue::Json(value) => {
                let text = serde_json::to_string(value)
                    .map_err(|e| KrakenError::QueryEncoding(format!("{}: {}", key, e)))?;
                out.append_pair(key, &text);
            }
        }
        Ok(())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
    fn from(values: [&str; N]) -> Self {
        ParamValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

/// JSON strings are treated as plain strings; everything else keeps its JSON form.
impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ParamValue::Str(s),
            other => ParamValue::Json(other),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Json(Value::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Json(Value::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Json(Value::Bool(value))
    }
}

/// Query parameters of a request, keyed and encoded in sorted key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    params: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    /// Builder form of [`QueryParams::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up the value for `key`.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Encode as `application/x-www-form-urlencoded`.
    ///
    /// Keys are emitted in sorted order; values of one key keep their order.
    ///
    /// # Errors
    ///
    /// Returns [`KrakenError::QueryEncoding`] if a JSON value cannot be
    /// serialized.
    pub fn encode(&self) -> KrakenResult<String> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            value.append_pairs(key, &mut serializer)?;
        }
        Ok(serializer.finish())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Text form of a nonce taken from a request body, as fed to the signer.
///
/// JSON strings contribute their raw text, all other values their JSON text.
pub fn nonce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
