//! Decoded `/pronounce` response.

use crate::transport::RawResponse;
use crate::{Error, Result};
use serde_json::Value;
use std::borrow::Cow;
use tracing::debug;

/// JSON body of a submission response.
///
/// Only `audio_url` drives behavior; `error` is read for logging and every
/// other key is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct PronounceResponse {
    pub status: u16,
    body: Value,
}

impl PronounceResponse {
    /// Decode the body as JSON. The status code is not inspected: a 500
    /// with a JSON body decodes like a 200.
    ///
    /// A literal `null` body is rejected since there is nothing to look
    /// `audio_url` up on. Other non-object values decode and simply carry
    /// no fields.
    pub fn decode(raw: &RawResponse) -> Result<Self> {
        let body: Value = serde_json::from_slice(&raw.body)
            .map_err(|e| Error::decode(raw.status, e.to_string()))?;
        if body.is_null() {
            return Err(Error::decode(raw.status, "response body is null"));
        }
        Ok(Self {
            status: raw.status,
            body,
        })
    }

    pub fn from_value(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// The audio URL, if present and truthy.
    ///
    /// Missing, `null`, `false`, `0` and `""` are falsy. Any other value is
    /// turned into a string the way a browser would assign it to `src`:
    /// `true` becomes `"true"`, `7` becomes `"7"`, arrays are joined with
    /// `,` and objects become `"[object Object]"`.
    pub fn audio_url(&self) -> Option<Cow<'_, str>> {
        let value = self.body.get("audio_url")?;
        if !is_truthy(value) {
            return None;
        }
        match value {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => {
                debug!(value = %other, "coercing non-string audio_url");
                Some(Cow::Owned(coerce(other)))
            }
        }
    }

    /// Server-provided error message, when the body has one.
    pub fn error_message(&self) -> Option<&str> {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String conversion for a JSON value as a browser performs it.
fn coerce(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::String(s) => s.clone(),
        // null elements join as empty strings
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
