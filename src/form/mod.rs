//! Form payload: the field values collected from a form at submission time.
//!
//! Fields keep the order and names the form gave them. Repeated names are
//! allowed, as in any multipart body. Nothing here validates field content.

use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

/// Value of a single form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        bytes: Bytes,
    },
}

/// Ordered set of `(name, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<(String, FormValue)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_text(name, value);
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        self.push(
            name,
            FormValue::File {
                file_name: file_name.into(),
                mime,
                bytes: bytes.into(),
            },
        );
        self
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(name, FormValue::Text(value.into()));
    }

    pub fn push(&mut self, name: impl Into<String>, value: FormValue) {
        self.fields.push((name.into(), value));
    }

    /// First value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the multipart body. Only fails on a malformed MIME string.
    pub fn into_multipart(self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File {
                    file_name,
                    mime,
                    bytes,
                } => {
                    let mut part = Part::bytes(bytes.to_vec()).file_name(file_name);
                    if let Some(mime) = mime {
                        part = part.mime_str(&mime).map_err(|e| {
                            Error::validation_with_context(
                                format!("Invalid mime: {}", e),
                                ErrorContext::new()
                                    .with_field_path(name.clone())
                                    .with_details(mime.clone()),
                            )
                        })?;
                    }
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}
