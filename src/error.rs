use crate::transport::TransportError;
use thiserror::Error;

/// Where in a submission an error came from.
///
/// Errors never reach the end user; they are logged by the handler and
/// folded into a `SubmissionOutcome`. This context is what makes those log
/// lines traceable to a page element or an audio URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Page element id (`tts-form`, `audio-source`), form field name, or
    /// config key such as `base_url`.
    pub field_path: Option<String>,
    /// The audio URL being loaded or played, or the MIME string that failed
    /// to parse.
    pub details: Option<String>,
    /// Component that raised the error, such as `page`, `transport` or `audio`.
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Every failure a submission chain or page setup can hit.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad base URL, missing page element, or no audio output device.
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// A form field that cannot be encoded as multipart, e.g. an invalid MIME type.
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// Media load or playback failed, or the page listener was registered twice.
    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response body could not be decoded into the expected JSON shape.
    #[error("Decode error: HTTP {status}: {message}")]
    Decode { status: u16, message: String },
}

/// Display suffix such as ` (field: audio-source, source: page)`, empty when
/// no context was attached.
fn format_context(ctx: &ErrorContext) -> String {
    let parts: Vec<String> = [
        ("field", &ctx.field_path),
        ("details", &ctx.details),
        ("source", &ctx.source),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
    .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    pub fn decode(status: u16, msg: impl Into<String>) -> Self {
        Error::Decode {
            status,
            message: msg.into(),
        }
    }

    /// Context of a configuration, validation or runtime error. Transport,
    /// I/O and decode errors carry none.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}
