//! # pronounce-client
//!
//! Form-to-speech client: a form's fields are posted as multipart data to a
//! server's `/pronounce` endpoint, the JSON reply is checked for an
//! `audio_url`, and when one is present an audio element is pointed at it,
//! reloaded and played.
//!
//! ## Overview
//!
//! There is one flow. A [`Page`] owns the form, the audio player and its
//! source. The host calls [`Page::ready`] once, which registers a
//! [`FormSubmissionHandler`]. Every submission afterwards is intercepted,
//! sent as exactly one request, and resolved on its own task.
//!
//! - **No retries**: a failed submission is logged and forgotten
//! - **No user-facing errors**: failures go to `tracing` only
//! - **No serialization**: overlapping submissions race; the last response to
//!   resolve owns the audio element
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pronounce_client::{ClientConfig, FormElement, HttpTransport, InMemoryAudioElement};
//! use pronounce_client::page::{PageBuilder, Submission};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> pronounce_client::Result<()> {
//!     let transport = Arc::new(HttpTransport::new(&ClientConfig::from_env())?);
//!     let audio = Arc::new(InMemoryAudioElement::new());
//!     let page = PageBuilder::standard(FormElement::new().with_text("text", "hello"), audio).build();
//!     page.ready(transport)?;
//!
//!     if let Submission::Intercepted(handle) = page.submit()? {
//!         let _outcome = handle.await;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`page`] | Element contract and one-time listener registration |
//! | [`handler`] | The submission chain and its continuation |
//! | [`form`] | Ordered multipart form payloads |
//! | [`transport`] | Submission transport trait and its reqwest implementation |
//! | [`response`] | JSON response decoding |
//! | [`audio`] | Audio element trait and implementations |
//! | [`config`] | Server base URL and HTTP settings |

pub mod audio;
pub mod config;
pub mod form;
pub mod handler;
pub mod page;
pub mod response;
pub mod transport;

pub use audio::{AudioElement, FileAudioElement, InMemoryAudioElement};
#[cfg(feature = "playback")]
pub use audio::DeviceAudioElement;
pub use config::ClientConfig;
pub use form::{FormPayload, FormValue};
pub use handler::{Continuation, FormSubmissionHandler, SubmissionOutcome, SubmitEvent};
pub use page::{FormElement, Page};
pub use response::PronounceResponse;
pub use transport::{HttpTransport, RawResponse, SubmitTransport};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
