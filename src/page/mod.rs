//! The hosting page: the element contract and the one-time registration.
//!
//! A page holds a form, an audio player and the player's nested source,
//! each under a recognized id. [`Page::ready`] is the explicit
//! initialization the host calls once; it checks the contract and binds a
//! [`FormSubmissionHandler`] as the form's submit listener for the rest of
//! the page's life.

use crate::audio::AudioElement;
use crate::form::{FormPayload, FormValue};
use crate::handler::{FormSubmissionHandler, SubmissionOutcome, SubmitEvent};
use crate::transport::SubmitTransport;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const FORM_ID: &str = "tts-form";
pub const AUDIO_PLAYER_ID: &str = "audio-player";
pub const AUDIO_SOURCE_ID: &str = "audio-source";

/// A form and its controls, in document order.
#[derive(Debug, Clone, Default)]
pub struct FormElement {
    controls: Vec<(String, FormValue)>,
}

impl FormElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text control.
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append_text(name, value);
        self
    }

    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.controls.push((name.into(), FormValue::Text(value.into())));
    }

    /// Set the first control named `name`, appending one if none exists.
    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.set(name, FormValue::Text(value.into()));
    }

    pub fn set_file(
        &mut self,
        name: &str,
        file_name: impl Into<String>,
        mime: Option<String>,
        bytes: impl Into<Bytes>,
    ) {
        self.set(
            name,
            FormValue::File {
                file_name: file_name.into(),
                mime,
                bytes: bytes.into(),
            },
        );
    }

    fn set(&mut self, name: &str, value: FormValue) {
        match self.controls.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.controls.push((name.to_string(), value)),
        }
    }

    /// Snapshot of the current control values.
    pub fn payload(&self) -> FormPayload {
        let mut payload = FormPayload::new();
        for (name, value) in &self.controls {
            payload.push(name.clone(), value.clone());
        }
        payload
    }
}

enum Element {
    Form(FormElement),
    AudioPlayer(Arc<dyn AudioElement>),
    AudioSource,
}

/// Result of dispatching a submit on the page.
#[derive(Debug)]
pub enum Submission {
    /// The listener took the submission; the handle resolves when the chain ends.
    Intercepted(JoinHandle<SubmissionOutcome>),
    /// No listener prevented it; the page navigated away with the form.
    Navigated(FormPayload),
}

/// Collects elements by id.
#[derive(Default)]
pub struct PageBuilder {
    elements: HashMap<String, Element>,
}

impl PageBuilder {
    pub fn form(mut self, id: impl Into<String>, form: FormElement) -> Self {
        self.elements.insert(id.into(), Element::Form(form));
        self
    }

    pub fn audio_player(mut self, id: impl Into<String>, player: Arc<dyn AudioElement>) -> Self {
        self.elements.insert(id.into(), Element::AudioPlayer(player));
        self
    }

    pub fn audio_source(mut self, id: impl Into<String>) -> Self {
        self.elements.insert(id.into(), Element::AudioSource);
        self
    }

    /// Page with the standard form, player and source ids.
    pub fn standard(form: FormElement, player: Arc<dyn AudioElement>) -> Self {
        Self::default()
            .form(FORM_ID, form)
            .audio_player(AUDIO_PLAYER_ID, player)
            .audio_source(AUDIO_SOURCE_ID)
    }

    pub fn build(self) -> Page {
        Page {
            elements: self.elements,
            listener: OnceCell::new(),
        }
    }
}

pub struct Page {
    elements: HashMap<String, Element>,
    listener: OnceCell<Arc<FormSubmissionHandler>>,
}

impl Page {
    pub fn builder() -> PageBuilder {
        PageBuilder::default()
    }

    /// Register the submit listener. Call once when the page is ready.
    ///
    /// A missing form, player or source element is a configuration error.
    /// A second call is rejected and the first registration stays in place.
    pub fn ready(&self, transport: Arc<dyn SubmitTransport>) -> Result<Arc<FormSubmissionHandler>> {
        self.form()?;
        let player = self.player()?;
        if !matches!(self.elements.get(AUDIO_SOURCE_ID), Some(Element::AudioSource)) {
            return Err(missing(AUDIO_SOURCE_ID));
        }

        let handler = Arc::new(FormSubmissionHandler::new(transport, player));
        self.listener.set(Arc::clone(&handler)).map_err(|_| {
            Error::runtime_with_context(
                "submit listener already registered",
                ErrorContext::new().with_field_path(FORM_ID).with_source("page"),
            )
        })?;
        debug!(form = FORM_ID, "submit listener registered");
        Ok(handler)
    }

    pub fn is_ready(&self) -> bool {
        self.listener.get().is_some()
    }

    pub fn form(&self) -> Result<&FormElement> {
        match self.elements.get(FORM_ID) {
            Some(Element::Form(form)) => Ok(form),
            _ => Err(missing(FORM_ID)),
        }
    }

    pub fn form_mut(&mut self) -> Result<&mut FormElement> {
        match self.elements.get_mut(FORM_ID) {
            Some(Element::Form(form)) => Ok(form),
            _ => Err(missing(FORM_ID)),
        }
    }

    pub fn player(&self) -> Result<Arc<dyn AudioElement>> {
        match self.elements.get(AUDIO_PLAYER_ID) {
            Some(Element::AudioPlayer(player)) => Ok(Arc::clone(player)),
            _ => Err(missing(AUDIO_PLAYER_ID)),
        }
    }

    /// Dispatch a submit event for the form's current values.
    ///
    /// Once the page is ready the handler spawns the submission with
    /// `tokio::spawn`, so this must be called from within a Tokio runtime;
    /// outside one it panics. Before `ready` nothing is spawned and the
    /// payload comes back as [`Submission::Navigated`].
    pub fn submit(&self) -> Result<Submission> {
        let mut event = SubmitEvent::new(self.form()?.payload());
        match self.listener.get() {
            Some(handler) => Ok(Submission::Intercepted(handler.on_submit(&mut event))),
            None => Ok(Submission::Navigated(event.payload().clone())),
        }
    }
}

fn missing(id: &str) -> Error {
    Error::configuration_with_context(
        format!("required element #{} not found", id),
        ErrorContext::new().with_field_path(id).with_source("page"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::InMemoryAudioElement;
    use crate::transport::RawResponse;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl SubmitTransport for Fixed {
        async fn submit(&self, _payload: FormPayload) -> Result<RawResponse> {
            Ok(RawResponse::new(200, self.0))
        }
    }

    fn transport() -> Arc<dyn SubmitTransport> {
        Arc::new(Fixed(r#"{"audio_url": "/audio/1.wav"}"#))
    }

    #[test]
    fn missing_elements_fail_setup() {
        let player: Arc<dyn AudioElement> = Arc::new(InMemoryAudioElement::new());

        let no_form = Page::builder()
            .audio_player(AUDIO_PLAYER_ID, player.clone())
            .audio_source(AUDIO_SOURCE_ID)
            .build();
        let err = no_form.ready(transport()).unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some(FORM_ID)
        );

        let no_source = Page::builder()
            .form(FORM_ID, FormElement::new())
            .audio_player(AUDIO_PLAYER_ID, player)
            .build();
        let err = no_source.ready(transport()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(!no_source.is_ready());
    }

    #[test]
    fn wrong_ids_fail_setup() {
        let page = Page::builder()
            .form("other-form", FormElement::new())
            .audio_player(AUDIO_PLAYER_ID, Arc::new(InMemoryAudioElement::new()))
            .audio_source(AUDIO_SOURCE_ID)
            .build();
        assert!(page.ready(transport()).is_err());
    }

    #[test]
    fn registers_only_once() {
        let page = PageBuilder::standard(FormElement::new(), Arc::new(InMemoryAudioElement::new()))
            .build();
        assert!(page.ready(transport()).is_ok());
        assert!(matches!(
            page.ready(transport()),
            Err(Error::Runtime { .. })
        ));
        assert!(page.is_ready());
    }

    #[test]
    fn unregistered_form_navigates() {
        let page = PageBuilder::standard(
            FormElement::new().with_text("text", "hello"),
            Arc::new(InMemoryAudioElement::new()),
        )
        .build();
        match page.submit().unwrap() {
            Submission::Navigated(payload) => {
                assert_eq!(payload, FormPayload::new().text("text", "hello"))
            }
            Submission::Intercepted(_) => panic!("no listener was registered"),
        }
    }

    #[test]
    #[should_panic(expected = "Tokio 1.x runtime")]
    fn ready_page_submit_needs_runtime() {
        let page = PageBuilder::standard(FormElement::new(), Arc::new(InMemoryAudioElement::new()))
            .build();
        page.ready(transport()).unwrap();
        let _ = page.submit();
    }

    #[tokio::test]
    async fn registered_form_is_intercepted() {
        let audio = Arc::new(InMemoryAudioElement::new());
        let mut page =
            PageBuilder::standard(FormElement::new().with_text("text", "hello"), audio.clone())
                .build();
        page.ready(transport()).unwrap();
        page.form_mut().unwrap().set_text("text", "changed");

        let outcome = match page.submit().unwrap() {
            Submission::Intercepted(handle) => handle.await.unwrap(),
            Submission::Navigated(_) => panic!("submission was not intercepted"),
        };
        assert_eq!(
            outcome,
            SubmissionOutcome::Played {
                url: "/audio/1.wav".into()
            }
        );
        assert_eq!(audio.source().await.as_deref(), Some("/audio/1.wav"));
    }

    #[test]
    fn set_text_replaces_first_control() {
        let mut form = FormElement::new()
            .with_text("text", "a")
            .with_text("text", "b");
        form.set_text("text", "c");
        form.set_text("speed", "1.5");
        let names_values: Vec<_> = form
            .payload()
            .fields()
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect();
        assert_eq!(
            names_values,
            vec![
                ("text".to_string(), FormValue::Text("c".into())),
                ("text".to_string(), FormValue::Text("b".into())),
                ("speed".to_string(), FormValue::Text("1.5".into())),
            ]
        );
    }
}
