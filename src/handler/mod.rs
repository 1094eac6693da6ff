//! Form submission handler.
//!
//! One submission is one chain: post the form, decode the reply, then run a
//! continuation against the audio element. The chain is split so that the
//! decision (`Continuation::from_result`) is a pure function and only
//! [`FormSubmissionHandler::apply`] touches the element.
//!
//! Nothing here serializes submissions. Two overlapping submissions both
//! run to completion and whichever response resolves last leaves its URL
//! on the audio element.

use crate::audio::AudioElement;
use crate::form::FormPayload;
use crate::response::PronounceResponse;
use crate::transport::SubmitTransport;
use crate::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// A form submission as the page dispatches it.
#[derive(Debug, Clone)]
pub struct SubmitEvent {
    payload: FormPayload,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(payload: FormPayload) -> Self {
        Self {
            payload,
            default_prevented: false,
        }
    }

    /// Suppress the navigation-based submission the page would otherwise perform.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn payload(&self) -> &FormPayload {
        &self.payload
    }
}

/// What to do with the audio element once a response (or failure) is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Point the element at `url`, reload and play.
    Play { url: String },
    /// Leave the element alone. `server_error` is only ever logged.
    Idle { server_error: Option<String> },
    /// The chain failed; log `error` and leave the element alone.
    Report { error: String },
}

impl Continuation {
    pub fn from_result(result: &Result<PronounceResponse>) -> Self {
        match result {
            Ok(response) => match response.audio_url() {
                Some(url) => Continuation::Play {
                    url: url.into_owned(),
                },
                None => Continuation::Idle {
                    server_error: response.error_message().map(str::to_string),
                },
            },
            Err(e) => Continuation::Report {
                error: e.to_string(),
            },
        }
    }
}

/// How a submission ended. Never shown to the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// `url` is the source the element held when playback started, which
    /// is not this submission's URL if an overlapping one replaced it.
    Played { url: String },
    NoAudio,
    Failed { error: String },
}

/// Submit listener bound to one transport and one audio element.
pub struct FormSubmissionHandler {
    transport: Arc<dyn SubmitTransport>,
    audio: Arc<dyn AudioElement>,
}

impl std::fmt::Debug for FormSubmissionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSubmissionHandler").finish_non_exhaustive()
    }
}

impl FormSubmissionHandler {
    pub fn new(transport: Arc<dyn SubmitTransport>, audio: Arc<dyn AudioElement>) -> Self {
        Self { transport, audio }
    }

    pub fn audio(&self) -> &Arc<dyn AudioElement> {
        &self.audio
    }

    /// Intercept a submission: prevent the default navigation, snapshot the
    /// payload and run the chain on a spawned task.
    ///
    /// Returns immediately. Must be called from within a Tokio runtime.
    pub fn on_submit(self: &Arc<Self>, event: &mut SubmitEvent) -> JoinHandle<SubmissionOutcome> {
        event.prevent_default();
        let payload = event.payload().clone();
        let handler = Arc::clone(self);
        tokio::spawn(async move { handler.submit(payload).await })
    }

    /// Run one full submission chain. Failures are logged and folded into
    /// the outcome; nothing propagates to the caller.
    pub async fn submit(&self, payload: FormPayload) -> SubmissionOutcome {
        let span = tracing::info_span!("submission", id = %Uuid::new_v4());
        async move {
            let result = self.request(payload).await;
            let continuation = Continuation::from_result(&result);
            self.apply(continuation).await
        }
        .instrument(span)
        .await
    }

    /// Post the payload and decode the reply.
    pub async fn request(&self, payload: FormPayload) -> Result<PronounceResponse> {
        debug!(fields = payload.len(), "submitting form");
        let raw = self.transport.submit(payload).await?;
        PronounceResponse::decode(&raw)
    }

    /// Carry out a continuation against the audio element.
    pub async fn apply(&self, continuation: Continuation) -> SubmissionOutcome {
        match continuation {
            Continuation::Play { url } => match self.play(&url).await {
                Ok(playing) => {
                    if playing == url {
                        info!(url = %url, "playback started");
                    } else {
                        warn!(url = %url, playing = %playing, "source replaced before playback");
                    }
                    SubmissionOutcome::Played { url: playing }
                }
                Err(e) => {
                    error!(url = %url, error = %e, "audio playback failed");
                    SubmissionOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            },
            Continuation::Idle { server_error } => {
                match server_error {
                    Some(message) => warn!(server_error = %message, "server returned no audio"),
                    None => debug!("response has no audio_url"),
                }
                SubmissionOutcome::NoAudio
            }
            Continuation::Report { error } => {
                error!(error = %error, "submission failed");
                SubmissionOutcome::Failed { error }
            }
        }
    }

    /// Set, load and play. Returns the source the element actually held
    /// once playback started.
    async fn play(&self, url: &str) -> Result<String> {
        self.audio.set_source(url).await;
        self.audio.load().await?;
        self.audio.play().await?;
        Ok(self.audio.source().await.unwrap_or_else(|| url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioEvent, InMemoryAudioElement};
    use crate::transport::RawResponse;
    use crate::Error;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    /// Replies with a fixed response and records every payload it saw.
    struct StaticTransport {
        reply: std::result::Result<RawResponse, String>,
        seen: Mutex<Vec<FormPayload>>,
    }

    impl StaticTransport {
        fn ok(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(RawResponse::new(status, body.to_string())),
                seen: Mutex::default(),
            })
        }

        fn failing(msg: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(msg.to_string()),
                seen: Mutex::default(),
            })
        }
    }

    #[async_trait]
    impl SubmitTransport for StaticTransport {
        async fn submit(&self, payload: FormPayload) -> Result<RawResponse> {
            self.seen.lock().await.push(payload);
            match &self.reply {
                Ok(r) => Ok(r.clone()),
                Err(msg) => Err(Error::Transport(
                    crate::transport::TransportError::Other(msg.clone()),
                )),
            }
        }
    }

    fn handler(
        transport: Arc<StaticTransport>,
    ) -> (Arc<FormSubmissionHandler>, Arc<InMemoryAudioElement>) {
        let audio = Arc::new(InMemoryAudioElement::new());
        let h = Arc::new(FormSubmissionHandler::new(transport, audio.clone()));
        (h, audio)
    }

    #[test]
    fn continuation_from_result() {
        let ok = Ok(PronounceResponse::from_value(200, json!({"audio_url": "/a.mp3"})));
        assert_eq!(
            Continuation::from_result(&ok),
            Continuation::Play {
                url: "/a.mp3".into()
            }
        );

        let empty = Ok(PronounceResponse::from_value(200, json!({})));
        assert_eq!(
            Continuation::from_result(&empty),
            Continuation::Idle { server_error: None }
        );

        let server = Ok(PronounceResponse::from_value(
            400,
            json!({"error": "No text provided"}),
        ));
        assert_eq!(
            Continuation::from_result(&server),
            Continuation::Idle {
                server_error: Some("No text provided".into())
            }
        );

        let failed: Result<PronounceResponse> = Err(Error::decode(500, "bad json"));
        assert!(matches!(
            Continuation::from_result(&failed),
            Continuation::Report { .. }
        ));
    }

    #[tokio::test]
    async fn on_submit_prevents_default_and_plays() {
        let transport = StaticTransport::ok(200, r#"{"audio_url": "/audio/123.mp3"}"#);
        let (h, audio) = handler(transport.clone());

        let mut event = SubmitEvent::new(FormPayload::new().text("text", "hello"));
        let task = h.on_submit(&mut event);
        assert!(event.default_prevented());

        let outcome = task.await.unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::Played {
                url: "/audio/123.mp3".into()
            }
        );
        assert_eq!(audio.source().await.as_deref(), Some("/audio/123.mp3"));
        assert_eq!(audio.play_count().await, 1);

        let seen = transport.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], FormPayload::new().text("text", "hello"));
    }

    #[tokio::test]
    async fn empty_response_leaves_audio_untouched() {
        let (h, audio) = handler(StaticTransport::ok(200, "{}"));
        let outcome = h.submit(FormPayload::new().text("text", "hello")).await;
        assert_eq!(outcome, SubmissionOutcome::NoAudio);
        assert!(audio.is_untouched().await);
    }

    #[tokio::test]
    async fn invalid_json_is_reported_not_played() {
        let (h, audio) = handler(StaticTransport::ok(500, "Internal Server Error"));
        let outcome = h.submit(FormPayload::new()).await;
        assert!(matches!(outcome, SubmissionOutcome::Failed { .. }));
        assert!(audio.is_untouched().await);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_not_played() {
        let (h, audio) = handler(StaticTransport::failing("connection refused"));
        let outcome = h.submit(FormPayload::new().text("text", "hi")).await;
        match outcome {
            SubmissionOutcome::Failed { error } => assert!(error.contains("connection refused")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(audio.is_untouched().await);
    }

    #[tokio::test]
    async fn load_failure_stops_before_play() {
        let transport = StaticTransport::ok(200, r#"{"audio_url": "/gone.wav"}"#);
        let audio = Arc::new(InMemoryAudioElement::failing_load());
        let h = FormSubmissionHandler::new(transport, audio.clone());

        let outcome = h.submit(FormPayload::new()).await;
        assert!(matches!(outcome, SubmissionOutcome::Failed { .. }));
        assert_eq!(
            audio.events().await,
            vec![AudioEvent::SetSource("/gone.wav".into()), AudioEvent::Load]
        );
    }

    /// Element whose source is replaced by another submission mid-load.
    struct ReplacedDuringLoad {
        inner: InMemoryAudioElement,
        replacement: &'static str,
    }

    #[async_trait]
    impl AudioElement for ReplacedDuringLoad {
        async fn set_source(&self, url: &str) {
            self.inner.set_source(url).await;
        }

        async fn source(&self) -> Option<String> {
            self.inner.source().await
        }

        async fn load(&self) -> Result<()> {
            self.inner.set_source(self.replacement).await;
            self.inner.load().await
        }

        async fn play(&self) -> Result<()> {
            self.inner.play().await
        }
    }

    #[tokio::test]
    async fn played_outcome_names_the_source_actually_playing() {
        let transport = StaticTransport::ok(200, r#"{"audio_url": "/mine.wav"}"#);
        let audio = Arc::new(ReplacedDuringLoad {
            inner: InMemoryAudioElement::new(),
            replacement: "/theirs.wav",
        });
        let h = FormSubmissionHandler::new(transport, audio);

        let outcome = h.submit(FormPayload::new().text("text", "mine")).await;
        assert_eq!(
            outcome,
            SubmissionOutcome::Played {
                url: "/theirs.wav".into()
            }
        );
    }

    #[tokio::test]
    async fn numeric_audio_url_is_played_as_string() {
        let (h, audio) = handler(StaticTransport::ok(200, r#"{"audio_url": 7}"#));
        let outcome = h.submit(FormPayload::new()).await;
        assert_eq!(outcome, SubmissionOutcome::Played { url: "7".into() });
        assert_eq!(audio.source().await.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn handler_survives_failures() {
        let (h, audio) = handler(StaticTransport::failing("down"));
        for _ in 0..3 {
            let mut event = SubmitEvent::new(FormPayload::new());
            let outcome = h.on_submit(&mut event).await.unwrap();
            assert!(matches!(outcome, SubmissionOutcome::Failed { .. }));
        }
        assert!(audio.is_untouched().await);
    }
}
