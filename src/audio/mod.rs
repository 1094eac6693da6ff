//! Audio element: the media player a successful submission drives.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`AudioElement`] | Trait for anything with a source URL that can load and play |
//! | [`InMemoryAudioElement`] | Records every call, used by tests and headless hosts |
//! | [`FileAudioElement`] | Downloads the source and writes it to a file on play |
//! | `DeviceAudioElement` | Plays on the default sound device (`playback` feature) |

#[cfg(feature = "playback")]
mod device;
mod file;
mod media;

#[cfg(feature = "playback")]
pub use device::DeviceAudioElement;
pub use file::FileAudioElement;

use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// A player element with a single source.
///
/// Implementations own their state behind interior mutability so one
/// element can be shared by every in-flight submission.
#[async_trait]
pub trait AudioElement: Send + Sync {
    /// Point the element at a new URL. Does not load it.
    async fn set_source(&self, url: &str);

    async fn source(&self) -> Option<String>;

    /// (Re)load media from the current source.
    async fn load(&self) -> Result<()>;

    /// Start playback of the loaded media.
    async fn play(&self) -> Result<()>;
}

/// One call made on an [`InMemoryAudioElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    SetSource(String),
    Load,
    Play,
}

#[derive(Debug, Default)]
struct Recorded {
    source: Option<String>,
    events: Vec<AudioEvent>,
}

/// In-memory element for testing.
#[derive(Debug, Default)]
pub struct InMemoryAudioElement {
    state: Mutex<Recorded>,
    fail_load: bool,
}

impl InMemoryAudioElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element whose `load` always fails, as when the media URL is unreachable.
    pub fn failing_load() -> Self {
        Self {
            state: Mutex::default(),
            fail_load: true,
        }
    }

    pub async fn events(&self) -> Vec<AudioEvent> {
        self.state.lock().await.events.clone()
    }

    pub async fn play_count(&self) -> usize {
        self.state
            .lock()
            .await
            .events
            .iter()
            .filter(|e| **e == AudioEvent::Play)
            .count()
    }

    pub async fn is_untouched(&self) -> bool {
        self.state.lock().await.events.is_empty()
    }
}

#[async_trait]
impl AudioElement for InMemoryAudioElement {
    async fn set_source(&self, url: &str) {
        let mut st = self.state.lock().await;
        st.source = Some(url.to_string());
        st.events.push(AudioEvent::SetSource(url.to_string()));
    }

    async fn source(&self) -> Option<String> {
        self.state.lock().await.source.clone()
    }

    async fn load(&self) -> Result<()> {
        let mut st = self.state.lock().await;
        st.events.push(AudioEvent::Load);
        if self.fail_load {
            return Err(Error::runtime_with_context(
                "media could not be loaded",
                ErrorContext::new()
                    .with_details(st.source.clone().unwrap_or_default())
                    .with_source("audio"),
            ));
        }
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        self.state.lock().await.events.push(AudioEvent::Play);
        Ok(())
    }
}
