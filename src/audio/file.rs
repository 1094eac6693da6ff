use super::media::MediaSlot;
use super::AudioElement;
use crate::transport::HttpTransport;
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Player for hosts without a sound device.
///
/// `load` downloads the current source through the shared transport and
/// `play` writes the loaded bytes to `output`. Changing the source drops
/// whatever was loaded before.
pub struct FileAudioElement {
    transport: HttpTransport,
    output: PathBuf,
    media: MediaSlot,
}

impl FileAudioElement {
    pub fn new(transport: HttpTransport, output: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            output: output.into(),
            media: MediaSlot::default(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

#[async_trait]
impl AudioElement for FileAudioElement {
    async fn set_source(&self, url: &str) {
        self.media.set_source(url).await;
    }

    async fn source(&self) -> Option<String> {
        self.media.source().await
    }

    async fn load(&self) -> Result<()> {
        self.media.load(&self.transport).await
    }

    async fn play(&self) -> Result<()> {
        let (source, bytes) = self.media.playable().await?;
        tokio::fs::write(&self.output, &bytes).await?;
        info!(
            source = %source,
            output = %self.output.display(),
            bytes = bytes.len(),
            "audio written"
        );
        Ok(())
    }
}
