use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Slot {
    source: Option<String>,
    /// URL the bytes were fetched from, with the bytes.
    loaded: Option<(String, Bytes)>,
}

/// Source URL plus whatever was last loaded for it.
///
/// Loaded bytes only count while they belong to the current source, so a
/// `set_source` from an overlapping submission invalidates an earlier load.
#[derive(Debug, Default)]
pub(crate) struct MediaSlot {
    slot: Mutex<Slot>,
}

impl MediaSlot {
    pub(crate) async fn set_source(&self, url: &str) {
        let mut slot = self.slot.lock().await;
        slot.source = Some(url.to_string());
        slot.loaded = None;
    }

    pub(crate) async fn source(&self) -> Option<String> {
        self.slot.lock().await.source.clone()
    }

    /// Fetch the current source. A result for a source that was replaced
    /// while fetching is dropped.
    pub(crate) async fn load(&self, transport: &HttpTransport) -> Result<()> {
        let source = self.source().await.ok_or_else(|| {
            Error::runtime_with_context(
                "no source to load",
                ErrorContext::new().with_source("audio"),
            )
        })?;
        let bytes = transport.fetch(&source).await?;
        self.store(source, bytes).await;
        Ok(())
    }

    pub(crate) async fn store(&self, source: String, bytes: Bytes) {
        let mut slot = self.slot.lock().await;
        if slot.source.as_deref() == Some(source.as_str()) {
            slot.loaded = Some((source, bytes));
        }
    }

    /// Bytes loaded for the current source, with that source.
    pub(crate) async fn playable(&self) -> Result<(String, Bytes)> {
        let slot = self.slot.lock().await;
        match (&slot.source, &slot.loaded) {
            (Some(source), Some((loaded_from, bytes))) if loaded_from == source => {
                Ok((source.clone(), bytes.clone()))
            }
            (source, _) => Err(Error::runtime_with_context(
                "play called before media was loaded",
                ErrorContext::new()
                    .with_details(source.clone().unwrap_or_default())
                    .with_source("audio"),
            )),
        }
    }
}
