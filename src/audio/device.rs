use super::media::MediaSlot;
use super::AudioElement;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use bytes::Bytes;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

enum Command {
    Play(Bytes, oneshot::Sender<Result<()>>),
    WaitUntilEnd(oneshot::Sender<()>),
}

/// Player on the default sound device.
///
/// The output stream is not `Send`, so it lives on a dedicated thread that
/// owns the current [`Sink`]. Each `play` stops whatever was playing and
/// starts the newly loaded media.
pub struct DeviceAudioElement {
    transport: HttpTransport,
    media: MediaSlot,
    commands: mpsc::UnboundedSender<Command>,
}

impl DeviceAudioElement {
    /// Open the default output device. Fails with a configuration error
    /// when there is none.
    pub fn new(transport: HttpTransport) -> Result<Self> {
        let (commands, mut rx) = mpsc::unbounded_channel::<Command>();
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<std::result::Result<(), String>>(1);

        std::thread::Builder::new()
            .name("pronounce-audio".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => {
                        let _ = ready_tx.send(Ok(()));
                        pair
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let mut current: Option<Sink> = None;
                while let Some(command) = rx.blocking_recv() {
                    match command {
                        Command::Play(bytes, reply) => {
                            if let Some(sink) = current.take() {
                                sink.stop();
                            }
                            let started = start(&handle, bytes).map(|sink| {
                                current = Some(sink);
                            });
                            let _ = reply.send(started);
                        }
                        Command::WaitUntilEnd(reply) => {
                            if let Some(sink) = &current {
                                sink.sleep_until_end();
                            }
                            let _ = reply.send(());
                        }
                    }
                }
                debug!("audio thread exiting");
            })?;

        let ready = ready_rx.recv().map_err(|_| {
            Error::runtime_with_context(
                "audio thread exited during startup",
                ErrorContext::new().with_source("audio"),
            )
        })?;
        ready.map_err(|e| {
            Error::configuration_with_context(
                "No audio output device",
                ErrorContext::new().with_details(e).with_source("audio"),
            )
        })?;

        Ok(Self {
            transport,
            media: MediaSlot::default(),
            commands,
        })
    }

    /// Block (asynchronously) until the current media finishes.
    pub async fn wait_until_end(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.commands
            .send(Command::WaitUntilEnd(reply))
            .map_err(|_| thread_gone())?;
        done.await.map_err(|_| thread_gone())
    }
}

fn start(handle: &OutputStreamHandle, bytes: Bytes) -> Result<Sink> {
    let sink = Sink::try_new(handle).map_err(|e| {
        Error::runtime_with_context(
            format!("Failed to create audio sink: {}", e),
            ErrorContext::new().with_source("audio"),
        )
    })?;
    let source = Decoder::new(Cursor::new(bytes)).map_err(|e| {
        Error::runtime_with_context(
            format!("Failed to decode audio: {}", e),
            ErrorContext::new().with_source("audio"),
        )
    })?;
    sink.append(source);
    sink.play();
    Ok(sink)
}

fn thread_gone() -> Error {
    Error::runtime_with_context(
        "audio thread is not running",
        ErrorContext::new().with_source("audio"),
    )
}

#[async_trait]
impl AudioElement for DeviceAudioElement {
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
        let len = bytes.len();
        let (reply, started) = oneshot::channel();
        self.commands
            .send(Command::Play(bytes, reply))
            .map_err(|_| thread_gone())?;
        started.await.map_err(|_| thread_gone())??;
        info!(source = %source, bytes = len, "audio playing");
        Ok(())
    }
}
