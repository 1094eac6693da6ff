//! pronounce-cli: submit text to a pronounce server and play or save the audio it returns
//!
//! Usage:
//!   pronounce-cli say --text <text> [OPTIONS]     Submit a form and save the returned audio
//!   pronounce-cli say --text <text> --play        Play it on the sound device (`playback` feature)
//!   pronounce-cli endpoint                        Show the resolved endpoint URL

use anyhow::{anyhow, bail, Context};
use pronounce_client::page::{PageBuilder, Submission};
#[cfg(feature = "playback")]
use pronounce_client::DeviceAudioElement;
use pronounce_client::{
    AudioElement, ClientConfig, FileAudioElement, FormElement, HttpTransport, SubmissionOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "say" => cmd_say(&args[2..]).await,
        "endpoint" => cmd_endpoint(&args[2..]),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"pronounce-cli: submit text for pronunciation and save the audio

USAGE:
    pronounce-cli <COMMAND> [OPTIONS]

COMMANDS:
    say                         Submit the form and play or save the returned audio
    endpoint                    Print the endpoint submissions are posted to
    version                     Show version information
    help                        Show this help message

SAY OPTIONS:
    --text <text>               Text to pronounce (repeat to submit several at once)
    --speed <n>                 Playback speed field sent with each submission
    --field <name=value>        Extra text field (repeatable)
    --file <name=path>          File field (repeatable)
    --out <path>                Where the audio is written (default: pronounce-output.audio)
    --play                      Play on the default sound device instead of writing --out;
                                falls back to --out when there is no device
                                (needs a build with --features playback)
    --base-url <url>            Server base URL

ENVIRONMENT:
    PRONOUNCE_BASE_URL          Server base URL (default http://127.0.0.1:5000)
    PRONOUNCE_PROXY_URL         Proxy for all requests
    RUST_LOG                    Log filter (default info)"#
    );
}

fn cmd_version() {
    println!("pronounce-cli {}", env!("CARGO_PKG_VERSION"));
}

#[derive(Debug, Default)]
struct SayArgs {
    texts: Vec<String>,
    speed: Option<String>,
    fields: Vec<(String, String)>,
    files: Vec<(String, PathBuf)>,
    out: Option<PathBuf>,
    play: bool,
    base_url: Option<String>,
}

fn parse_say(args: &[String]) -> anyhow::Result<SayArgs> {
    let mut parsed = SayArgs::default();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{flag} requires a value"))
        };
        match flag.as_str() {
            "--text" => parsed.texts.push(value()?),
            "--speed" => parsed.speed = Some(value()?),
            "--field" => parsed.fields.push(split_pair(&value()?)?),
            "--file" => {
                let (name, path) = split_pair(&value()?)?;
                parsed.files.push((name, PathBuf::from(path)));
            }
            "--out" => parsed.out = Some(PathBuf::from(value()?)),
            "--base-url" => parsed.base_url = Some(value()?),
            "--play" => parsed.play = true,
            other => bail!("unknown option: {other}"),
        }
    }
    if parsed.texts.is_empty() {
        bail!("say needs at least one --text");
    }
    Ok(parsed)
}

fn split_pair(s: &str) -> anyhow::Result<(String, String)> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| anyhow!("expected name=value, got {s:?}"))
}

fn config_for(base_url: Option<&String>) -> ClientConfig {
    let config = ClientConfig::from_env();
    match base_url {
        Some(url) => config.with_base_url(url.clone()),
        None => config,
    }
}

fn cmd_endpoint(args: &[String]) -> anyhow::Result<()> {
    let base_url = match args {
        [flag, url] if flag == "--base-url" => Some(url),
        [] => None,
        _ => bail!("usage: pronounce-cli endpoint [--base-url <url>]"),
    };
    let config = config_for(base_url);
    println!("{}", config.endpoint()?);
    Ok(())
}

/// Where played audio ends up.
enum Player {
    File(PathBuf),
    #[cfg(feature = "playback")]
    Device(Arc<DeviceAudioElement>),
}

impl Player {
    /// Block until the sound device has finished; a file is done once written.
    async fn finish(&self, played: usize) -> anyhow::Result<()> {
        match self {
            Player::File(out) => {
                if played > 0 {
                    println!("audio saved to {}", out.display());
                }
            }
            #[cfg(feature = "playback")]
            Player::Device(device) => device.wait_until_end().await?,
        }
        Ok(())
    }
}

fn file_player(transport: &HttpTransport, out: PathBuf) -> (Arc<dyn AudioElement>, Player) {
    let element: Arc<dyn AudioElement> =
        Arc::new(FileAudioElement::new(transport.clone(), out.clone()));
    (element, Player::File(out))
}

#[cfg(feature = "playback")]
fn select_player(
    play: bool,
    transport: &HttpTransport,
    out: PathBuf,
) -> anyhow::Result<(Arc<dyn AudioElement>, Player)> {
    if !play {
        return Ok(file_player(transport, out));
    }
    match DeviceAudioElement::new(transport.clone()) {
        Ok(device) => {
            let device = Arc::new(device);
            let element: Arc<dyn AudioElement> = device.clone();
            Ok((element, Player::Device(device)))
        }
        Err(e) => {
            tracing::warn!(error = %e, out = %out.display(), "no sound device, writing audio to file");
            Ok(file_player(transport, out))
        }
    }
}

#[cfg(not(feature = "playback"))]
fn select_player(
    play: bool,
    transport: &HttpTransport,
    out: PathBuf,
) -> anyhow::Result<(Arc<dyn AudioElement>, Player)> {
    if play {
        bail!("--play needs pronounce-cli built with --features playback");
    }
    Ok(file_player(transport, out))
}

async fn cmd_say(args: &[String]) -> anyhow::Result<()> {
    let say = parse_say(args)?;
    let config = config_for(say.base_url.as_ref());
    let transport = HttpTransport::new(&config)?;
    let out = say
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from("pronounce-output.audio"));
    let (audio, player) = select_player(say.play, &transport, out)?;

    let mut form = FormElement::new().with_text("text", "");
    if let Some(speed) = &say.speed {
        form.set_text("speed", speed.clone());
    }
    for (name, value) in &say.fields {
        form.append_text(name.clone(), value.clone());
    }
    for (name, path) in &say.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        form.set_file(name, file_name, None, bytes);
    }

    let mut page = PageBuilder::standard(form, audio).build();
    page.ready(Arc::new(transport))?;

    // Every text is its own submission, all in flight together.
    let mut handles = Vec::new();
    for text in &say.texts {
        page.form_mut()?.set_text("text", text.clone());
        match page.submit()? {
            Submission::Intercepted(handle) => handles.push(handle),
            Submission::Navigated(_) => bail!("submission was not intercepted"),
        }
    }

    let mut played = 0usize;
    for joined in futures::future::join_all(handles).await {
        match joined.context("submission task panicked")? {
            SubmissionOutcome::Played { url } => {
                played += 1;
                println!("played {url}");
            }
            SubmissionOutcome::NoAudio => println!("no audio returned"),
            SubmissionOutcome::Failed { error } => println!("failed: {error}"),
        }
    }

    player.finish(played).await
}
