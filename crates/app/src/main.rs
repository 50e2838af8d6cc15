//! `trim-preview <input> <start> <end> <out.wav> [--export <server-url>]`
//!
//! Plays a region of an audio file through the playback controller, offline,
//! and writes what would have been heard to a WAV file. With `--export`, the
//! committed region is also sent to a trim server and its output is written
//! next to the preview.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trim_core::{Event, EventQueue, Session, format_duration};
use trim_transport::{MediaAsset, wire};

mod export;

const BLOCK_FRAMES: usize = 512;

#[derive(Debug, PartialEq)]
struct Args {
    input: PathBuf,
    start: f64,
    end: f64,
    output: PathBuf,
    export: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut args: Vec<String> = args.into_iter().collect();
    let export = match args.iter().position(|a| a == "--export") {
        Some(i) if i + 1 < args.len() => {
            let url = args.remove(i + 1);
            args.remove(i);
            Some(url)
        }
        Some(_) => bail!("--export needs a server url"),
        None => None,
    };
    let [input, start, end, output] = args.as_slice() else {
        bail!("usage: trim-preview <input> <start> <end> <out.wav> [--export <server-url>]");
    };

    Ok(Args {
        input: PathBuf::from(input),
        start: start
            .parse()
            .with_context(|| format!("invalid start time {start:?}"))?,
        end: end
            .parse()
            .with_context(|| format!("invalid end time {end:?}"))?,
        output: PathBuf::from(output),
        export,
    })
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "mp3" => wire::MIME_MPEG,
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trim_app=info,trim_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let asset = MediaAsset::new(bytes, content_type_for(&args.input));
    let audio = trim_decode::decode_asset(&asset)
        .with_context(|| format!("cannot decode {}", args.input.display()))?;
    let channels = audio.channels;
    tracing::info!(
        frames = audio.frames(),
        sample_rate = audio.sample_rate,
        channels,
        "decoded"
    );

    let (handle, mut renderer) = trim_engine::start(audio);
    let mut session = Session::new();
    session.load(asset, handle);
    session.poll();

    let mut queue = EventQueue::new();
    queue.push(Event::SetRegionStart(args.start));
    queue.push(Event::SetRegionEnd(args.end));
    if queue.run(&mut session) > 0 {
        bail!(
            "region {}..{} does not fit the clip ({} s)",
            args.start,
            args.end,
            session.duration().unwrap_or(0.0)
        );
    }

    let (start_time, end_time) = session.export_request()?.form_values();

    let preview = trim_render::render_region(&mut session, &mut renderer, BLOCK_FRAMES, channels)?;
    trim_render::write_wav(&preview, &args.output)
        .with_context(|| format!("cannot write {}", args.output.display()))?;

    let snapshot = session.snapshot();
    println!(
        "{} of {} written to {} (startTime={start_time} endTime={end_time})",
        format_duration(snapshot.region.length()),
        snapshot.duration_label,
        args.output.display()
    );

    let Some(url) = &args.export else {
        return Ok(());
    };
    let client = export::TrimClient::new(url)?;
    export::export_region(&mut session, &client).await?;

    if let Some(trimmed) = session.trimmed() {
        let path = export::trimmed_path(&args.output, trimmed.content_type());
        std::fs::write(&path, trimmed.bytes())
            .with_context(|| format!("cannot write {}", path.display()))?;
        let source_len = session.asset().map_or(0, MediaAsset::len);
        println!(
            "server trimmed {source_len} bytes to {} ({}) in {}",
            trimmed.len(),
            trimmed.duration().map_or_else(|| "unknown length".to_string(), format_duration),
            path.display()
        );
    }

    Ok(())
}
