use std::io::Cursor;

use bytes::Bytes;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use trim_transport::{AudioBuffer, MediaAsset, wire};

fn open_format(bytes: &Bytes, content_type: &str) -> anyhow::Result<Box<dyn FormatReader>> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.clone())), Default::default());

    let mut hint = Hint::new();
    hint.mime_type(&wire::essence(content_type));
    hint.with_extension(wire::extension_for(content_type));

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    Ok(probed.format)
}

/// Decode an in-memory asset into interleaved f32 samples.
pub fn decode_asset(asset: &MediaAsset) -> anyhow::Result<AudioBuffer> {
    decode_bytes(asset.bytes(), asset.content_type())
}

pub fn decode_bytes(bytes: &Bytes, content_type: &str) -> anyhow::Result<AudioBuffer> {
    let mut format = open_format(bytes, content_type)?;

    let track = format
        .default_track()
        .ok_or_else(|| anyhow::anyhow!("no default track"))?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2) as u16;
    let track_id = track.id;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt frame in the middle of a stream is skipped, not fatal.
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };
        let spec = *decoded.spec();
        let duration = decoded.capacity() as u64;

        let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    Ok(AudioBuffer {
        samples,
        sample_rate,
        channels,
    })
}

/// Duration of an asset in seconds.
///
/// Uses the container's frame count when it declares one and falls back to a
/// full decode otherwise (e.g. MP3 without a Xing/Info header).
pub fn probe_duration(bytes: &Bytes, content_type: &str) -> anyhow::Result<f64> {
    let format = open_format(bytes, content_type)?;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow::anyhow!("no default track"))?;

    if let (Some(n_frames), Some(sample_rate)) =
        (track.codec_params.n_frames, track.codec_params.sample_rate)
    {
        if sample_rate > 0 {
            return Ok(n_frames as f64 / sample_rate as f64);
        }
    }

    Ok(decode_bytes(bytes, content_type)?.duration_secs())
}
