use std::path::Path;

use trim_core::{Rejected, Session};
use trim_engine::{EngineHandle, Renderer};
use trim_transport::AudioBuffer;

/// Upper bound on blocks rendered for one preview, so a renderer that never
/// reports progress cannot spin forever.
const MAX_BLOCKS: usize = 1 << 22;

/// Play the session's committed region through `renderer` and collect the output.
///
/// Blocks are collected until the controller pauses at the region end, so the
/// result can overshoot the region end by at most one block.
pub fn render_region(
    session: &mut Session<EngineHandle>,
    renderer: &mut Renderer,
    block_frames: usize,
    channels: u16,
) -> anyhow::Result<AudioBuffer> {
    let output_channels = channels.max(1) as usize;
    let block_len = block_frames.max(1) * output_channels;

    session.poll();
    session.play().map_err(|e: Rejected| anyhow::anyhow!("cannot start preview: {e}"))?;

    let mut samples = Vec::new();
    let mut block = vec![0.0f32; block_len];

    for _ in 0..MAX_BLOCKS {
        renderer.process(&mut block, output_channels);
        samples.extend_from_slice(&block);
        session.poll();

        if !session.is_playing() {
            return Ok(AudioBuffer {
                samples,
                sample_rate: renderer.sample_rate(),
                channels: channels.max(1),
            });
        }
    }

    anyhow::bail!("preview did not reach the region end")
}

pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;

    for &sample in &buffer.samples {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}
