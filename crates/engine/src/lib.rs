use trim_transport::{AudioBuffer, Command, Status};

const COMMAND_CAPACITY: usize = 64;
const STATUS_CAPACITY: usize = 64;

/// The decoding/playback primitive a controller drives.
///
/// Commands take effect asynchronously; what actually happened is reported
/// back through [`Player::poll_status`], in order.
pub trait Player {
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_volume(&mut self, volume: f32);

    /// Last position reported by the engine, in seconds.
    fn position(&self) -> f64;
    /// Duration once metadata has been reported.
    fn duration(&self) -> Option<f64>;

    fn poll_status(&mut self) -> Option<Status>;
}

/// Control side of the engine. Owned by the controller.
pub struct EngineHandle {
    commands: rtrb::Producer<Command>,
    status: rtrb::Consumer<Status>,
    position: f64,
    duration: Option<f64>,
}

impl EngineHandle {
    fn send(&mut self, command: Command) {
        // A full queue means the renderer has stalled; dropping is preferable to blocking.
        let _ = self.commands.push(command);
    }
}

impl Player for EngineHandle {
    fn play(&mut self) {
        self.send(Command::Play);
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.send(Command::Seek { seconds });
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(Command::SetVolume(volume));
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn poll_status(&mut self) -> Option<Status> {
        let status = self.status.pop().ok()?;
        match status {
            Status::MetadataReady(duration) => self.duration = Some(duration),
            Status::Progress(position) => self.position = position,
            Status::Ended => {}
        }
        Some(status)
    }
}

/// Output side of the engine: produces blocks of samples on demand.
///
/// Whatever owns the output (a device callback, an offline renderer) calls
/// [`Renderer::process`] once per block. It never blocks or allocates.
pub struct Renderer {
    audio: AudioBuffer,
    commands: rtrb::Consumer<Command>,
    status: rtrb::Producer<Status>,
    playing: bool,
    position: f64, // (fractional) frames
    volume: f32,
}

/// Start an engine for a decoded buffer.
///
/// `MetadataReady` is queued immediately, so the first poll of the handle
/// learns the duration.
pub fn start(audio: AudioBuffer) -> (EngineHandle, Renderer) {
    let (command_tx, command_rx) = rtrb::RingBuffer::<Command>::new(COMMAND_CAPACITY);
    let (mut status_tx, status_rx) = rtrb::RingBuffer::<Status>::new(STATUS_CAPACITY);

    let _ = status_tx.push(Status::MetadataReady(audio.duration_secs()));

    let handle = EngineHandle {
        commands: command_tx,
        status: status_rx,
        position: 0.0,
        duration: None,
    };

    let renderer = Renderer {
        audio,
        commands: command_rx,
        status: status_tx,
        playing: false,
        position: 0.0,
        volume: 1.0,
    };

    (handle, renderer)
}

impl Renderer {
    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current position in seconds.
    pub fn position_secs(&self) -> f64 {
        if self.audio.sample_rate == 0 {
            return 0.0;
        }
        self.position / self.audio.sample_rate as f64
    }

    fn apply_commands(&mut self) {
        while let Ok(cmd) = self.commands.pop() {
            match cmd {
                Command::Play => self.playing = true,
                Command::Pause => self.playing = false,
                Command::Seek { seconds } => {
                    let frames = seconds.max(0.0) * self.audio.sample_rate as f64;
                    self.position = frames.min(self.audio.frames() as f64);
                }
                Command::SetVolume(volume) => self.volume = volume.clamp(0.0, 1.0),
            }
        }
    }

    /// Fill `out` with one block of interleaved samples for `output_channels` channels.
    pub fn process(&mut self, out: &mut [f32], output_channels: usize) {
        self.apply_commands();

        let output_channels = output_channels.max(1);
        let audio_channels = self.audio.channels.max(1) as usize;
        let total_frames = self.audio.frames();
        let was_playing = self.playing;

        for frame in out.chunks_mut(output_channels) {
            if !self.playing {
                frame.fill(0.0);
                continue;
            }

            let frame_index = self.position as usize;
            if frame_index >= total_frames {
                self.playing = false;
                frame.fill(0.0);
                let _ = self.status.push(Status::Ended);
                continue;
            }

            for (ch, sample) in frame.iter_mut().enumerate() {
                let idx = frame_index * audio_channels + ch % audio_channels;
                *sample = self.audio.samples[idx] * self.volume;
            }

            self.position += 1.0;
        }

        if was_playing {
            let _ = self.status.push(Status::Progress(self.position_secs()));
        }
    }
}
