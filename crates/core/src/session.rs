//! Region-synchronized playback controller.
//!
//! One `Session` drives one playback primitive at a time. Position, play state,
//! volume and the trim region are kept mutually consistent as user input and
//! engine status arrive. Every transition runs to completion before the next
//! one starts; transitions that are not valid in the current state are
//! rejected with the state left untouched.

use crate::time::{RegionError, RegionId, TrimRegion, format_duration};
use trim_engine::Player;
use trim_transport::{MediaAsset, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Unloaded,
    /// Asset loaded, waiting for the duration.
    Loading,
    Paused,
    Playing,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

/// Why a transition was ignored.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Rejected {
    #[error("no asset loaded")]
    NotLoaded,

    #[error("metadata not ready")]
    MetadataPending,

    #[error("already playing")]
    AlreadyPlaying,

    #[error("not playing")]
    NotPlaying,

    #[error("selected region is empty")]
    DegenerateRegion,

    #[error("region {0:?} is not the active region")]
    UnknownRegion(RegionId),

    #[error("invalid value")]
    InvalidValue,

    #[error("an export is already in flight")]
    ExportInProgress,

    #[error("no export in flight")]
    NoExportPending,

    #[error(transparent)]
    Region(#[from] RegionError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    pub level: f32,
    pub muted: bool,
    /// Level restored when unmuting.
    pub saved: f32,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            level: 1.0,
            muted: false,
            saved: 1.0,
        }
    }
}

/// Committed bounds plus the source asset, ready to be sent to the trim endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub asset: MediaAsset,
    pub region: TrimRegion,
}

impl ExportRequest {
    pub fn new(asset: MediaAsset, region: TrimRegion) -> Result<Self, Rejected> {
        if region.is_degenerate() {
            return Err(Rejected::DegenerateRegion);
        }
        Ok(Self { asset, region })
    }

    /// The `startTime` / `endTime` form values.
    pub fn form_values(&self) -> (String, String) {
        (self.region.start.to_string(), self.region.end.to_string())
    }
}

/// Point-in-time view of the session for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub position: f64,
    pub duration: f64,
    pub region: TrimRegion,
    pub volume: Volume,
    pub position_label: String,
    pub duration_label: String,
    pub has_trimmed: bool,
    pub exporting: bool,
}

struct Loaded<P> {
    asset: MediaAsset,
    player: P,
    duration: Option<f64>,
    region: TrimRegion,
    region_id: Option<RegionId>,
    position: f64,
    playing: bool,
}

impl<P: Player> Loaded<P> {
    fn ready_duration(&self) -> Result<f64, Rejected> {
        self.duration.ok_or(Rejected::MetadataPending)
    }

    fn move_to(&mut self, seconds: f64) {
        self.position = seconds;
        self.player.seek(seconds);
    }

    fn stop_at_region_start(&mut self) {
        self.player.pause();
        self.playing = false;
        let start = self.region.start;
        self.move_to(start);
    }
}

pub struct Session<P: Player> {
    loaded: Option<Loaded<P>>,
    trimmed: Option<MediaAsset>,
    exporting: bool,
    volume: Volume,
}

impl<P: Player> Default for Session<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Player> Session<P> {
    pub fn new() -> Self {
        Self {
            loaded: None,
            trimmed: None,
            exporting: false,
            volume: Volume::default(),
        }
    }

    /// Load a new asset, releasing everything derived from the previous one.
    pub fn load(&mut self, asset: MediaAsset, mut player: P) {
        self.unload();

        player.set_volume(self.volume.level);
        self.loaded = Some(Loaded {
            asset,
            player,
            duration: None,
            region: TrimRegion::default(),
            region_id: None,
            position: 0.0,
            playing: false,
        });
    }

    /// Release the current asset, its player and any trimmed result. An
    /// export still in flight is abandoned; its result will be refused.
    pub fn unload(&mut self) {
        if let Some(mut loaded) = self.loaded.take() {
            if loaded.playing {
                loaded.player.pause();
            }
        }
        self.trimmed = None;
        self.exporting = false;
    }

    fn loaded_mut(&mut self) -> Result<&mut Loaded<P>, Rejected> {
        self.loaded.as_mut().ok_or(Rejected::NotLoaded)
    }

    pub fn on_metadata_ready(&mut self, duration: f64) -> Result<(), Rejected> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(Rejected::InvalidValue);
        }
        let loaded = self.loaded_mut()?;
        loaded.duration = Some(duration);
        loaded.asset = loaded.asset.clone().with_duration(duration);
        loaded.region = TrimRegion::whole(duration);
        loaded.position = loaded.position.clamp(0.0, duration);
        Ok(())
    }

    /// Start playback from the region start.
    pub fn play(&mut self) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        loaded.ready_duration()?;
        if loaded.playing {
            return Err(Rejected::AlreadyPlaying);
        }
        if loaded.region.is_degenerate() {
            return Err(Rejected::DegenerateRegion);
        }

        let start = loaded.region.start;
        loaded.move_to(start);
        loaded.player.play();
        loaded.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        if !loaded.playing {
            return Err(Rejected::NotPlaying);
        }
        loaded.player.pause();
        loaded.playing = false;
        Ok(())
    }

    pub fn toggle_play(&mut self) -> Result<(), Rejected> {
        if self.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Position reported by the engine while playing. Reaching the region end
    /// pauses and rewinds to the region start.
    pub fn on_progress(&mut self, position: f64) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        let duration = loaded.ready_duration()?;
        if !loaded.playing {
            // Late tick from before a pause or seek.
            return Err(Rejected::NotPlaying);
        }
        if !position.is_finite() {
            return Err(Rejected::InvalidValue);
        }

        loaded.position = position.clamp(0.0, duration);
        if loaded.region.end > 0.0 && loaded.position >= loaded.region.end {
            loaded.stop_at_region_start();
        }
        Ok(())
    }

    pub fn on_ended(&mut self) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        loaded.playing = false;
        Ok(())
    }

    pub fn seek(&mut self, seconds: f64) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        let duration = loaded.ready_duration()?;
        if !seconds.is_finite() {
            return Err(Rejected::InvalidValue);
        }
        loaded.move_to(seconds.clamp(0.0, duration));
        Ok(())
    }

    pub fn set_region_start(&mut self, value: f64) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        let duration = loaded.ready_duration()?;
        let region = loaded.region.with_start(value, duration)?;
        let moved = region.start != loaded.region.start;
        loaded.region = region;

        if moved && !loaded.playing {
            loaded.move_to(region.start);
        }
        Ok(())
    }

    pub fn set_region_end(&mut self, value: f64) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        let duration = loaded.ready_duration()?;
        loaded.region = loaded.region.with_end(value, duration)?;
        Ok(())
    }

    /// A region appeared on the selection surface; it becomes the active region.
    pub fn region_created(&mut self, id: RegionId, start: f64, end: f64) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        let duration = loaded.ready_duration()?;
        let region = crate::time::clamp_region(TrimRegion::new(start, end), duration)?;
        loaded.region_id = Some(id);
        self.apply_region(region);
        Ok(())
    }

    pub fn region_updated(&mut self, id: RegionId, start: f64, end: f64) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        let duration = loaded.ready_duration()?;
        if loaded.region_id != Some(id) {
            return Err(Rejected::UnknownRegion(id));
        }
        let region = crate::time::clamp_region(TrimRegion::new(start, end), duration)?;
        self.apply_region(region);
        Ok(())
    }

    /// The active region was removed: the selection falls back to the whole clip.
    pub fn region_removed(&mut self, id: RegionId) -> Result<(), Rejected> {
        let loaded = self.loaded_mut()?;
        let duration = loaded.ready_duration()?;
        if loaded.region_id != Some(id) {
            return Err(Rejected::UnknownRegion(id));
        }
        loaded.region_id = None;
        self.apply_region(TrimRegion::whole(duration));
        Ok(())
    }

    fn apply_region(&mut self, region: TrimRegion) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        let moved = region.start != loaded.region.start;
        loaded.region = region;
        if moved && !loaded.playing {
            loaded.move_to(region.start);
        }
    }

    pub fn set_volume(&mut self, value: f32) -> Result<(), Rejected> {
        if value.is_nan() {
            return Err(Rejected::InvalidValue);
        }
        let level = value.clamp(0.0, 1.0);
        self.volume.level = level;
        self.volume.muted = level == 0.0;
        self.push_volume();
        Ok(())
    }

    pub fn toggle_mute(&mut self) {
        if self.volume.muted {
            self.volume.level = self.volume.saved;
            self.volume.muted = false;
        } else {
            self.volume.saved = self.volume.level;
            self.volume.level = 0.0;
            self.volume.muted = true;
        }
        self.push_volume();
    }

    fn push_volume(&mut self) {
        let level = self.volume.level;
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.player.set_volume(level);
        }
    }

    /// Drain the player's status queue, handling each status in arrival order.
    ///
    /// Returns the last position that was accepted, if any.
    pub fn poll(&mut self) -> Option<f64> {
        let mut position_changed = None;
        while let Some(status) = self.loaded.as_mut().and_then(|l| l.player.poll_status()) {
            let result = match status {
                Status::MetadataReady(duration) => self.on_metadata_ready(duration),
                Status::Progress(position) => {
                    let result = self.on_progress(position);
                    if result.is_ok() {
                        position_changed = Some(position);
                    }
                    result
                }
                Status::Ended => self.on_ended(),
            };
            if let Err(reason) = result {
                tracing::debug!(?status, %reason, "status ignored");
            }
        }
        position_changed
    }

    pub fn export_request(&self) -> Result<ExportRequest, Rejected> {
        let loaded = self.loaded.as_ref().ok_or(Rejected::NotLoaded)?;
        loaded.duration.ok_or(Rejected::MetadataPending)?;
        ExportRequest::new(loaded.asset.clone(), loaded.region)
    }

    /// Mark an export as in flight and hand out what to send. A second export
    /// is refused until [`Session::finish_export`] is called.
    pub fn begin_export(&mut self) -> Result<ExportRequest, Rejected> {
        if self.exporting {
            return Err(Rejected::ExportInProgress);
        }
        let request = self.export_request()?;
        self.exporting = true;
        Ok(request)
    }

    /// Settle the export in flight. `None` means it failed and the previous
    /// trimmed result is kept.
    pub fn finish_export(&mut self, result: Option<MediaAsset>) -> Result<(), Rejected> {
        if !self.exporting {
            return Err(Rejected::NoExportPending);
        }
        self.exporting = false;
        match result {
            Some(asset) => self.set_trimmed(asset),
            None => Ok(()),
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Keep the result of a completed trim, releasing the previous one.
    pub fn set_trimmed(&mut self, asset: MediaAsset) -> Result<(), Rejected> {
        if self.loaded.is_none() {
            return Err(Rejected::NotLoaded);
        }
        self.trimmed = Some(asset);
        Ok(())
    }

    pub fn trimmed(&self) -> Option<&MediaAsset> {
        self.trimmed.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        match &self.loaded {
            None => PlaybackState::Unloaded,
            Some(loaded) if loaded.duration.is_none() => PlaybackState::Loading,
            Some(loaded) if loaded.playing => PlaybackState::Playing,
            Some(_) => PlaybackState::Paused,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    pub fn asset(&self) -> Option<&MediaAsset> {
        self.loaded.as_ref().map(|l| &l.asset)
    }

    pub fn position(&self) -> f64 {
        self.loaded.as_ref().map_or(0.0, |l| l.position)
    }

    pub fn duration(&self) -> Option<f64> {
        self.loaded.as_ref().and_then(|l| l.duration)
    }

    pub fn region(&self) -> TrimRegion {
        self.loaded.as_ref().map_or_else(TrimRegion::default, |l| l.region)
    }

    pub fn region_id(&self) -> Option<RegionId> {
        self.loaded.as_ref().and_then(|l| l.region_id)
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let duration = self.duration().unwrap_or(0.0);
        SessionSnapshot {
            state: self.state(),
            position: self.position(),
            duration,
            region: self.region(),
            volume: self.volume,
            position_label: format_duration(self.position()),
            duration_label: format_duration(duration),
            has_trimmed: self.trimmed.is_some(),
            exporting: self.exporting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use trim_transport::Command;

    #[derive(Default)]
    struct Recorder {
        commands: Vec<Command>,
        statuses: VecDeque<Status>,
        drops: usize,
    }

    /// Player double that records commands and counts how often it is released.
    struct FakePlayer {
        recorder: Rc<RefCell<Recorder>>,
    }

    impl FakePlayer {
        fn new() -> (Self, Rc<RefCell<Recorder>>) {
            let recorder = Rc::new(RefCell::new(Recorder::default()));
            (
                Self {
                    recorder: Rc::clone(&recorder),
                },
                recorder,
            )
        }
    }

    impl Player for FakePlayer {
        fn play(&mut self) {
            self.recorder.borrow_mut().commands.push(Command::Play);
        }
        fn pause(&mut self) {
            self.recorder.borrow_mut().commands.push(Command::Pause);
        }
        fn seek(&mut self, seconds: f64) {
            self.recorder
                .borrow_mut()
                .commands
                .push(Command::Seek { seconds });
        }
        fn set_volume(&mut self, volume: f32) {
            self.recorder
                .borrow_mut()
                .commands
                .push(Command::SetVolume(volume));
        }
        fn position(&self) -> f64 {
            0.0
        }
        fn duration(&self) -> Option<f64> {
            None
        }
        fn poll_status(&mut self) -> Option<Status> {
            self.recorder.borrow_mut().statuses.pop_front()
        }
    }

    impl Drop for FakePlayer {
        fn drop(&mut self) {
            self.recorder.borrow_mut().drops += 1;
        }
    }

    fn asset() -> MediaAsset {
        MediaAsset::new(vec![0u8; 16], "audio/mpeg")
    }

    fn ready_session(duration: f64) -> (Session<FakePlayer>, Rc<RefCell<Recorder>>) {
        let (player, recorder) = FakePlayer::new();
        let mut session = Session::new();
        session.load(asset(), player);
        session.on_metadata_ready(duration).unwrap();
        recorder.borrow_mut().commands.clear();
        (session, recorder)
    }

    #[test]
    fn test_load_resets_state() {
        let (player, _recorder) = FakePlayer::new();
        let mut session = Session::new();
        assert_eq!(session.state(), PlaybackState::Unloaded);

        session.load(asset(), player);

        assert_eq!(session.state(), PlaybackState::Loading);
        assert_eq!(session.position(), 0.0);
        assert_eq!(session.region(), TrimRegion::new(0.0, 0.0));
    }

    #[test]
    fn test_metadata_selects_whole_clip() {
        let (session, _recorder) = ready_session(30.0);

        assert_eq!(session.state(), PlaybackState::Paused);
        assert_eq!(session.duration(), Some(30.0));
        assert_eq!(session.region(), TrimRegion::new(0.0, 30.0));
    }

    #[test]
    fn test_play_before_metadata_is_ignored() {
        let (player, recorder) = FakePlayer::new();
        let mut session = Session::new();
        session.load(asset(), player);
        recorder.borrow_mut().commands.clear();

        assert_eq!(session.play(), Err(Rejected::MetadataPending));
        assert_eq!(session.state(), PlaybackState::Loading);
        assert!(recorder.borrow().commands.is_empty());
    }

    #[test]
    fn test_play_starts_from_region_start() {
        let (mut session, recorder) = ready_session(30.0);
        session.set_region_start(5.0).unwrap();
        session.seek(20.0).unwrap();
        recorder.borrow_mut().commands.clear();

        session.play().unwrap();

        assert!(session.is_playing());
        assert_eq!(session.position(), 5.0);
        assert_eq!(
            recorder.borrow().commands,
            vec![Command::Seek { seconds: 5.0 }, Command::Play]
        );
    }

    #[test]
    fn test_double_play_is_absorbed() {
        let (mut session, recorder) = ready_session(30.0);
        session.play().unwrap();
        let sent = recorder.borrow().commands.len();

        assert_eq!(session.play(), Err(Rejected::AlreadyPlaying));
        assert_eq!(recorder.borrow().commands.len(), sent);
        assert!(session.is_playing());
    }

    #[test]
    fn test_pause_keeps_position() {
        let (mut session, _recorder) = ready_session(30.0);
        session.play().unwrap();
        session.on_progress(12.5).unwrap();

        session.pause().unwrap();

        assert_eq!(session.state(), PlaybackState::Paused);
        assert_eq!(session.position(), 12.5);
        assert_eq!(session.pause(), Err(Rejected::NotPlaying));
    }

    #[test]
    fn test_progress_past_region_end_pauses_and_rewinds() {
        let (mut session, recorder) = ready_session(30.0);
        session.set_region_start(5.0).unwrap();
        session.set_region_end(10.0).unwrap();
        session.play().unwrap();
        recorder.borrow_mut().commands.clear();

        session.on_progress(9.9).unwrap();
        assert!(session.is_playing());

        session.on_progress(10.02).unwrap();

        assert_eq!(session.state(), PlaybackState::Paused);
        assert_eq!(session.position(), 5.0);
        assert_eq!(
            recorder.borrow().commands,
            vec![Command::Pause, Command::Seek { seconds: 5.0 }]
        );
    }

    #[test]
    fn test_playing_position_never_exceeds_region_end_after_a_tick() {
        let (mut session, _recorder) = ready_session(60.0);
        session.set_region_end(7.0).unwrap();
        session.play().unwrap();

        let mut t = 0.0;
        while t < 20.0 {
            let _ = session.on_progress(t);
            if session.is_playing() {
                assert!(session.position() <= session.region().end);
            }
            t += 0.3;
        }
        assert!(!session.is_playing());
    }

    #[test]
    fn test_late_progress_after_pause_is_ignored() {
        let (mut session, _recorder) = ready_session(30.0);
        session.play().unwrap();
        session.on_progress(3.0).unwrap();
        session.pause().unwrap();

        assert_eq!(session.on_progress(3.5), Err(Rejected::NotPlaying));
        assert_eq!(session.position(), 3.0);
    }

    #[test]
    fn test_ended_pauses() {
        let (mut session, _recorder) = ready_session(30.0);
        session.play().unwrap();
        session.on_progress(29.9).unwrap();

        session.on_ended().unwrap();

        assert_eq!(session.state(), PlaybackState::Paused);
        assert_eq!(session.position(), 29.9);
    }

    #[test]
    fn test_seek_clamps_and_keeps_play_state() {
        let (mut session, _recorder) = ready_session(30.0);

        session.seek(45.0).unwrap();
        assert_eq!(session.position(), 30.0);
        session.seek(-2.0).unwrap();
        assert_eq!(session.position(), 0.0);

        session.play().unwrap();
        session.seek(12.0).unwrap();
        assert!(session.is_playing());
        assert_eq!(session.position(), 12.0);
        assert_eq!(session.seek(f64::NAN), Err(Rejected::InvalidValue));
    }

    #[test]
    fn test_region_start_edit_moves_cursor_when_paused() {
        let (mut session, recorder) = ready_session(30.0);

        session.set_region_start(8.0).unwrap();

        assert_eq!(session.position(), 8.0);
        assert_eq!(recorder.borrow().commands, vec![Command::Seek { seconds: 8.0 }]);
    }

    #[test]
    fn test_region_start_edit_leaves_cursor_while_playing() {
        let (mut session, _recorder) = ready_session(30.0);
        session.play().unwrap();
        session.on_progress(4.0).unwrap();

        session.set_region_start(2.0).unwrap();

        assert_eq!(session.position(), 4.0);
        assert_eq!(session.region().start, 2.0);
    }

    #[test]
    fn test_region_edits_reject_crossing_bounds() {
        let (mut session, _recorder) = ready_session(30.0);
        session.set_region_start(5.0).unwrap();
        session.set_region_end(10.0).unwrap();

        assert!(session.set_region_start(10.0).is_err());
        assert!(session.set_region_start(15.0).is_err());
        assert!(session.set_region_end(5.0).is_err());
        assert!(session.set_region_end(1.0).is_err());
        assert_eq!(session.region(), TrimRegion::new(5.0, 10.0));
    }

    #[test]
    fn test_region_invariant_holds_for_edit_sequences() {
        let (mut session, _recorder) = ready_session(30.0);
        let edits = [
            (true, 12.0),
            (false, 3.0),
            (false, 18.0),
            (true, 25.0),
            (true, 17.9),
            (false, 17.9),
            (false, 40.0),
            (true, -5.0),
            (false, 0.0),
            (true, 30.0),
            (false, 0.1),
        ];

        for (is_start, value) in edits {
            let _ = if is_start {
                session.set_region_start(value)
            } else {
                session.set_region_end(value)
            };
            let region = session.region();
            assert!(
                0.0 <= region.start && region.start < region.end && region.end <= 30.0,
                "{region:?} after edit {value}"
            );
        }
    }

    #[test]
    fn test_region_edits_require_metadata() {
        let (player, _recorder) = FakePlayer::new();
        let mut session = Session::new();
        session.load(asset(), player);

        assert_eq!(session.set_region_start(1.0), Err(Rejected::MetadataPending));
        assert_eq!(session.set_region_end(1.0), Err(Rejected::MetadataPending));
    }

    #[test]
    fn test_region_surface_events() {
        let (mut session, _recorder) = ready_session(30.0);
        let id = RegionId(7);

        session.region_created(id, 2.0, 8.0).unwrap();
        assert_eq!(session.region(), TrimRegion::new(2.0, 8.0));
        assert_eq!(session.region_id(), Some(id));
        assert_eq!(session.position(), 2.0);

        session.region_updated(id, 3.0, 9.0).unwrap();
        assert_eq!(session.region(), TrimRegion::new(3.0, 9.0));

        assert_eq!(
            session.region_updated(RegionId(8), 0.0, 1.0),
            Err(Rejected::UnknownRegion(RegionId(8)))
        );

        session.region_removed(id).unwrap();
        assert_eq!(session.region(), TrimRegion::new(0.0, 30.0));
        assert_eq!(session.region_id(), None);
    }

    #[test]
    fn test_degenerate_region_from_surface_is_rejected() {
        let (mut session, _recorder) = ready_session(30.0);
        session.region_created(RegionId(1), 2.0, 8.0).unwrap();

        let result = session.region_created(RegionId(2), 5.0, 5.0);

        assert!(matches!(result, Err(Rejected::Region(RegionError::Degenerate { .. }))));
        assert_eq!(session.region(), TrimRegion::new(2.0, 8.0));
        assert_eq!(session.region_id(), Some(RegionId(1)));
    }

    #[test]
    fn test_zero_length_region_cannot_be_exported() {
        let region = TrimRegion::new(5.0, 5.0);

        assert_eq!(
            ExportRequest::new(asset().with_duration(30.0), region),
            Err(Rejected::DegenerateRegion)
        );
    }

    #[test]
    fn test_zero_length_asset_cannot_play_or_export() {
        let (mut session, _recorder) = ready_session(0.0);

        assert_eq!(session.play(), Err(Rejected::DegenerateRegion));
        assert_eq!(session.export_request(), Err(Rejected::DegenerateRegion));
    }

    #[test]
    fn test_export_request_carries_committed_bounds() {
        let (mut session, _recorder) = ready_session(10.0);
        session.set_region_start(2.5).unwrap();
        session.set_region_end(7.5).unwrap();

        let request = session.export_request().unwrap();

        assert_eq!(request.region, TrimRegion::new(2.5, 7.5));
        assert_eq!(request.asset.content_type(), "audio/mpeg");
        assert_eq!(
            request.form_values(),
            ("2.5".to_string(), "7.5".to_string())
        );
    }

    #[test]
    fn test_export_asset_carries_decoded_duration() {
        let (session, _recorder) = ready_session(30.0);

        let request = session.export_request().unwrap();

        assert_eq!(request.asset.duration(), Some(30.0));
        assert_eq!(session.asset().and_then(MediaAsset::duration), Some(30.0));
    }

    #[test]
    fn test_second_export_is_refused_while_one_is_pending() {
        let (mut session, _recorder) = ready_session(10.0);
        session.set_region_end(4.0).unwrap();

        let request = session.begin_export().unwrap();
        assert_eq!(request.region, TrimRegion::new(0.0, 4.0));
        assert!(session.snapshot().exporting);
        assert_eq!(session.begin_export(), Err(Rejected::ExportInProgress));

        let trimmed = MediaAsset::new(vec![9u8; 4], "audio/mpeg").with_duration(4.0);
        session.finish_export(Some(trimmed.clone())).unwrap();

        assert!(!session.is_exporting());
        assert_eq!(session.trimmed(), Some(&trimmed));
        assert_eq!(session.finish_export(None), Err(Rejected::NoExportPending));
        assert!(session.begin_export().is_ok());
    }

    #[test]
    fn test_failed_export_keeps_previous_result() {
        let (mut session, _recorder) = ready_session(10.0);
        let first = MediaAsset::new(vec![1u8], "audio/mpeg");
        session.begin_export().unwrap();
        session.finish_export(Some(first.clone())).unwrap();

        session.begin_export().unwrap();
        session.finish_export(None).unwrap();

        assert_eq!(session.trimmed(), Some(&first));
        assert!(!session.is_exporting());
    }

    #[test]
    fn test_reload_abandons_pending_export() {
        let (mut session, _recorder) = ready_session(10.0);
        session.begin_export().unwrap();

        let (player, _second) = FakePlayer::new();
        session.load(asset(), player);

        assert!(!session.is_exporting());
        assert_eq!(
            session.finish_export(Some(MediaAsset::new(vec![1u8], "audio/mpeg"))),
            Err(Rejected::NoExportPending)
        );
        assert!(session.trimmed().is_none());
    }

    #[test]
    fn test_export_before_load_or_metadata() {
        let mut session: Session<FakePlayer> = Session::new();
        assert_eq!(session.export_request(), Err(Rejected::NotLoaded));

        let (player, _recorder) = FakePlayer::new();
        session.load(asset(), player);
        assert_eq!(session.export_request(), Err(Rejected::MetadataPending));
    }

    #[test]
    fn test_volume_clamps_and_tracks_mute() {
        let (mut session, recorder) = ready_session(30.0);

        session.set_volume(1.7).unwrap();
        assert_eq!(session.volume().level, 1.0);

        session.set_volume(0.0).unwrap();
        assert!(session.volume().muted);

        session.set_volume(0.4).unwrap();
        assert!(!session.volume().muted);
        assert_eq!(session.set_volume(f32::NAN), Err(Rejected::InvalidValue));

        assert_eq!(
            recorder.borrow().commands,
            vec![
                Command::SetVolume(1.0),
                Command::SetVolume(0.0),
                Command::SetVolume(0.4)
            ]
        );
    }

    #[test]
    fn test_toggle_mute_restores_saved_volume() {
        let (mut session, _recorder) = ready_session(30.0);
        session.set_volume(0.6).unwrap();

        session.toggle_mute();
        assert_eq!(session.volume().level, 0.0);
        assert!(session.volume().muted);
        assert_eq!(session.volume().saved, 0.6);

        session.toggle_mute();
        assert_eq!(session.volume().level, 0.6);
        assert!(!session.volume().muted);
    }

    #[test]
    fn test_volume_survives_reload() {
        let (mut session, _recorder) = ready_session(30.0);
        session.set_volume(0.3).unwrap();

        let (player, recorder) = FakePlayer::new();
        session.load(asset(), player);

        assert_eq!(recorder.borrow().commands, vec![Command::SetVolume(0.3)]);
    }

    #[test]
    fn test_reload_releases_previous_player_exactly_once() {
        let (mut session, first) = ready_session(30.0);
        session.play().unwrap();

        let (player, second) = FakePlayer::new();
        session.load(asset(), player);

        assert_eq!(first.borrow().drops, 1);
        assert_eq!(first.borrow().commands.last(), Some(&Command::Pause));
        assert_eq!(second.borrow().drops, 0);

        session.unload();
        session.unload();
        drop(session);

        assert_eq!(first.borrow().drops, 1);
        assert_eq!(second.borrow().drops, 1);
    }

    #[test]
    fn test_trimmed_asset_is_released_on_reload() {
        let (mut session, _recorder) = ready_session(30.0);
        let trimmed = MediaAsset::new(vec![1u8, 2, 3], "audio/mpeg");

        session.set_trimmed(trimmed.clone()).unwrap();
        assert_eq!(session.trimmed(), Some(&trimmed));
        assert!(session.snapshot().has_trimmed);

        let (player, _second) = FakePlayer::new();
        session.load(asset(), player);

        assert!(session.trimmed().is_none());
        session.unload();
        assert_eq!(session.set_trimmed(trimmed), Err(Rejected::NotLoaded));
    }

    #[test]
    fn test_poll_dispatches_statuses_in_order() {
        let (player, recorder) = FakePlayer::new();
        let mut session = Session::new();
        session.load(asset(), player);
        recorder.borrow_mut().statuses.extend([Status::MetadataReady(20.0)]);
        assert_eq!(session.poll(), None);
        session.set_region_end(4.0).unwrap();
        session.play().unwrap();

        recorder
            .borrow_mut()
            .statuses
            .extend([Status::Progress(2.0), Status::Progress(4.1), Status::Progress(4.2)]);

        assert_eq!(session.poll(), Some(4.2));
        assert_eq!(session.state(), PlaybackState::Paused);
        assert_eq!(session.position(), 0.0);
    }

    #[test]
    fn test_poll_skips_rejected_progress() {
        let (mut session, recorder) = ready_session(20.0);
        session.seek(6.0).unwrap();

        // Paused: a stale tick must not move the cursor or be reported.
        recorder.borrow_mut().statuses.extend([Status::Progress(9.0)]);
        assert_eq!(session.poll(), None);
        assert_eq!(session.position(), 6.0);

        session.play().unwrap();
        recorder
            .borrow_mut()
            .statuses
            .extend([Status::Progress(1.0), Status::Ended, Status::Progress(3.0)]);

        assert_eq!(session.poll(), Some(1.0));
        assert_eq!(session.state(), PlaybackState::Paused);
        assert_eq!(session.position(), 1.0);
    }

    #[test]
    fn test_snapshot_formats_times() {
        let (mut session, _recorder) = ready_session(125.0);
        session.seek(61.0).unwrap();

        let snapshot = session.snapshot();

        assert_eq!(snapshot.state, PlaybackState::Paused);
        assert_eq!(snapshot.position_label, "1:01");
        assert_eq!(snapshot.duration_label, "2:05");
        assert!(!snapshot.has_trimmed);
        assert!(!snapshot.exporting);
    }
}
