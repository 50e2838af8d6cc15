//! Events feeding a [`Session`], processed strictly in arrival order.

use std::collections::VecDeque;

use crate::session::{Rejected, Session};
use crate::time::RegionId;
use trim_engine::Player;

/// User input, engine status and selection-surface notifications, as one stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Play,
    Pause,
    TogglePlay,
    Seek(f64),
    SetRegionStart(f64),
    SetRegionEnd(f64),
    SetVolume(f32),
    ToggleMute,
    Unload,
    MetadataReady(f64),
    Progress(f64),
    Ended,
    RegionCreated { id: RegionId, start: f64, end: f64 },
    RegionUpdated { id: RegionId, start: f64, end: f64 },
    RegionRemoved(RegionId),
}

impl<P: Player> Session<P> {
    /// Handle one event to completion.
    pub fn dispatch(&mut self, event: Event) -> Result<(), Rejected> {
        match event {
            Event::Play => self.play(),
            Event::Pause => self.pause(),
            Event::TogglePlay => self.toggle_play(),
            Event::Seek(seconds) => self.seek(seconds),
            Event::SetRegionStart(value) => self.set_region_start(value),
            Event::SetRegionEnd(value) => self.set_region_end(value),
            Event::SetVolume(value) => self.set_volume(value),
            Event::ToggleMute => {
                self.toggle_mute();
                Ok(())
            }
            Event::Unload => {
                self.unload();
                Ok(())
            }
            Event::MetadataReady(duration) => self.on_metadata_ready(duration),
            Event::Progress(position) => self.on_progress(position),
            Event::Ended => self.on_ended(),
            Event::RegionCreated { id, start, end } => self.region_created(id, start, end),
            Event::RegionUpdated { id, start, end } => self.region_updated(id, start, end),
            Event::RegionRemoved(id) => self.region_removed(id),
        }
    }
}

/// FIFO of pending events for one session.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.pending.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain every pending event into `session`. Rejected events are logged and
    /// skipped; they never stop the queue.
    ///
    /// Returns the number of rejected events.
    pub fn run<P: Player>(&mut self, session: &mut Session<P>) -> usize {
        let mut rejected = 0;
        while let Some(event) = self.pending.pop_front() {
            if let Err(reason) = session.dispatch(event) {
                tracing::debug!(?event, %reason, "event ignored");
                rejected += 1;
            }
        }
        rejected
    }
}
