pub mod event;
pub mod session;
pub mod time;

pub use event::{Event, EventQueue};
pub use session::{ExportRequest, PlaybackState, Rejected, Session, SessionSnapshot, Volume};
pub use time::{RegionError, RegionId, TrimRegion, clamp_region, format_duration};

pub use trim_engine::{EngineHandle, Player, Renderer};
pub use trim_transport::{AudioBuffer, MediaAsset, Status};
