pub mod backend;
pub mod cli;
pub mod config;
pub mod logging;
pub mod player;
pub mod scheduler;
pub mod score;
pub mod smf;
pub mod ui;

pub use backend::{MidirBackend, MockBackend, NoteHandle, SoundBackend};
pub use cli::{handle_device_list, validate_device, Args};
pub use player::{PlaybackController, PlaybackState, PlayerError};
pub use scheduler::{schedule, PlaybackConfig, ScheduledNote};
pub use score::{Event, EventKind, Score, Track};
pub use smf::{decode, DecodeError};
