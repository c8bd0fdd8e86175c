//! Standard MIDI File decoding
//!
//! This module turns a complete in-memory file into a [`Score`](crate::score::Score):
//! - [`ByteCursor`] for bounds-checked big-endian and variable-length reads
//! - [`decode`] for header/track chunk validation and event decoding,
//!   including running-status compression
//!
//! Only note-on and note-off events carry data out of the decoder; every other
//! channel, meta and sysex event is consumed structurally and reported as
//! [`EventKind::Other`](crate::score::EventKind::Other).

mod cursor;
mod decoder;
mod error;

pub use cursor::ByteCursor;
pub use decoder::decode;
pub use error::{DecodeError, Result};

/// Tag opening the header chunk
pub const HEADER_TAG: &[u8; 4] = b"MThd";
/// Tag opening every track chunk
pub const TRACK_TAG: &[u8; 4] = b"MTrk";
