//! Sound backends for scheduled playback
//!
//! The player hands every scheduled note to a [`SoundBackend`], which starts
//! it at an absolute time on its own clock and returns a [`NoteHandle`] that
//! can silence it later. The main components are:
//! - [`MidirBackend`] for sending notes to a MIDI output port via midir
//! - [`MockBackend`] for tests and dry runs
//!
mod midir_backend;
mod mock_backend;

use thiserror::Error;

pub use midir_backend::{MidirBackend, MidirNoteHandle};
pub use mock_backend::{MockBackend, MockNoteHandle, TriggeredNote};

/// Seconds a triggered note sounds when nothing else is specified
pub const DEFAULT_NOTE_DURATION: f64 = 1.0;

/// Errors raised while setting up a backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("MIDI connection error: {0}")]
    Connection(String),
    #[error("MIDI output port '{name}' not found, available ports: {available:?}")]
    PortNotFound { name: String, available: Vec<String> },
    #[error("no MIDI output ports available")]
    NoPorts,
}

/// Handle to one triggered sound
pub trait NoteHandle {
    /// Silences the sound, or prevents it from starting. Calling it again does nothing.
    fn stop(&self);
}

/// Anything that can start a note at an absolute time on its own clock
pub trait SoundBackend {
    type Handle: NoteHandle;

    /// Current time on the backend clock, in seconds
    fn current_time(&self) -> f64;

    /// Starts `note` at `at` seconds for `duration` seconds.
    ///
    /// Note numbers are passed through untransformed; each backend decides
    /// what to do with values outside 0-127.
    fn trigger(&mut self, note: i32, velocity: u8, at: f64, duration: f64) -> Self::Handle;
}

/// Equal-tempered frequency of a note number, A4 (69) = 440 Hz
pub fn note_to_frequency(note: i32) -> f64 {
    440.0 * 2f64.powf(f64::from(note - 69) / 12.0)
}

/// Narrows a transposed note number to a MIDI data byte
pub fn midi_note(note: i32) -> Option<u8> {
    u8::try_from(note).ok().filter(|n| *n <= 0x7F)
}

#[cfg(not(feature = "test-mock"))]
pub fn list_output_ports() -> Vec<String> {
    let midi_out = match midir::MidiOutput::new("midiplay-port-lister") {
        Ok(m) => m,
        Err(e) => {
            log::error!("Failed to open MIDI output for listing: {}", e);
            return vec![];
        }
    };

    midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect()
}

#[cfg(feature = "test-mock")]
pub fn list_output_ports() -> Vec<String> {
    vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_frequency() {
        assert!((note_to_frequency(69) - 440.0).abs() < 1e-9);
        assert!((note_to_frequency(81) - 880.0).abs() < 1e-9);
        assert!((note_to_frequency(60) - 261.625_565).abs() < 1e-3);
    }

    #[test]
    fn test_midi_note_range() {
        assert_eq!(midi_note(0), Some(0));
        assert_eq!(midi_note(127), Some(127));
        assert_eq!(midi_note(128), None);
        assert_eq!(midi_note(-1), None);
    }
}
