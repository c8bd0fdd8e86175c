//! Playback control: load, play, stop and the transform knobs

use crate::backend::{NoteHandle, SoundBackend, DEFAULT_NOTE_DURATION};
use crate::scheduler::{schedule, schedule_end, PlaybackConfig};
use crate::score::Score;
use crate::smf::{self, DecodeError};
use log::{debug, error, info};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    #[error("failed to decode MIDI file: {0}")]
    Decode(#[from] DecodeError),
    #[error("tempo multiplier must be a positive number, got {0}")]
    InvalidTempo(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Owns the current score, playback settings and the handles of every note
/// sent to the backend since the last play.
///
/// Settings changes apply from the next [`play`](Self::play) on; notes that
/// are already scheduled are never rewritten.
pub struct PlaybackController<B: SoundBackend> {
    backend: B,
    score: Score,
    config: PlaybackConfig,
    note_duration: f64,
    state: PlaybackState,
    handles: Vec<B::Handle>,
    playback_end: Option<f64>,
}

impl<B: SoundBackend> PlaybackController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, PlaybackConfig::default(), DEFAULT_NOTE_DURATION)
    }

    pub fn with_config(backend: B, config: PlaybackConfig, note_duration: f64) -> Self {
        Self {
            backend,
            score: Score::default(),
            config,
            note_duration,
            state: PlaybackState::Stopped,
            handles: Vec::new(),
            playback_end: None,
        }
    }

    /// Decodes `data` and makes it the current score.
    ///
    /// On failure the previous score stays loaded. Playback in progress is
    /// not interrupted either way.
    pub fn load_bytes(&mut self, data: &[u8]) -> Result<(), PlayerError> {
        match smf::decode(data) {
            Ok(score) => {
                self.load_score(score);
                Ok(())
            }
            Err(e) => {
                error!("Rejected MIDI file, keeping current score: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn load_score(&mut self, score: Score) {
        info!("Loaded MIDI with {} tracks", score.tracks.len());
        self.score = score;
    }

    /// Schedules the current score from the backend's current time.
    ///
    /// Does nothing if already playing or if the score has no tracks.
    /// Returns the number of notes handed to the backend.
    pub fn play(&mut self) -> usize {
        if self.state == PlaybackState::Playing {
            debug!("Play requested while already playing, ignoring");
            return 0;
        }
        if self.score.is_empty() {
            debug!("Play requested with no tracks loaded, ignoring");
            return 0;
        }

        let start = self.backend.current_time();
        let config = self.config;
        let notes = schedule(&self.score, &config, start);

        for note in &notes {
            debug!(
                "Dispatching note {} vel {} at {:.3}s",
                note.note, note.velocity, note.absolute_time
            );
            let handle = self.backend.trigger(
                note.note,
                note.velocity,
                note.absolute_time,
                self.note_duration,
            );
            self.handles.push(handle);
        }

        self.playback_end = schedule_end(&notes, self.note_duration);
        self.state = PlaybackState::Playing;
        info!("Playback started at {:.3}s with {} notes", start, notes.len());
        notes.len()
    }

    /// Stops every note issued since the last play. Safe to call in any state.
    pub fn stop(&mut self) {
        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            handle.stop();
        }
        self.playback_end = None;
        if self.state == PlaybackState::Playing {
            info!("Playback stopped, {} notes cancelled", count);
        }
        self.state = PlaybackState::Stopped;
    }

    pub fn set_tempo(&mut self, multiplier: f64) -> Result<(), PlayerError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(PlayerError::InvalidTempo(multiplier));
        }
        debug!("Tempo multiplier set to {}", multiplier);
        self.config.tempo_multiplier = multiplier;
        Ok(())
    }

    pub fn set_transpose(&mut self, semitones: i32) {
        debug!("Transpose set to {:+} semitones", semitones);
        self.config.transpose_semitones = semitones;
    }

    pub fn set_mute_lead(&mut self, mute: bool) {
        debug!("Lead track mute set to {}", mute);
        self.config.mute_lead_track = mute;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn note_duration(&self) -> f64 {
        self.note_duration
    }

    /// Number of note handles issued since the last play and not yet stopped
    pub fn active_handles(&self) -> usize {
        self.handles.len()
    }

    /// Backend time at which the last scheduled note ends, while playing
    pub fn playback_end(&self) -> Option<f64> {
        self.playback_end
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
