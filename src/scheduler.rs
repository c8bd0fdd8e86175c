// scheduler.rs

use crate::score::Score;
use log::{debug, warn};

/// Playback tempo assumed for every file; in-file tempo meta events are not read.
pub const NOMINAL_BPM: f64 = 120.0;

const MICROS_PER_MINUTE: f64 = 60_000_000.0;
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// User-adjustable playback knobs, read once per play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    /// Playback speed factor, 1.0 is nominal. Must be positive.
    pub tempo_multiplier: f64,
    /// Semitones added to every sounded note
    pub transpose_semitones: i32,
    /// Skip track 0 entirely
    pub mute_lead_track: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tempo_multiplier: 1.0,
            transpose_semitones: 0,
            mute_lead_track: false,
        }
    }
}

/// A note to start at an absolute time on the sound backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    /// Transposed note number, not clamped to 0-127
    pub note: i32,
    pub velocity: u8,
    /// Seconds, on the same clock as the start offset
    pub absolute_time: f64,
}

/// Seconds per tick at the nominal tempo
pub fn tick_duration(division: u16) -> f64 {
    let micros_per_beat = MICROS_PER_MINUTE / NOMINAL_BPM;
    (micros_per_beat / MICROS_PER_SECOND) / f64::from(division)
}

/// Converts a score into start commands.
///
/// Only note-ons with a non-zero velocity are scheduled; note-offs are not,
/// and the backend's own note duration decides when each sound ends. Output
/// follows track order then event order, without sorting by time.
pub fn schedule(score: &Score, config: &PlaybackConfig, start_offset: f64) -> Vec<ScheduledNote> {
    if score.division == 0 {
        warn!("Score has a division of 0 ticks per quarter note, nothing to schedule");
        return Vec::new();
    }

    let tick_secs = tick_duration(score.division);
    let mut notes = Vec::new();

    for (index, track) in score.tracks.iter().enumerate() {
        if index == 0 && config.mute_lead_track {
            debug!("Lead track muted, skipping {} events", track.events.len());
            continue;
        }

        notes.extend(track.events.iter().filter_map(|event| {
            let (note, velocity) = event.sounding_note()?;
            Some(ScheduledNote {
                note: i32::from(note) + config.transpose_semitones,
                velocity,
                absolute_time: start_offset
                    + event.tick as f64 * tick_secs / config.tempo_multiplier,
            })
        }));
    }

    debug!(
        "Scheduled {} notes from {} tracks (tempo x{}, transpose {:+})",
        notes.len(),
        score.tracks.len(),
        config.tempo_multiplier,
        config.transpose_semitones
    );
    notes
}

/// Time at which the last scheduled sound ends, given a fixed note duration
pub fn schedule_end(notes: &[ScheduledNote], duration: f64) -> Option<f64> {
    notes
        .iter()
        .map(|n| n.absolute_time + duration)
        .reduce(f64::max)
}
