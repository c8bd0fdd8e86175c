//! Decoded representation of a multi-track MIDI file

/// Ticks per quarter note assumed before any file has been loaded
pub const DEFAULT_DIVISION: u16 = 480;

/// What happened at a given tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Note On with note number and velocity (velocity 0 is left as-is)
    NoteOn { note: u8, velocity: u8 },
    /// Note Off with note number and release velocity
    NoteOff { note: u8, velocity: u8 },
    /// Any other channel, meta or sysex event; consumed but not interpreted
    Other,
}

/// A single event positioned at an absolute tick from the start of its track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub tick: u64,
    pub kind: EventKind,
}

impl Event {
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }

    /// Returns the note and velocity if this event should make a sound
    pub fn sounding_note(&self) -> Option<(u8, u8)> {
        match self.kind {
            EventKind::NoteOn { note, velocity } if velocity > 0 => Some((note, velocity)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    /// Events in non-decreasing tick order
    pub events: Vec<Event>,
}

impl Track {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn note_on_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::NoteOn { .. }))
            .count()
    }
}

/// An immutable, fully decoded file. Track 0 is the lead track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub format: u16,
    pub division: u16,
    pub tracks: Vec<Track>,
}

impl Default for Score {
    fn default() -> Self {
        Self {
            format: 0,
            division: DEFAULT_DIVISION,
            tracks: Vec::new(),
        }
    }
}

impl Score {
    pub fn new(format: u16, division: u16, tracks: Vec<Track>) -> Self {
        Self {
            format,
            division,
            tracks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(|t| t.events.len()).sum()
    }
}
