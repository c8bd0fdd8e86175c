use super::{note_to_frequency, NoteHandle, SoundBackend};
use log::info;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One call to [`MockBackend::trigger`], as recorded
#[derive(Debug, Clone)]
pub struct TriggeredNote {
    pub note: i32,
    pub velocity: u8,
    pub at: f64,
    pub duration: f64,
    stopped: Arc<AtomicBool>,
}

impl TriggeredNote {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MockNoteHandle {
    stopped: Arc<AtomicBool>,
    stop_calls: Arc<AtomicUsize>,
}

impl NoteHandle for MockNoteHandle {
    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Backend that makes no sound and remembers what it was asked to play
#[derive(Debug, Default)]
pub struct MockBackend {
    now: f64,
    log_notes: bool,
    triggered: Vec<TriggeredNote>,
    stop_calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that logs every triggered note, used for dry runs
    pub fn logging() -> Self {
        Self {
            log_notes: true,
            ..Self::default()
        }
    }

    pub fn set_time(&mut self, now: f64) {
        self.now = now;
    }

    pub fn triggered(&self) -> &[TriggeredNote] {
        &self.triggered
    }

    /// Total number of `stop` calls made on handles from this backend
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn clear(&mut self) {
        self.triggered.clear();
        self.stop_calls.store(0, Ordering::SeqCst);
    }
}

impl SoundBackend for MockBackend {
    type Handle = MockNoteHandle;

    fn current_time(&self) -> f64 {
        self.now
    }

    fn trigger(&mut self, note: i32, velocity: u8, at: f64, duration: f64) -> MockNoteHandle {
        if self.log_notes {
            info!(
                "Note {} ({:.2} Hz) vel {} at {:.3}s for {:.3}s",
                note,
                note_to_frequency(note),
                velocity,
                at,
                duration
            );
        }

        let stopped = Arc::new(AtomicBool::new(false));
        self.triggered.push(TriggeredNote {
            note,
            velocity,
            at,
            duration,
            stopped: stopped.clone(),
        });
        MockNoteHandle {
            stopped,
            stop_calls: self.stop_calls.clone(),
        }
    }
}
