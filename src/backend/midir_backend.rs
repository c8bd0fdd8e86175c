use super::{midi_note, BackendError, NoteHandle, SoundBackend};
use crossbeam::channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use midir::{MidiOutput, MidiOutputConnection};
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const ALL_NOTES_OFF: u8 = 123;

enum Command {
    Trigger {
        id: u64,
        note: u8,
        velocity: u8,
        at: f64,
        duration: f64,
        cancelled: Arc<AtomicBool>,
    },
    Release(u64),
    Shutdown,
}

/// Handle to a note queued on a [`MidirBackend`]
#[derive(Debug)]
pub struct MidirNoteHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
    tx: Option<Sender<Command>>,
}

impl MidirNoteHandle {
    fn inert(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(true)),
            tx: None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl NoteHandle for MidirNoteHandle {
    fn stop(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = &self.tx {
            // The dispatcher is gone once the backend is dropped; nothing left to silence.
            let _ = tx.send(Command::Release(self.id));
        }
    }
}

/// Plays scheduled notes on a MIDI output port.
///
/// A dispatcher thread opens and holds the connection, and sends note-on and
/// note-off messages when their time comes. The clock starts at connection.
pub struct MidirBackend {
    epoch: Instant,
    port_name: String,
    tx: Sender<Command>,
    next_id: u64,
    thread_handle: Option<JoinHandle<()>>,
}

impl MidirBackend {
    /// Connects to the first port whose name contains `device_name`, or to the
    /// first available port when no name is given.
    pub fn connect(device_name: Option<&str>, channel: u8) -> Result<Self, BackendError> {
        let epoch = Instant::now();
        let (tx, rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let device_name = device_name.map(str::to_string);

        let thread_handle = thread::spawn(move || {
            let (connection, port_name) = match connect_output(device_name.as_deref()) {
                Ok(connected) => connected,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(port_name));

            Dispatcher::new(connection, channel, epoch).run(rx);
        });

        let port_name = match ready_rx.recv() {
            Ok(result) => result,
            Err(_) => Err(BackendError::Connection(
                "MIDI output thread exited during setup".to_string(),
            )),
        };
        let port_name = match port_name {
            Ok(name) => name,
            Err(e) => {
                let _ = thread_handle.join();
                return Err(e);
            }
        };

        Ok(Self {
            epoch,
            port_name,
            tx,
            next_id: 0,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

fn connect_output(device_name: Option<&str>) -> Result<(MidiOutputConnection, String), BackendError> {
    let midi_out =
        MidiOutput::new("midiplay-output").map_err(|e| BackendError::Connection(e.to_string()))?;

    let out_ports = midi_out.ports();
    let available_ports: Vec<String> = out_ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();
    debug!("Available MIDI output ports: {:?}", available_ports);

    let port = match device_name {
        Some(name) => out_ports
            .iter()
            .find(|p| midi_out.port_name(p).unwrap_or_default().contains(name))
            .ok_or_else(|| {
                error!("MIDI output device '{}' not found", name);
                BackendError::PortNotFound {
                    name: name.to_string(),
                    available: available_ports.clone(),
                }
            })?,
        None => out_ports.first().ok_or(BackendError::NoPorts)?,
    };

    let port_name = midi_out
        .port_name(port)
        .map_err(|e| BackendError::Connection(e.to_string()))?;
    info!("Connecting to MIDI output port: {}", port_name);

    let connection = midi_out
        .connect(port, "midiplay-output-conn")
        .map_err(|e| BackendError::Connection(e.to_string()))?;
    Ok((connection, port_name))
}

impl SoundBackend for MidirBackend {
    type Handle = MidirNoteHandle;

    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn trigger(&mut self, note: i32, velocity: u8, at: f64, duration: f64) -> MidirNoteHandle {
        let id = self.next_id;
        self.next_id += 1;

        let Some(note) = midi_note(note) else {
            warn!("Note {} is outside the MIDI range, not sent", note);
            return MidirNoteHandle::inert(id);
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let command = Command::Trigger {
            id,
            note,
            velocity: velocity & 0x7F,
            at,
            duration,
            cancelled: cancelled.clone(),
        };
        if self.tx.send(command).is_err() {
            error!("MIDI output thread is not running, note {} dropped", note);
            return MidirNoteHandle::inert(id);
        }

        MidirNoteHandle {
            id,
            cancelled,
            tx: Some(self.tx.clone()),
        }
    }
}

impl Drop for MidirBackend {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

enum Action {
    Start {
        note: u8,
        velocity: u8,
        cancelled: Arc<AtomicBool>,
    },
    End,
}

struct Pending {
    at: f64,
    id: u64,
    action: Action,
}

impl Pending {
    /// At equal times every note-off goes out before any note-on, so a note
    /// ending exactly when the same pitch starts again does not cut it short.
    fn sort_key(&self) -> (bool, u64) {
        (matches!(self.action, Action::Start { .. }), self.id)
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.at
            .total_cmp(&other.at)
            .then_with(|| self.sort_key().cmp(&other.sort_key()))
    }
}

/// Where the dispatcher writes raw MIDI messages
trait MidiSink {
    fn send(&mut self, msg: &[u8]) -> Result<(), String>;
}

impl MidiSink for MidiOutputConnection {
    fn send(&mut self, msg: &[u8]) -> Result<(), String> {
        MidiOutputConnection::send(self, msg).map_err(|e| e.to_string())
    }
}

struct Dispatcher<S: MidiSink> {
    connection: S,
    channel: u8,
    epoch: Instant,
    pending: BinaryHeap<Reverse<Pending>>,
    sounding: HashMap<u64, u8>,
}

impl<S: MidiSink> Dispatcher<S> {
    fn new(connection: S, channel: u8, epoch: Instant) -> Self {
        Self {
            connection,
            channel: channel & 0x0F,
            epoch,
            pending: BinaryHeap::new(),
            sounding: HashMap::new(),
        }
    }

    fn run(&mut self, rx: Receiver<Command>) {
        info!("MIDI output thread started");

        loop {
            let received = match self.pending.peek() {
                None => match rx.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => break,
                },
                Some(Reverse(next)) => {
                    let wait = next.at - self.now();
                    if wait <= 0.0 {
                        None
                    } else {
                        let timeout = Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX);
                        match rx.recv_timeout(timeout) {
                            Ok(cmd) => Some(cmd),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                }
            };

            if let Some(cmd) = received {
                if !self.handle_command(cmd) {
                    break;
                }
            }

            let now = self.now();
            self.fire_due(now);
        }

        self.silence_all();
        info!("MIDI output thread stopping");
    }

    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Applies one command; returns false on shutdown.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Trigger {
                id,
                note,
                velocity,
                at,
                duration,
                cancelled,
            } => {
                let end = at + duration;
                // A note must end strictly after it starts to be heard at all.
                if !(end > at) {
                    debug!("Note {} at {:.3}s has no length, not sent", note, at);
                    return true;
                }
                self.pending.push(Reverse(Pending {
                    at,
                    id,
                    action: Action::Start {
                        note,
                        velocity,
                        cancelled,
                    },
                }));
                self.pending.push(Reverse(Pending {
                    at: end,
                    id,
                    action: Action::End,
                }));
                true
            }
            Command::Release(id) => {
                self.release(id);
                true
            }
            Command::Shutdown => false,
        }
    }

    fn fire_due(&mut self, now: f64) {
        while self
            .pending
            .peek()
            .is_some_and(|Reverse(next)| next.at <= now)
        {
            let Some(Reverse(due)) = self.pending.pop() else {
                break;
            };
            match due.action {
                Action::Start {
                    note,
                    velocity,
                    cancelled,
                } => {
                    if cancelled.load(Ordering::SeqCst) {
                        continue;
                    }
                    debug!("Sending MIDI Note On: note={}, vel={}", note, velocity);
                    self.send(&[NOTE_ON | self.channel, note, velocity]);
                    self.sounding.insert(due.id, note);
                }
                Action::End => self.release(due.id),
            }
        }
    }

    fn release(&mut self, id: u64) {
        if let Some(note) = self.sounding.remove(&id) {
            debug!("Sending MIDI Note Off: note={}", note);
            self.send(&[NOTE_OFF | self.channel, note, 0]);
        }
    }

    fn silence_all(&mut self) {
        let ids: Vec<u64> = self.sounding.keys().copied().collect();
        for id in ids {
            self.release(id);
        }
        self.pending.clear();
        debug!("Sending All Notes Off: ch={}", self.channel);
        self.send(&[CONTROL_CHANGE | self.channel, ALL_NOTES_OFF, 0]);
    }

    fn send(&mut self, msg: &[u8]) {
        if let Err(e) = self.connection.send(msg) {
            error!("Failed to send MIDI message: {}", e);
        }
    }
}
