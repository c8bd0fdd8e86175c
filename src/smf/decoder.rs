use super::cursor::ByteCursor;
use super::error::{DecodeError, Result};
use super::{HEADER_TAG, TRACK_TAG};
use crate::score::{Event, EventKind, Score, Track};
use log::{debug, info, warn};

/// Number of header bytes this decoder reads: format, track count and division
const HEADER_FIELDS_LEN: u32 = 6;

/// Decodes a complete Standard MIDI File buffer.
///
/// Any failure aborts the whole decode; no partial score is returned.
pub fn decode(data: &[u8]) -> Result<Score> {
    let mut cursor = ByteCursor::new(data);

    expect_tag(&mut cursor, HEADER_TAG)?;
    let header_len = cursor.read_u32_be()?;
    let format = cursor.read_u16_be()?;
    let track_count = cursor.read_u16_be()?;
    let division = cursor.read_u16_be()?;

    if header_len < HEADER_FIELDS_LEN {
        // The declared length wins: step back so the next chunk starts where
        // the header says it ends.
        warn!(
            "Header declares {} bytes, fewer than the {} always read",
            header_len, HEADER_FIELDS_LEN
        );
        let overrun = (HEADER_FIELDS_LEN - header_len) as usize;
        cursor.seek(cursor.position().saturating_sub(overrun));
    } else {
        cursor.skip((header_len - HEADER_FIELDS_LEN) as usize)?;
    }

    debug!(
        "Header: format={}, tracks={}, division={}",
        format, track_count, division
    );

    let mut tracks = Vec::with_capacity(usize::from(track_count));
    for index in 0..track_count {
        let track = decode_track(&mut cursor)?;
        debug!("Track {}: {} events", index, track.events.len());
        tracks.push(track);
    }

    info!(
        "Decoded MIDI file: format {}, division {}, {} tracks",
        format,
        division,
        tracks.len()
    );

    Ok(Score::new(format, division, tracks))
}

fn expect_tag(cursor: &mut ByteCursor<'_>, expected: &[u8; 4]) -> Result<()> {
    let tag = cursor.read_bytes(4)?;
    if tag != expected {
        return Err(DecodeError::InvalidFormat(format!(
            "expected chunk tag {:?}, found {:?}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(tag)
        )));
    }
    Ok(())
}

fn decode_track(cursor: &mut ByteCursor<'_>) -> Result<Track> {
    expect_tag(cursor, TRACK_TAG)?;
    let length = cursor.read_u32_be()? as usize;
    let end = cursor.position().saturating_add(length);

    let mut events = Vec::new();
    let mut tick: u64 = 0;
    let mut running_status: u8 = 0;

    while cursor.position() < end {
        tick += u64::from(cursor.read_var_len()?);

        let status = if cursor.peek_u8()? & 0x80 != 0 {
            // Meta and sysex status bytes are remembered too, matching the
            // files this player was written against.
            running_status = cursor.read_u8()?;
            running_status
        } else {
            running_status
        };

        if let Some(kind) = decode_event(cursor, status)? {
            events.push(Event::new(tick, kind));
        }
    }

    // Trailing padding or decode drift is tolerated; the declared length wins.
    cursor.seek(end);
    Ok(Track::new(events))
}

/// Consumes the body of one event. Returns `None` when there is no usable
/// status byte yet (data byte before any status), in which case nothing is read.
fn decode_event(cursor: &mut ByteCursor<'_>, status: u8) -> Result<Option<EventKind>> {
    let kind = match status & 0xF0 {
        0x80 => {
            let note = cursor.read_u8()?;
            let velocity = cursor.read_u8()?;
            EventKind::NoteOff { note, velocity }
        }
        0x90 => {
            let note = cursor.read_u8()?;
            let velocity = cursor.read_u8()?;
            EventKind::NoteOn { note, velocity }
        }
        0xC0 | 0xD0 => {
            cursor.skip(1)?;
            EventKind::Other
        }
        0xA0 | 0xB0 | 0xE0 => {
            cursor.skip(2)?;
            EventKind::Other
        }
        0xF0 => {
            if status == 0xFF {
                let _meta_type = cursor.read_u8()?;
            }
            let len = cursor.read_var_len()? as usize;
            cursor.skip(len)?;
            EventKind::Other
        }
        _ => {
            debug!(
                "Data byte at offset {} with no running status, skipping",
                cursor.position()
            );
            return Ok(None);
        }
    };
    Ok(Some(kind))
}
