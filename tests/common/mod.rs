#![allow(dead_code)]

/// Appends a variable-length quantity, at most 4 bytes (values below 2^28)
pub fn write_var_len(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 4];
    let mut i = 3;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}

/// Header chunk with the standard 6-byte body
pub fn header(format: u16, tracks: u16, division: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&format.to_be_bytes());
    out.extend_from_slice(&tracks.to_be_bytes());
    out.extend_from_slice(&division.to_be_bytes());
    out
}

/// Track chunk wrapping already-encoded event bytes
pub fn track_chunk(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// A complete format-1 file from raw track bodies
pub fn smf(division: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = header(1, tracks.len() as u16, division);
    for body in tracks {
        out.extend(track_chunk(body));
    }
    out
}

/// Track body of note-on events, each given as (delta, note, velocity), ending in end-of-track
pub fn note_on_track(notes: &[(u32, u8, u8)]) -> Vec<u8> {
    let mut body = Vec::new();
    for &(delta, note, velocity) in notes {
        write_var_len(&mut body, delta);
        body.extend_from_slice(&[0x90, note, velocity]);
    }
    body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
    body
}
