/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Point-to-point notification frame codec.
//!
//! ```text
//! ┌─────┬────────┬─────────┬──────────────┬──────────────┬─────┐
//! │ '!' │ device │ command │ payload 0–10 │ checksum ddd │ '#' │
//! └─────┴────────┴─────────┴──────────────┴──────────────┴─────┘
//!   0      1        2         3..N           3 ASCII digits
//! ```
//!
//! The checksum is the byte sum of device, command and payload, modulo 1000,
//! written as three zero-padded decimal digits.  On a byte stream every frame
//! is followed by `'\n'` (see [`write_frame`] / [`read_frame`]), so line
//! terminators are reserved in every field.

use std::io::{BufRead, Write};

use thiserror::Error;

// ── Constants ─────────────────────────────────────────────────────────────────

pub const SYNC_SYMBOL: u8 = b'!';
pub const END_SYMBOL: u8 = b'#';
pub const MAX_PAYLOAD_LEN: usize = 10;

const CHECKSUM_DIGITS: usize = 3;
const CHECKSUM_MODULUS: u32 = 1000;
/// Sync + device + command + checksum + end.
const MIN_FRAME_LEN: usize = 3 + CHECKSUM_DIGITS + 1;
const MAX_FRAME_LEN: usize = MIN_FRAME_LEN + MAX_PAYLOAD_LEN;

// ── Error type ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload is {len} bytes, at most {} allowed", MAX_PAYLOAD_LEN)]
    PayloadTooLong { len: usize },

    #[error("payload byte {byte:#04x} is reserved")]
    ReservedPayloadByte { byte: u8 },

    #[error("{field} byte {byte:#04x} is a line terminator")]
    ReservedHeaderByte { field: &'static str, byte: u8 },

    #[error("frame is {len} bytes, expected {}..={}", MIN_FRAME_LEN, MAX_FRAME_LEN)]
    BadLength { len: usize },

    #[error("frame does not start with '!'")]
    MissingSync,

    #[error("frame does not end with '#'")]
    MissingEnd,

    #[error("checksum field is not three decimal digits")]
    MalformedChecksum,

    #[error("checksum mismatch: computed {computed:03}, received {received:03}")]
    ChecksumMismatch { computed: u16, received: u16 },

    #[error("frame transport I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

// ── Frame ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub device_id: u8,
    pub command: u8,
    payload: Vec<u8>,
}

impl Frame {
    /// Build a frame, validating header and payload.
    ///
    /// # Errors
    /// * [`FrameError::ReservedHeaderByte`] for a `'\n'` or `'\r'` device id
    ///   or command.
    /// * [`FrameError::PayloadTooLong`] for more than [`MAX_PAYLOAD_LEN`] bytes.
    /// * [`FrameError::ReservedPayloadByte`] for `'\0'`, `'!'`, `'#'` or `'\n'`.
    pub fn new(device_id: u8, command: u8, payload: &[u8]) -> Result<Self, FrameError> {
        validate_header(device_id, command)?;
        validate_payload(payload)?;
        Ok(Self {
            device_id,
            command,
            payload: payload.to_vec(),
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Serialise to wire bytes (without the trailing newline).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MIN_FRAME_LEN + self.payload.len());
        buf.push(SYNC_SYMBOL);
        buf.push(self.device_id);
        buf.push(self.command);
        buf.extend_from_slice(&self.payload);

        let sum = checksum(&buf[1..]);
        buf.extend_from_slice(format!("{sum:03}").as_bytes());
        buf.push(END_SYMBOL);
        buf
    }

    /// Parse and validate wire bytes.  A frame failing any check is rejected
    /// as a whole.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let len = bytes.len();
        if !(MIN_FRAME_LEN..=MAX_FRAME_LEN).contains(&len) {
            return Err(FrameError::BadLength { len });
        }
        if bytes[0] != SYNC_SYMBOL {
            return Err(FrameError::MissingSync);
        }
        if bytes[len - 1] != END_SYMBOL {
            return Err(FrameError::MissingEnd);
        }

        let checksum_start = len - 1 - CHECKSUM_DIGITS;
        let received = parse_checksum(&bytes[checksum_start..len - 1])?;
        let computed = checksum(&bytes[1..checksum_start]);
        if computed != received {
            return Err(FrameError::ChecksumMismatch { computed, received });
        }

        Frame::new(bytes[1], bytes[2], &bytes[3..checksum_start])
    }
}

/// Byte sum of `bytes` modulo 1000.
pub fn checksum(bytes: &[u8]) -> u16 {
    let sum: u32 = bytes.iter().map(|&b| u32::from(b)).sum();
    // < 1000, always fits
    (sum % CHECKSUM_MODULUS) as u16
}

/// Check that `device_id` and `command` can travel on the line transport.
pub fn validate_header(device_id: u8, command: u8) -> Result<(), FrameError> {
    for (field, byte) in [("device id", device_id), ("command", command)] {
        if matches!(byte, b'\n' | b'\r') {
            return Err(FrameError::ReservedHeaderByte { field, byte });
        }
    }
    Ok(())
}

fn validate_payload(payload: &[u8]) -> Result<(), FrameError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLong { len: payload.len() });
    }
    match payload
        .iter()
        .find(|&&b| matches!(b, 0 | SYNC_SYMBOL | END_SYMBOL | b'\n'))
    {
        Some(&byte) => Err(FrameError::ReservedPayloadByte { byte }),
        None => Ok(()),
    }
}

fn parse_checksum(digits: &[u8]) -> Result<u16, FrameError> {
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(FrameError::MalformedChecksum);
    }
    Ok(digits
        .iter()
        .fold(0u16, |acc, &d| acc * 10 + u16::from(d - b'0')))
}

// ── Stream transport ──────────────────────────────────────────────────────────

/// Write `frame` followed by `'\n'` and flush.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, frame: &Frame) -> Result<(), FrameError> {
    let mut line = frame.encode();
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
}

/// Read one newline-terminated frame.
///
/// Returns `Ok(None)` at end of input.  A trailing `'\r'` is tolerated.
pub fn read_frame<R: BufRead + ?Sized>(reader: &mut R) -> Result<Option<Frame>, FrameError> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
    Frame::decode(&line).map(Some)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
