//! Burst scanner for splitting a response byte stream into frames.
//!
//! A response burst is a concatenation of zero or more frames with no
//! delimiter beyond the embedded size fields. The scanner accumulates
//! partial reads in a `BytesMut` and runs a small state machine:
//! - `WaitingForHeader`: need at least 8 bytes
//! - `WaitingForPayload`: header parsed, need N more payload bytes
//!
//! FAIL headers are special-cased before the size field is ever treated as
//! a payload length: the wire protocol packs the error code into `size`,
//! so a FAIL frame completes at the header with an empty payload.
//!
//! # Example
//!
//! ```
//! use dfhack_client::protocol::{build_frame, BurstScanner, RPC_REPLY_RESULT};
//!
//! let mut scanner = BurstScanner::new();
//! let frames = scanner.push(&build_frame(RPC_REPLY_RESULT, b"ok")).unwrap();
//! assert_eq!(frames.len(), 1);
//! assert!(frames[0].is_result());
//! ```

use bytes::{Bytes, BytesMut};

use super::frame::Frame;
use super::wire_format::{Header, HEADER_SIZE};
use crate::error::{DfhackError, Result};

/// Default maximum payload size accepted from the server (64 MB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: i32 = 64 * 1024 * 1024;

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for a complete header (need 8 bytes).
    WaitingForHeader,
    /// Header parsed, waiting for payload bytes.
    WaitingForPayload { header: Header, remaining: usize },
}

/// Buffer for accumulating socket reads and extracting complete frames.
pub struct BurstScanner {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum allowed payload size.
    max_payload_size: i32,
}

impl BurstScanner {
    /// Create a new scanner with the default payload limit.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD_SIZE)
    }

    /// Create a new scanner with a custom payload limit.
    pub fn with_max_payload(max_payload_size: i32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            state: State::WaitingForHeader,
            max_payload_size,
        }
    }

    /// Push data into the scanner and extract all complete frames.
    ///
    /// Partial data is buffered internally for the next push. The returned
    /// vector may be empty while a frame is still incomplete.
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if a non-FAIL header carries a negative size or a
    /// size above the configured maximum.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Try to extract a single frame from the buffer.
    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match &self.state {
            State::WaitingForHeader => {
                if self.buffer.len() < HEADER_SIZE {
                    return Ok(None);
                }

                let header = Header::decode(&self.buffer[..HEADER_SIZE]);
                let _ = self.buffer.split_to(HEADER_SIZE);

                // FAIL completes at the header; its size is an error code,
                // never a length to slice.
                if header.is_fail() {
                    return Ok(Some(Frame::new(header, Bytes::new())));
                }

                if header.size < 0 {
                    return Err(DfhackError::Protocol(format!(
                        "negative payload size {} for frame id {}",
                        header.size, header.id
                    )));
                }
                if header.size > self.max_payload_size {
                    return Err(DfhackError::Protocol(format!(
                        "payload size {} exceeds maximum {}",
                        header.size, self.max_payload_size
                    )));
                }

                if header.size == 0 {
                    return Ok(Some(Frame::new(header, Bytes::new())));
                }

                self.state = State::WaitingForPayload {
                    header,
                    remaining: header.size as usize,
                };
                self.try_extract_one()
            }

            State::WaitingForPayload { header, remaining } => {
                let remaining = *remaining;
                if self.buffer.len() < remaining {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(remaining).freeze();
                let header = *header;
                self.state = State::WaitingForHeader;

                Ok(Some(Frame::new(header, payload)))
            }
        }
    }

    /// Number of buffered bytes belonging to an incomplete frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
            + match &self.state {
                State::WaitingForHeader => 0,
                // Header already consumed from the buffer.
                State::WaitingForPayload { .. } => HEADER_SIZE,
            }
    }

    /// Check whether no incomplete frame data is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && matches!(self.state, State::WaitingForHeader)
    }
}

impl Default for BurstScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a complete burst into frames in one shot.
pub fn split_frames(burst: &[u8]) -> Result<Vec<Frame>> {
    let mut scanner = BurstScanner::new();
    let frames = scanner.push(burst)?;
    if !scanner.is_empty() {
        return Err(DfhackError::Protocol(format!(
            "{} trailing bytes after the last complete frame",
            scanner.pending()
        )));
    }
    Ok(frames)
}
