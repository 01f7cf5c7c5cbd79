//! Frame struct with typed accessors.
//!
//! A frame is one header plus its payload, the unit of both directions on
//! the wire. Uses `bytes::Bytes` for zero-copy payload sharing. FAIL and
//! QUIT frames carry no payload; a FAIL frame's header size holds the
//! remote error code instead of a length.
//!
//! # Example
//!
//! ```
//! use dfhack_client::protocol::{Frame, Header, RPC_REPLY_TEXT};
//! use bytes::Bytes;
//!
//! let frame = Frame::new(Header::new(RPC_REPLY_TEXT, 5), Bytes::from_static(b"hello"));
//! assert!(frame.is_text());
//! assert_eq!(frame.payload(), b"hello");
//! ```

use bytes::Bytes;

use super::wire_format::{Header, HEADER_SIZE, RPC_REQUEST_QUIT};

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (zero-copy via `bytes::Bytes`; empty for FAIL/QUIT).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Create a frame from header and raw bytes (copies data).
    pub fn from_parts(header: Header, payload: &[u8]) -> Self {
        Self {
            header,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    /// Get the frame id.
    #[inline]
    pub fn id(&self) -> i16 {
        self.header.id
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Check if this is a RESULT reply.
    #[inline]
    pub fn is_result(&self) -> bool {
        self.header.is_result()
    }

    /// Check if this is a FAIL reply.
    #[inline]
    pub fn is_fail(&self) -> bool {
        self.header.is_fail()
    }

    /// Check if this is a TEXT notification.
    #[inline]
    pub fn is_text(&self) -> bool {
        self.header.is_text()
    }

    /// Check if this frame ends a call (RESULT or FAIL).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.header.is_terminal()
    }

    /// Error code of a FAIL frame, taken from the header's size field.
    ///
    /// Returns `None` for any other frame kind.
    #[inline]
    pub fn fail_code(&self) -> Option<i32> {
        self.is_fail().then_some(self.header.size)
    }
}

/// Build a complete request frame as a single byte vector.
///
/// Encodes a header with `size = payload.len()` and appends the payload.
///
/// # Example
///
/// ```
/// use dfhack_client::protocol::{build_frame, HEADER_SIZE};
///
/// let bytes = build_frame(5, b"hello");
/// assert_eq!(bytes.len(), HEADER_SIZE + 5);
/// ```
pub fn build_frame(id: i16, payload: &[u8]) -> Vec<u8> {
    let header = Header::new(id, payload.len() as i32);
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    buf
}

/// Build the zero-payload QUIT frame sent during teardown.
pub fn quit_frame() -> Vec<u8> {
    build_frame(RPC_REQUEST_QUIT, &[])
}
