//! Wire format encoding and decoding.
//!
//! Implements the two fixed-size wire structures:
//!
//! ```text
//! Handshake (12 bytes)              Message header (8 bytes)
//! ┌──────────┬───────────┐          ┌──────────┬──────────┬──────────┐
//! │ Magic    │ Version   │          │ Id       │ Padding  │ Size     │
//! │ 8 bytes  │ 4 bytes   │          │ 2 bytes  │ 2 bytes  │ 4 bytes  │
//! │ ASCII    │ int32 LE  │          │ int16 LE │ zeros    │ int32 LE │
//! └──────────┴───────────┘          └──────────┴──────────┴──────────┘
//! ```
//!
//! All multi-byte integers are Little Endian. The header's `size` field is
//! the payload length for every id except [`RPC_REPLY_FAIL`], where the wire
//! protocol overloads it to carry an error code directly. That special case
//! is handled during frame splitting, not here.

use crate::error::{DfhackError, Result};

/// Handshake size in bytes (fixed, exactly 12).
pub const HANDSHAKE_SIZE: usize = 12;

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Magic tag of the client-sent handshake request.
pub const REQUEST_MAGIC: &[u8; 8] = b"DFHack?\n";

/// Magic tag of the server-sent handshake response.
pub const RESPONSE_MAGIC: &[u8; 8] = b"DFHack!\n";

/// The only protocol version supported end-to-end.
pub const PROTOCOL_VERSION: i32 = 1;

/// Reply id: terminal frame carrying the call's encoded output.
pub const RPC_REPLY_RESULT: i16 = -1;

/// Reply id: terminal frame signalling failure; `size` holds the error code.
pub const RPC_REPLY_FAIL: i16 = -2;

/// Reply id: non-terminal frame carrying notification text bytes.
pub const RPC_REPLY_TEXT: i16 = -3;

/// Request id: zero-payload teardown frame sent before closing the socket.
pub const RPC_REQUEST_QUIT: i16 = -4;

/// Reserved method id for BindMethod (never rebound).
pub const BIND_METHOD_ID: i16 = 0;

/// Reserved method id for RunCommand (never rebound).
pub const RUN_COMMAND_ID: i16 = 1;

/// Decoded handshake from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    /// One of the two recognized magic tags.
    pub magic: [u8; 8],
    /// Protocol version, must be in [1, 255].
    pub version: i32,
}

impl Handshake {
    /// The handshake the client sends when opening a connection.
    pub fn request() -> Self {
        Self {
            magic: *REQUEST_MAGIC,
            version: PROTOCOL_VERSION,
        }
    }

    /// Encode handshake to bytes (Little Endian version).
    pub fn encode(&self) -> [u8; HANDSHAKE_SIZE] {
        let mut buf = [0u8; HANDSHAKE_SIZE];
        buf[0..8].copy_from_slice(&self.magic);
        buf[8..12].copy_from_slice(&self.version.to_le_bytes());
        buf
    }

    /// Decode and validate a handshake.
    ///
    /// Short input is zero-padded before validation, mirroring the lenient
    /// parse of the header path; a padded magic will not match either tag
    /// and still fails cleanly.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut padded = [0u8; HANDSHAKE_SIZE];
        let n = buf.len().min(HANDSHAKE_SIZE);
        padded[..n].copy_from_slice(&buf[..n]);

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&padded[0..8]);
        let version = i32::from_le_bytes([padded[8], padded[9], padded[10], padded[11]]);

        if &magic != REQUEST_MAGIC && &magic != RESPONSE_MAGIC {
            return Err(DfhackError::Protocol(format!(
                "unrecognized handshake magic {:?}",
                String::from_utf8_lossy(&magic)
            )));
        }
        if !(1..=255).contains(&version) {
            return Err(DfhackError::Protocol(format!(
                "handshake version {} outside [1, 255]",
                version
            )));
        }

        Ok(Self { magic, version })
    }
}

/// Decoded message header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Non-negative server-assigned method id, or one of the sentinel ids.
    pub id: i16,
    /// Payload byte length, except for FAIL where it is the error code.
    pub size: i32,
}

impl Header {
    /// Create a new header.
    pub fn new(id: i16, size: i32) -> Self {
        Self { id, size }
    }

    /// Encode header to bytes (Little Endian, 2 reserved zero bytes).
    ///
    /// # Example
    ///
    /// ```
    /// use dfhack_client::protocol::Header;
    ///
    /// let bytes = Header::new(5, 100).encode();
    /// assert_eq!(bytes.len(), 8);
    /// assert_eq!(&bytes[2..4], &[0, 0]);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.id.to_le_bytes());
        // bytes 2..4 are reserved padding, always zero
        buf[4..8].copy_from_slice(&self.size.to_le_bytes());
        buf
    }

    /// Decode header from bytes (Little Endian).
    ///
    /// Short input is zero-padded rather than rejected.
    pub fn decode(buf: &[u8]) -> Self {
        let mut padded = [0u8; HEADER_SIZE];
        let n = buf.len().min(HEADER_SIZE);
        padded[..n].copy_from_slice(&buf[..n]);

        Self {
            id: i16::from_le_bytes([padded[0], padded[1]]),
            size: i32::from_le_bytes([padded[4], padded[5], padded[6], padded[7]]),
        }
    }

    /// Check if this is a RESULT reply.
    #[inline]
    pub fn is_result(&self) -> bool {
        self.id == RPC_REPLY_RESULT
    }

    /// Check if this is a FAIL reply.
    #[inline]
    pub fn is_fail(&self) -> bool {
        self.id == RPC_REPLY_FAIL
    }

    /// Check if this is a TEXT notification.
    #[inline]
    pub fn is_text(&self) -> bool {
        self.id == RPC_REPLY_TEXT
    }

    /// Check if this is a QUIT request.
    #[inline]
    pub fn is_quit(&self) -> bool {
        self.id == RPC_REQUEST_QUIT
    }

    /// Check if this header ends a call (RESULT or FAIL).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.is_result() || self.is_fail()
    }
}
