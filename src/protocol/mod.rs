//! Protocol module - wire framing for the DFHack remote API.
//!
//! Pure encode/decode with no I/O:
//! - [`wire_format`]: handshake and message header layouts, sentinel ids
//! - [`frame`]: one header + payload unit
//! - [`burst`]: splitting a response burst into frames

mod burst;
mod frame;
mod wire_format;

pub use burst::{split_frames, BurstScanner, DEFAULT_MAX_PAYLOAD_SIZE};
pub use frame::{build_frame, quit_frame, Frame};
pub use wire_format::{
    Handshake, Header, BIND_METHOD_ID, HANDSHAKE_SIZE, HEADER_SIZE, PROTOCOL_VERSION,
    REQUEST_MAGIC, RESPONSE_MAGIC, RPC_REPLY_FAIL, RPC_REPLY_RESULT, RPC_REPLY_TEXT,
    RPC_REQUEST_QUIT, RUN_COMMAND_ID,
};
