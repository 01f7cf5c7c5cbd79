//! # dfhack-client
//!
//! Rust client for the DFHack remote API wire protocol.
//!
//! ## Protocol
//!
//! 1. **Handshake**: the client opens a TCP connection and sends a 12-byte
//!    handshake (`"DFHack?\n"` + version); the server answers with
//!    `"DFHack!\n"` + version. Only version 1 is supported.
//! 2. **Interaction**: requests and replies are frames, an 8-byte header
//!    (id + size) followed by the encoded message. Every callable method
//!    has a server-assigned non-negative id; id 0 is reserved for
//!    `BindMethod`, which resolves any other method by name, and id 1 for
//!    `RunCommand`. A reply burst is zero or more TEXT notification frames
//!    followed by exactly one RESULT or FAIL frame. As a special exception,
//!    a FAIL header's size field holds the error code directly.
//! 3. **Disconnect**: the client sends a zero-size QUIT frame and closes
//!    the socket.
//!
//! ## Example
//!
//! ```ignore
//! use dfhack_client::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client = Client::builder().host("localhost").port(5000).build();
//!     let (version, _) = client.call_empty("GetVersion").await.unwrap();
//!     println!("{}", version.get("value").unwrap());
//!     client.close().await;
//! }
//! ```

pub mod codec;
pub mod error;
pub mod methods;
pub mod protocol;
pub mod registry;
pub mod transport;

mod client;

pub use client::{Client, ClientBuilder};
pub use codec::{JsonCodec, MessageCodec, TypedMessage};
pub use error::{DfhackError, Result};
pub use methods::MethodTable;
pub use registry::MethodBinding;
