//! Client and builder: the remote-call engine.
//!
//! The [`Client`] drives one call at a time over one connection: resolve
//! the method name to a wire id (binding it through `BindMethod` on first
//! use), validate and encode the input, send the request frame, then
//! demultiplex the response burst into notification text and a single
//! terminal result or failure.
//!
//! # Example
//!
//! ```ignore
//! use dfhack_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::builder().port(5000).build();
//!
//!     let (version, _text) = client.call_empty("GetVersion").await?;
//!     println!("DFHack {}", version.get("value").unwrap());
//!
//!     let (_out, text) = client.run_command("ls", &[]).await?;
//!     println!("{text}");
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use bytes::BytesMut;
use serde_json::{json, Map, Value};

use crate::codec::{JsonCodec, MessageCodec, TypedMessage};
use crate::error::{DfhackError, Result};
use crate::methods::{MethodTable, BIND_METHOD, RUN_COMMAND};
use crate::protocol::{build_frame, Frame};
use crate::registry::{MethodBinding, MethodRegistry};
use crate::transport::{Transport, TransportConfig};

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    config: TransportConfig,
    table: MethodTable,
    codec: Option<Box<dyn MessageCodec + Send>>,
}

impl ClientBuilder {
    /// Create a builder with defaults: localhost:5000, the core method
    /// table, and the JSON codec.
    pub fn new() -> Self {
        Self {
            config: TransportConfig::default(),
            table: MethodTable::core(),
            codec: None,
        }
    }

    /// Set the server host.
    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the per-read timeout that also ends a burst on an idle gap.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the bound on total wait while zero response bytes have arrived.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Set the per-read buffer size.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Replace the method seed table.
    pub fn method_table(mut self, table: MethodTable) -> Self {
        self.table = table;
        self
    }

    /// Replace the message codec.
    pub fn codec(mut self, codec: impl MessageCodec + Send + 'static) -> Self {
        self.codec = Some(Box::new(codec));
        self
    }

    /// Build the client. No connection is made until the first call.
    pub fn build(self) -> Client {
        let codec = self
            .codec
            .unwrap_or_else(|| Box::new(JsonCodec::for_table(&self.table)));
        Client {
            transport: Transport::new(self.config),
            registry: MethodRegistry::new(&self.table),
            codec,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for one connection to a remote core.
///
/// All calls are strictly sequential; `&mut self` throughout enforces the
/// one-call-at-a-time contract of the shared socket.
pub struct Client {
    transport: Transport,
    registry: MethodRegistry,
    codec: Box<dyn MessageCodec + Send>,
}

impl Client {
    /// Create a client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings.
    pub fn new() -> Self {
        ClientBuilder::new().build()
    }

    /// Open the connection and perform the handshake. Calls open lazily,
    /// so this is only needed to fail fast on connection problems.
    pub async fn open(&mut self) -> Result<()> {
        self.transport.open().await
    }

    /// Check if the connection is currently open.
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Close the connection and drop all non-reserved id assignments.
    ///
    /// Idempotent; assigned ids are a property of the connection and do
    /// not survive a reopen.
    pub async fn close(&mut self) {
        self.transport.close().await;
        self.registry.reset();
    }

    /// Look up a binding by method name.
    pub fn binding(&self, method: &str) -> Option<&MethodBinding> {
        self.registry.lookup(method)
    }

    /// Call a remote method with a typed input.
    ///
    /// Resolves the method through the registry, binding it first when it
    /// has no wire id yet. Returns the decoded output and the accumulated
    /// notification text.
    pub async fn call(
        &mut self,
        method: &str,
        input: TypedMessage,
    ) -> Result<(TypedMessage, String)> {
        let binding = self
            .registry
            .lookup(method)
            .cloned()
            .ok_or_else(|| DfhackError::UnboundMethod(method.to_string()))?;

        let binding = if binding.is_bound() {
            binding
        } else {
            self.bind_method(method, None, None, None).await?
        };

        self.dispatch(&binding, input).await
    }

    /// Call a remote method with an empty input message.
    pub async fn call_empty(&mut self, method: &str) -> Result<(TypedMessage, String)> {
        let input = self
            .registry
            .lookup(method)
            .map(|b| TypedMessage::empty(&b.input))
            .ok_or_else(|| DfhackError::UnboundMethod(method.to_string()))?;
        self.call(method, input).await
    }

    /// Call a remote method with plain key/value input, returning the
    /// output as a plain map.
    pub async fn call_dict(
        &mut self,
        method: &str,
        fields: Map<String, Value>,
    ) -> Result<(Map<String, Value>, String)> {
        let input = self
            .registry
            .lookup(method)
            .map(|b| TypedMessage::from_map(&b.input, fields))
            .ok_or_else(|| DfhackError::UnboundMethod(method.to_string()))?;

        let (output, text) = self.call(method, input).await?;
        Ok((output.to_map()?, text))
    }

    /// Resolve a method name to a server-assigned wire id.
    ///
    /// No wire traffic when the method is already bound. Omitted type and
    /// plugin arguments are filled from the registry's seed entry; a name
    /// with no seed entry needs both types supplied explicitly.
    pub async fn bind_method(
        &mut self,
        method: &str,
        input: Option<&str>,
        output: Option<&str>,
        plugin: Option<&str>,
    ) -> Result<MethodBinding> {
        let seed = self.registry.lookup(method).cloned();
        if let Some(binding) = &seed {
            if binding.is_bound() {
                tracing::debug!(method, id = ?binding.assigned_id, "method already bound");
                return Ok(binding.clone());
            }
        }

        let input = input
            .map(str::to_string)
            .or_else(|| seed.as_ref().map(|s| s.input.clone()))
            .ok_or_else(|| DfhackError::UnknownMethod(method.to_string()))?;
        let output = output
            .map(str::to_string)
            .or_else(|| seed.as_ref().map(|s| s.output.clone()))
            .ok_or_else(|| DfhackError::UnknownMethod(method.to_string()))?;
        let plugin = plugin
            .map(str::to_string)
            .or_else(|| seed.as_ref().and_then(|s| s.plugin.clone()));

        // Both type names must resolve before anything is sent.
        self.codec.resolve(&input)?;
        self.codec.resolve(&output)?;

        tracing::info!(method, "binding remote method");

        let bind = self
            .registry
            .lookup(BIND_METHOD)
            .cloned()
            .ok_or_else(|| DfhackError::UnboundMethod(BIND_METHOD.to_string()))?;
        let request = TypedMessage::new(
            &bind.input,
            json!({
                "method": method,
                "input_msg": input,
                "output_msg": output,
                "plugin": plugin,
            }),
        );

        let (reply, _text) = self.dispatch(&bind, request).await?;

        let assigned = reply
            .get("assigned_id")
            .and_then(Value::as_i64)
            .and_then(|id| i16::try_from(id).ok())
            .ok_or_else(|| {
                DfhackError::Protocol("bind reply carried no usable assigned_id".to_string())
            })?;

        Ok(self
            .registry
            .record(method, &input, &output, plugin.as_deref(), assigned)
            .clone())
    }

    /// Bind every currently-unbound method in the registry.
    ///
    /// The first failure aborts the remaining batch and is surfaced.
    pub async fn bind_all(&mut self) -> Result<()> {
        for method in self.registry.unbound() {
            self.bind_method(&method, None, None, None).await?;
        }
        Ok(())
    }

    /// Run a console command remotely via the reserved `RunCommand` id.
    pub async fn run_command(
        &mut self,
        command: &str,
        arguments: &[&str],
    ) -> Result<(TypedMessage, String)> {
        tracing::info!(command, ?arguments, "running remote command");

        let binding = self
            .registry
            .lookup(RUN_COMMAND)
            .cloned()
            .ok_or_else(|| DfhackError::UnboundMethod(RUN_COMMAND.to_string()))?;
        let input = TypedMessage::new(
            &binding.input,
            json!({
                "command": command,
                "arguments": arguments,
            }),
        );

        self.dispatch(&binding, input).await
    }

    /// Execute one call against an already-resolved binding.
    async fn dispatch(
        &mut self,
        binding: &MethodBinding,
        input: TypedMessage,
    ) -> Result<(TypedMessage, String)> {
        let id = binding
            .assigned_id
            .ok_or_else(|| DfhackError::UnboundMethod(binding.method.clone()))?;

        if input.type_name() != binding.input {
            return Err(DfhackError::TypeMismatch {
                method: binding.method.clone(),
                expected: binding.input.clone(),
                actual: input.type_name().to_string(),
            });
        }

        tracing::debug!(method = %binding.method, id, "calling remote method");

        let payload = self.codec.encode(&input)?;
        let request = build_frame(id, &payload);
        let frames = self.transport.request(&request).await?;

        collect_reply(self.codec.as_ref(), &binding.output, frames)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Demultiplex a response burst into notification text and the terminal
/// result.
///
/// TEXT payload bytes accumulate in order; exactly one RESULT is decoded
/// as the binding's output type; FAIL fails the call with the error code
/// from its header; any other id is a protocol violation, as is a second
/// terminal frame or a burst with none.
fn collect_reply(
    codec: &dyn MessageCodec,
    output_type: &str,
    frames: Vec<Frame>,
) -> Result<(TypedMessage, String)> {
    let mut result = None;
    let mut text = BytesMut::new();

    for frame in frames {
        if frame.is_result() {
            if result.is_some() {
                return Err(DfhackError::Protocol(
                    "second RESULT frame in one response".to_string(),
                ));
            }
            result = Some(codec.decode(output_type, frame.payload())?);
        } else if frame.is_fail() {
            return Err(DfhackError::Remote {
                code: frame.fail_code().unwrap_or(0),
            });
        } else if frame.is_text() {
            text.extend_from_slice(frame.payload());
        } else {
            return Err(DfhackError::Protocol(format!(
                "unexpected frame id {} in response",
                frame.id()
            )));
        }
    }

    let output = result.ok_or_else(|| {
        DfhackError::Protocol("response burst ended without a terminal frame".to_string())
    })?;
    Ok((output, String::from_utf8_lossy(&text).into_owned()))
}
