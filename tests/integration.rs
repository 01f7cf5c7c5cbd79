//! Integration tests against a scripted in-process TCP server.
//!
//! Each test binds a listener on an ephemeral port and plays the server
//! side of the protocol by hand: handshake, then scripted frame exchanges.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use dfhack_client::protocol::{
    build_frame, Header, HEADER_SIZE, REQUEST_MAGIC, RESPONSE_MAGIC, RPC_REPLY_FAIL,
    RPC_REPLY_RESULT, RPC_REPLY_TEXT,
};
use dfhack_client::{Client, DfhackError};

/// Build a client pointed at the listener with test-friendly timeouts.
fn client_for(addr: std::net::SocketAddr) -> Client {
    Client::builder()
        .host("127.0.0.1")
        .port(addr.port())
        .read_timeout(Duration::from_millis(50))
        .response_timeout(Duration::from_millis(500))
        .build()
}

/// Play the server side of the handshake.
async fn serve_handshake(stream: &mut TcpStream) {
    let mut buf = [0u8; 12];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf[..8], REQUEST_MAGIC);
    assert_eq!(i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]), 1);

    let mut resp = RESPONSE_MAGIC.to_vec();
    resp.extend_from_slice(&1i32.to_le_bytes());
    stream.write_all(&resp).await.unwrap();
}

/// Read one request frame, returning its id and payload.
async fn read_request(stream: &mut TcpStream) -> (i16, Vec<u8>) {
    let mut header = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header).await.unwrap();
    let decoded = Header::decode(&header);

    let mut payload = vec![0u8; decoded.size as usize];
    stream.read_exact(&mut payload).await.unwrap();
    (decoded.id, payload)
}

#[tokio::test]
async fn end_to_end_bind_then_call() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        serve_handshake(&mut stream).await;

        // BindMethod request for GetVersion, answered with id 5.
        let (id, payload) = read_request(&mut stream).await;
        assert_eq!(id, 0);
        let request: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(request["method"], "GetVersion");
        assert_eq!(request["input_msg"], "dfproto.EmptyMessage");
        assert_eq!(request["output_msg"], "dfproto.StringMessage");

        let reply = serde_json::to_vec(&json!({"assigned_id": 5})).unwrap();
        stream
            .write_all(&build_frame(RPC_REPLY_RESULT, &reply))
            .await
            .unwrap();

        // The bound call, answered with two TEXT frames and a RESULT.
        let (id, _payload) = read_request(&mut stream).await;
        assert_eq!(id, 5);

        let mut burst = build_frame(RPC_REPLY_TEXT, b"hello ");
        burst.extend(build_frame(RPC_REPLY_TEXT, b"world"));
        let output = serde_json::to_vec(&json!({"value": "1.0.0"})).unwrap();
        burst.extend(build_frame(RPC_REPLY_RESULT, &output));
        stream.write_all(&burst).await.unwrap();

        // Teardown: a zero-size QUIT frame.
        let mut header = [0u8; HEADER_SIZE];
        stream.read_exact(&mut header).await.unwrap();
        let quit = Header::decode(&header);
        assert!(quit.is_quit());
        assert_eq!(quit.size, 0);
    });

    let mut client = client_for(addr);
    let (output, text) = client.call_empty("GetVersion").await.unwrap();

    assert_eq!(output.get("value").unwrap(), "1.0.0");
    assert_eq!(output.type_name(), "dfproto.StringMessage");
    assert_eq!(text, "hello world");

    client.close().await;
    server.await.unwrap();
}

#[tokio::test]
async fn binding_twice_is_one_wire_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        serve_handshake(&mut stream).await;

        // Exactly one bind exchange is served; any further request from
        // the client would hit the closing assertion below.
        let (id, _) = read_request(&mut stream).await;
        assert_eq!(id, 0);
        let reply = serde_json::to_vec(&json!({"assigned_id": 12})).unwrap();
        stream
            .write_all(&build_frame(RPC_REPLY_RESULT, &reply))
            .await
            .unwrap();

        // Nothing but EOF may follow.
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty(), "unexpected extra traffic: {rest:?}");
    });

    let mut client = client_for(addr);

    let first = client.bind_method("GetDFVersion", None, None, None).await.unwrap();
    assert_eq!(first.assigned_id, Some(12));

    // Pure cache hit: no frames cross the wire.
    let second = client.bind_method("GetDFVersion", None, None, None).await.unwrap();
    assert_eq!(second, first);

    drop(client);
    server.await.unwrap();
}

#[tokio::test]
async fn fail_reply_surfaces_remote_error_code() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        serve_handshake(&mut stream).await;

        let (id, _) = read_request(&mut stream).await;
        assert_eq!(id, 1); // RunCommand

        // FAIL packs the error code into the header's size field.
        stream
            .write_all(&Header::new(RPC_REPLY_FAIL, 2).encode())
            .await
            .unwrap();
    });

    let mut client = client_for(addr);
    let result = client.run_command("no-such-command", &["x"]).await;

    match result {
        Err(DfhackError::Remote { code }) => assert_eq!(code, 2),
        other => panic!("expected Remote error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn burst_without_terminal_is_a_protocol_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        serve_handshake(&mut stream).await;

        let _ = read_request(&mut stream).await;
        // One TEXT frame, then silence; the idle gap ends the burst.
        stream
            .write_all(&build_frame(RPC_REPLY_TEXT, b"just text"))
            .await
            .unwrap();
        // Hold the socket open past the client's read timeout.
        tokio::time::sleep(Duration::from_millis(300)).await;
    });

    let mut client = client_for(addr);
    let result = client.run_command("ls", &[]).await;

    match result {
        Err(DfhackError::Protocol(msg)) => assert!(msg.contains("terminal")),
        other => panic!("expected Protocol error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        serve_handshake(&mut stream).await;

        let _ = read_request(&mut stream).await;
        // Never reply; keep the socket open so no EOF arrives.
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let mut client = client_for(addr);
    let result = client.run_command("ls", &[]).await;

    assert!(matches!(result, Err(DfhackError::Timeout(_))));
}

#[tokio::test]
async fn handshake_with_wrong_magic_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 12];
        stream.read_exact(&mut buf).await.unwrap();

        let mut resp = b"BadMagic".to_vec();
        resp.extend_from_slice(&1i32.to_le_bytes());
        stream.write_all(&resp).await.unwrap();
    });

    let mut client = client_for(addr);
    let result = client.open().await;

    match result {
        Err(DfhackError::Connection(msg)) => assert!(msg.contains("handshake")),
        other => panic!("expected Connection error, got {:?}", other.err()),
    }
    assert!(!client.is_open());
}

#[tokio::test]
async fn close_resets_bindings_and_is_idempotent() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        serve_handshake(&mut stream).await;

        let (id, _) = read_request(&mut stream).await;
        assert_eq!(id, 0);
        let reply = serde_json::to_vec(&json!({"assigned_id": 7})).unwrap();
        stream
            .write_all(&build_frame(RPC_REPLY_RESULT, &reply))
            .await
            .unwrap();

        // Drain the QUIT frame.
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
    });

    let mut client = client_for(addr);
    client.bind_method("GetVersion", None, None, None).await.unwrap();
    assert!(client.binding("GetVersion").unwrap().is_bound());

    // Assigned ids do not survive the connection.
    client.close().await;
    assert!(!client.binding("GetVersion").unwrap().is_bound());
    // Reserved ids do.
    assert_eq!(client.binding("BindMethod").unwrap().assigned_id, Some(0));

    // Double close and closing a never-opened client are both no-ops.
    client.close().await;
    let mut fresh = Client::builder().host("127.0.0.1").port(1).build();
    fresh.close().await;
}
