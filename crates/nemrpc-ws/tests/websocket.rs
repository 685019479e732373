//! End-to-end test against a local WebSocket server acting as the node.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use nemrpc_core::{Command, Frame, Headers};
use nemrpc_ws::{StreamClient, StreamConfig};

async fn read_frame<S>(ws: &mut S) -> Frame
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match ws.next().await.expect("client hung up").expect("ws error") {
            Message::Text(text) => return Frame::decode_strict(text.as_bytes()).unwrap(),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn subscribe_height_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let node = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

        let connect = read_frame(&mut ws).await;
        assert_eq!(connect.command, Command::Connect);
        assert_eq!(connect.headers.get("host"), Some("127.0.0.1"));
        ws.send(Message::Text("CONNECTED\nversion:1.2\n\n\0".into()))
            .await
            .unwrap();

        let subscribe = read_frame(&mut ws).await;
        assert_eq!(subscribe.command, Command::Subscribe);
        assert_eq!(subscribe.headers.destination(), Some("/blocks/new"));
        let id = subscribe.headers.get("id").unwrap().to_string();

        let block = Frame::new(Command::Message)
            .with_headers(
                Headers::new()
                    .with("subscription", &id)
                    .with("destination", "/blocks/new"),
            )
            .with_body(serde_json::json!({ "height": 1_234_567 }));
        ws.send(Message::Text(block.encode().into())).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let config = StreamConfig {
        port,
        handshake_timeout_ms: 2_000,
        ..StreamConfig::default()
    };
    let client = StreamClient::new("http://127.0.0.1:7890", config);
    let mut blocks = client.subscribe_height().await.unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), blocks.next())
        .await
        .unwrap()
        .expect("no block frame");
    assert_eq!(frame.command, Command::Message);
    assert_eq!(
        frame.body_as::<serde_json::Value>().unwrap()["height"],
        1_234_567
    );

    let end = tokio::time::timeout(Duration::from_secs(5), blocks.next())
        .await
        .unwrap();
    assert!(end.is_none(), "stream should end when the node closes");

    node.await.unwrap();
}

#[tokio::test]
async fn unreachable_node_fails_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = StreamClient::new(
        "http://127.0.0.1:7890",
        StreamConfig {
            port,
            ..StreamConfig::default()
        },
    );
    let err = client.subscribe_errors().await.unwrap_err();
    assert!(matches!(
        err,
        nemrpc_core::StreamError::HandshakeFailed { .. }
    ));
}
