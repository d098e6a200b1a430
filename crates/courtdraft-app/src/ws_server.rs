// WebSocket server: command intake and change fan-out for draft viewers.

use std::sync::Arc;

use futures_util::stream::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::notify::{BroadcastSink, DraftEvent};
use crate::protocol;
use crate::registry::DraftRegistry;

/// Text frames buffered per connection before the reader waits.
const INBOUND_QUEUE: usize = 64;

/// Bind `127.0.0.1:{port}` and serve clients until the task is cancelled.
pub async fn run(
    port: u16,
    registry: Arc<DraftRegistry>,
    sink: Arc<BroadcastSink>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");
    serve(listener, registry, sink).await
}

/// Accept connections on `listener`, one task per client.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<DraftRegistry>,
    sink: Arc<BroadcastSink>,
) -> anyhow::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");

        let registry = Arc::clone(&registry);
        let events = sink.subscribe();
        tokio::spawn(async move {
            match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => handle_connection(ws, registry, events, addr_str).await,
                Err(e) => warn!("WebSocket handshake failed for {addr_str}: {e}"),
            }
        });
    }
}

/// Serve one client: replies to its commands and forwards every draft event.
async fn handle_connection<S>(
    ws: WebSocketStream<S>,
    registry: Arc<DraftRegistry>,
    mut events: broadcast::Receiver<DraftEvent>,
    addr: String,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    info!("Client {addr} connected");
    let (mut write, read) = ws.split();
    let (tx, mut rx) = mpsc::channel::<String>(INBOUND_QUEUE);

    let reader_addr = addr.clone();
    let reader = tokio::spawn(async move {
        let _ = process_message_stream(read, &tx, &reader_addr).await;
    });

    loop {
        tokio::select! {
            text = rx.recv() => {
                let Some(text) = text else { break };
                let reply = protocol::handle_text(&registry, &text).await;
                if send_json(&mut write, &reply).await.is_err() {
                    break;
                }
            }

            event = events.recv() => match event {
                Ok(event) => {
                    if send_json(&mut write, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client {addr} lagged behind, skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    reader.abort();
    info!("Client {addr} disconnected");
}

async fn send_json<W, T>(write: &mut W, value: &T) -> Result<(), ()>
where
    W: Sink<Message> + Unpin,
    T: Serialize,
{
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to serialize outbound message: {e}");
            return Ok(());
        }
    };
    write.send(Message::Text(text.into())).await.map_err(|_| {
        debug!("Outbound send failed; client gone");
    })
}

/// Forward text payloads from any [`Stream`] of WebSocket messages through
/// `tx`. Returns `Err(())` if the channel is closed (receiver dropped),
/// signalling the caller to stop.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<String>,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                if tx.send(text.to_string()).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Binary, Ping, Pong, and raw frames carry no commands.
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::config::DraftDefaults;
    use crate::db::Database;
    use crate::engine::DraftEngine;
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    fn mock_stream(
        messages: Vec<Result<Message, WsError>>,
    ) -> impl Stream<Item = Result<Message, WsError>> + Unpin {
        stream::iter(messages)
    }

    #[tokio::test]
    async fn text_messages_forwarded_in_order() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("first".into())),
            Ok(Message::Text("second".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), "first");
        assert_eq!(rx.recv().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn close_frame_stops_processing() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("before_close".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("after_close_should_not_appear".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), "before_close");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn error_stops_processing() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("before_error".into())),
            Err(WsError::ConnectionClosed),
            Ok(Message::Text("after_error_should_not_appear".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), "before_error");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn binary_and_ping_messages_are_ignored() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Binary(vec![1, 2, 3].into())),
            Ok(Message::Ping(vec![].into())),
            Ok(Message::Text(r#"{"type":"get_draft","draft_id":"d"}"#.into())),
        ];

        process_message_stream(mock_stream(messages), &tx, "test")
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            r#"{"type":"get_draft","draft_id":"d"}"#
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn returns_err_when_channel_closed() {
        let (tx, rx) = mpsc::channel(64);
        drop(rx);

        let messages = vec![Ok(Message::Text("orphan".into()))];
        let result = process_message_stream(mock_stream(messages), &tx, "test").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn client_gets_reply_and_change_event() {
        let sink = Arc::new(BroadcastSink::new(16));
        let engine = DraftEngine::new(
            Arc::new(Database::open(":memory:").unwrap()),
            Arc::new(InMemoryCatalog::default()),
            sink.clone(),
            DraftDefaults::default(),
        );
        let registry = Arc::new(DraftRegistry::new(Arc::new(engine)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, registry, sink));

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        let create = r#"{"id":1,"type":"create_draft","config":{"title":"Wire","participants":2,"players_per_team":1,"mode":"free"}}"#;
        client.send(Message::Text(create.into())).await.unwrap();

        let mut saw_reply = false;
        let mut saw_event = false;
        while !(saw_reply && saw_event) {
            let Some(Ok(Message::Text(text))) = client.next().await else {
                panic!("connection ended early");
            };
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            match value["type"].as_str() {
                Some("draft") => {
                    assert_eq!(value["id"], 1);
                    assert_eq!(value["draft"]["title"], "Wire");
                    saw_reply = true;
                }
                Some("draft_changed") => saw_event = true,
                other => panic!("unexpected message type {other:?}"),
            }
        }

        server.abort();
    }
}
