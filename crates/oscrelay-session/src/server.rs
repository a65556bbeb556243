//! WebSocket front end.
//!
//! Every accepted connection becomes three tasks tied to one cancellation
//! token: a reader that parses text frames into events, the session relay,
//! and a writer that pushes notices back to the client.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use oscrelay_transport::DatagramTransport;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::envelope::{ClientNotice, InboundEvent};
use crate::error::{RelayError, Result};
use crate::relay::{SessionRelay, SessionSummary};

/// Accepts WebSocket clients and relays each one's events to the peer.
pub struct RelayServer {
    listener: TcpListener,
    transport: Arc<dyn DatagramTransport>,
    config: Arc<RelayConfig>,
    next_session_id: AtomicU64,
}

impl RelayServer {
    /// Validate `config` and bind the client listener.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        transport: Arc<dyn DatagramTransport>,
        config: RelayConfig,
    ) -> Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(addr).await?;
        info!(
            listen = %listener.local_addr()?,
            peer = %transport.peer_addr(),
            transport = transport.transport_name(),
            capture = %config.capture_mode,
            "relay listening"
        );
        Ok(Self {
            listener,
            transport,
            config: Arc::new(config),
            next_session_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Accept clients until `shutdown` fires, then wait for open sessions.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => {
                    let (stream, client) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            warn!(error = %err, "accept failed");
                            continue;
                        }
                    };
                    let id = format!(
                        "session-{}",
                        self.next_session_id.fetch_add(1, Ordering::Relaxed)
                    );
                    info!(session = %id, %client, "client connected");
                    sessions.spawn(serve_connection(
                        id,
                        stream,
                        Arc::clone(&self.transport),
                        Arc::clone(&self.config),
                        shutdown.child_token(),
                    ));
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    log_session_exit(joined);
                }
            }
        }

        info!(open = sessions.len(), "relay shutting down");
        while let Some(joined) = sessions.join_next().await {
            log_session_exit(joined);
        }
        Ok(())
    }
}

fn log_session_exit(joined: std::result::Result<Result<SessionSummary>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(summary)) => debug!(session = %summary.id, "session task finished"),
        Ok(Err(err)) => warn!(kind = err.kind(), error = %err, "session failed"),
        Err(err) => warn!(error = %err, "session task aborted"),
    }
}

async fn serve_connection(
    id: String,
    stream: TcpStream,
    transport: Arc<dyn DatagramTransport>,
    config: Arc<RelayConfig>,
    cancel: CancellationToken,
) -> Result<SessionSummary> {
    let socket = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = socket.split();

    let (event_tx, event_rx) = mpsc::channel::<InboundEvent>(config.event_queue_depth);
    let (notice_tx, mut notice_rx) = mpsc::channel::<ClientNotice>(config.event_queue_depth);

    // The reader never waits on the queue, so a disconnect is seen even
    // while a transfer keeps the relay busy.
    let reader = {
        let id = id.clone();
        let cancel = cancel.clone();
        let reader_notices = notice_tx.clone();
        tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    _ = cancel.cancelled() => break,
                    frame = source.next() => frame,
                };
                match frame {
                    Some(Ok(Message::Text(text))) => match InboundEvent::parse(&text) {
                        Ok(event) => match event_tx.try_send(event) {
                            Ok(()) => {}
                            Err(TrySendError::Full(event)) => {
                                warn!(
                                    session = %id,
                                    event = %event.event,
                                    "event queue full, event dropped"
                                );
                                if let Some(ack) = event.ack {
                                    let err = RelayError::EventQueueFull(event.event);
                                    let notice = ClientNotice::ack_error(ack, &err);
                                    let _ = reader_notices.try_send(notice);
                                }
                            }
                            Err(TrySendError::Closed(_)) => break,
                        },
                        Err(err) => warn!(session = %id, error = %err, "malformed frame ignored"),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(session = %id, error = %err, "client read failed");
                        break;
                    }
                }
            }
            // Disconnect abandons whatever the relay is still doing.
            cancel.cancel();
        })
    };

    let writer = {
        let id = id.clone();
        tokio::spawn(async move {
            while let Some(notice) = notice_rx.recv().await {
                let text = match notice.to_json() {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(session = %id, error = %err, "notice not serializable");
                        continue;
                    }
                };
                if let Err(err) = sink.send(Message::Text(text)).await {
                    debug!(session = %id, error = %err, "client write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        })
    };

    let relay = SessionRelay::new(id, transport, config, notice_tx);
    let summary = relay.run(event_rx, cancel.clone()).await;

    cancel.cancel();
    let _ = reader.await;
    let _ = writer.await;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use oscrelay_wire::address;
    use serde_json::{json, Value};
    use tokio_tungstenite::connect_async;

    use super::*;
    use crate::testing::RecordingTransport;

    type Running = (SocketAddr, CancellationToken, tokio::task::JoinHandle<Result<()>>);

    async fn start(transport: &Arc<RecordingTransport>) -> Running {
        start_with(transport, RelayConfig::default()).await
    }

    async fn start_with(transport: &Arc<RecordingTransport>, config: RelayConfig) -> Running {
        let server = RelayServer::bind(
            "127.0.0.1:0",
            Arc::clone(transport) as Arc<dyn DatagramTransport>,
            config,
        )
        .await
        .expect("server should bind");
        let addr = server.local_addr().expect("bound address");
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server.serve(shutdown.clone()));
        (addr, shutdown, handle)
    }

    async fn next_json<S>(source: &mut S) -> Value
    where
        S: futures_util::Stream<
                Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
            > + Unpin,
    {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), source.next())
                .await
                .expect("notice should arrive")
                .expect("socket should stay open")
                .expect("frame should be readable");
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).expect("notice should be JSON");
            }
        }
    }

    #[tokio::test]
    async fn relays_event_and_acks() {
        let transport = Arc::new(RecordingTransport::default());
        let (addr, shutdown, handle) = start(&transport).await;

        let (mut socket, _) = connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        socket
            .send(Message::Text(
                json!({"event": "agent-feedback", "data": {"feedback": 1}, "ack": 7}).to_string(),
            ))
            .await
            .expect("frame should send");

        let ack = next_json(&mut socket).await;
        assert_eq!(ack, json!({"event": "ack", "id": 7, "status": "ok"}));
        assert_eq!(transport.addresses(), vec![address::AGENT_FEEDBACK]);

        shutdown.cancel();
        handle
            .await
            .expect("server task should join")
            .expect("server should stop cleanly");
    }

    #[tokio::test]
    async fn malformed_frames_do_not_end_the_session() {
        let transport = Arc::new(RecordingTransport::default());
        let (addr, shutdown, handle) = start(&transport).await;

        let (mut socket, _) = connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        socket
            .send(Message::Text("{not json".into()))
            .await
            .expect("frame should send");
        socket
            .send(Message::Binary(vec![1, 2, 3]))
            .await
            .expect("frame should send");
        socket
            .send(Message::Text(json!({"event": "nope", "ack": 1}).to_string()))
            .await
            .expect("frame should send");
        socket
            .send(Message::Text(json!({"event": "play", "ack": 2}).to_string()))
            .await
            .expect("frame should send");

        let first = next_json(&mut socket).await;
        assert_eq!(first["id"], 1);
        assert_eq!(first["status"], "error");
        assert_eq!(first["kind"], "unknown-event-kind");
        let second = next_json(&mut socket).await;
        assert_eq!(second["id"], 2);
        assert_eq!(second["status"], "ok");
        assert_eq!(transport.addresses(), vec![address::PLAY]);

        shutdown.cancel();
        handle
            .await
            .expect("server task should join")
            .expect("server should stop cleanly");
    }

    #[tokio::test]
    async fn disconnect_with_full_queue_abandons_transfer() {
        let transport = Arc::new(RecordingTransport::default());
        let mut config = RelayConfig {
            event_queue_depth: 1,
            ..RelayConfig::default()
        };
        config.stream.pacing = Duration::from_millis(10);
        let (addr, shutdown, handle) = start_with(&transport, config).await;

        let (mut socket, _) = connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let chunk = json!({
            "event": "audio-chunk",
            "data": {"channel": 0, "samples": vec![0.1f32; 20_000]},
        });
        socket
            .send(Message::Text(chunk.to_string()))
            .await
            .expect("frame should send");
        for _ in 0..4 {
            socket
                .send(Message::Text(json!({"event": "play"}).to_string()))
                .await
                .expect("frame should send");
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(socket);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let chunks = || {
            transport
                .addresses()
                .iter()
                .filter(|a| a.as_str() == address::LEFT_CHANNEL_DATA)
                .count()
        };
        let at_disconnect = chunks();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(at_disconnect > 0 && at_disconnect < 200);
        assert_eq!(chunks(), at_disconnect, "transfer kept running after disconnect");

        shutdown.cancel();
        handle
            .await
            .expect("server task should join")
            .expect("server should stop cleanly");
    }

    #[tokio::test]
    async fn full_queue_rejects_acked_event() {
        let transport = Arc::new(RecordingTransport::default());
        let mut config = RelayConfig {
            event_queue_depth: 1,
            ..RelayConfig::default()
        };
        config.stream.pacing = Duration::from_millis(10);
        let (addr, shutdown, handle) = start_with(&transport, config).await;

        let (mut socket, _) = connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let chunk = json!({
            "event": "audio-chunk",
            "data": {"channel": 0, "samples": vec![0.1f32; 5_000]},
        });
        socket
            .send(Message::Text(chunk.to_string()))
            .await
            .expect("frame should send");
        for ack in 1..=3 {
            socket
                .send(Message::Text(json!({"event": "play", "ack": ack}).to_string()))
                .await
                .expect("frame should send");
        }

        let rejected = next_json(&mut socket).await;
        assert_eq!(rejected["status"], "error");
        assert_eq!(rejected["kind"], "event-queue-full");

        shutdown.cancel();
        handle
            .await
            .expect("server task should join")
            .expect("server should stop cleanly");
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let transport: Arc<dyn DatagramTransport> = Arc::new(RecordingTransport::default());
        let config = RelayConfig {
            event_queue_depth: 0,
            ..RelayConfig::default()
        };
        let err = RelayServer::bind("127.0.0.1:0", transport, config)
            .await
            .err()
            .expect("bind should fail");
        assert_eq!(err.kind(), "invalid-config");
    }
}
