use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use oscrelay_session::{CaptureMode, CaptureTiming, RelayConfig, RelayServer};
use oscrelay_transport::{DatagramTransport, PeerEndpoint, UdpTransport};
use oscrelay_wire::{address, decode_message, TypedValue, WireMessage};
use serde_json::{json, Value};
use tokio::net::UdpSocket;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

struct Harness {
    peer: UdpSocket,
    relay_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl Harness {
    async fn start(config: RelayConfig) -> Self {
        let peer = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("peer socket should bind");
        let endpoint = PeerEndpoint::from(peer.local_addr().expect("peer address"));
        let transport: Arc<dyn DatagramTransport> =
            Arc::new(UdpTransport::connect(endpoint).expect("transport should connect"));

        let server = RelayServer::bind("127.0.0.1:0", transport, config)
            .await
            .expect("relay should bind");
        let relay_addr = server.local_addr().expect("relay address");
        let shutdown = CancellationToken::new();
        tokio::spawn(server.serve(shutdown.clone()));

        Self {
            peer,
            relay_addr,
            shutdown,
        }
    }

    async fn recv(&self) -> WireMessage {
        let mut buf = vec![0u8; 65_536];
        let len = tokio::time::timeout(Duration::from_secs(5), self.peer.recv(&mut buf))
            .await
            .expect("peer should receive a datagram")
            .expect("peer recv should succeed");
        decode_message(&buf[..len]).expect("datagram should be valid OSC")
    }

    /// Receive until a message for `address` arrives, returning everything seen.
    async fn recv_until(&self, address: &str) -> Vec<WireMessage> {
        let mut seen = Vec::new();
        loop {
            let message = self.recv().await;
            let done = message.address() == address;
            seen.push(message);
            if done {
                return seen;
            }
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn fast_config(capture_mode: CaptureMode) -> RelayConfig {
    RelayConfig {
        channel_gap: Duration::from_millis(5),
        completion_delay: Duration::from_millis(5),
        capture_mode,
        capture: CaptureTiming {
            grain_length: 480,
            grain_count: 10,
            sample_rate: 48_000,
        },
        ..RelayConfig::default()
    }
}

fn reassemble(messages: &[WireMessage], channel_address: &str, len: usize) -> Vec<f32> {
    let mut samples = vec![f32::NAN; len];
    for message in messages.iter().filter(|m| m.address() == channel_address) {
        let start = message.args()[0].as_i32().expect("leading index slot") as usize;
        for (offset, value) in message.args()[1..].iter().enumerate() {
            samples[start + offset] = value.as_f32().expect("sample slot");
        }
    }
    samples
}

async fn next_notice<S>(source: &mut S) -> Value
where
    S: futures_util::Stream<
            Item = Result<Message, tokio_tungstenite::tungstenite::Error>,
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
async fn interactive_events_reach_the_peer() {
    let harness = Harness::start(RelayConfig::default()).await;
    let (mut socket, _) = connect_async(format!("ws://{}", harness.relay_addr))
        .await
        .expect("client should connect");

    socket
        .send(Message::Text(
            json!({"event": "oscMessagePauseAgent", "data": {"isPaused": true}}).to_string(),
        ))
        .await
        .expect("frame should send");
    socket
        .send(Message::Text(
            json!({"event": "sensor-update", "data": {"value": 0.5}}).to_string(),
        ))
        .await
        .expect("frame should send");

    let pause = harness.recv().await;
    assert_eq!(pause.address(), address::PAUSE_AGENT);
    assert_eq!(pause.args(), &[TypedValue::Int32(1)]);
    let sensor = harness.recv().await;
    assert_eq!(sensor.address(), address::SENSOR);
    assert_eq!(sensor.args(), &[TypedValue::Float32(0.5)]);
}

#[tokio::test]
async fn audio_chunk_streams_in_indexed_chunks() {
    let harness = Harness::start(RelayConfig::default()).await;
    let (mut socket, _) = connect_async(format!("ws://{}", harness.relay_addr))
        .await
        .expect("client should connect");

    let samples: Vec<f32> = (0..250).map(|i| i as f32 * 0.001).collect();
    socket
        .send(Message::Text(
            json!({
                "event": "audio-chunk",
                "data": {"channel": 1, "startIndex": 0, "samples": samples},
                "ack": 1
            })
            .to_string(),
        ))
        .await
        .expect("frame should send");

    let ack = next_notice(&mut socket).await;
    assert_eq!(ack["status"], "ok");

    let mut chunks = Vec::new();
    for _ in 0..3 {
        chunks.push(harness.recv().await);
    }
    let indices: Vec<_> = chunks.iter().map(|m| m.args()[0].as_i32()).collect();
    assert_eq!(indices, vec![Some(0), Some(100), Some(200)]);
    assert_eq!(
        reassemble(&chunks, address::RIGHT_CHANNEL_DATA, samples.len()),
        samples
    );
}

#[tokio::test]
async fn client_capture_upload_round_trip() {
    let harness = Harness::start(fast_config(CaptureMode::Client)).await;
    let (mut socket, _) = connect_async(format!("ws://{}", harness.relay_addr))
        .await
        .expect("client should connect");

    socket
        .send(Message::Text(json!({"event": "record-start"}).to_string()))
        .await
        .expect("frame should send");
    assert_eq!(harness.recv().await.address(), address::CLEAR_RECORDING_BUFFER);
    assert_eq!(next_notice(&mut socket).await["state"], "armed");

    let left: Vec<f32> = (0..230).map(|i| (i as f32).sin()).collect();
    let right: Vec<f32> = (0..170).map(|i| (i as f32).cos()).collect();
    socket
        .send(Message::Text(
            json!({"event": "recording-captured", "data": {"left": left, "right": right}})
                .to_string(),
        ))
        .await
        .expect("frame should send");

    let messages = harness.recv_until(address::AUDIO_TRANSMISSION_DONE).await;
    let done = messages.last().expect("done message");
    assert_eq!(done.args(), &[TypedValue::Int32(0)]);

    let last_left = messages
        .iter()
        .rposition(|m| m.address() == address::LEFT_CHANNEL_DATA)
        .expect("left chunks");
    let first_right = messages
        .iter()
        .position(|m| m.address() == address::RIGHT_CHANNEL_DATA)
        .expect("right chunks");
    assert!(last_left < first_right);

    assert_eq!(reassemble(&messages, address::LEFT_CHANNEL_DATA, left.len()), left);
    assert_eq!(
        reassemble(&messages, address::RIGHT_CHANNEL_DATA, right.len()),
        right
    );

    let mut states = Vec::new();
    while states.last().map(String::as_str) != Some("idle") {
        let notice = next_notice(&mut socket).await;
        states.push(notice["state"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(states, vec!["streaming", "streaming", "completed", "idle"]);
}

#[tokio::test]
async fn server_capture_completes_without_audio() {
    let harness = Harness::start(fast_config(CaptureMode::Server)).await;
    let (mut socket, _) = connect_async(format!("ws://{}", harness.relay_addr))
        .await
        .expect("client should connect");

    socket
        .send(Message::Text(json!({"event": "record-start"}).to_string()))
        .await
        .expect("frame should send");
    socket
        .send(Message::Text(json!({"event": "record-start"}).to_string()))
        .await
        .expect("frame should send");

    assert_eq!(next_notice(&mut socket).await["state"], "armed");
    assert_eq!(next_notice(&mut socket).await["state"], "completed");
    assert_eq!(next_notice(&mut socket).await["state"], "idle");

    socket
        .send(Message::Text(json!({"event": "explore"}).to_string()))
        .await
        .expect("frame should send");
    assert_eq!(harness.recv().await.address(), address::RECORD_IN_HOST);
    assert_eq!(harness.recv().await.address(), address::EXPLORE);
}
