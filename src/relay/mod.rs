//! Voice-command WebSocket relay
//!
//! Each browser connection gets its own [`RelaySession`], which dials the
//! voice service and pumps text frames both ways until either side closes.
//!
//! ```text
//!   Connecting ──upstream open──▶ Open ──either side closes──▶ Closing ──▶ Closed
//!       │                                                                   ▲
//!       └──────────── connect failure / client gone / shutdown ─────────────┘
//! ```
//!
//! Client frames that arrive while Connecting are dropped, not queued.
//! Frames are never inspected or rewritten.

mod channel;

pub use channel::{
    ClientSocket, RelayChannel, TungsteniteConnector, UpstreamConnector, UpstreamSocket,
};

use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Could not connect to voice service at {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closing => write!(f, "closing"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// What ended a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Upstream,
    /// Server shutdown
    Server,
}

/// Outcome of a finished session
#[derive(Debug)]
pub struct SessionSummary {
    pub id: Uuid,
    pub forwarded_to_upstream: u64,
    pub forwarded_to_client: u64,
    pub dropped: u64,
    pub closed_by: Side,
    pub error: Option<RelayError>,
}

/// One client connection and its upstream counterpart
pub struct RelaySession {
    id: Uuid,
    state: SessionState,
    shutdown: CancellationToken,
    forwarded_to_upstream: u64,
    forwarded_to_client: u64,
    dropped: u64,
}

impl RelaySession {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Connecting,
            shutdown,
            forwarded_to_upstream: 0,
            forwarded_to_client: 0,
            dropped: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Relay {}: {} -> {}", self.id, self.state, next);
        self.state = next;
    }

    /// Drive the session to completion.
    pub async fn run<C, U>(mut self, mut client: C, connector: &U) -> SessionSummary
    where
        C: RelayChannel,
        U: UpstreamConnector,
    {
        info!("Relay {} opened", self.id);

        let upstream = {
            let connect = connector.connect();
            tokio::pin!(connect);
            loop {
                tokio::select! {
                    result = &mut connect => break result,
                    frame = client.recv() => match frame {
                        Ok(Some(_)) => {
                            self.dropped += 1;
                            debug!("Relay {}: dropped client frame while connecting", self.id);
                        }
                        Ok(None) => return self.finish(Side::Client, None),
                        Err(e) => return self.finish(Side::Client, Some(e)),
                    },
                    _ = self.shutdown.cancelled() => {
                        self.transition(SessionState::Closing);
                        client.close().await;
                        return self.finish(Side::Server, None);
                    }
                }
            }
        };

        let mut upstream = match upstream {
            Ok(channel) => channel,
            Err(e) => {
                error!("Relay {}: {}", self.id, e);
                self.transition(SessionState::Closing);
                client.close().await;
                return self.finish(Side::Upstream, Some(e));
            }
        };
        self.transition(SessionState::Open);

        let (closed_by, error) = loop {
            tokio::select! {
                frame = client.recv() => match frame {
                    Ok(Some(text)) => match upstream.send(text).await {
                        Ok(()) => self.forwarded_to_upstream += 1,
                        Err(e) => {
                            self.dropped += 1;
                            debug!("Relay {}: client frame dropped: {}", self.id, e);
                        }
                    },
                    Ok(None) => break (Side::Client, None),
                    Err(e) => break (Side::Client, Some(e)),
                },
                frame = upstream.recv() => match frame {
                    Ok(Some(text)) => match client.send(text).await {
                        Ok(()) => self.forwarded_to_client += 1,
                        Err(e) => {
                            self.dropped += 1;
                            debug!("Relay {}: upstream frame dropped: {}", self.id, e);
                        }
                    },
                    Ok(None) => break (Side::Upstream, None),
                    Err(e) => break (Side::Upstream, Some(e)),
                },
                _ = self.shutdown.cancelled() => break (Side::Server, None),
            }
        };

        self.transition(SessionState::Closing);
        match closed_by {
            Side::Client => upstream.close().await,
            Side::Upstream => client.close().await,
            Side::Server => {
                client.close().await;
                upstream.close().await;
            }
        }
        if let Some(e) = &error {
            error!("Relay {}: {}", self.id, e);
        }
        self.finish(closed_by, error)
    }

    fn finish(mut self, closed_by: Side, error: Option<RelayError>) -> SessionSummary {
        self.transition(SessionState::Closed);
        info!(
            "Relay {} closed by {:?} ({} up, {} down, {} dropped)",
            self.id, closed_by, self.forwarded_to_upstream, self.forwarded_to_client, self.dropped
        );
        SessionSummary {
            id: self.id,
            forwarded_to_upstream: self.forwarded_to_upstream,
            forwarded_to_client: self.forwarded_to_client,
            dropped: self.dropped,
            closed_by,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::{mpsc, oneshot};
    use tokio::time::timeout;

    const BOUND: Duration = Duration::from_secs(2);

    /// In-memory channel; the test holds the other ends.
    struct MemoryChannel {
        inbound: mpsc::UnboundedReceiver<String>,
        outbound: Option<mpsc::UnboundedSender<String>>,
    }

    /// Test-side handles: push frames in, observe frames (and close) out.
    struct Peer {
        tx: mpsc::UnboundedSender<String>,
        rx: mpsc::UnboundedReceiver<String>,
    }

    fn pair() -> (MemoryChannel, Peer) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        (
            MemoryChannel {
                inbound: in_rx,
                outbound: Some(out_tx),
            },
            Peer {
                tx: in_tx,
                rx: out_rx,
            },
        )
    }

    impl RelayChannel for MemoryChannel {
        async fn recv(&mut self) -> Result<Option<String>, RelayError> {
            Ok(self.inbound.recv().await)
        }

        async fn send(&mut self, text: String) -> Result<(), RelayError> {
            match &self.outbound {
                Some(tx) => tx.send(text).map_err(|e| RelayError::Send(e.to_string())),
                None => Err(RelayError::Send("closed".into())),
            }
        }

        async fn close(&mut self) {
            self.outbound = None;
        }
    }

    /// Hands out the upstream channel only when the test releases it.
    struct GatedConnector {
        gate: Mutex<Option<oneshot::Receiver<Result<MemoryChannel, RelayError>>>>,
    }

    impl GatedConnector {
        fn new() -> (Self, oneshot::Sender<Result<MemoryChannel, RelayError>>) {
            let (tx, rx) = oneshot::channel();
            (
                Self {
                    gate: Mutex::new(Some(rx)),
                },
                tx,
            )
        }
    }

    impl UpstreamConnector for GatedConnector {
        type Channel = MemoryChannel;

        async fn connect(&self) -> Result<MemoryChannel, RelayError> {
            let gate = self.gate.lock().unwrap().take();
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(RelayError::Send("gate dropped".into()))),
                None => Err(RelayError::Send("connect called twice".into())),
            }
        }
    }

    async fn expect_closed(rx: &mut mpsc::UnboundedReceiver<String>) {
        loop {
            match timeout(BOUND, rx.recv()).await {
                Ok(None) => return,
                Ok(Some(_)) => continue,
                Err(_) => panic!("channel not closed within {BOUND:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_frames_before_upstream_open_are_dropped() {
        let (client, mut browser) = pair();
        let (connector, gate) = GatedConnector::new();
        let session = RelaySession::new(CancellationToken::new());
        assert_eq!(session.state(), SessionState::Connecting);
        let task = tokio::spawn(async move { session.run(client, &connector).await });

        browser.tx.send("early".into()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (upstream, mut voice) = pair();
        gate.send(Ok(upstream)).ok();
        tokio::time::sleep(Duration::from_millis(50)).await;

        browser.tx.send("late".into()).unwrap();
        let got = timeout(BOUND, voice.rx.recv()).await.unwrap();
        assert_eq!(got.as_deref(), Some("late"));

        drop(browser.tx);
        let summary = timeout(BOUND, task).await.unwrap().unwrap();
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.forwarded_to_upstream, 1);
        assert_eq!(summary.closed_by, Side::Client);
    }

    #[tokio::test]
    async fn test_forwards_both_directions_in_order() {
        let (client, mut browser) = pair();
        let (upstream, mut voice) = pair();
        let (connector, gate) = GatedConnector::new();
        gate.send(Ok(upstream)).ok();
        let task = tokio::spawn(async move {
            RelaySession::new(CancellationToken::new())
                .run(client, &connector)
                .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        for i in 0..5 {
            browser.tx.send(format!("cmd-{i}")).unwrap();
        }
        for i in 0..5 {
            let got = timeout(BOUND, voice.rx.recv()).await.unwrap();
            assert_eq!(got, Some(format!("cmd-{i}")));
        }

        voice
            .tx
            .send(r#"{"transcript": "open settings"}"#.into())
            .unwrap();
        let got = timeout(BOUND, browser.rx.recv()).await.unwrap();
        assert_eq!(got.as_deref(), Some(r#"{"transcript": "open settings"}"#));

        drop(voice.tx);
        let summary = timeout(BOUND, task).await.unwrap().unwrap();
        assert_eq!(summary.forwarded_to_upstream, 5);
        assert_eq!(summary.forwarded_to_client, 1);
        assert_eq!(summary.closed_by, Side::Upstream);
    }

    #[tokio::test]
    async fn test_client_close_closes_upstream() {
        let (client, browser) = pair();
        let (upstream, mut voice) = pair();
        let (connector, gate) = GatedConnector::new();
        gate.send(Ok(upstream)).ok();
        let task = tokio::spawn(async move {
            RelaySession::new(CancellationToken::new())
                .run(client, &connector)
                .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(browser.tx);
        expect_closed(&mut voice.rx).await;
        let summary = timeout(BOUND, task).await.unwrap().unwrap();
        assert!(summary.error.is_none());
    }

    #[tokio::test]
    async fn test_upstream_close_closes_client() {
        let (client, mut browser) = pair();
        let (upstream, voice) = pair();
        let (connector, gate) = GatedConnector::new();
        gate.send(Ok(upstream)).ok();
        tokio::spawn(async move {
            RelaySession::new(CancellationToken::new())
                .run(client, &connector)
                .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(voice.tx);
        expect_closed(&mut browser.rx).await;
    }

    #[tokio::test]
    async fn test_connect_failure_closes_client() {
        let (client, mut browser) = pair();
        let (connector, gate) = GatedConnector::new();
        gate.send(Err(RelayError::Connect {
            url: "ws://localhost:8765".into(),
            reason: "connection refused".into(),
        }))
        .ok();
        let summary = timeout(
            BOUND,
            RelaySession::new(CancellationToken::new()).run(client, &connector),
        )
        .await
        .unwrap();

        assert_eq!(summary.closed_by, Side::Upstream);
        assert!(matches!(summary.error, Some(RelayError::Connect { .. })));
        expect_closed(&mut browser.rx).await;
    }

    #[tokio::test]
    async fn test_client_leaving_while_connecting_ends_session() {
        let (client, browser) = pair();
        let (connector, _gate) = GatedConnector::new();
        drop(browser.tx);
        let summary = timeout(
            BOUND,
            RelaySession::new(CancellationToken::new()).run(client, &connector),
        )
        .await
        .unwrap();
        assert_eq!(summary.closed_by, Side::Client);
        assert_eq!(summary.forwarded_to_upstream, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_both_sides() {
        let (client, mut browser) = pair();
        let (upstream, mut voice) = pair();
        let (connector, gate) = GatedConnector::new();
        gate.send(Ok(upstream)).ok();
        let shutdown = CancellationToken::new();
        let session = RelaySession::new(shutdown.child_token());
        let task = tokio::spawn(async move { session.run(client, &connector).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        shutdown.cancel();
        expect_closed(&mut browser.rx).await;
        expect_closed(&mut voice.rx).await;
        let summary = timeout(BOUND, task).await.unwrap().unwrap();
        assert_eq!(summary.closed_by, Side::Server);
    }
}
