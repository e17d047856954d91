//! In-process transport.
//!
//! A [`LocalHub`] is a broadcast bus; every [`LocalTransport`] connected to
//! it sees every message, including its own. Used for tests and for running
//! two sessions in one process.

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{PeerMessage, PeerTransport, Result, TransportType};
use crate::error::TransportError;
use crate::observability::metrics;

/// Default bus capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Shared broadcast bus.
#[derive(Debug, Clone)]
pub struct LocalHub {
    tx: broadcast::Sender<PeerMessage>,
}

impl LocalHub {
    /// Hub buffering up to `capacity` messages per receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Attaches a new endpoint. It only sees messages sent after this call.
    #[must_use]
    pub fn connect(&self) -> LocalTransport {
        LocalTransport {
            tx: self.tx.clone(),
            rx: Mutex::new(self.tx.subscribe()),
            closed: CancellationToken::new(),
        }
    }
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One endpoint on a [`LocalHub`].
#[derive(Debug)]
pub struct LocalTransport {
    tx: broadcast::Sender<PeerMessage>,
    rx: Mutex<broadcast::Receiver<PeerMessage>>,
    closed: CancellationToken,
}

#[async_trait::async_trait]
impl PeerTransport for LocalTransport {
    async fn broadcast(&self, message: &PeerMessage) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed("local transport closed".into()));
        }
        // Send only fails with no receivers, which is a lost message, not an error.
        let _ = self.tx.send(message.clone());
        Ok(())
    }

    async fn receive(&self) -> Result<Option<PeerMessage>> {
        let mut rx = tokio::select! {
            () = self.closed.cancelled() => return Ok(None),
            rx = self.rx.lock() => rx,
        };
        loop {
            tokio::select! {
                () = self.closed.cancelled() => return Ok(None),
                received = rx.recv() => match received {
                    Ok(message) => return Ok(Some(message)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "local transport lagged, messages lost");
                        metrics::record_peer_message_dropped("lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(None),
                },
            }
        }
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Local
    }

    async fn close(&self) -> Result<()> {
        self.closed.cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::game::PlayerId;

    fn score(sender: &str, goals: u32) -> PeerMessage {
        PeerMessage::update_score(PlayerId::new(sender), goals).unwrap()
    }

    #[tokio::test]
    async fn every_endpoint_sees_every_message() {
        let hub = LocalHub::default();
        let a = hub.connect();
        let b = hub.connect();

        a.broadcast(&score("a", 1)).await.unwrap();

        assert_eq!(a.receive().await.unwrap(), Some(score("a", 1)));
        assert_eq!(b.receive().await.unwrap(), Some(score("a", 1)));
    }

    #[tokio::test]
    async fn late_endpoint_misses_earlier_messages() {
        let hub = LocalHub::default();
        let a = hub.connect();
        a.broadcast(&score("a", 1)).await.unwrap();

        let b = hub.connect();
        a.broadcast(&score("a", 2)).await.unwrap();
        assert_eq!(b.receive().await.unwrap(), Some(score("a", 2)));
    }

    #[tokio::test]
    async fn close_unblocks_receive() {
        let hub = LocalHub::default();
        let a = std::sync::Arc::new(hub.connect());
        let waiter = {
            let a = a.clone();
            tokio::spawn(async move { a.receive().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        a.close().await.unwrap();
        assert_eq!(waiter.await.unwrap().unwrap(), None);
        assert_eq!(a.transport_type(), TransportType::Local);
    }

    #[tokio::test]
    async fn lagging_receiver_skips_ahead() {
        let hub = LocalHub::new(2);
        let a = hub.connect();
        for goals in 0..5 {
            a.broadcast(&score("a", goals)).await.unwrap();
        }
        let first = a.receive().await.unwrap().unwrap();
        assert_eq!(first, score("a", 3));
    }
}
