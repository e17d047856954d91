//! UDP transport.
//!
//! Each [`PeerMessage`] travels as one JSON datagram to every configured
//! peer address. Datagrams that do not parse are logged and dropped.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{MAX_DATAGRAM_SIZE, PeerMessage, PeerTransport, Result, TransportType};
use crate::error::TransportError;
use crate::observability::metrics;

/// Datagram transport to a fixed set of peers.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peers: Vec<SocketAddr>,
    closed: CancellationToken,
}

impl UdpTransport {
    /// Binds `addr` and sends to `peers`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if the socket cannot be bound.
    pub async fn bind(addr: SocketAddr, peers: Vec<SocketAddr>) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        debug!(local = %socket.local_addr()?, peers = peers.len(), "udp transport bound");
        Ok(Self {
            socket,
            peers,
            closed: CancellationToken::new(),
        })
    }

    /// Address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if the OS cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Adds a peer address.
    pub fn add_peer(&mut self, peer: SocketAddr) {
        if !self.peers.contains(&peer) {
            self.peers.push(peer);
        }
    }
}

#[async_trait::async_trait]
impl PeerTransport for UdpTransport {
    async fn broadcast(&self, message: &PeerMessage) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed("udp transport closed".into()));
        }
        let bytes = message.to_json()?;
        if bytes.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::MalformedMessage(format!(
                "message of {} bytes exceeds datagram limit",
                bytes.len()
            )));
        }
        for peer in &self.peers {
            if let Err(e) = self.socket.send_to(&bytes, peer).await {
                warn!(peer = %peer, error = %e, "failed to send datagram");
            }
        }
        Ok(())
    }

    async fn receive(&self) -> Result<Option<PeerMessage>> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, from) = tokio::select! {
                () = self.closed.cancelled() => return Ok(None),
                received = self.socket.recv_from(&mut buf) => received?,
            };
            match PeerMessage::from_json(&buf[..len]) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => {
                    warn!(from = %from, error = %e, "dropping malformed datagram");
                    metrics::record_peer_message_dropped("malformed");
                }
            }
        }
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Udp
    }

    async fn close(&self) -> Result<()> {
        self.closed.cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::PlayerId;

    async fn pair() -> (UdpTransport, UdpTransport) {
        let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let mut a = UdpTransport::bind(any, vec![]).await.unwrap();
        let mut b = UdpTransport::bind(any, vec![]).await.unwrap();
        a.add_peer(b.local_addr().unwrap());
        b.add_peer(a.local_addr().unwrap());
        (a, b)
    }

    #[tokio::test]
    async fn datagram_round_trip() {
        let (a, b) = pair().await;
        let msg = PeerMessage::update_score(PlayerId::new("a"), 1).unwrap();
        a.broadcast(&msg).await.unwrap();
        assert_eq!(b.receive().await.unwrap(), Some(msg));
    }

    #[tokio::test]
    async fn malformed_datagram_is_skipped() {
        let (a, b) = pair().await;
        let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        raw.send_to(b"not json", b.local_addr().unwrap())
            .await
            .unwrap();

        // Give the garbage a head start so it is queued first.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let msg = PeerMessage::update_score(PlayerId::new("a"), 2).unwrap();
        a.broadcast(&msg).await.unwrap();

        assert_eq!(b.receive().await.unwrap(), Some(msg));
    }

    #[tokio::test]
    async fn closed_transport_receives_none() {
        let (a, _b) = pair().await;
        a.close().await.unwrap();
        assert_eq!(a.receive().await.unwrap(), None);
        assert!(a.broadcast(&PeerMessage::update_score(PlayerId::new("a"), 0).unwrap()).await.is_err());
    }
}
