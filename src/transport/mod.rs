//! Peer transport layer.
//!
//! Provides the [`PeerTransport`] trait for exchanging [`PeerMessage`]s with
//! the other participant. Delivery is best effort: at most once, no ordering,
//! no durability. Loopback suppression is the receiver's job (the session
//! coordinator drops messages carrying its own sender id).

pub mod local;
pub mod message;
pub mod udp;

pub use local::{LocalHub, LocalTransport};
pub use message::{MessageType, PeerEvent, PeerMessage};
pub use udp::UdpTransport;

use std::fmt;

use crate::error::TransportError;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Largest datagram accepted by the UDP transport (64 KB).
pub const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

/// Async transport for peer messages.
///
/// Uses `&self` with interior mutability so one transport can be shared by
/// the inbound pump task and the outbound side of the session.
#[async_trait::async_trait]
pub trait PeerTransport: Send + Sync {
    /// Sends `message` to every peer. Failures are not retried.
    async fn broadcast(&self, message: &PeerMessage) -> Result<()>;

    /// Waits for the next message.
    ///
    /// Returns `Ok(None)` once the transport is closed.
    async fn receive(&self) -> Result<Option<PeerMessage>>;

    /// Returns the type of this transport for logging.
    fn transport_type(&self) -> TransportType;

    /// Closes the transport; pending and future `receive` calls return `None`.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Transport type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    /// In-process broadcast hub.
    Local,
    /// UDP datagrams.
    Udp,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Udp => write!(f, "udp"),
        }
    }
}
