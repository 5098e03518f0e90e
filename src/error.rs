use std::io;

use net::ProtoError;

/// Failure reading or writing a framed packet.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Peer closed the connection")]
    Closed,
    #[error("Networking error - {0}")]
    Io(#[from] io::Error),
    #[error("Malformed frame - {0}")]
    Framing(#[from] ProtoError),
}

/// Failure anywhere in the upstream status round trip.
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("Upstream exchange failed - {0}")]
    Transport(#[from] TransportError),
    #[error("Upstream sent an invalid packet - {0}")]
    Protocol(#[from] ProtoError),
    #[error("Upstream timed out")]
    Timeout(#[from] tokio::time::error::Elapsed),
}

/// Reason a client connection ended abnormally.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Client transport failed - {0}")]
    Transport(#[from] TransportError),
    #[error("Could not encode reply - {0}")]
    Protocol(#[from] ProtoError),
    #[error("Client idle for too long")]
    Timeout,
    #[error("Client stopped reading replies")]
    SendTimeout,
    #[error("Handshake requested unknown state {0}")]
    InvalidNextState(u8),
    #[error("Client sent an empty packet")]
    EmptyPacket,
    #[error("Connection task failed - {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SessionError {
    /// Whether this is an orderly close rather than a fault.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Closed))
    }
}
