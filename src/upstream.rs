use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use net::{packets, HandshakeNextState};
use serde_json::json;
use tokio::{net::TcpStream, time::timeout};

use crate::{
    config::MirageConfig,
    error::UpstreamError,
    logging::MirageLogger,
    transport::{read_packet, send_payload},
};

/// Source of the status payload relayed to clients.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// One unframed status response, type byte included.
    async fn fetch_status(&self) -> Result<Bytes, UpstreamError>;

    /// Human readable target for logs.
    fn label(&self) -> String;
}

/// Status document served in place of the upstream's when it cannot be reached.
pub fn placeholder_status_json(message: &str) -> String {
    json!({
        "version": {
            "name": message,
            "protocol": -1
        },
        "players": {
            "max": 0,
            "online": 0
        },
        "description": {
            "text": message
        }
    })
    .to_string()
}

/// Opens a fresh connection to the real server for every status query.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    host: String,
    port: u16,
    protocol_version: u32,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(host: impl Into<String>, port: u16, protocol_version: u32, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            protocol_version,
            timeout,
        }
    }

    pub fn from_config(config: &MirageConfig) -> Self {
        Self::new(
            config.upstream_host.clone(),
            config.upstream_port,
            config.protocol_version,
            config.upstream_timeout(),
        )
    }

    async fn request(&self) -> Result<Bytes, UpstreamError> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|source| UpstreamError::Connect {
                addr: self.label(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            MirageLogger::tcp_nodelay_failed(&e);
        }

        let handshake = packets::handshake(
            self.protocol_version,
            &self.host,
            self.port,
            HandshakeNextState::Status,
        )?;
        send_payload(&mut stream, &handshake).await?;
        send_payload(&mut stream, &packets::status_request()).await?;

        Ok(read_packet(&mut stream).await?)
    }
}

#[async_trait]
impl StatusSource for UpstreamClient {
    async fn fetch_status(&self) -> Result<Bytes, UpstreamError> {
        timeout(self.timeout, self.request()).await?
    }

    fn label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
