//! Per-connection pipeline: a reader task frames packets off the socket into a
//! bounded queue, and a handler task dispatches them by connection phase.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use bytes::Bytes;
use net::packets::{self, HANDSHAKE_ID, LOGIN_START_ID, PING_ID, STATUS_REQUEST_ID};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
    time::timeout,
};

use crate::{
    config::MirageConfig,
    error::SessionError,
    logging::MirageLogger,
    transport::{read_packet, send_payload},
    upstream::{placeholder_status_json, StatusSource},
};

/// Stage of the protocol a connection is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Handshake,
    Status,
    Login,
}

impl Phase {
    fn from_next_state(value: u8) -> Result<Self, SessionError> {
        match value {
            1 => Ok(Self::Status),
            2 => Ok(Self::Login),
            other => Err(SessionError::InvalidNextState(other)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Everything a connection needs besides its socket. Shared by all sessions.
pub struct SessionContext {
    pub upstream: Arc<dyn StatusSource>,
    pub message_path: PathBuf,
    pub fallback_message: String,
    /// Status JSON served when the upstream fails.
    pub unavailable_status: String,
    pub queue_capacity: usize,
    pub idle_timeout: Duration,
}

impl SessionContext {
    pub fn from_config(config: &MirageConfig, upstream: Arc<dyn StatusSource>) -> Self {
        Self {
            upstream,
            message_path: config.message_path.clone(),
            fallback_message: config.fallback_message.clone(),
            unavailable_status: placeholder_status_json(&config.unavailable_motd),
            queue_capacity: config.queue_capacity,
            idle_timeout: config.idle_timeout(),
        }
    }

    async fn status_payload(&self) -> Result<Bytes, SessionError> {
        match self.upstream.fetch_status().await {
            Ok(status) => Ok(status),
            Err(err) => {
                MirageLogger::upstream_failure(&self.upstream.label(), &err);
                let placeholder = packets::status_response(&self.unavailable_status)?;
                Ok(Bytes::from(placeholder))
            }
        }
    }

    /// Read fresh on every login so the file can change while running.
    /// The bytes are forwarded as they are, without UTF-8 checks.
    async fn disconnect_message(&self) -> Vec<u8> {
        match tokio::fs::read(&self.message_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                MirageLogger::message_unreadable(&self.message_path, &err);
                self.fallback_message.clone().into_bytes()
            }
        }
    }
}

/// Run a full connection: spawn the reader and handler, wait for both.
///
/// Whichever side finishes first brings the other down: the handler dropping
/// its queue stops the reader, and a failed read aborts the handler. A clean
/// close by the client lets the handler drain what was already queued. Replies
/// that the client does not take within `idle_timeout` end the handler.
pub async fn serve<S>(
    stream: S,
    address: SocketAddr,
    context: Arc<SessionContext>,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (queue_tx, queue_rx) = mpsc::channel(context.queue_capacity.max(1));

    let mut reader_task = tokio::spawn(read_loop(reader, queue_tx, context.idle_timeout));
    let mut handler_task = tokio::spawn(Session::new(address, writer, context).run(queue_rx));

    tokio::select! {
        handled = &mut handler_task => {
            let read = reader_task.await?;
            handled??;
            match read {
                Err(err) if !err.is_closed() => Err(err),
                _ => Ok(()),
            }
        }
        read = &mut reader_task => {
            match read? {
                Err(err) if !err.is_closed() => {
                    handler_task.abort();
                    Err(err)
                }
                _ => handler_task.await?,
            }
        }
    }
}

/// Frame packets off `reader` into `queue` until the stream ends or the
/// receiving side goes away. Blocks while the queue is full.
pub async fn read_loop<R>(
    mut reader: R,
    queue: mpsc::Sender<Bytes>,
    idle_timeout: Duration,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let packet = tokio::select! {
            _ = queue.closed() => return Ok(()),
            read = timeout(idle_timeout, read_packet(&mut reader)) => {
                read.map_err(|_| SessionError::Timeout)??
            }
        };

        if queue.send(packet).await.is_err() {
            return Ok(());
        }
    }
}

/// Handler side of a connection. Owns the phase and the write half.
pub struct Session<W> {
    address: SocketAddr,
    writer: W,
    phase: Phase,
    context: Arc<SessionContext>,
}

impl<W> Session<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(address: SocketAddr, writer: W, context: Arc<SessionContext>) -> Self {
        Self {
            address,
            writer,
            phase: Phase::Handshake,
            context,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Dispatch queued packets in arrival order until one ends the session.
    pub async fn run(mut self, mut queue: mpsc::Receiver<Bytes>) -> Result<(), SessionError> {
        while let Some(packet) = queue.recv().await {
            if self.dispatch(&packet).await? == Flow::Close {
                break;
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, packet: &[u8]) -> Result<Flow, SessionError> {
        let Some((&id, body)) = packet.split_first() else {
            return Err(SessionError::EmptyPacket);
        };

        match (id, self.phase) {
            (HANDSHAKE_ID, Phase::Handshake) => {
                // next state is the final field of the handshake
                let next = packet[packet.len() - 1];
                self.phase = Phase::from_next_state(next)?;
                MirageLogger::phase_changed(&self.address, self.phase);
                Ok(Flow::Continue)
            }
            (STATUS_REQUEST_ID, Phase::Status) => {
                // only the shared context is borrowed across the upstream call
                let context = Arc::clone(&self.context);
                let status = context.status_payload().await?;
                self.send(&status).await?;
                Ok(Flow::Continue)
            }
            (PING_ID, Phase::Status) => {
                self.send(&packets::ping_response(body)).await?;
                Ok(Flow::Close)
            }
            (LOGIN_START_ID, Phase::Login) => {
                let context = Arc::clone(&self.context);
                let disconnect = packets::disconnect(context.disconnect_message().await)?;
                self.send(&packets::login_success()).await?;
                self.send(&disconnect).await?;
                Ok(Flow::Close)
            }
            _ => {
                MirageLogger::packet_ignored(&self.address, id, self.phase);
                Ok(Flow::Continue)
            }
        }
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        timeout(self.context.idle_timeout, send_payload(&mut self.writer, payload))
            .await
            .map_err(|_| SessionError::SendTimeout)??;
        Ok(())
    }
}
