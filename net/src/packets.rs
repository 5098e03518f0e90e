//! Payload builders for every packet this server emits.
//!
//! Builders return the unframed payload (type byte first); callers wrap it
//! with [`crate::frame_packet`] before writing.

use super::{
    error::{ProtoError, Result},
    varint::write_varint,
};

/// Serverbound handshake, and status request once in the status phase.
pub const HANDSHAKE_ID: u8 = 0x00;
pub const STATUS_REQUEST_ID: u8 = 0x00;
pub const STATUS_RESPONSE_ID: u8 = 0x00;
/// Status ping and its pong share the id.
pub const PING_ID: u8 = 0x01;
pub const LOGIN_START_ID: u8 = 0x00;
pub const LOGIN_SUCCESS_ID: u8 = 0x02;
/// Play-phase disconnect for protocol 754.
pub const DISCONNECT_ID: u8 = 0x19;

/// Username reported in login success. Not configurable.
pub const LOGIN_USERNAME: &str = "Player";

/// Longest string the protocol accepts, counted in UTF-8 bytes.
pub const MAX_STRING_BYTES: usize = 32767 * 4;

/// Next state requested by a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeNextState {
    Status = 1,
    Login = 2,
}

/// Append-only payload buffer scoped to a single packet.
#[derive(Debug)]
pub struct PacketBuilder {
    buf: Vec<u8>,
}

impl PacketBuilder {
    pub fn new(id: u8) -> Self {
        Self { buf: vec![id] }
    }

    pub fn varint(mut self, value: u32) -> Self {
        write_varint(&mut self.buf, value);
        self
    }

    pub fn string(self, value: &str) -> Result<Self> {
        self.string_bytes(value.as_bytes())
    }

    /// Length-prefixed string field written as-is, without UTF-8 validation.
    pub fn string_bytes(mut self, value: &[u8]) -> Result<Self> {
        if value.len() > MAX_STRING_BYTES {
            return Err(ProtoError::StringTooLong {
                max: MAX_STRING_BYTES,
                actual: value.len(),
            });
        }

        write_varint(&mut self.buf, value.len() as u32);
        self.buf.extend_from_slice(value);
        Ok(self)
    }

    pub fn u16_be(mut self, value: u16) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.buf.extend_from_slice(value);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub fn handshake(
    protocol_version: u32,
    host: &str,
    port: u16,
    next_state: HandshakeNextState,
) -> Result<Vec<u8>> {
    Ok(PacketBuilder::new(HANDSHAKE_ID)
        .varint(protocol_version)
        .string(host)?
        .u16_be(port)
        .varint(next_state as u32)
        .finish())
}

pub fn status_request() -> Vec<u8> {
    PacketBuilder::new(STATUS_REQUEST_ID).finish()
}

/// Status response carrying a JSON document.
pub fn status_response(json: &str) -> Result<Vec<u8>> {
    Ok(PacketBuilder::new(STATUS_RESPONSE_ID).string(json)?.finish())
}

/// Echo of a client ping; `payload` is passed through untouched.
pub fn ping_response(payload: &[u8]) -> Vec<u8> {
    PacketBuilder::new(PING_ID).bytes(payload).finish()
}

/// Login success with a nil UUID and the fixed [`LOGIN_USERNAME`].
pub fn login_success() -> Vec<u8> {
    PacketBuilder::new(LOGIN_SUCCESS_ID)
        .bytes(&[0u8; 16])
        .varint(LOGIN_USERNAME.len() as u32)
        .bytes(LOGIN_USERNAME.as_bytes())
        .finish()
}

/// Disconnect with `reason`, an already JSON-encoded chat component.
/// The bytes are forwarded untouched.
pub fn disconnect(reason: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    Ok(PacketBuilder::new(DISCONNECT_ID)
        .string_bytes(reason.as_ref())?
        .finish())
}
