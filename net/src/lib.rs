//! Minimal Minecraft protocol framing: varints, length-prefixed frames and the
//! handful of packets the impostor emits.
mod error;
mod frame;
pub mod packets;
mod varint;

#[cfg(test)]
mod tests;

pub use error::{ProtoError, Result};
pub use frame::{frame_packet, MAX_PACKET_SIZE};
pub use packets::HandshakeNextState;
pub use varint::{
    decode_varint, decode_varint_partial, encode_varint, varint_len, write_varint, MAX_VARINT_LEN,
};
