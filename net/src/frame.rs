use super::{
    error::{debug_log_error, ProtoError, Result},
    varint::{varint_len, write_varint},
};

/// Maximum packet length in bytes (protocol limit).
pub const MAX_PACKET_SIZE: usize = 2_097_152;

/// Wrap `payload` in the wire envelope: `varint(len) || payload`.
pub fn frame_packet(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PACKET_SIZE {
        let err = ProtoError::PacketTooLarge { len: payload.len() };
        debug_log_error("refusing to frame packet", &err);
        return Err(err);
    }

    // MAX_PACKET_SIZE fits in 22 bits
    let len = payload.len() as u32;
    let mut out = Vec::with_capacity(varint_len(len) + payload.len());
    write_varint(&mut out, len);
    out.extend_from_slice(payload);
    Ok(out)
}
