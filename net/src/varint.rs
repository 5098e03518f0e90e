//! Variable-length integers: 7 data bits per byte, least significant group
//! first, high bit set on every byte except the last.

use super::error::{debug_log_error, ProtoError, Result};

/// Longest encoding of a 32-bit value.
pub const MAX_VARINT_LEN: usize = 5;

const SEGMENT_BITS: u8 = 0x7f;
const CONTINUE_BIT: u8 = 0x80;

/// Decode a varint from the start of `input`.
///
/// Returns the value and the number of bytes consumed.
#[inline]
pub fn decode_varint(input: &[u8]) -> Result<(u32, usize)> {
    match decode_varint_partial(input)? {
        Some(decoded) => Ok(decoded),
        None => {
            let err = ProtoError::UnexpectedEof;
            debug_log_error("varint truncated", &err);
            Err(err)
        }
    }
}

/// Like [`decode_varint`], but `Ok(None)` when `input` ends before the
/// terminating byte.
#[inline]
pub fn decode_varint_partial(input: &[u8]) -> Result<Option<(u32, usize)>> {
    let mut value: u32 = 0;
    for i in 0..MAX_VARINT_LEN {
        let Some(&byte) = input.get(i) else {
            return Ok(None);
        };

        value |= u32::from(byte & SEGMENT_BITS) << (i * 7);
        if byte & CONTINUE_BIT == 0 {
            return Ok(Some((value, i + 1)));
        }
    }

    Err(ProtoError::VarIntTooLarge)
}

/// Append the encoding of `value` to `out`. Zero encodes as a single `0x00`.
#[inline]
pub fn write_varint(out: &mut Vec<u8>, value: u32) {
    let mut val = value;
    loop {
        if val & !u32::from(SEGMENT_BITS) == 0 {
            out.push(val as u8);
            return;
        }
        out.push((val as u8 & SEGMENT_BITS) | CONTINUE_BIT);
        val >>= 7;
    }
}

#[inline]
pub fn encode_varint(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(varint_len(value));
    write_varint(&mut out, value);
    out
}

#[inline]
pub fn varint_len(value: u32) -> usize {
    let mut val = value;
    let mut count = 1;
    while val & !u32::from(SEGMENT_BITS) != 0 {
        count += 1;
        val >>= 7;
    }
    count
}
