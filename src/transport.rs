//! Length-prefixed packet I/O over any async byte stream.

use std::io::{self, ErrorKind};

use bytes::{Bytes, BytesMut};
use net::{decode_varint_partial, frame_packet, MAX_PACKET_SIZE, MAX_VARINT_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Upper bound on buffer growth per read while assembling a payload.
const MAX_CHUNK_SIZE: usize = 4096;

/// Read one framed packet and return its payload without the length prefix.
///
/// The prefix is consumed one byte at a time so nothing past the frame is
/// read. EOF before the first prefix byte is reported as
/// [`TransportError::Closed`]; EOF anywhere later is an I/O error.
pub async fn read_packet<R>(reader: &mut R) -> Result<Bytes, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; MAX_VARINT_LEN];
    let mut filled = 0;
    let len = loop {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(err) if err.kind() == ErrorKind::UnexpectedEof && filled == 0 => {
                return Err(TransportError::Closed);
            }
            Err(err) => return Err(err.into()),
        };
        prefix[filled] = byte;
        filled += 1;

        // a fifth continuation byte is rejected by the decoder
        if let Some((len, _)) = decode_varint_partial(&prefix[..filled])? {
            break len as usize;
        }
    };

    if len > MAX_PACKET_SIZE {
        return Err(net::ProtoError::PacketTooLarge { len }.into());
    }

    // grow with the data actually received, not the declared length
    let mut payload = BytesMut::with_capacity(len.min(MAX_CHUNK_SIZE));
    while payload.len() < len {
        let remaining = len - payload.len();
        payload.reserve(remaining.min(MAX_CHUNK_SIZE));
        let n = (&mut *reader)
            .take(remaining as u64)
            .read_buf(&mut payload)
            .await?;
        if n == 0 {
            return Err(io::Error::from(ErrorKind::UnexpectedEof).into());
        }
    }

    Ok(payload.freeze())
}

/// Write `bytes` in full, tolerating short writes, then flush.
pub async fn write_packet<W>(writer: &mut W, bytes: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let mut sent = 0;
    while sent < bytes.len() {
        let n = writer.write(&bytes[sent..]).await?;
        if n == 0 {
            return Err(io::Error::from(ErrorKind::WriteZero).into());
        }
        sent += n;
    }
    writer.flush().await?;
    Ok(())
}

/// Frame `payload` and write it.
pub async fn send_payload<W>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let framed = frame_packet(payload)?;
    write_packet(writer, &framed).await
}
