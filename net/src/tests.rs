use super::{
    decode_varint, decode_varint_partial, encode_varint, frame_packet, packets, varint_len,
    HandshakeNextState, ProtoError, MAX_PACKET_SIZE,
};

/// Split one complete frame off the front of `input`, or `None` while the
/// frame is still incomplete.
fn split_frame(input: &[u8]) -> Option<(&[u8], usize)> {
    let (len, prefix_len) = decode_varint_partial(input).unwrap()?;
    let total = prefix_len + len as usize;
    if input.len() < total {
        return None;
    }
    Some((&input[prefix_len..total], total))
}

#[test]
fn varint_roundtrip() {
    let values = [1, 2, 127, 128, 255, 25565, 2_097_151, 2_097_152, u32::MAX];
    for value in values {
        let bytes = encode_varint(value);
        assert_eq!(bytes.len(), varint_len(value));
        assert_eq!(decode_varint(&bytes).unwrap(), (value, bytes.len()));
    }
}

#[test]
fn varint_zero_is_one_byte() {
    assert_eq!(encode_varint(0), vec![0x00]);
    assert_eq!(varint_len(0), 1);
    assert_eq!(decode_varint(&[0x00]).unwrap(), (0, 1));
}

#[test]
fn varint_known_values() {
    let cases: [(u32, &[u8]); 5] = [
        (1, &[0x01]),
        (127, &[0x7f]),
        (128, &[0x80, 0x01]),
        (25565, &[0xdd, 0xc7, 0x01]),
        (u32::MAX, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
    ];
    for (value, bytes) in cases {
        assert_eq!(encode_varint(value), bytes, "encode {value}");
        assert_eq!(decode_varint(bytes).unwrap(), (value, bytes.len()));
    }
}

#[test]
fn varint_ignores_trailing_bytes() {
    assert_eq!(decode_varint(&[0xac, 0x02, 0xff, 0xff]).unwrap(), (300, 2));
}

#[test]
fn varint_truncated() {
    assert_eq!(decode_varint(&[0x80, 0x80]), Err(ProtoError::UnexpectedEof));
    assert_eq!(decode_varint_partial(&[0x80]), Ok(None));
    assert_eq!(decode_varint_partial(&[]), Ok(None));
}

#[test]
fn varint_too_long() {
    let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
    assert_eq!(decode_varint(&bytes), Err(ProtoError::VarIntTooLarge));
}

#[test]
fn frame_prefixes_length() {
    assert_eq!(frame_packet(&[0x00]).unwrap(), vec![0x01, 0x00]);
    assert_eq!(frame_packet(&[]).unwrap(), vec![0x00]);

    let payload = vec![7u8; 300];
    let framed = frame_packet(&payload).unwrap();
    assert_eq!(&framed[..2], &[0xac, 0x02]);
    assert_eq!(&framed[2..], payload.as_slice());
}

#[test]
fn frame_rejects_oversized_payload() {
    let payload = vec![0u8; MAX_PACKET_SIZE + 1];
    assert_eq!(
        frame_packet(&payload),
        Err(ProtoError::PacketTooLarge {
            len: MAX_PACKET_SIZE + 1
        })
    );
}

#[test]
fn split_frame_waits_for_full_payload() {
    let framed = frame_packet(b"hello").unwrap();
    assert_eq!(split_frame(&framed[..3]), None);

    let mut two = framed.clone();
    two.extend_from_slice(&frame_packet(b"!").unwrap());
    let (first, used) = split_frame(&two).unwrap();
    assert_eq!(first, b"hello");
    let (second, _) = split_frame(&two[used..]).unwrap();
    assert_eq!(second, b"!");
}

#[test]
fn handshake_layout() {
    let payload = packets::handshake(754, "mc.example.net", 25565, HandshakeNextState::Status)
        .unwrap();

    let mut expected = vec![0x00, 0xf2, 0x05, 14];
    expected.extend_from_slice(b"mc.example.net");
    expected.extend_from_slice(&[0x63, 0xdd, 0x01]);
    assert_eq!(payload, expected);
}

#[test]
fn status_request_is_bare_id() {
    assert_eq!(packets::status_request(), vec![0x00]);
}

#[test]
fn ping_response_echoes_payload() {
    let payload = [0, 0, 1, 2, 3, 4, 5, 6];
    let pong = packets::ping_response(&payload);
    assert_eq!(pong[0], 0x01);
    assert_eq!(&pong[1..], &payload);
}

#[test]
fn login_success_layout() {
    let payload = packets::login_success();
    assert_eq!(payload[0], 0x02);
    assert_eq!(&payload[1..17], &[0u8; 16]);
    assert_eq!(payload[17], 6);
    assert_eq!(&payload[18..], b"Player");
}

#[test]
fn disconnect_layout() {
    let reason = r#"{"text":"bye"}"#;
    let payload = packets::disconnect(reason).unwrap();
    assert_eq!(payload[0], 0x19);
    assert_eq!(payload[1] as usize, reason.len());
    assert_eq!(&payload[2..], reason.as_bytes());
}

#[test]
fn status_response_layout() {
    let payload = packets::status_response("{}").unwrap();
    assert_eq!(payload, vec![0x00, 0x02, b'{', b'}']);
}

#[test]
fn oversized_string_rejected() {
    let reason = "a".repeat(packets::MAX_STRING_BYTES + 1);
    assert!(matches!(
        packets::disconnect(&reason),
        Err(ProtoError::StringTooLong { .. })
    ));
}

#[test]
fn disconnect_passes_invalid_utf8_through() {
    let reason = [b'{', 0xff, 0xfe, b'}'];
    let payload = packets::disconnect(reason).unwrap();
    assert_eq!(payload, vec![0x19, 4, b'{', 0xff, 0xfe, b'}']);
}
