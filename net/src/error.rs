/// Protocol decode/encode error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtoError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("varint longer than 5 bytes")]
    VarIntTooLarge,
    #[error("packet of {len} bytes exceeds the protocol limit")]
    PacketTooLarge { len: usize },
    #[error("string of {actual} bytes exceeds {max}")]
    StringTooLong { max: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ProtoError>;

pub(crate) fn debug_log_error(context: &str, error: &ProtoError) {
    #[cfg(debug_assertions)]
    {
        log::debug!("{}: {}", context, error);
    }
    let _ = context;
    let _ = error;
}
