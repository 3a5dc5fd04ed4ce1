/// Core error type.
///
/// Adapter crates map their specific errors into this type. Per-recipient send
/// failures use [`crate::transport::TransportError`] instead and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("recipient registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("progress reporter error: {0}")]
    Reporter(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
