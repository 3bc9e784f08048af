use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unknown item kind: {0}")]
    UnknownItemKind(String),

    #[error("unknown property kind: {0}")]
    UnknownPropertyKind(String),
}
