use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    /// The underlying engine rejected or failed an operation.
    #[error("engine failure: {0}")]
    Engine(String),

    /// An operation that requires an active call was issued outside one.
    #[error("no active call")]
    NotInCall,
}

pub type Result<T> = std::result::Result<T, MediaError>;
