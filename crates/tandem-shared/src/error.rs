use thiserror::Error;

/// Top-level error taxonomy.
///
/// Validation and signed-out failures are rejected synchronously at the
/// call boundary; the remaining variants are caught at the adapter
/// boundary, logged, and surfaced once. None are fatal to the process.
#[derive(Error, Debug)]
pub enum TandemError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, TandemError>;

/// An authentication failure, carrying the provider's machine code and a
/// user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthError {
    /// Machine-readable provider code, e.g. `invalid-email`.
    pub code: String,
    /// Message suitable for direct display.
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Map a provider failure to its user-facing message.
    ///
    /// Unrecognised codes pass the raw provider message through unchanged.
    pub fn normalized(code: &str, raw_message: &str) -> Self {
        let message = match code {
            "invalid-email" => "Invalid email",
            "invalid-credential" => "Invalid Credentials",
            "email-already-in-use" => "User already exists",
            "weak-password" => "Password too weak",
            _ => raw_message,
        };
        Self::new(code, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_are_normalized() {
        assert_eq!(
            AuthError::normalized("invalid-email", "auth/invalid-email").message,
            "Invalid email"
        );
        assert_eq!(
            AuthError::normalized("invalid-credential", "boom").message,
            "Invalid Credentials"
        );
        assert_eq!(
            AuthError::normalized("email-already-in-use", "boom").message,
            "User already exists"
        );
        assert_eq!(
            AuthError::normalized("weak-password", "boom").message,
            "Password too weak"
        );
    }

    #[test]
    fn unknown_codes_pass_the_raw_message_through() {
        let err = AuthError::normalized("network-request-failed", "A network error occurred");
        assert_eq!(err.message, "A network error occurred");
        assert_eq!(err.code, "network-request-failed");
    }
}
