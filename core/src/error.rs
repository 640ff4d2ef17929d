//! Errors surfaced to the host caller

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Wrong number of arguments")]
    WrongArgumentCount { expected: usize, actual: usize },

    #[error("{what} must be a string")]
    NotAString { what: &'static str },

    /// The guest parser returned its absence value for the given source
    #[error("Invalid Ruby code")]
    InvalidInput,

    /// Load, resolution or call failure raised inside the guest, passed through as-is
    #[error("{message}")]
    Guest { message: String },

    #[error("setup called before the interpreter was booted")]
    NotBooted,

    #[error("parse called before setup bound an entry point")]
    NotBound,

    #[error("interpreter has been torn down")]
    TornDown,
}

impl BridgeError {
    pub fn guest(err: impl std::fmt::Display) -> Self {
        BridgeError::Guest {
            message: err.to_string(),
        }
    }

    /// Errors the host should raise as a type error rather than a plain error
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            BridgeError::WrongArgumentCount { .. }
                | BridgeError::NotAString { .. }
                | BridgeError::InvalidInput
        )
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
