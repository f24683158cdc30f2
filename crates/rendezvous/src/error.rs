//! Errors reported back to a peer.

use thiserror::Error;

/// Failure of a single peer request.
///
/// The `Display` text is exactly what the peer receives in `error_message`.
/// Unknown, consumed and malformed codes all surface as
/// [`BrokerError::CodeNotFound`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid or expired code")]
    CodeNotFound,

    #[error("Cannot join your own code")]
    SelfJoin,

    #[error("Unable to allocate a code")]
    CodesExhausted,
}

impl BrokerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Stable machine-readable code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::CodeNotFound => "CODE_NOT_FOUND",
            Self::SelfJoin => "SELF_JOIN",
            Self::CodesExhausted => "CODES_EXHAUSTED",
        }
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;
