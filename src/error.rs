use thiserror::Error;

use crate::comm::CommError;

/// Unified error type for the pool.
///
/// Every fallible operation in the crate returns this type; there are no
/// retries anywhere — a failed operation means the pool as a whole is
/// considered failed.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The process group cannot host a pool (e.g. no workers available).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The caller broke the evaluate/terminate protocol contract.
    #[error("Protocol misuse: {message}")]
    ProtocolMisuse { message: String },

    /// A work callback returned a vector of the wrong length for its slice.
    #[error("Work callback returned {actual} values for a slice of {expected}")]
    CallbackContract { expected: usize, actual: usize },

    /// The messaging substrate failed underneath us.
    #[error("Communication failed during {operation}")]
    Comm {
        operation: String,
        #[source]
        source: CommError,
    },

    /// A wire frame could not be encoded or decoded.
    #[error("Codec failure while {operation}")]
    Codec {
        operation: String,
        #[source]
        source: bincode::Error,
    },
}

impl PoolError {
    /// Create a configuration error.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a protocol misuse error.
    pub fn misuse<S: Into<String>>(message: S) -> Self {
        Self::ProtocolMisuse {
            message: message.into(),
        }
    }

    /// Create a communication error for a named protocol step.
    pub fn comm<S: Into<String>>(operation: S, source: CommError) -> Self {
        Self::Comm {
            operation: operation.into(),
            source,
        }
    }

    /// Create a codec error for a named framing step.
    pub fn codec<S: Into<String>>(operation: S, source: bincode::Error) -> Self {
        Self::Codec {
            operation: operation.into(),
            source,
        }
    }

    /// Error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::ProtocolMisuse { .. } => "misuse",
            Self::CallbackContract { .. } => "callback",
            Self::Comm { .. } => "comm",
            Self::Codec { .. } => "codec",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PoolError::configuration("No workers");
        assert!(matches!(err, PoolError::Configuration { .. }));
        assert_eq!(err.category(), "configuration");

        let err = PoolError::misuse("bad instruction length");
        assert!(matches!(err, PoolError::ProtocolMisuse { .. }));
        assert_eq!(err.category(), "misuse");
    }

    #[test]
    fn test_error_display() {
        let err = PoolError::CallbackContract {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Work callback returned 3 values for a slice of 4"
        );
    }
}
