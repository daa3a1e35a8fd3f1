use std::fmt;

/// Failure taxonomy for every fallible core operation.
///
/// Callers match on the variant; errors are never compared by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The named topic, queue, subscription, message or delivery is absent.
    NotFound { kind: &'static str, id: String },
    /// A topic, queue or subscription with the same key already exists.
    AlreadyExists { kind: &'static str, id: String },
    /// Publish payload exceeded the configured maximum.
    MessageTooLarge { size: usize, max_size: usize },
    Internal(String), // unexpected failure in a dependency
}

pub type Result<T> = std::result::Result<T, BrokerError>;

impl BrokerError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        BrokerError::NotFound { kind, id: id.into() }
    }

    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        BrokerError::AlreadyExists { kind, id: id.into() }
    }
}

impl std::error::Error for BrokerError {}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            BrokerError::AlreadyExists { kind, id } => write!(f, "{kind} already exists: {id}"),
            BrokerError::MessageTooLarge { size, max_size } => {
                write!(f, "message size {size} exceeds maximum {max_size}")
            }
            BrokerError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}
