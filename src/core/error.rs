//! Permission system error types

use thiserror::Error;

/// Errors that can occur while administering tenant permissions
///
/// Access checks themselves never fail; these errors come from group
/// lifecycle, node declaration and configuration loading.
#[derive(Error, Debug)]
pub enum PermissionError {
    /// Every generated group id collided with an existing group
    #[error("Could not create a group with a unique ID after {attempts} attempts")]
    GroupIdExhausted { attempts: usize },

    /// A required input was empty or absent
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    /// Group not found in the tenant
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Node id was not declared
    #[error("Permission node not found: {0}")]
    NodeNotFound(String),

    /// Node id declared twice
    #[error("Permission node already registered: {0}")]
    DuplicateNode(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PermissionError {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        PermissionError::InvalidConfig(msg.into())
    }

    /// Whether this error signals a broken invariant rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, PermissionError::GroupIdExhausted { .. })
    }
}

/// Result type alias for permission operations
pub type PermissionResult<T> = Result<T, PermissionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PermissionError::GroupIdExhausted { attempts: 7 };
        assert_eq!(
            err.to_string(),
            "Could not create a group with a unique ID after 7 attempts"
        );

        let err = PermissionError::MissingInput("node id");
        assert_eq!(err.to_string(), "Missing required input: node id");
    }

    #[test]
    fn test_is_fatal() {
        assert!(PermissionError::GroupIdExhausted { attempts: 7 }.is_fatal());
        assert!(!PermissionError::GroupNotFound("abc".into()).is_fatal());
        assert!(!PermissionError::invalid_config("bad").is_fatal());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PermissionError = io_err.into();
        assert!(matches!(err, PermissionError::Io(_)));
    }
}
