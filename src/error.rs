use thiserror::Error;

use crate::model::binding::Operation;

/// Failure reported by a storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum BindingError {
    #[error("invalid binding configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{operation} operation: missing {field} field")]
    MissingField {
        operation: Operation,
        field: &'static str,
    },

    #[error("{operation} operation: {field} {value:?} is invalid: {reason}")]
    InvalidField {
        operation: Operation,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("unsupported operation {0}")]
    UnsupportedOperation(String),

    #[error("failed to check bucket {bucket}")]
    Initialization {
        bucket: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to make bucket {bucket}")]
    Provisioning {
        bucket: String,
        #[source]
        source: StorageError,
    },

    #[error("create operation: failed to upload {key}")]
    Upload {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("delete operation: failed to remove {key}")]
    Removal {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("get operation: failed to read {key}")]
    NotFoundOrRead {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("presignedGet operation: failed to presign {key}")]
    Presign {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("{operation} operation: cannot marshal response to json")]
    Serialization {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    #[error("read failed at offset {offset}: {read}/{requested} bytes")]
    Read {
        offset: u64,
        requested: usize,
        read: usize,
        #[source]
        source: Option<StorageError>,
    },
}

impl BindingError {
    /// True for errors caused by the request itself rather than the backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BindingError::Validation(_)
                | BindingError::MissingField { .. }
                | BindingError::InvalidField { .. }
                | BindingError::UnsupportedOperation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BindingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_validation() {
        let cases = vec![
            (BindingError::Validation("invoke request required".into()), true),
            (
                BindingError::MissingField {
                    operation: Operation::Get,
                    field: "objectName",
                },
                true,
            ),
            (BindingError::UnsupportedOperation("copy".into()), true),
            (
                BindingError::Upload {
                    key: "file".into(),
                    source: StorageError::new("boom"),
                },
                false,
            ),
            (BindingError::Config("missing endpoint".into()), false),
        ];

        for (err, expected) in cases {
            assert_eq!(err.is_validation(), expected, "failed for case: {}", err);
        }
    }

    #[test]
    fn test_messages_name_operation_and_field() {
        let err = BindingError::MissingField {
            operation: Operation::PresignedGet,
            field: "expires",
        };
        assert_eq!(err.to_string(), "presignedGet operation: missing expires field");

        let err = BindingError::UnsupportedOperation("copy".into());
        assert_eq!(err.to_string(), "unsupported operation copy");
    }
}
