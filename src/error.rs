use thiserror::Error;

use crate::pipeline::ValidationError;

/// Errors reported by fallible pipeline and resource operations.
///
/// An error only invalidates the operation that returned it; the object it was called on remains
/// usable.
#[derive(Debug, Error)]
pub enum Error {
    /// The context handed back the null identity when asked to allocate a resource, typically
    /// because it was not initialized.
    #[error("failed to create {resource}")]
    Construction { resource: &'static str },

    #[error("invalid pipeline state: {0}")]
    Validation(#[from] ValidationError),

    #[error(
        "update of {len} bytes at offset {offset} exceeds buffer capacity of {capacity} bytes"
    )]
    OutOfRange {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("cannot pop from an empty state stack")]
    EmptyStack,

    /// A required argument was missing or referred to a resource that no longer exists.
    #[error("missing {0}")]
    NilArgument(&'static str),

    /// A vertex attribute was declared with fewer than 1 or more than 4 components.
    #[error("vertex attribute component count must be between 1 and 4, got {0}")]
    InvalidComponentCount(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::OutOfRange {
            offset: 8,
            len: 16,
            capacity: 16,
        };

        assert_eq!(
            err.to_string(),
            "update of 16 bytes at offset 8 exceeds buffer capacity of 16 bytes"
        );
        assert_eq!(
            Error::Construction { resource: "buffer" }.to_string(),
            "failed to create buffer"
        );
        assert_eq!(
            Error::InvalidComponentCount(0).to_string(),
            "vertex attribute component count must be between 1 and 4, got 0"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: Error = ValidationError::InvalidBlendFunction.into();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidBlendFunction)
        ));
    }
}
