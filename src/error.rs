//! Error Types
//!
//! A single error enum shared by every library module. Binaries wrap it in
//! `anyhow` and only convert it to a message and exit code at the very top.

use std::io;

/// Convenience alias used across the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures raised while building databases, configuring searches,
/// running aligners or evaluating hits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A database could not be built from the given genes.
    #[error("cannot build database: {0}")]
    Construction(String),

    /// An invalid threshold, width or other setting.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Out-of-range database access.
    #[error("gene index {index} out of range for database of {len} genes")]
    Index { index: usize, len: usize },

    /// Failure reported by the external alignment engine.
    #[error("alignment engine failed: {0}")]
    AlignmentEngine(String),

    /// Malformed serialized database.
    #[error("malformed database record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sequence containing characters outside the IUPAC nucleotide alphabet.
    #[error("invalid nucleotide {byte:?} at position {position} in sequence {id:?}")]
    InvalidSequence { id: String, position: usize, byte: char },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Numeric exit code associated with this failure.
    ///
    /// I/O errors carry the OS errno when there is one; every other variant
    /// maps to a fixed code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Io(e) => e.raw_os_error().unwrap_or(1),
            Error::Construction(_) => 2,
            Error::Configuration(_) => 3,
            Error::Index { .. } => 4,
            Error::AlignmentEngine(_) => 5,
            Error::Serialization(_) => 6,
            Error::InvalidSequence { .. } => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_exit_code_uses_errno() {
        let err = Error::from(io::Error::from_raw_os_error(2));
        assert_eq!(err.exit_code(), 2);

        let err = Error::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_index_message() {
        let err = Error::Index { index: 5, len: 3 };
        assert_eq!(err.to_string(), "gene index 5 out of range for database of 3 genes");
    }
}
