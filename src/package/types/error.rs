//! Custom error types for the newton-package-reader crate.

use thiserror::Error;

use super::models::PackageHeader;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum PackageError {
    /// An error originating from I/O operations (open failures, short reads).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The package sets the relocation flag. The header was understood, but the
    /// relocation section layout is not decoded.
    #[error("Packages with relocation data are not supported")]
    UnsupportedRelocation { header: Box<PackageHeader> },

    /// An object record in a part's object stream could not be decoded.
    #[error("Malformed object at file offset {offset:#010x}: {reason}")]
    MalformedObject { offset: u64, reason: String },

    /// An offset/length pair points outside the available bytes.
    #[error("Out of bounds reading {context}: {offset}+{len} exceeds {available} bytes")]
    OutOfBounds {
        context: &'static str,
        offset: u64,
        len: u64,
        available: u64,
    },

    /// The file is structurally invalid.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl PackageError {
    /// Returns `true` for errors that can end a single part's object stream
    /// while the rest of the package is still reported.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PackageError::MalformedObject { .. } | PackageError::OutOfBounds { .. }
        )
    }
}

/// A convenience `Result` type alias using the crate's `PackageError` type.
pub type Result<T> = std::result::Result<T, PackageError>;
