//! # newton-package-reader
//!
//! A reader for Newton package files (`package0` / `package1`).
//!
//! Decodes the package directory, the part table, the string table and the
//! object stream stored in each part. Packages with relocation data are
//! recognized but not decoded.
pub mod package;

// Re-export the main types for convenience
pub use package::{
    format::objects::ObjectStream,
    format::strings::StringTable,
    report::DecodeOptions,
    types::models::{
        Alignment, ClassCode, FourCc, ObjectEntry, ObjectRecord, PackageFlags, PackageFormat,
        PackageHeader, PartEntry, PartFlags, PartKind, TaggedRef, TextRef,
    },
    PackageError, PackageReader, Result,
};
