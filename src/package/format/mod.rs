//! File format parsing layer for Newton packages.
//!
//! This module provides the decoding layer that sits between the raw package
//! buffer and the high-level [`PackageReader`](crate::package::reader::PackageReader).
//!
//! # Module Organization
//!
//! - [`directory`]: Parses the fixed header and locates the other regions
//! - [`parts`]: Parses the part table
//! - [`strings`]: Resolves text references into the string table
//! - [`objects`]: Decodes the object stream inside a part
//! - [`refs`]: Classifies tagged reference words
//!
//! # Architecture
//!
//! ```text
//! Package Structure:
//! ┌─────────────────┐
//! │  Directory      │ ← directory::parse()
//! │  header         │
//! ├─────────────────┤
//! │  Part table     │ ← parts::parse()
//! ├─────────────────┤
//! │  String table   │ ← StringTable::read()
//! ├─────────────────┤ ← directory size
//! │  Part data      │ ← ObjectStream
//! │  (object        │     └ refs::decode()
//! │   records)      │
//! └─────────────────┘
//! ```

pub mod directory;
pub mod objects;
pub mod parts;
pub mod refs;
pub mod strings;
