//! Core Newton package reader module

pub mod format;
pub mod reader;
pub mod report;
pub mod types;
mod utils;

pub use reader::PackageReader;
pub use types::error::{PackageError, Result};
