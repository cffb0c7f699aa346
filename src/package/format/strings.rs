//! Variable-length string table.
//!
//! Text in the table is big-endian UTF-16 with no implicit terminator. A
//! [`TextRef`] gives a byte offset relative to the start of the table and a
//! byte length; the full length is always decoded, so any NUL terminator
//! stored by the package builder is part of the result.

use encoding_rs::UTF_16BE;
use log::warn;

use crate::package::types::error::{PackageError, Result};
use crate::package::types::models::TextRef;
use crate::package::utils;

/// A view of the string table region of a package.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decodes the text addressed by `text`.
    ///
    /// # Errors
    /// - `OutOfBounds` if the reference reaches past the end of the table
    /// - `InvalidFormat` if the byte length is odd
    pub fn read(&self, text: TextRef) -> Result<String> {
        if text.length % 2 != 0 {
            return Err(PackageError::InvalidFormat(format!(
                "Text reference at offset {} has odd byte length {}",
                text.offset, text.length
            )));
        }
        let bytes =
            utils::slice(self.data, text.offset as u64, text.length as u64, "string table")?;
        let (decoded, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
        if had_errors {
            warn!("Unpaired surrogate in text at offset {}", text.offset);
        }
        Ok(decoded.into_owned())
    }
}
