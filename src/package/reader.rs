use std::fs;
use std::path::Path;

use log::info;

use super::format::directory::{self, PackageDirectory};
use super::format::objects::ObjectStream;
use super::format::strings::StringTable;
use super::types::error::{PackageError, Result};
use super::types::models::*;
use super::utils;

/// The main reader for Newton package files.
///
/// Holds the whole package in memory and decodes its directory eagerly. Part
/// payloads are decoded lazily through [`PackageReader::objects`].
#[derive(Debug)]
pub struct PackageReader {
    data: Vec<u8>,
    directory: PackageDirectory,
}

impl PackageReader {
    /// Reads a package file from the given path.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened or read
    /// - The directory is truncated or inconsistent with the file length
    /// - The package carries relocation data (`UnsupportedRelocation`, which
    ///   still holds the parsed header)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening package file: {}", path.display());
        let data = fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Decodes the directory of an in-memory package.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let directory = directory::parse(&data)?;
        info!(
            "Package opened: '{}', {} parts",
            directory.header.signature_text(),
            directory.parts.len()
        );
        Ok(Self { data, directory })
    }

    /// Total length of the package buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn header(&self) -> &PackageHeader {
        &self.directory.header
    }

    pub fn parts(&self) -> &[PartEntry] {
        &self.directory.parts
    }

    /// Absolute offset of the part-data region.
    pub fn data_offset(&self) -> usize {
        self.directory.data_offset
    }

    pub fn string_table(&self) -> StringTable<'_> {
        StringTable::new(&self.data[self.directory.string_table.clone()])
    }

    /// Decodes a text reference against the string table.
    pub fn text(&self, text: TextRef) -> Result<String> {
        self.string_table().read(text)
    }

    /// Returns the bytes of a part.
    ///
    /// # Errors
    /// `InvalidFormat` for an unknown part index, `OutOfBounds` if the part
    /// reaches past the end of the file.
    pub fn part_data(&self, index: usize) -> Result<&[u8]> {
        let part = self.part(index)?;
        let start = self.directory.data_offset as u64 + part.offset as u64;
        utils::slice(&self.data, start, part.size as u64, "part data")
    }

    /// Returns a lazy decoder over the object records of a part.
    ///
    /// Each call starts a fresh pass from the beginning of the part.
    pub fn objects(&self, index: usize) -> Result<ObjectStream<'_>> {
        let part = self.part(index)?;
        let base_offset = self.directory.data_offset as u64 + part.offset as u64;
        Ok(ObjectStream::new(self.part_data(index)?, base_offset))
    }

    fn part(&self, index: usize) -> Result<&PartEntry> {
        self.directory.parts.get(index).ok_or_else(|| {
            PackageError::InvalidFormat(format!(
                "Invalid part index {} (package has {} parts)",
                index,
                self.directory.parts.len()
            ))
        })
    }
}
