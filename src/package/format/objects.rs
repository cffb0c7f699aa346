//! # Object Stream Decoding
//!
//! A part's payload is a flat run of object records. Each record starts with a
//! big-endian header word:
//!
//! ```text
//! [24 bits] total record size in bytes
//! [ 8 bits] object format (0x40 binary, 0x41 array, 0x43 frame)
//! ```
//!
//! followed by a flags word and, for arrays and binaries, a class word:
//!
//! ```text
//! +0   header word
//! +4   flags (array: low bit set = 4-byte alignment, clear = 8-byte)
//! +8   class (array/binary) or first slot (frame)
//! +12  payload
//! ```
//!
//! Binary records are padded to a multiple of four bytes; arrays and frames are
//! not. Pointers found inside records are reported as indices and never
//! followed.

use byteorder::{BigEndian, ByteOrder};
use encoding_rs::MACINTOSH;
use log::{debug, trace};

use crate::package::format::refs;
use crate::package::types::error::{PackageError, Result};
use crate::package::types::models::{
    Alignment, ClassCode, ObjectEntry, ObjectFormat, ObjectRecord, TaggedRef,
};
use crate::package::utils;

/// Bytes before a frame's first slot.
const FRAME_HEADER_SIZE: usize = 8;
/// Smallest binary record: header, flags and class.
const MIN_BINARY_SIZE: usize = 12;
/// Smallest array record: header, flags, class and one slot.
const MIN_ARRAY_SIZE: usize = 16;
/// Symbol text starts after the class word and the 4-byte symbol hash.
const SYMBOL_TEXT_OFFSET: usize = 16;
/// Symbol text length is the record size minus the text offset and the
/// trailing NUL.
const SYMBOL_TEXT_OVERHEAD: usize = SYMBOL_TEXT_OFFSET + 1;

/// Lazily decodes the object records of one part.
///
/// Yields `Ok` entries until the region is consumed exactly. The first error
/// (unknown format, impossible size, truncated record) is yielded once and
/// ends the stream; entries produced before it remain valid.
#[derive(Debug, Clone)]
pub struct ObjectStream<'a> {
    region: &'a [u8],
    base_offset: u64,
    pos: usize,
    finished: bool,
}

impl<'a> ObjectStream<'a> {
    /// Creates a stream over `region`, whose first byte sits at absolute file
    /// offset `base_offset`.
    pub fn new(region: &'a [u8], base_offset: u64) -> Self {
        Self {
            region,
            base_offset,
            pos: 0,
            finished: false,
        }
    }

    /// Bytes consumed so far, relative to the start of the region.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn file_offset(&self) -> u64 {
        self.base_offset + self.pos as u64
    }

    fn malformed(&self, reason: String) -> PackageError {
        PackageError::MalformedObject {
            offset: self.file_offset(),
            reason,
        }
    }

    /// Decodes the record at the cursor, returning it with the number of bytes
    /// it occupies in the stream.
    fn decode_record(&self) -> Result<(ObjectRecord, usize)> {
        let header = utils::read_u32_at(self.region, self.pos as u64, "object header")?;
        let size = (header >> 8) as usize;
        let format = ObjectFormat::try_from((header & ObjectFormat::MASK) as u8).map_err(|code| {
            self.malformed(format!("unrecognized object format {:#04x}", code))
        })?;

        let min_size = match format {
            ObjectFormat::Binary => MIN_BINARY_SIZE,
            ObjectFormat::Array => MIN_ARRAY_SIZE,
            ObjectFormat::Frame => FRAME_HEADER_SIZE,
        };
        // Also guarantees every record advances the cursor.
        if size < min_size {
            return Err(self.malformed(format!(
                "{:?} record declares {} bytes, needs at least {}",
                format, size, min_size
            )));
        }

        let record = utils::slice(self.region, self.pos as u64, size as u64, "object record")?;
        let word_at = |offset: usize| BigEndian::read_u32(&record[offset..offset + 4]);

        match format {
            ObjectFormat::Binary => {
                let class = ClassCode(word_at(8));
                let symbol = (class == ClassCode::SYMBOL).then(|| {
                    let len = size.saturating_sub(SYMBOL_TEXT_OVERHEAD);
                    let bytes = record
                        .get(SYMBOL_TEXT_OFFSET..SYMBOL_TEXT_OFFSET + len)
                        .unwrap_or_default();
                    MACINTOSH.decode_without_bom_handling(bytes).0.into_owned()
                });
                let padded = (size + 3) & !3;
                let consumed = padded.min(self.region.len() - self.pos);
                if consumed != padded {
                    debug!(
                        "Binary record at {:#010x} ends the part before its padding",
                        self.file_offset()
                    );
                }
                let record = ObjectRecord::Binary {
                    size: size as u32,
                    class,
                    symbol,
                };
                Ok((record, consumed))
            }
            ObjectFormat::Array => {
                let alignment = if word_at(4) & 0x1 != 0 {
                    Alignment::Four
                } else {
                    Alignment::Eight
                };
                let record = ObjectRecord::Array {
                    size: size as u32,
                    class: ClassCode(word_at(8)),
                    alignment,
                    first: refs::decode(word_at(12)),
                };
                Ok((record, size))
            }
            ObjectFormat::Frame => {
                let body = &record[FRAME_HEADER_SIZE..];
                if body.len() % 4 != 0 {
                    return Err(self.malformed(format!(
                        "frame of {} bytes does not hold whole slots",
                        size
                    )));
                }
                let slots: Vec<TaggedRef> = body
                    .chunks_exact(4)
                    .map(|chunk| refs::decode(BigEndian::read_u32(chunk)))
                    .collect();
                Ok((ObjectRecord::Frame { size: size as u32, slots }, size))
            }
        }
    }
}

impl<'a> Iterator for ObjectStream<'a> {
    type Item = Result<ObjectEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.pos >= self.region.len() {
            return None;
        }

        match self.decode_record() {
            Ok((record, consumed)) => {
                let entry = ObjectEntry {
                    file_offset: self.file_offset(),
                    record,
                };
                trace!(
                    "Object at {:#010x}: {} bytes consumed",
                    entry.file_offset,
                    consumed
                );
                self.pos += consumed;
                Some(Ok(entry))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
