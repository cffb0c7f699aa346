//! Tagged reference classification.
//!
//! A reference is a 32-bit word whose low bits select its meaning:
//!
//! ```text
//! ...............................00  Integer (30-bit signed, value << 2)
//! ...............................01  Pointer (heap index << 2)
//! 000000000000cccccccccccccccc1010  Character (16-bit code point << 4)
//! ...............................10  Special constant
//! tttttttttttttttt..............11  Magic pointer (table, index << 2)
//! ```
//!
//! Characters are a strict subset of the `10` pattern, so they are matched
//! before immediates.

use crate::package::types::models::TaggedRef;

const TAG_MASK: u32 = 0x0000_0003;
const TAG_INTEGER: u32 = 0x0;
const TAG_POINTER: u32 = 0x1;
const TAG_IMMEDIATE: u32 = 0x2;

const CHAR_MASK: u32 = 0xfff0_000f;
const CHAR_TAG: u32 = 0x0000_000a;

/// Classifies one tagged word. Every input maps to exactly one variant.
pub fn decode(word: u32) -> TaggedRef {
    match word & TAG_MASK {
        TAG_INTEGER => TaggedRef::Integer((word as i32) >> 2),
        TAG_POINTER => TaggedRef::Pointer(word >> 2),
        TAG_IMMEDIATE if word & CHAR_MASK == CHAR_TAG => TaggedRef::Character((word >> 4) as u16),
        TAG_IMMEDIATE => TaggedRef::Special(word >> 2),
        _ => TaggedRef::MagicPointer {
            table: (word >> 16) as u16,
            index: ((word & 0x0000_ffff) >> 2) as u16,
        },
    }
}

/// Builds the tagged word for a reference.
///
/// Values that do not fit the tag's payload width are truncated, so only
/// references produced by [`decode`] are guaranteed to round-trip.
pub fn encode(reference: TaggedRef) -> u32 {
    match reference {
        TaggedRef::Integer(value) => (value << 2) as u32,
        TaggedRef::Pointer(index) => (index << 2) | TAG_POINTER,
        TaggedRef::Character(code) => ((code as u32) << 4) | CHAR_TAG,
        TaggedRef::Special(value) => (value << 2) | TAG_IMMEDIATE,
        TaggedRef::MagicPointer { table, index } => {
            ((table as u32) << 16) | (((index as u32) << 2) & 0x0000_ffff) | TAG_MASK
        }
    }
}
