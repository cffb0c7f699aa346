//! Core data structures for Newton package components.
//!
//! This module defines the fundamental types used throughout the library:
//! - The package directory header and its flags
//! - Part descriptors and text references
//! - Object records and tagged references from the object stream

/// Size in bytes of the fixed package directory header.
pub const HEADER_SIZE: usize = 52;

/// Size in bytes of one part table entry.
pub const PART_ENTRY_SIZE: usize = 32;

/// An `(offset, length)` pair addressing text in the string table.
///
/// Both values are byte counts; the text itself is big-endian UTF-16.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextRef {
    pub offset: u16,
    pub length: u16,
}

impl TextRef {
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Package format, classified from the last signature byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    /// `package0`: no relocation information.
    NoRelocation,
    /// `package1`: may contain relocation information.
    MayRelocate,
    /// Anything else. Decoding is still attempted.
    Unknown(u8),
}

impl From<u8> for PackageFormat {
    fn from(last: u8) -> Self {
        match last {
            b'0' => Self::NoRelocation,
            b'1' => Self::MayRelocate,
            other => Self::Unknown(other),
        }
    }
}

/// Package-level flag bits from the directory header.
///
/// Unknown bits are kept in the raw value but have no name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageFlags(pub u32);

impl PackageFlags {
    pub const AUTO_REMOVE: u32 = 0x8000_0000;
    pub const COPY_PROTECT: u32 = 0x4000_0000;
    pub const NO_COMPRESSION: u32 = 0x1000_0000;
    pub const RELOCATION: u32 = 0x0400_0000;
    pub const USE_FASTER_COMPRESSION: u32 = 0x0200_0000;

    const NAMED: [(u32, &'static str); 5] = [
        (Self::AUTO_REMOVE, "kAutoRemoveFlag"),
        (Self::COPY_PROTECT, "kCopyProtectFlag"),
        (Self::NO_COMPRESSION, "kNoCompressionFlag"),
        (Self::RELOCATION, "kRelocationFlag"),
        (Self::USE_FASTER_COMPRESSION, "kUseFasterCompressionFlag"),
    ];

    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn has_relocation(&self) -> bool {
        self.contains(Self::RELOCATION)
    }

    /// Names of all known bits that are set, in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Parsed package directory header.
///
/// All fields are stored exactly as found in the file (after big-endian
/// conversion); derived offsets are computed on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageHeader {
    pub signature: [u8; 8],
    pub reserved1: u32,
    pub flags: PackageFlags,
    pub version: u32,
    pub copyright: TextRef,
    pub name: TextRef,
    /// Declared total size of the package in bytes.
    pub size: u32,
    /// Seconds since midnight, January 4, 1904.
    pub creation_date: u32,
    pub reserved2: u32,
    pub reserved3: u32,
    /// Absolute offset where the part-data region begins.
    pub directory_size: u32,
    pub num_parts: u32,
}

impl PackageHeader {
    pub fn format(&self) -> PackageFormat {
        PackageFormat::from(self.signature[7])
    }

    pub fn signature_text(&self) -> String {
        String::from_utf8_lossy(&self.signature).into_owned()
    }

    /// Absolute offset of the string table: right after the header and part table.
    pub fn string_table_offset(&self) -> u64 {
        HEADER_SIZE as u64 + PART_ENTRY_SIZE as u64 * self.num_parts as u64
    }

    /// Absolute offset of the part-data region.
    pub fn data_offset(&self) -> u64 {
        self.directory_size as u64
    }

    /// Whole days elapsed since the 1904 epoch.
    pub fn creation_days(&self) -> u32 {
        self.creation_date / 60 / 60 / 24
    }
}

/// The kind of a part, taken from the low two flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Protocol,
    Nos,
    Raw,
    Unknown(u32),
}

/// Part flag bits from a part table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartFlags(pub u32);

impl PartFlags {
    pub const KIND_MASK: u32 = 0x0000_0003;
    pub const PROTOCOL_PART: u32 = 0x0000_0000;
    pub const NOS_PART: u32 = 0x0000_0001;
    pub const RAW_PART: u32 = 0x0000_0002;
    pub const AUTO_LOAD: u32 = 0x0000_0010;
    pub const AUTO_REMOVE: u32 = 0x0000_0020;
    pub const NOTIFY: u32 = 0x0000_0080;
    pub const AUTO_COPY: u32 = 0x0000_0100;

    const NAMED: [(u32, &'static str); 4] = [
        (Self::AUTO_LOAD, "kAutoLoadFlag"),
        (Self::AUTO_REMOVE, "kAutoRemoveFlag"),
        (Self::NOTIFY, "kNotifyFlag"),
        (Self::AUTO_COPY, "kAutoCopyFlag"),
    ];

    pub fn kind(&self) -> PartKind {
        match self.0 & Self::KIND_MASK {
            Self::PROTOCOL_PART => PartKind::Protocol,
            Self::NOS_PART => PartKind::Nos,
            Self::RAW_PART => PartKind::Raw,
            other => PartKind::Unknown(other),
        }
    }

    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    /// Names of the part kind and every known behavior bit that is set.
    pub fn names(&self) -> Vec<&'static str> {
        let kind = match self.kind() {
            PartKind::Protocol => Some("kProtocolPart"),
            PartKind::Nos => Some("kNOSPart"),
            PartKind::Raw => Some("kRawPart"),
            PartKind::Unknown(_) => None,
        };
        kind.into_iter()
            .chain(
                Self::NAMED
                    .iter()
                    .filter(|(bit, _)| self.contains(*bit))
                    .map(|(_, name)| *name),
            )
            .collect()
    }
}

/// A four-character type code such as `form` or `book`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FourCc(pub u32);

impl FourCc {
    pub fn bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// One entry of the part table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartEntry {
    /// Offset relative to the start of the part-data region.
    pub offset: u32,
    pub size: u32,
    /// Duplicate of `size` in the file format; kept verbatim.
    pub size2: u32,
    pub part_type: FourCc,
    pub reserved1: u32,
    pub flags: PartFlags,
    pub info: TextRef,
    pub reserved2: u32,
}

/// Class word of an array or binary object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassCode(pub u32);

impl ClassCode {
    pub const NIL: ClassCode = ClassCode(0x0000_0002);
    pub const SYMBOL: ClassCode = ClassCode(0x0005_5552);

    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::NIL => Some("NIL"),
            Self::SYMBOL => Some("Symbol"),
            _ => None,
        }
    }
}

/// Memory alignment of an array object's slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Four,
    Eight,
}

impl Alignment {
    pub fn bytes(&self) -> u32 {
        match self {
            Alignment::Four => 4,
            Alignment::Eight => 8,
        }
    }
}

/// A decoded 32-bit tagged reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggedRef {
    Integer(i32),
    /// Opaque heap index; never dereferenced.
    Pointer(u32),
    Character(u16),
    Special(u32),
    MagicPointer { table: u16, index: u16 },
}

/// Object format codes held in the low byte of a record header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFormat {
    Binary = 0x40,
    Array = 0x41,
    Frame = 0x43,
}

impl ObjectFormat {
    pub const MASK: u32 = 0x0000_00ff;
}

impl TryFrom<u8> for ObjectFormat {
    type Error = u8;
    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0x40 => Ok(Self::Binary),
            0x41 => Ok(Self::Array),
            0x43 => Ok(Self::Frame),
            other => Err(other),
        }
    }
}

/// One record of a part's object stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRecord {
    Binary {
        size: u32,
        class: ClassCode,
        /// Present only for symbol-class objects.
        symbol: Option<String>,
    },
    Array {
        size: u32,
        class: ClassCode,
        alignment: Alignment,
        first: TaggedRef,
    },
    Frame {
        size: u32,
        slots: Vec<TaggedRef>,
    },
}

/// An object record together with the absolute file offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub file_offset: u64,
    pub record: ObjectRecord,
}
