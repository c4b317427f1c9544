//! Map header and tag index header
//!
//! The map header is a fixed 2048-byte record at file offset 0:
//!
//! ```text
//! 0x000  "head" marker            0x040  build string [32]
//! 0x004  cache version            0x060  scenario type (u16) + pad
//! 0x008  declared file size       0x064  checksum
//! 0x00C  padding length           0x068  flags
//! 0x010  tag index file offset    0x06C  reserved [1936]
//! 0x014  tag index size           0x7FC  "foot" marker
//! 0x018  reserved [8]
//! 0x020  scenario name [32]
//! ```
//!
//! It is decoded into an owned record with `binrw` because it is read once
//! per map. The 40-byte tag index header is viewed in place.

use std::fmt;
use std::io::Cursor;

use binrw::{BinRead, BinWrite};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{MapError, Result};
use crate::primitives::{TagClass, TagId, fixed_str};

/// Size of the map header in bytes
pub const MAP_HEADER_SIZE: usize = 2048;

/// Size of the tag index header in bytes
pub const TAG_INDEX_HEADER_SIZE: usize = 40;

/// Leading map header marker
pub const HEAD_MAGIC: TagClass = TagClass::from_fourcc(*b"head");

/// Trailing map header marker
pub const FOOT_MAGIC: TagClass = TagClass::from_fourcc(*b"foot");

/// Tag index header marker
pub const TAGS_MAGIC: TagClass = TagClass::from_fourcc(*b"tags");

/// Offset of the trailing marker inside the map header
const FOOT_OFFSET: u64 = 0x7FC;

/// Cache format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapVersion {
    /// Original Xbox release
    Xbox,
    /// PC demo
    Demo,
    /// PC retail
    Retail,
    /// Custom Edition
    CustomEdition,
    /// Any other value
    Other(u32),
}

impl MapVersion {
    /// Decode a raw version value.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            5 => Self::Xbox,
            6 => Self::Demo,
            7 => Self::Retail,
            609 => Self::CustomEdition,
            other => Self::Other(other),
        }
    }

    /// Raw value as stored in the header.
    pub const fn to_raw(self) -> u32 {
        match self {
            Self::Xbox => 5,
            Self::Demo => 6,
            Self::Retail => 7,
            Self::CustomEdition => 609,
            Self::Other(raw) => raw,
        }
    }

    /// Whether this is one of the known enumerants.
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for MapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xbox => f.write_str("xbox"),
            Self::Demo => f.write_str("demo"),
            Self::Retail => f.write_str("retail"),
            Self::CustomEdition => f.write_str("custom edition"),
            Self::Other(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

/// Kind of scenario a map contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioType {
    /// Campaign level
    Singleplayer,
    /// Multiplayer level
    Multiplayer,
    /// Main menu / user interface
    UserInterface,
    /// Any other value
    Other(u16),
}

impl ScenarioType {
    /// Decode a raw scenario type.
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Singleplayer,
            1 => Self::Multiplayer,
            2 => Self::UserInterface,
            other => Self::Other(other),
        }
    }
}

/// Map header (2048 bytes at file offset 0)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct MapHeader {
    /// Leading marker, `"head"`
    pub head_magic: u32,
    /// Cache format version
    pub version: u32,
    /// Declared size of the whole file
    pub file_size: u32,
    /// Length of trailing padding
    pub padding_length: u32,
    /// File offset of the tag index header
    pub tag_index_offset: u32,
    /// Size of the tag index (header, entries and tag heap)
    pub tag_index_size: u32,
    /// Reserved
    pub reserved: [u8; 8],
    /// Scenario name, NUL padded
    pub scenario_name: [u8; 32],
    /// Build string, NUL padded
    pub build: [u8; 32],
    /// Scenario type
    pub scenario_type: u16,
    /// Reserved
    pub reserved_type: u16,
    /// Header checksum
    pub checksum: u32,
    /// Flags
    pub flags: u32,
    /// Trailing marker, `"foot"`
    #[brw(pad_before = 1936)]
    pub foot_magic: u32,
}

impl MapHeader {
    /// Decode and check the header at the start of a map image.
    ///
    /// Fails with a malformed header error when the image is shorter than a
    /// header or either marker does not match.
    pub fn parse(image: &[u8]) -> Result<Self> {
        if image.len() < MAP_HEADER_SIZE {
            return Err(MapError::malformed(
                0,
                format!(
                    "image of {} bytes is shorter than the {MAP_HEADER_SIZE}-byte map header",
                    image.len()
                ),
            ));
        }

        let header = Self::read(&mut Cursor::new(&image[..MAP_HEADER_SIZE]))?;

        if header.head_magic != HEAD_MAGIC.to_raw() {
            return Err(MapError::malformed(
                0,
                format!(
                    "leading marker is '{}', expected '{HEAD_MAGIC}'",
                    TagClass::from(header.head_magic)
                ),
            ));
        }
        if header.foot_magic != FOOT_MAGIC.to_raw() {
            return Err(MapError::malformed(
                FOOT_OFFSET,
                format!(
                    "trailing marker is '{}', expected '{FOOT_MAGIC}'",
                    TagClass::from(header.foot_magic)
                ),
            ));
        }

        Ok(header)
    }

    /// Encode the header into its 2048-byte on-disk form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(MAP_HEADER_SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Cache format version.
    pub const fn version(&self) -> MapVersion {
        MapVersion::from_raw(self.version)
    }

    /// Scenario type.
    pub const fn scenario_type(&self) -> ScenarioType {
        ScenarioType::from_raw(self.scenario_type)
    }

    /// Scenario name without padding.
    pub fn scenario_name(&self) -> String {
        fixed_str(&self.scenario_name).into_owned()
    }

    /// Build string without padding.
    pub fn build(&self) -> String {
        fixed_str(&self.build).into_owned()
    }
}

impl Default for MapHeader {
    fn default() -> Self {
        Self {
            head_magic: HEAD_MAGIC.to_raw(),
            version: MapVersion::Retail.to_raw(),
            file_size: 0,
            padding_length: 0,
            tag_index_offset: MAP_HEADER_SIZE as u32,
            tag_index_size: 0,
            reserved: [0; 8],
            scenario_name: [0; 32],
            build: [0; 32],
            scenario_type: 0,
            reserved_type: 0,
            checksum: 0,
            flags: 0,
            foot_magic: FOOT_MAGIC.to_raw(),
        }
    }
}

/// Tag index header (40 bytes at the map header's tag index offset)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TagIndexHeader {
    pub(crate) tag_index_virtual_offset: U32,
    pub(crate) base_tag: U32,
    pub(crate) scenario_tag: U32,
    pub(crate) tag_count: U32,
    pub(crate) vertex_count: U32,
    pub(crate) vertex_offset: U32,
    pub(crate) index_count: U32,
    pub(crate) index_offset: U32,
    pub(crate) model_data_size: U32,
    pub(crate) magic: U32,
}

impl TagIndexHeader {
    /// Build a header record.
    pub fn new(tag_index_virtual_offset: u32, base_tag: TagId, scenario_tag: TagId, tag_count: u32) -> Self {
        Self {
            tag_index_virtual_offset: U32::new(tag_index_virtual_offset),
            base_tag: U32::new(base_tag.to_raw()),
            scenario_tag: U32::new(scenario_tag.to_raw()),
            tag_count: U32::new(tag_count),
            vertex_count: U32::ZERO,
            vertex_offset: U32::ZERO,
            index_count: U32::ZERO,
            index_offset: U32::ZERO,
            model_data_size: U32::ZERO,
            magic: U32::new(TAGS_MAGIC.to_raw()),
        }
    }

    /// Virtual address of the first entry of the directory.
    pub fn tag_index_virtual_offset(&self) -> u32 {
        self.tag_index_virtual_offset.get()
    }

    /// Identifier of the first directory entry.
    pub fn base_tag(&self) -> TagId {
        TagId::new(self.base_tag.get())
    }

    /// Identifier of the map's scenario tag.
    pub fn scenario_tag(&self) -> TagId {
        TagId::new(self.scenario_tag.get())
    }

    /// Number of directory entries.
    pub fn tag_count(&self) -> u32 {
        self.tag_count.get()
    }

    /// Legacy model vertex count.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count.get()
    }

    /// Legacy model vertex data offset.
    pub fn vertex_offset(&self) -> u32 {
        self.vertex_offset.get()
    }

    /// Legacy model index count.
    pub fn index_count(&self) -> u32 {
        self.index_count.get()
    }

    /// Legacy model index data offset.
    pub fn index_offset(&self) -> u32 {
        self.index_offset.get()
    }

    /// Size of the legacy model data block.
    pub fn model_data_size(&self) -> u32 {
        self.model_data_size.get()
    }

    /// Marker, `"tags"`.
    pub fn magic(&self) -> TagClass {
        TagClass::from(self.magic.get())
    }
}

const _: () = assert!(size_of::<TagIndexHeader>() == TAG_INDEX_HEADER_SIZE);
const _: () = assert!(std::mem::offset_of!(TagIndexHeader, tag_count) == 12);
const _: () = assert!(std::mem::offset_of!(TagIndexHeader, magic) == 36);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header_bytes() -> Vec<u8> {
        let mut header = MapHeader {
            file_size: 0x1234,
            tag_index_offset: 0x800,
            scenario_type: 1,
            ..MapHeader::default()
        };
        header.scenario_name[..10].copy_from_slice(b"bloodgulch");
        header.build[..13].copy_from_slice(b"01.00.00.0609");
        header.version = 609;
        header.to_bytes().unwrap()
    }

    #[test]
    fn test_header_field_offsets() {
        let bytes = header_bytes();
        assert_eq!(bytes.len(), MAP_HEADER_SIZE);
        assert_eq!(&bytes[0..4], b"daeh");
        assert_eq!(&bytes[4..8], &609u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &0x1234u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &0x800u32.to_le_bytes());
        assert_eq!(&bytes[32..42], b"bloodgulch");
        assert_eq!(&bytes[64..77], b"01.00.00.0609");
        assert_eq!(&bytes[96..98], &1u16.to_le_bytes());
        assert_eq!(&bytes[2044..2048], b"toof");
    }

    #[test]
    fn test_parse_header() {
        let header = MapHeader::parse(&header_bytes()).unwrap();
        assert_eq!(header.version(), MapVersion::CustomEdition);
        assert_eq!(header.scenario_type(), ScenarioType::Multiplayer);
        assert_eq!(header.scenario_name(), "bloodgulch");
        assert_eq!(header.tag_index_offset, 0x800);
    }

    #[test]
    fn test_bad_leading_marker() {
        let mut bytes = header_bytes();
        bytes[0..4].copy_from_slice(b"HEAD");
        let err = MapHeader::parse(&bytes).unwrap_err();
        assert!(err.is_malformed_header());
    }

    #[test]
    fn test_bad_trailing_marker() {
        let mut bytes = header_bytes();
        bytes[2044..2048].copy_from_slice(b"xxxx");
        match MapHeader::parse(&bytes).unwrap_err() {
            MapError::MalformedHeader { offset, message } => {
                assert_eq!(offset, 0x7FC);
                assert!(message.contains("trailing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_image() {
        let bytes = header_bytes();
        let err = MapHeader::parse(&bytes[..100]).unwrap_err();
        assert!(err.is_malformed_header());
    }

    #[test]
    fn test_version_values() {
        assert_eq!(MapVersion::from_raw(7), MapVersion::Retail);
        assert_eq!(MapVersion::from_raw(5).to_raw(), 5);
        assert!(!MapVersion::from_raw(42).is_known());
        assert_eq!(ScenarioType::from_raw(9), ScenarioType::Other(9));
    }

    #[test]
    fn test_index_header_layout() {
        let header = TagIndexHeader::new(0x4044_0028, TagId::new(0xE174_0000), TagId::new(0xE174_0001), 3);
        let bytes = header.as_bytes();
        assert_eq!(&bytes[36..40], b"sgat");
        assert_eq!(header.magic(), TAGS_MAGIC);
        assert_eq!(header.tag_count(), 3);
        assert_eq!(header.base_tag().index(), 0);
    }
}
