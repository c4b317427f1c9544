//! Tag directory entry

use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::primitives::{TagClass, TagId};

/// Size of one directory entry in bytes
pub const TAG_ENTRY_SIZE: usize = 32;

/// One record of the tag directory (32 bytes)
///
/// The three class ids form the inheritance chain: a water shader has
/// primary class `swat` and secondary class `shdr`.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TagEntry {
    pub(crate) primary_class: U32,
    pub(crate) secondary_class: U32,
    pub(crate) tertiary_class: U32,
    pub(crate) tag_id: U32,
    pub(crate) path_offset: U32,
    pub(crate) body_offset: U32,
    pub(crate) external: U32,
    pub(crate) reserved: U32,
}

impl TagEntry {
    /// Build an entry record.
    pub fn new(classes: [TagClass; 3], tag_id: TagId, path_offset: u32, body_offset: u32, external: bool) -> Self {
        Self {
            primary_class: U32::new(classes[0].to_raw()),
            secondary_class: U32::new(classes[1].to_raw()),
            tertiary_class: U32::new(classes[2].to_raw()),
            tag_id: U32::new(tag_id.to_raw()),
            path_offset: U32::new(path_offset),
            body_offset: U32::new(body_offset),
            external: U32::new(u32::from(external)),
            reserved: U32::ZERO,
        }
    }

    /// Concrete class of the tag.
    pub fn primary_class(&self) -> TagClass {
        TagClass::from(self.primary_class.get())
    }

    /// Parent class.
    pub fn secondary_class(&self) -> TagClass {
        TagClass::from(self.secondary_class.get())
    }

    /// Grandparent class.
    pub fn tertiary_class(&self) -> TagClass {
        TagClass::from(self.tertiary_class.get())
    }

    /// All three classes, most specific first.
    pub fn classes(&self) -> [TagClass; 3] {
        [self.primary_class(), self.secondary_class(), self.tertiary_class()]
    }

    /// Whether the tag is of `class` or derives from it.
    pub fn is_a(&self, class: TagClass) -> bool {
        !class.is_none() && self.classes().contains(&class)
    }

    /// Identifier of this tag.
    pub fn tag_id(&self) -> TagId {
        TagId::new(self.tag_id.get())
    }

    /// Virtual offset of the tag path (tag heap).
    pub fn path_offset(&self) -> u32 {
        self.path_offset.get()
    }

    /// Virtual offset of the tag body (tag heap), or an offset into a
    /// resource file when the tag is external.
    pub fn body_offset(&self) -> u32 {
        self.body_offset.get()
    }

    /// Whether the body is stored in a side resource file.
    pub fn is_external(&self) -> bool {
        self.external.get() != 0
    }
}

const _: () = assert!(size_of::<TagEntry>() == TAG_ENTRY_SIZE);
const _: () = assert!(std::mem::offset_of!(TagEntry, tag_id) == 12);
const _: () = assert!(std::mem::offset_of!(TagEntry, body_offset) == 20);
const _: () = assert!(std::mem::offset_of!(TagEntry, external) == 24);
