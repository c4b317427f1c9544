//! Inline reference records embedded in tag bodies
//!
//! | Record          | Size | Layout                                            |
//! |-----------------|------|---------------------------------------------------|
//! | `TagBlock`      | 12   | count, virtual offset, reserved                   |
//! | `TagReference`  | 16   | class, path virtual offset, path length, tag id   |
//! | `DataReference` | 20   | size, flags, file offset, virtual offset, unused  |

use super::{TagClass, TagId};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Array descriptor ("tag block"): element count and virtual offset of the
/// first element.
///
/// It carries no element type; the caller supplies it together with the
/// virtual base the offset is relative to. A zero count is never
/// dereferenced, whatever the offset says.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TagBlock {
    pub(crate) count: U32,
    pub(crate) offset: U32,
    pub(crate) reserved: U32,
}

impl TagBlock {
    /// Create a descriptor for `count` elements at `offset`.
    pub fn new(count: u32, offset: u32) -> Self {
        Self {
            count: U32::new(count),
            offset: U32::new(offset),
            reserved: U32::ZERO,
        }
    }

    /// Number of elements.
    pub fn count(&self) -> u32 {
        self.count.get()
    }

    /// Virtual offset of the first element.
    pub fn offset(&self) -> u32 {
        self.offset.get()
    }

    /// Whether the block has no elements.
    pub fn is_empty(&self) -> bool {
        self.count.get() == 0
    }
}

/// Inline reference to another tag.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TagReference {
    pub(crate) class: U32,
    pub(crate) path_offset: U32,
    pub(crate) path_length: U32,
    pub(crate) tag_id: U32,
}

impl TagReference {
    /// Create a reference record.
    pub fn new(class: TagClass, path_offset: u32, path_length: u32, tag_id: TagId) -> Self {
        Self {
            class: U32::new(class.to_raw()),
            path_offset: U32::new(path_offset),
            path_length: U32::new(path_length),
            tag_id: U32::new(tag_id.to_raw()),
        }
    }

    /// An unset reference.
    pub fn null() -> Self {
        Self::new(TagClass::NONE, 0, 0, TagId::INVALID)
    }

    /// Class of the referenced tag.
    pub fn class(&self) -> TagClass {
        TagClass::from(self.class.get())
    }

    /// Virtual offset of the referenced tag's path (tag heap).
    pub fn path_offset(&self) -> u32 {
        self.path_offset.get()
    }

    /// Length of the path in bytes, without terminator.
    pub fn path_length(&self) -> u32 {
        self.path_length.get()
    }

    /// Resolved identifier of the referenced tag.
    pub fn tag_id(&self) -> TagId {
        TagId::new(self.tag_id.get())
    }

    /// Whether the reference points at a tag.
    pub fn is_set(&self) -> bool {
        !self.tag_id().is_invalid()
    }
}

impl Default for TagReference {
    fn default() -> Self {
        Self::null()
    }
}

/// Untyped reference to a raw payload block.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct DataReference {
    pub(crate) size: U32,
    pub(crate) flags: U32,
    pub(crate) file_offset: U32,
    pub(crate) virtual_offset: U32,
    pub(crate) unused: U32,
}

impl DataReference {
    /// Payload is stored in a side resource file
    pub const FLAG_EXTERNAL: u32 = 0x1;

    /// Reference `size` bytes stored in this image.
    pub fn new(size: u32, file_offset: u32, virtual_offset: u32) -> Self {
        Self {
            size: U32::new(size),
            flags: U32::ZERO,
            file_offset: U32::new(file_offset),
            virtual_offset: U32::new(virtual_offset),
            unused: U32::ZERO,
        }
    }

    /// Reference `size` bytes at `offset` in a side resource file.
    pub fn external(size: u32, offset: u32) -> Self {
        Self {
            flags: U32::new(Self::FLAG_EXTERNAL),
            ..Self::new(size, offset, 0)
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u32 {
        self.size.get()
    }

    /// Whether the payload lives outside this image.
    pub fn is_external(&self) -> bool {
        self.flags.get() & Self::FLAG_EXTERNAL != 0
    }

    /// Offset of the payload in the file that holds it.
    pub fn file_offset(&self) -> u32 {
        self.file_offset.get()
    }

    /// Virtual offset of the payload.
    pub fn virtual_offset(&self) -> u32 {
        self.virtual_offset.get()
    }
}

const _: () = assert!(size_of::<TagBlock>() == 12);
const _: () = assert!(size_of::<TagReference>() == 16);
const _: () = assert!(size_of::<DataReference>() == 20);
const _: () = assert!(std::mem::offset_of!(TagReference, tag_id) == 12);
const _: () = assert!(std::mem::offset_of!(DataReference, virtual_offset) == 12);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_block_from_bytes() {
        let bytes = [3, 0, 0, 0, 0x10, 0x00, 0x44, 0x40, 0, 0, 0, 0];
        let block = TagBlock::ref_from_bytes(&bytes).unwrap();
        assert_eq!(block.count(), 3);
        assert_eq!(block.offset(), 0x4044_0010);
        assert!(!block.is_empty());
    }

    #[test]
    fn test_reference_unset() {
        let reference = TagReference::null();
        assert!(!reference.is_set());
        assert_eq!(reference.class(), TagClass::NONE);

        let set = TagReference::new(TagClass::BITMAP, 0x4044_1000, 12, TagId::new(0xE174_0003));
        assert!(set.is_set());
        assert_eq!(set.class(), TagClass::BITMAP);
        assert_eq!(set.path_length(), 12);
    }

    #[test]
    fn test_data_reference_flags() {
        let internal = DataReference::new(64, 0x800, 0x4044_0800);
        assert!(!internal.is_external());
        assert_eq!(internal.size(), 64);
        assert_eq!(internal.file_offset(), 0x800);

        let external = DataReference::external(128, 0x1_0000);
        assert!(external.is_external());
        assert_eq!(external.file_offset(), 0x1_0000);
    }
}
