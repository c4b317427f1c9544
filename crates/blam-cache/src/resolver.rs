//! Virtual address resolution
//!
//! Offsets stored inside tag bodies are virtual addresses: the address the
//! data had when the map was loaded at runtime. A [`VirtualRegion`] pairs a
//! byte region with the virtual address of its first byte and turns stored
//! offsets back into typed views of that region.
//!
//! ```text
//! local = virtual_offset - base        (fails if virtual_offset < base)
//! bytes = region[local .. local + len] (fails if past region.len())
//! ```
//!
//! This is the single place where untrusted offsets are checked; everything
//! above it reads through here.

use crate::error::{MapError, Result};
use crate::primitives::TagBlock;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

/// A byte region addressed through virtual offsets.
///
/// Copyable and stateless, so it can be shared freely between readers.
#[derive(Debug, Clone, Copy)]
pub struct VirtualRegion<'a> {
    bytes: &'a [u8],
    base: u32,
}

impl<'a> VirtualRegion<'a> {
    /// Create a region whose first byte has virtual address `base`.
    pub const fn new(bytes: &'a [u8], base: u32) -> Self {
        Self { bytes, base }
    }

    /// The underlying bytes.
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Virtual address of the first byte.
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Length of the region in bytes.
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the region is empty.
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Translate a virtual offset into a local offset, checking that `size`
    /// bytes are available from there.
    pub fn resolve(&self, virtual_offset: u32, size: usize) -> Result<usize> {
        let out_of_bounds = || MapError::OutOfBounds {
            virtual_offset,
            base: self.base,
            size,
            region_len: self.bytes.len(),
        };

        let local = virtual_offset
            .checked_sub(self.base)
            .ok_or_else(out_of_bounds)? as usize;
        let end = local.checked_add(size).ok_or_else(out_of_bounds)?;
        if end > self.bytes.len() {
            return Err(out_of_bounds());
        }
        Ok(local)
    }

    /// Borrow `len` raw bytes at a virtual offset.
    pub fn read_bytes(&self, virtual_offset: u32, len: usize) -> Result<&'a [u8]> {
        let local = self.resolve(virtual_offset, len)?;
        Ok(&self.bytes[local..local + len])
    }

    /// View the record at a virtual offset.
    pub fn read<T>(&self, virtual_offset: u32) -> Result<&'a T>
    where
        T: FromBytes + KnownLayout + Immutable + Unaligned,
    {
        let size = size_of::<T>();
        let bytes = self.read_bytes(virtual_offset, size)?;
        T::ref_from_bytes(bytes).map_err(|_| MapError::OutOfBounds {
            virtual_offset,
            base: self.base,
            size,
            region_len: self.bytes.len(),
        })
    }

    /// View `count` contiguous records starting at a virtual offset.
    ///
    /// A zero count yields an empty slice without looking at the offset.
    pub fn read_slice<T>(&self, virtual_offset: u32, count: usize) -> Result<&'a [T]>
    where
        T: FromBytes + Immutable + Unaligned,
    {
        if count == 0 {
            return Ok(&[]);
        }

        let size = size_of::<T>()
            .checked_mul(count)
            .ok_or(MapError::OutOfBounds {
                virtual_offset,
                base: self.base,
                size: usize::MAX,
                region_len: self.bytes.len(),
            })?;
        let bytes = self.read_bytes(virtual_offset, size)?;
        <[T]>::ref_from_bytes_with_elems(bytes, count).map_err(|_| MapError::OutOfBounds {
            virtual_offset,
            base: self.base,
            size,
            region_len: self.bytes.len(),
        })
    }

    /// View the elements described by an array descriptor.
    pub fn read_array<T>(&self, block: &TagBlock) -> Result<&'a [T]>
    where
        T: FromBytes + Immutable + Unaligned,
    {
        if block.is_empty() {
            return Ok(&[]);
        }
        self.read_slice(block.offset(), block.count() as usize)
    }

    /// Borrow the NUL-terminated byte string at a virtual offset, without
    /// the terminator. An unterminated string runs to the end of the region.
    pub fn read_c_str(&self, virtual_offset: u32) -> Result<&'a [u8]> {
        let local = self.resolve(virtual_offset, 0)?;
        let tail = &self.bytes[local..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(&tail[..end])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use zerocopy::little_endian::U32;

    const BASE: u32 = 0x4044_0000;

    fn region_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        for value in 0u32..16 {
            bytes.extend_from_slice(&(value * 10).to_le_bytes());
        }
        bytes.extend_from_slice(b"levels\\test\0tail");
        bytes
    }

    #[test]
    fn test_resolve_subtracts_base() {
        let bytes = region_bytes();
        let region = VirtualRegion::new(&bytes, BASE);
        assert_eq!(region.resolve(BASE, 4).unwrap(), 0);
        assert_eq!(region.resolve(BASE + 8, 4).unwrap(), 8);
    }

    #[test]
    fn test_resolve_before_base_fails() {
        let bytes = region_bytes();
        let region = VirtualRegion::new(&bytes, BASE);
        let err = region.resolve(BASE - 1, 1).unwrap_err();
        assert!(err.is_out_of_bounds());
    }

    #[test]
    fn test_resolve_past_end_fails() {
        let bytes = region_bytes();
        let region = VirtualRegion::new(&bytes, BASE);
        let len = bytes.len() as u32;
        assert!(region.resolve(BASE + len, 0).is_ok());
        assert!(region.resolve(BASE + len - 4, 5).is_err());
        assert!(region.resolve(u32::MAX, 4).is_err());
    }

    #[test]
    fn test_read_typed_record() {
        let bytes = region_bytes();
        let region = VirtualRegion::new(&bytes, BASE);
        let value: &U32 = region.read(BASE + 12).unwrap();
        assert_eq!(value.get(), 30);
    }

    #[test]
    fn test_read_array_with_descriptor() {
        let bytes = region_bytes();
        let region = VirtualRegion::new(&bytes, BASE);
        let block = TagBlock::new(3, BASE + 4);
        let values: &[U32] = region.read_array(&block).unwrap();
        let values: Vec<u32> = values.iter().map(|v| v.get()).collect();
        assert_eq!(values, vec![10, 20, 30]);
    }

    #[test]
    fn test_read_array_overrun_fails() {
        let bytes = region_bytes();
        let region = VirtualRegion::new(&bytes, BASE);
        let block = TagBlock::new(1000, BASE);
        let result: Result<&[U32]> = region.read_array(&block);
        assert!(matches!(result, Err(MapError::OutOfBounds { size: 4000, .. })));
    }

    #[test]
    fn test_read_array_count_overflow_fails() {
        let bytes = region_bytes();
        let region = VirtualRegion::new(&bytes, BASE);
        let block = TagBlock::new(u32::MAX, BASE);
        let result: Result<&[crate::primitives::TagReference]> = region.read_array(&block);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_c_str() {
        let bytes = region_bytes();
        let region = VirtualRegion::new(&bytes, BASE);
        assert_eq!(region.read_c_str(BASE + 64).unwrap(), b"levels\\test");
        assert_eq!(region.read_c_str(BASE + 76).unwrap(), b"tail");
        assert!(region.read_c_str(BASE - 4).is_err());
    }

    proptest! {
        #[test]
        fn zero_count_is_never_dereferenced(offset in any::<u32>(), base in any::<u32>()) {
            let bytes = [0u8; 8];
            let region = VirtualRegion::new(&bytes, base);
            let block = TagBlock::new(0, offset);
            let values: &[U32] = region.read_array(&block).unwrap();
            prop_assert!(values.is_empty());
        }

        #[test]
        fn reads_never_escape_the_region(offset in any::<u32>(), count in 0u32..64) {
            let bytes = region_bytes();
            let region = VirtualRegion::new(&bytes, BASE);
            if let Ok(values) = region.read_array::<U32>(&TagBlock::new(count, offset)) {
                prop_assert_eq!(values.len(), count as usize);
                let local = offset.wrapping_sub(BASE) as usize;
                prop_assert!(local + values.len() * 4 <= bytes.len() || count == 0);
            }
        }
    }
}
