//! Synthetic map images for tests
//!
//! [`MapBuilder`] lays out a complete, valid map in memory:
//!
//! ```text
//! 0x0000  map header (2048 bytes)
//! 0x0800  tag index header (40 bytes)
//! 0x0828  directory entries (32 bytes x capacity)
//! ...     data area: paths, tag bodies, arrays, raw payloads
//! ```
//!
//! The tag heap spans the whole image with virtual base [`HEAP_BASE`], so
//! the virtual address of any byte is `HEAP_BASE + file offset`.
//! [`BspBuilder`] lays out a structure BSP region with its own private base.

#![allow(clippy::expect_used, clippy::panic, clippy::cast_possible_truncation)]

use zerocopy::{Immutable, IntoBytes};

use crate::directory::{TAG_ENTRY_SIZE, TagEntry};
use crate::header::{MAP_HEADER_SIZE, MapHeader, TAG_INDEX_HEADER_SIZE, TagIndexHeader};
use crate::primitives::{DataReference, TagBlock, TagClass, TagId, TagReference};
use crate::tags::TagLayout;
use crate::tags::bsp::{BSP_HEADER_SIZE, BspHeader};

/// Virtual base of the tag heap in built maps
pub const HEAP_BASE: u32 = 0x4044_0000;

/// Identifier of the first directory entry in built maps
pub const BASE_TAG: u32 = 0xE174_0000;

const DEFAULT_CAPACITY: usize = 32;

fn pad_to_word(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

/// Builder for a synthetic map image.
#[derive(Debug, Clone)]
pub struct MapBuilder {
    header: MapHeader,
    scenario: TagId,
    capacity: usize,
    entries: Vec<TagEntry>,
    path_lengths: Vec<u32>,
    data: Vec<u8>,
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MapBuilder {
    /// Builder with room for 32 directory entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Builder with room for `capacity` directory entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            header: MapHeader::default(),
            scenario: TagId::INVALID,
            capacity,
            entries: Vec::new(),
            path_lengths: Vec::new(),
            data: Vec::new(),
        }
    }

    fn data_start(&self) -> usize {
        MAP_HEADER_SIZE + TAG_INDEX_HEADER_SIZE + self.capacity * TAG_ENTRY_SIZE
    }

    /// Append raw bytes to the data area, returning their file offset.
    pub fn append(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.data_start() + self.data.len();
        self.data.extend_from_slice(bytes);
        pad_to_word(&mut self.data);
        offset as u32
    }

    /// Append raw bytes, returning their virtual address in the tag heap.
    pub fn alloc(&mut self, bytes: &[u8]) -> u32 {
        HEAP_BASE + self.append(bytes)
    }

    /// Append an array of records, returning its block descriptor.
    pub fn alloc_array<T: IntoBytes + Immutable>(&mut self, items: &[T]) -> TagBlock {
        if items.is_empty() {
            return TagBlock::default();
        }
        let offset = self.alloc(items.as_bytes());
        TagBlock::new(items.len() as u32, offset)
    }

    /// Virtual address one past the current end of the data area.
    pub fn virtual_end(&self) -> u32 {
        HEAP_BASE + (self.data_start() + self.data.len()) as u32
    }

    fn push_entry(&mut self, classes: [TagClass; 3], path: &str, body_offset: u32, external: bool) -> TagId {
        let index = self.entries.len();
        assert!(index < self.capacity, "directory capacity of {} exceeded", self.capacity);

        let mut stored = path.as_bytes().to_vec();
        stored.push(0);
        let path_offset = self.alloc(&stored);

        let id = TagId::new(BASE_TAG + index as u32);
        self.entries
            .push(TagEntry::new(classes, id, path_offset, body_offset, external));
        self.path_lengths.push(path.len() as u32);
        id
    }

    /// Add a tag whose body is copied into the data area.
    pub fn add_tag(&mut self, classes: [TagClass; 3], path: &str, body: &[u8]) -> TagId {
        let body_offset = self.alloc(body);
        self.push_entry(classes, path, body_offset, false)
    }

    /// Add a tag whose body lives at an arbitrary virtual offset.
    pub fn add_tag_at(&mut self, classes: [TagClass; 3], path: &str, body_offset: u32) -> TagId {
        self.push_entry(classes, path, body_offset, false)
    }

    /// Add a typed tag body under its layout's class.
    pub fn add_typed<T: TagLayout + IntoBytes + Immutable>(&mut self, path: &str, body: &T) -> TagId {
        self.add_tag([T::CLASS, TagClass::NONE, TagClass::NONE], path, body.as_bytes())
    }

    /// Add a tag whose body lives in a resource file.
    pub fn add_external(&mut self, classes: [TagClass; 3], path: &str, resource_offset: u32) -> TagId {
        self.push_entry(classes, path, resource_offset, true)
    }

    /// A reference record pointing at an added tag.
    pub fn reference(&self, id: TagId) -> TagReference {
        let index = usize::from(id.index());
        let entry = &self.entries[index];
        TagReference::new(entry.primary_class(), entry.path_offset(), self.path_lengths[index], id)
    }

    /// Set the scenario tag recorded in the index header.
    pub fn set_scenario(&mut self, id: TagId) {
        self.scenario = id;
    }

    /// The map header, for tests that need unusual values.
    ///
    /// The tag index offset is always overwritten by [`build`](Self::build);
    /// the file size only when left at zero.
    pub fn header_mut(&mut self) -> &mut MapHeader {
        &mut self.header
    }

    /// Assemble the map image.
    pub fn build(&self) -> Vec<u8> {
        let total = self.data_start() + self.data.len();

        let mut header = self.header.clone();
        header.tag_index_offset = MAP_HEADER_SIZE as u32;
        header.tag_index_size = (total - MAP_HEADER_SIZE) as u32;
        if header.file_size == 0 {
            header.file_size = total as u32;
        }

        let mut image = header.to_bytes().expect("header encodes");
        let index = TagIndexHeader::new(
            HEAP_BASE + (MAP_HEADER_SIZE + TAG_INDEX_HEADER_SIZE) as u32,
            TagId::new(BASE_TAG),
            self.scenario,
            self.entries.len() as u32,
        );
        image.extend_from_slice(index.as_bytes());
        image.extend_from_slice(self.entries.as_bytes());
        image.resize(self.data_start(), 0);
        image.extend_from_slice(&self.data);
        image
    }
}

/// Builder for a structure BSP region with a private virtual base.
#[derive(Debug, Clone)]
pub struct BspBuilder {
    base: u32,
    data: Vec<u8>,
}

impl BspBuilder {
    /// Empty region whose first byte has virtual address `base`.
    pub fn new(base: u32) -> Self {
        Self {
            base,
            data: vec![0; BSP_HEADER_SIZE],
        }
    }

    /// Append raw bytes, returning their private virtual address.
    pub fn alloc(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.base + self.data.len() as u32;
        self.data.extend_from_slice(bytes);
        pad_to_word(&mut self.data);
        offset
    }

    /// Append one record, returning its private virtual address.
    pub fn alloc_record<T: IntoBytes + Immutable>(&mut self, record: &T) -> u32 {
        self.alloc(record.as_bytes())
    }

    /// Append an array of records, returning its block descriptor.
    pub fn alloc_array<T: IntoBytes + Immutable>(&mut self, items: &[T]) -> TagBlock {
        if items.is_empty() {
            return TagBlock::default();
        }
        let offset = self.alloc(items.as_bytes());
        TagBlock::new(items.len() as u32, offset)
    }

    /// Append a raw payload, returning a data reference addressed by its
    /// private virtual address.
    pub fn alloc_data(&mut self, bytes: &[u8]) -> DataReference {
        let offset = self.alloc(bytes);
        DataReference::new(bytes.len() as u32, 0, offset)
    }

    /// Region bytes with the header written for the given body address.
    pub fn finish(&self, body_offset: u32, lightmap_material_count: u32) -> Vec<u8> {
        let mut region = self.data.clone();
        let header = BspHeader::new(body_offset, lightmap_material_count);
        region[..BSP_HEADER_SIZE].copy_from_slice(header.as_bytes());
        region
    }
}
