//! Tag directory
//!
//! The directory is the tag index header followed by a dense array of
//! [`TagEntry`] records. A [`TagMap`] validates both once and then hands out
//! borrowed views: entries, names and typed tag bodies, all resolved through
//! the tag heap's virtual base.
//!
//! ```text
//! TagHeapVirtualBase = index.tag_index_virtual_offset
//!                    - size_of::<TagIndexHeader>()
//!                    - header.tag_index_offset
//! ```

mod entry;

pub use entry::{TAG_ENTRY_SIZE, TagEntry};

use tracing::{debug, warn};
use zerocopy::FromBytes;

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::header::{MapHeader, TAG_INDEX_HEADER_SIZE, TAGS_MAGIC, TagIndexHeader};
use crate::primitives::{DataReference, TagClass, TagId, TagReference};
use crate::resolver::VirtualRegion;
use crate::tags::TagLayout;
use crate::tags::scenario::Scenario;
use crate::tags::shader::ShaderRef;

/// Parsed view of a map's tag directory.
///
/// Cheap to clone; holds only the decoded map header and borrowed slices of
/// the image.
#[derive(Debug, Clone)]
pub struct TagMap<'a> {
    image: &'a [u8],
    header: MapHeader,
    index: &'a TagIndexHeader,
    entries: &'a [TagEntry],
    heap: VirtualRegion<'a>,
}

impl<'a> TagMap<'a> {
    /// Parse the directory of a map image with the default checks.
    pub fn new(image: &'a [u8]) -> Result<Self> {
        Self::with_config(image, &MapConfig::default())
    }

    /// Parse the directory of a map image.
    ///
    /// Fails without producing a partial directory when the map header or
    /// tag index header is malformed, or the entry table does not fit the
    /// image.
    pub fn with_config(image: &'a [u8], config: &MapConfig) -> Result<Self> {
        let header = MapHeader::parse(image)?;

        let version = header.version();
        if config.require_known_version && !version.is_known() {
            return Err(MapError::malformed(4, format!("unknown cache version {}", version.to_raw())));
        }

        if header.file_size as usize != image.len() {
            if config.check_file_size && header.file_size as usize > image.len() {
                return Err(MapError::malformed(
                    8,
                    format!(
                        "declared file size {} exceeds image length {}",
                        header.file_size,
                        image.len()
                    ),
                ));
            }
            warn!(
                "Declared file size {} does not match image length {}",
                header.file_size,
                image.len()
            );
        }

        let index_offset = u64::from(header.tag_index_offset);
        let entries_offset = index_offset + TAG_INDEX_HEADER_SIZE as u64;
        if entries_offset > image.len() as u64 {
            return Err(MapError::malformed(
                index_offset,
                format!(
                    "tag index header at {index_offset:#x} lies past the end of the {}-byte image",
                    image.len()
                ),
            ));
        }
        // Both bounds were just checked against the image length
        let index_start = index_offset as usize;
        let entries_start = entries_offset as usize;

        let index = TagIndexHeader::ref_from_bytes(&image[index_start..entries_start])
            .map_err(|_| MapError::malformed(index_offset, "tag index header is truncated"))?;

        if index.magic() != TAGS_MAGIC {
            return Err(MapError::malformed(
                index_offset + 36,
                format!("tag index marker is '{}', expected '{TAGS_MAGIC}'", index.magic()),
            ));
        }

        let count = index.tag_count();
        if count > config.max_tag_count {
            return Err(MapError::malformed(
                index_offset + 12,
                format!("tag count {count} exceeds the ceiling of {}", config.max_tag_count),
            ));
        }
        let entries_end = entries_offset + u64::from(count) * TAG_ENTRY_SIZE as u64;
        if entries_end > image.len() as u64 {
            return Err(MapError::malformed(
                index_offset + 12,
                format!(
                    "{count} directory entries end at {entries_end:#x}, past the end of the {}-byte image",
                    image.len()
                ),
            ));
        }
        let entries = <[TagEntry]>::ref_from_bytes_with_elems(
            &image[entries_start..entries_end as usize],
            count as usize,
        )
        .map_err(|_| MapError::malformed(entries_offset, "directory entries are truncated"))?;

        let heap_base = index
            .tag_index_virtual_offset()
            .checked_sub(header.tag_index_offset)
            .and_then(|v| v.checked_sub(TAG_INDEX_HEADER_SIZE as u32))
            .ok_or_else(|| {
                MapError::malformed(
                    index_offset,
                    format!(
                        "tag index virtual offset {:#010x} is below its file offset {:#x}",
                        index.tag_index_virtual_offset(),
                        header.tag_index_offset
                    ),
                )
            })?;

        debug!(
            "Parsed tag directory: {} tags, version {}, scenario '{}', heap base {:#010x}",
            count,
            version,
            header.scenario_name(),
            heap_base
        );

        Ok(Self {
            image,
            header,
            index,
            entries,
            heap: VirtualRegion::new(image, heap_base),
        })
    }

    /// The decoded map header.
    pub fn header(&self) -> &MapHeader {
        &self.header
    }

    /// The tag index header.
    pub fn index_header(&self) -> &'a TagIndexHeader {
        self.index
    }

    /// The whole map image.
    pub fn image(&self) -> &'a [u8] {
        self.image
    }

    /// The tag heap: the image addressed through its virtual base.
    pub fn heap(&self) -> VirtualRegion<'a> {
        self.heap
    }

    /// Virtual address of file offset 0 in the tag heap.
    pub fn heap_base(&self) -> u32 {
        self.heap.base()
    }

    /// All directory entries, in on-disk order.
    pub fn entries(&self) -> &'a [TagEntry] {
        self.entries
    }

    /// Number of directory entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry of a tag identifier.
    ///
    /// Returns `None` for the invalid sentinel, for identifiers whose index
    /// falls outside the directory, and for stale identifiers whose salt no
    /// longer matches the entry.
    pub fn lookup(&self, tag_id: TagId) -> Option<&'a TagEntry> {
        if tag_id.is_invalid() {
            return None;
        }
        let index = tag_id.index().checked_sub(self.index.base_tag().index())?;
        let entry = self.entries.get(usize::from(index))?;
        (entry.tag_id() == tag_id).then_some(entry)
    }

    /// Entries that are of `class` or derive from it, in directory order.
    pub fn tags_of_class(&self, class: TagClass) -> impl Iterator<Item = &'a TagEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.is_a(class))
    }

    /// View the body of a tag as its typed layout.
    ///
    /// The entry must be of the layout's class or derive from it, and its
    /// body must lie in this image.
    pub fn get_tag<T: TagLayout>(&self, tag_id: TagId) -> Result<&'a T> {
        let entry = self.lookup(tag_id).ok_or(MapError::TagNotFound(tag_id))?;
        self.entry_body(entry)
    }

    /// View the body of a directory entry as a typed layout.
    pub fn entry_body<T: TagLayout>(&self, entry: &TagEntry) -> Result<&'a T> {
        if !entry.is_a(T::CLASS) {
            return Err(MapError::ClassMismatch {
                tag_id: entry.tag_id(),
                expected: T::CLASS,
                found: entry.primary_class(),
            });
        }
        if entry.is_external() {
            return Err(MapError::ExternalResource { tag_id: entry.tag_id() });
        }
        self.heap.read(entry.body_offset())
    }

    /// Tag path of an identifier, or `""` when it cannot be resolved.
    pub fn tag_name(&self, tag_id: TagId) -> &'a str {
        self.lookup(tag_id).map_or("", |entry| self.entry_name(entry))
    }

    /// Tag path of a directory entry, or `""` when it cannot be resolved.
    pub fn entry_name(&self, entry: &TagEntry) -> &'a str {
        self.heap
            .read_c_str(entry.path_offset())
            .ok()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or("")
    }

    /// Path stored inline in a tag reference, or `""` when it cannot be
    /// resolved.
    pub fn reference_name(&self, reference: &TagReference) -> &'a str {
        self.heap
            .read_bytes(reference.path_offset(), reference.path_length() as usize)
            .ok()
            .map(|bytes| bytes.split(|&b| b == 0).next().unwrap_or(bytes))
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or("")
    }

    /// Entry a tag reference points at, if it is set and resolvable.
    pub fn resolve_reference(&self, reference: &TagReference) -> Option<&'a TagEntry> {
        if !reference.is_set() {
            return None;
        }
        self.lookup(reference.tag_id())
    }

    /// Typed body of the tag a reference points at, or `None` when the
    /// reference is unset.
    pub fn get_referenced<T: TagLayout>(&self, reference: &TagReference) -> Result<Option<&'a T>> {
        if !reference.is_set() {
            return Ok(None);
        }
        self.get_tag(reference.tag_id()).map(Some)
    }

    /// Raw bytes of a payload stored in this image.
    ///
    /// Payload references carry a file offset, so no virtual base applies.
    pub fn data(&self, reference: &DataReference) -> Result<&'a [u8]> {
        file_range(self.image, reference)
    }

    /// The map's scenario tag.
    pub fn scenario(&self) -> Result<&'a Scenario> {
        self.get_tag(self.index.scenario_tag())
    }

    /// A shader tag viewed through its concrete layout.
    pub fn shader(&self, tag_id: TagId) -> Result<ShaderRef<'a>> {
        ShaderRef::load(self, tag_id)
    }
}

/// Bytes of an internal payload, checked against the image.
pub(crate) fn file_range<'a>(image: &'a [u8], reference: &DataReference) -> Result<&'a [u8]> {
    if reference.is_external() {
        return Err(MapError::ExternalData {
            offset: reference.file_offset(),
            size: reference.size(),
        });
    }
    file_bytes(image, reference.file_offset(), reference.size())
}

/// `size` bytes at a file offset, checked against the image.
pub(crate) fn file_bytes(image: &[u8], offset: u32, size: u32) -> Result<&[u8]> {
    let start = u64::from(offset);
    let end = start + u64::from(size);
    if end > image.len() as u64 {
        return Err(MapError::RegionOutOfBounds {
            offset: start,
            size: u64::from(size),
            image_len: image.len(),
        });
    }
    Ok(&image[start as usize..end as usize])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::tags::bitmap::Bitmap;
    use crate::tags::shader::Shader;
    use crate::test_utils::{BASE_TAG, MapBuilder};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use zerocopy::{FromZeros, IntoBytes};

    fn sample_map() -> (Vec<u8>, [TagId; 3]) {
        let mut builder = MapBuilder::new();
        let bitmap = builder.add_typed("ui\\cursor", &Bitmap::new_zeroed());
        let shader = builder.add_tag(
            [TagClass::SHADER_ENVIRONMENT, TagClass::SHADER, TagClass::NONE],
            "levels\\test\\shaders\\ground",
            &[0u8; 0x344],
        );
        let external = builder.add_external(
            [TagClass::BITMAP, TagClass::NONE, TagClass::NONE],
            "ui\\shell\\bitmaps\\background",
            0x1000,
        );
        (builder.build(), [bitmap, shader, external])
    }

    #[test]
    fn test_parse_directory() {
        let (bytes, [bitmap, ..]) = sample_map();
        let map = TagMap::new(&bytes).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.heap_base(), crate::test_utils::HEAP_BASE);
        assert_eq!(map.entries()[0].tag_id(), bitmap);
        assert_eq!(map.entries()[0].primary_class(), TagClass::BITMAP);
    }

    #[test]
    fn test_lookup_checks_identity() {
        let (bytes, ids) = sample_map();
        let map = TagMap::new(&bytes).unwrap();
        for id in ids {
            assert_eq!(map.lookup(id).unwrap().tag_id(), id);
        }
        assert!(map.lookup(TagId::INVALID).is_none());
        assert!(map.lookup(TagId::new(BASE_TAG + 3)).is_none());
        // Right index, wrong salt
        assert!(map.lookup(TagId::new((BASE_TAG + 1) ^ 0x0001_0000)).is_none());
    }

    #[test]
    fn test_tag_name() {
        let (bytes, [bitmap, shader, _]) = sample_map();
        let map = TagMap::new(&bytes).unwrap();
        assert_eq!(map.tag_name(bitmap), "ui\\cursor");
        assert_eq!(map.tag_name(shader), "levels\\test\\shaders\\ground");
        assert_eq!(map.tag_name(TagId::INVALID), "");
    }

    #[test]
    fn test_get_tag_class_chain() {
        let (bytes, [bitmap, shader, _]) = sample_map();
        let map = TagMap::new(&bytes).unwrap();

        assert!(map.get_tag::<Bitmap>(bitmap).is_ok());
        // An environment shader satisfies a generic shader request
        assert!(map.get_tag::<Shader>(shader).is_ok());

        match map.get_tag::<Shader>(bitmap).unwrap_err() {
            MapError::ClassMismatch { expected, found, .. } => {
                assert_eq!(expected, TagClass::SHADER);
                assert_eq!(found, TagClass::BITMAP);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_get_tag_external() {
        let (bytes, [_, _, external]) = sample_map();
        let map = TagMap::new(&bytes).unwrap();
        let err = map.get_tag::<Bitmap>(external).unwrap_err();
        assert!(err.is_external());
        assert!(!err.is_out_of_bounds());
    }

    #[test]
    fn test_get_tag_not_found() {
        let (bytes, _) = sample_map();
        let map = TagMap::new(&bytes).unwrap();
        let err = map.get_tag::<Bitmap>(TagId::new(BASE_TAG + 40)).unwrap_err();
        assert!(matches!(err, MapError::TagNotFound(_)));
    }

    #[test]
    fn test_get_tag_body_overrun() {
        let mut builder = MapBuilder::new();
        // Body starts near the end of the image, too close for a whole bitmap
        let end_of_image = builder.virtual_end() + 8;
        builder.append(&[0u8; 24]);
        let id = builder.add_tag_at(
            [TagClass::BITMAP, TagClass::NONE, TagClass::NONE],
            "short",
            end_of_image,
        );
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();
        let err = map.get_tag::<Bitmap>(id).unwrap_err();
        assert!(err.is_out_of_bounds(), "{err}");
    }

    #[test]
    fn test_trailing_marker_rejected() {
        let (mut bytes, _) = sample_map();
        bytes[2044..2048].copy_from_slice(b"oops");
        let err = TagMap::new(&bytes).unwrap_err();
        assert!(err.is_malformed_header());
    }

    #[test]
    fn test_tags_marker_rejected() {
        let (mut bytes, _) = sample_map();
        bytes[2048 + 36..2048 + 40].copy_from_slice(b"xxxx");
        let err = TagMap::new(&bytes).unwrap_err();
        assert!(err.is_malformed_header());
    }

    #[test]
    fn test_entry_table_past_end_rejected() {
        let (mut bytes, _) = sample_map();
        bytes[2048 + 12..2048 + 16].copy_from_slice(&0x8000u32.to_le_bytes());
        let err = TagMap::new(&bytes).unwrap_err();
        assert!(err.is_malformed_header());
    }

    #[test]
    fn test_tag_count_ceiling() {
        let (bytes, _) = sample_map();
        let config = MapConfig::default().with_max_tag_count(2);
        assert!(TagMap::with_config(&bytes, &config).is_err());
        assert!(TagMap::with_config(&bytes, &config.with_max_tag_count(3)).is_ok());
    }

    #[test]
    fn test_unknown_version() {
        let mut builder = MapBuilder::new();
        builder.header_mut().version = 42;
        let bytes = builder.build();
        assert!(TagMap::new(&bytes).is_err());
        let relaxed = MapConfig::default().with_require_known_version(false);
        assert!(TagMap::with_config(&bytes, &relaxed).is_ok());
    }

    #[test]
    fn test_declared_file_size() {
        let mut builder = MapBuilder::new();
        builder.header_mut().file_size = u32::MAX;
        let bytes = builder.build();
        assert!(TagMap::new(&bytes).is_ok());
        let strict = MapConfig::default().with_check_file_size(true);
        assert!(TagMap::with_config(&bytes, &strict).unwrap_err().is_malformed_header());
    }

    #[test]
    fn test_tags_of_class_includes_subclasses() {
        let (bytes, [bitmap, shader, external]) = sample_map();
        let map = TagMap::new(&bytes).unwrap();
        let bitmaps: Vec<TagId> = map.tags_of_class(TagClass::BITMAP).map(TagEntry::tag_id).collect();
        assert_eq!(bitmaps, vec![bitmap, external]);
        let shaders: Vec<TagId> = map.tags_of_class(TagClass::SHADER).map(TagEntry::tag_id).collect();
        assert_eq!(shaders, vec![shader]);
    }

    #[test]
    fn test_reference_round_trip() {
        let mut builder = MapBuilder::new();
        let id = builder.add_typed("ui\\cursor", &Bitmap::new_zeroed());
        let reference = builder.reference(id);
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();

        assert_eq!(map.reference_name(&reference), map.tag_name(id));
        assert_eq!(map.resolve_reference(&reference).unwrap().tag_id(), id);
        assert!(map.get_referenced::<Bitmap>(&reference).unwrap().is_some());
        assert!(map.resolve_reference(&TagReference::null()).is_none());
        assert!(map.get_referenced::<Bitmap>(&TagReference::null()).unwrap().is_none());
    }

    #[test]
    fn test_data_reference() {
        let mut builder = MapBuilder::new();
        let payload = builder.append(b"pixels!!");
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();

        let internal = DataReference::new(8, payload, 0);
        assert_eq!(map.data(&internal).unwrap(), b"pixels!!");

        let external = DataReference::external(8, payload);
        assert!(map.data(&external).unwrap_err().is_external());

        let overrun = DataReference::new(64, payload, 0);
        assert!(map.data(&overrun).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_entries_view_is_in_place() {
        let (bytes, _) = sample_map();
        let map = TagMap::new(&bytes).unwrap();
        let first = map.entries()[0].as_bytes().as_ptr();
        assert_eq!(first, bytes[2048 + 40..].as_ptr());
    }

    const fn assert_send_sync<T: Send + Sync>() {}
    const _: () = assert_send_sync::<TagMap<'static>>();
    const _: () = assert_send_sync::<crate::resolver::VirtualRegion<'static>>();

    #[test]
    fn test_concurrent_readers() {
        let (bytes, [bitmap, shader, _]) = sample_map();
        let map = TagMap::new(&bytes).unwrap();
        let map = &map;

        std::thread::scope(|scope| {
            let readers: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        let names: Vec<&str> = map.entries().iter().map(|entry| map.entry_name(entry)).collect();
                        assert!(map.get_tag::<Bitmap>(bitmap).is_ok());
                        assert!(map.get_tag::<Shader>(shader).is_ok());
                        names
                    })
                })
                .collect();
            for reader in readers {
                assert_eq!(
                    reader.join().unwrap(),
                    vec!["ui\\cursor", "levels\\test\\shaders\\ground", "ui\\shell\\bitmaps\\background"]
                );
            }
        });
    }

    proptest! {
        #[test]
        fn lookup_outside_directory_is_none(raw in any::<u32>()) {
            let (bytes, _) = sample_map();
            let map = TagMap::new(&bytes).unwrap();
            let id = TagId::new(raw);
            match map.lookup(id) {
                Some(entry) => prop_assert_eq!(entry.tag_id(), id),
                None => prop_assert!(!(BASE_TAG..BASE_TAG + 3).contains(&raw)),
            }
        }
    }
}
