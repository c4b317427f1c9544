//! Opening maps from disk

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;

use blam_cache::directory::TAG_ENTRY_SIZE;
use blam_cache::header::{MAP_HEADER_SIZE, TAG_INDEX_HEADER_SIZE};
use blam_cache::tags::bitmap::Bitmap;
use blam_cache::{MapConfig, MapError, MapFile, MapHeader, TagBlock, TagClass, TagEntry, TagId, TagIndexHeader};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use zerocopy::IntoBytes;

const HEAP_BASE: u32 = 0x4044_0000;
const BASE_TAG: u32 = 0xE174_0000;
const PATH: &[u8] = b"ui\\shell\\bitmaps\\cursor\0";

/// A one-tag map: header, index, one bitmap entry, its path and body.
fn one_bitmap_map() -> Vec<u8> {
    let entries_start = MAP_HEADER_SIZE + TAG_INDEX_HEADER_SIZE;
    let path_offset = entries_start + TAG_ENTRY_SIZE;
    let body_offset = path_offset + PATH.len().next_multiple_of(4);
    let bitmap = Bitmap::new(TagBlock::default(), TagBlock::default());
    let total = body_offset + bitmap.as_bytes().len();

    let mut header = MapHeader::default();
    header.file_size = total as u32;
    header.tag_index_size = (total - MAP_HEADER_SIZE) as u32;
    header.scenario_name[..10].copy_from_slice(b"beavercrk\0");

    let mut image = header.to_bytes().unwrap();
    let index = TagIndexHeader::new(
        HEAP_BASE + entries_start as u32,
        TagId::new(BASE_TAG),
        TagId::INVALID,
        1,
    );
    image.extend_from_slice(index.as_bytes());
    let entry = TagEntry::new(
        [TagClass::BITMAP, TagClass::NONE, TagClass::NONE],
        TagId::new(BASE_TAG),
        HEAP_BASE + path_offset as u32,
        HEAP_BASE + body_offset as u32,
        false,
    );
    image.extend_from_slice(entry.as_bytes());
    image.extend_from_slice(PATH);
    image.resize(body_offset, 0);
    image.extend_from_slice(bitmap.as_bytes());
    assert_eq!(image.len(), total);
    image
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn open_mapped_file() {
    let bytes = one_bitmap_map();
    let temp = write_temp(&bytes);

    let file = MapFile::open(temp.path()).unwrap();
    assert_eq!(file.path(), Some(temp.path()));
    assert_eq!(file.len(), bytes.len());
    assert_eq!(file.bytes(), &bytes[..]);

    let map = file.directory().unwrap();
    assert_eq!(map.header().scenario_name(), "beavercrk");
    assert_eq!(map.heap_base(), HEAP_BASE);
    assert_eq!(map.len(), 1);

    let id = TagId::new(BASE_TAG);
    assert_eq!(map.tag_name(id), "ui\\shell\\bitmaps\\cursor");
    let bitmap = map.get_tag::<Bitmap>(id).unwrap();
    assert_eq!(bitmap.bitmap_count(), 0);
    assert!(bitmap.bitmaps(&map).unwrap().is_empty());
}

#[test]
fn mapped_and_owned_images_agree() {
    let bytes = one_bitmap_map();
    let temp = write_temp(&bytes);

    let mapped = MapFile::open(temp.path()).unwrap();
    let owned = MapFile::from_bytes(bytes);
    assert_eq!(owned.path(), None);

    let (a, b) = (mapped.directory().unwrap(), owned.directory().unwrap());
    assert_eq!(a.header(), b.header());
    assert_eq!(a.heap_base(), b.heap_base());
    let names_a: Vec<&str> = a.entries().iter().map(|entry| a.entry_name(entry)).collect();
    let names_b: Vec<&str> = b.entries().iter().map(|entry| b.entry_name(entry)).collect();
    assert_eq!(names_a, names_b);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MapFile::open(dir.path().join("nope.map")).unwrap_err();
    assert!(matches!(err, MapError::Io(_)));
}

#[test]
fn truncated_file_is_malformed() {
    let bytes = one_bitmap_map();
    let temp = write_temp(&bytes[..1024]);
    let file = MapFile::open(temp.path()).unwrap();
    let err = file.directory().unwrap_err();
    assert!(err.is_malformed_header(), "{err}");
}

#[test]
fn config_from_json() {
    let bytes = one_bitmap_map();
    let file = MapFile::from_bytes(bytes);

    let config = MapConfig::from_json_str(r#"{ "max_tag_count": 0 }"#).unwrap();
    assert!(file.directory_with_config(&config).unwrap_err().is_malformed_header());

    let config = MapConfig::from_json_str("{}").unwrap();
    assert!(file.directory_with_config(&config).is_ok());

    assert!(matches!(MapConfig::from_json_str("{ nope"), Err(MapError::Config(_))));
}
