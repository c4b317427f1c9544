//! Zero-copy reader for Blam engine cache map files
//!
#![allow(clippy::cast_possible_truncation)] // Offsets are bounds-checked before narrowing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // FourCC codes and engine terms
#![allow(clippy::float_cmp)] // Exact values in layout tests
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! A cache map is a single binary image: a 2048-byte header, a tag index and
//! directory, and the tag heap holding every tag body. Tag bodies point at
//! each other through virtual addresses that have to be rebased onto the
//! image before they can be read.
//!
//! # Layers
//!
//! - [`primitives`]: fixed-size field types (FourCC classes, identifiers,
//!   vectors, block descriptors, tag and data references)
//! - [`resolver`]: virtual address to byte range translation
//! - [`header`]: map header and tag index header
//! - [`directory`]: the [`TagMap`] view with lookup and typed casts
//! - [`tags`]: typed layouts for bitmaps, shaders, scenarios, structure BSPs
//!   and globals
//! - [`file`] and [`config`]: memory-mapped map files and load options
//!
//! # Example
//!
//! ```no_run
//! use blam_cache::{MapFile, TagClass};
//! use blam_cache::tags::bitmap::Bitmap;
//!
//! let file = MapFile::open("maps/bloodgulch.map")?;
//! let map = file.directory()?;
//! for entry in map.tags_of_class(TagClass::BITMAP) {
//!     let bitmap: &Bitmap = map.entry_body(entry)?;
//!     println!("{} has {} bitmaps", map.entry_name(entry), bitmap.bitmap_count());
//! }
//! # Ok::<(), blam_cache::MapError>(())
//! ```
//!
//! Every view borrows the image; nothing is copied and nothing outlives the
//! [`MapFile`] it came from.

#![warn(missing_docs)]

pub mod config;
pub mod directory;
pub mod error;
pub mod file;
pub mod header;
pub mod primitives;
pub mod resolver;
pub mod tags;

/// Synthetic map builders for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::MapConfig;
pub use directory::{TagEntry, TagMap};
pub use error::{MapError, Result};
pub use file::MapFile;
pub use header::{MapHeader, MapVersion, ScenarioType, TagIndexHeader};
pub use primitives::{DataReference, TagBlock, TagClass, TagId, TagReference};
pub use resolver::VirtualRegion;
