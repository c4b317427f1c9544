//! Map image acquisition

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use tracing::info;

use crate::config::MapConfig;
use crate::directory::TagMap;
use crate::error::Result;

enum Image {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// A read-only map image, memory-mapped from disk or held in memory.
///
/// Every view produced from it borrows it, so none can outlive it.
pub struct MapFile {
    path: Option<PathBuf>,
    image: Image,
}

impl MapFile {
    /// Memory-map a map file read-only.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or memory mapped
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        // The image is never written through this mapping
        #[allow(unsafe_code)]
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        info!("Mapped {} ({} bytes)", path.display(), mmap.len());

        Ok(Self {
            path: Some(path.to_path_buf()),
            image: Image::Mapped(mmap),
        })
    }

    /// Wrap an image that is already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            path: None,
            image: Image::Owned(bytes),
        }
    }

    /// Path the image was mapped from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The whole image.
    pub fn bytes(&self) -> &[u8] {
        match &self.image {
            Image::Mapped(mmap) => mmap,
            Image::Owned(bytes) => bytes,
        }
    }

    /// Image length in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Whether the image is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// Parse the tag directory with the default checks.
    pub fn directory(&self) -> Result<TagMap<'_>> {
        TagMap::new(self.bytes())
    }

    /// Parse the tag directory with explicit checks.
    pub fn directory_with_config(&self, config: &MapConfig) -> Result<TagMap<'_>> {
        TagMap::with_config(self.bytes(), config)
    }
}

impl std::fmt::Debug for MapFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapFile")
            .field("path", &self.path)
            .field("mapped", &matches!(self.image, Image::Mapped(_)))
            .field("len", &self.len())
            .finish()
    }
}
