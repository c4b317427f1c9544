//! Error types for cache map parsing and address resolution

use crate::primitives::{TagClass, TagId};
use thiserror::Error;

/// Errors that can occur while reading a cache map image.
///
/// Every variant is recoverable. Nothing in this crate panics on a corrupt
/// or adversarial image; the failure is reported here instead.
#[derive(Debug, Error)]
pub enum MapError {
    /// A fixed header (map header, tag index header, BSP region header)
    /// violates a structural expectation.
    #[error("malformed header at offset {offset:#x}: {message}")]
    MalformedHeader {
        /// File offset of the offending header
        offset: u64,
        /// Which expectation was violated
        message: String,
    },

    /// A virtual offset resolved outside of its region.
    #[error(
        "out-of-bounds access: virtual offset {virtual_offset:#010x} (base {base:#010x}) \
         reading {size} bytes from a region of {region_len} bytes"
    )]
    OutOfBounds {
        /// Stored virtual offset that was being resolved
        virtual_offset: u32,
        /// Virtual address of the first byte of the region
        base: u32,
        /// Number of bytes the read required
        size: usize,
        /// Length of the region in bytes
        region_len: usize,
    },

    /// A file-offset range does not fit inside the map image.
    #[error("file range {offset:#x}+{size:#x} exceeds image of {image_len} bytes")]
    RegionOutOfBounds {
        /// Start of the range in the file
        offset: u64,
        /// Length of the range
        size: u64,
        /// Length of the map image
        image_len: usize,
    },

    /// An element index stored in a tag does not fit the array it indexes.
    #[error("{what} index {index} out of range for {len} elements")]
    IndexOutOfRange {
        /// Name of the indexed array
        what: &'static str,
        /// Offending index (start of the range)
        index: u64,
        /// Number of elements available
        len: usize,
    },

    /// The tag identifier does not name a directory entry.
    #[error("tag {0} not found in directory")]
    TagNotFound(TagId),

    /// A typed cast was requested against an entry of another class.
    #[error("tag {tag_id} is a '{found}', requested '{expected}'")]
    ClassMismatch {
        /// Identifier of the entry
        tag_id: TagId,
        /// Class that was requested
        expected: TagClass,
        /// Primary class of the entry
        found: TagClass,
    },

    /// The tag body lives in a side resource file, not in this image.
    #[error("tag {tag_id} is stored in an external resource file")]
    ExternalResource {
        /// Identifier of the external entry
        tag_id: TagId,
    },

    /// A raw payload lives in a side resource file, not in this image.
    #[error("data at offset {offset:#x} ({size} bytes) is stored in an external resource file")]
    ExternalData {
        /// Offset of the payload inside the resource file
        offset: u32,
        /// Payload size in bytes
        size: u32,
    },

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `BinRw` parsing error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl MapError {
    pub(crate) fn malformed(offset: u64, message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            offset,
            message: message.into(),
        }
    }

    /// Whether this error reports a structural header violation.
    pub const fn is_malformed_header(&self) -> bool {
        matches!(self, Self::MalformedHeader { .. } | Self::BinRw(_))
    }

    /// Whether this error reports a read outside of a region or image.
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::RegionOutOfBounds { .. } | Self::IndexOutOfRange { .. }
        )
    }

    /// Whether the requested content lives in a side resource file.
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::ExternalResource { .. } | Self::ExternalData { .. })
    }
}

/// Type alias for map operation results
pub type Result<T> = std::result::Result<T, MapError>;
