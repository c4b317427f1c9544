//! Configuration for opening a map directory

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Largest tag count a directory can address (16-bit index half)
pub const MAX_ADDRESSABLE_TAGS: u32 = 0xFFFF;

/// Checks applied when a [`TagMap`](crate::TagMap) is constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Reject directories that declare more tags than this
    pub max_tag_count: u32,

    /// Reject cache versions that are not one of the known enumerants
    pub require_known_version: bool,

    /// Treat a declared file size larger than the image as malformed
    /// instead of only logging it
    pub check_file_size: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            max_tag_count: MAX_ADDRESSABLE_TAGS,
            require_known_version: true,
            check_file_size: false,
        }
    }
}

impl MapConfig {
    /// Create a configuration with the default checks
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON document.
    ///
    /// Missing fields keep their default value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the tag count ceiling
    #[must_use]
    pub const fn with_max_tag_count(mut self, max: u32) -> Self {
        self.max_tag_count = max;
        self
    }

    /// Require or tolerate unknown cache versions
    #[must_use]
    pub const fn with_require_known_version(mut self, require: bool) -> Self {
        self.require_known_version = require;
        self
    }

    /// Enable or disable the declared file size check
    #[must_use]
    pub const fn with_check_file_size(mut self, check: bool) -> Self {
        self.check_file_size = check;
        self
    }
}
