//! Fixed-size building blocks shared by every layout in a cache map.
//!
//! All on-disk records are little-endian and packed. Field types come from
//! [`zerocopy::little_endian`] so every record has alignment 1 and can be
//! viewed in place inside the map image without copying.

mod math;
mod reference;

pub use math::{Bounds, Bounds3, ColorArgb, ColorRgb, Plane3, Point2, Vector2, Vector3};
pub use reference::{DataReference, TagBlock, TagReference};

use std::borrow::Cow;
use std::fmt;

/// A tag class identifier.
///
/// Stored on disk as a little-endian `u32` whose value is the big-endian
/// reading of a four-character ASCII code, so `"scnr"` is `0x73636E72`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TagClass(u32);

impl TagClass {
    /// No class (`0xFFFFFFFF`)
    pub const NONE: Self = Self(0xFFFF_FFFF);
    /// Null class (`0`)
    pub const NULL: Self = Self(0);

    /// `bitm`
    pub const BITMAP: Self = Self::from_fourcc(*b"bitm");
    /// `shdr`
    pub const SHADER: Self = Self::from_fourcc(*b"shdr");
    /// `senv`
    pub const SHADER_ENVIRONMENT: Self = Self::from_fourcc(*b"senv");
    /// `soso`
    pub const SHADER_MODEL: Self = Self::from_fourcc(*b"soso");
    /// `sotr`
    pub const SHADER_TRANSPARENT_GENERIC: Self = Self::from_fourcc(*b"sotr");
    /// `schi`
    pub const SHADER_TRANSPARENT_CHICAGO: Self = Self::from_fourcc(*b"schi");
    /// `scex`
    pub const SHADER_TRANSPARENT_CHICAGO_EXTENDED: Self = Self::from_fourcc(*b"scex");
    /// `swat`
    pub const SHADER_TRANSPARENT_WATER: Self = Self::from_fourcc(*b"swat");
    /// `sgla`
    pub const SHADER_TRANSPARENT_GLASS: Self = Self::from_fourcc(*b"sgla");
    /// `smet`
    pub const SHADER_TRANSPARENT_METER: Self = Self::from_fourcc(*b"smet");
    /// `spla`
    pub const SHADER_TRANSPARENT_PLASMA: Self = Self::from_fourcc(*b"spla");
    /// `scnr`
    pub const SCENARIO: Self = Self::from_fourcc(*b"scnr");
    /// `sbsp`
    pub const SCENARIO_STRUCTURE_BSP: Self = Self::from_fourcc(*b"sbsp");
    /// `matg`
    pub const GLOBALS: Self = Self::from_fourcc(*b"matg");
    /// `sky `
    pub const SKY: Self = Self::from_fourcc(*b"sky ");
    /// `mod2`
    pub const GBXMODEL: Self = Self::from_fourcc(*b"mod2");

    /// Build a class from its four-character code.
    pub const fn from_fourcc(code: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(code))
    }

    /// Raw numeric value as stored in the map.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// The four-character code.
    pub const fn fourcc(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Whether this is one of the `NONE` / `NULL` sentinels.
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0 || self.0 == Self::NULL.0
    }
}

impl From<u32> for TagClass {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            return f.write_str("none");
        }
        for byte in self.fourcc() {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagClass({self})")
    }
}

/// A tag identifier.
///
/// The low 16 bits are a dense directory index, the high 16 bits a salt.
/// Only index extraction and the invalid sentinel are meaningful here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(u32);

impl TagId {
    /// Unset identifier
    pub const INVALID: Self = Self(0xFFFF_FFFF);

    /// Wrap a raw identifier.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw 32-bit value.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Directory index half (low 16 bits).
    pub const fn index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Salt half (high 16 bits).
    pub const fn salt(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Whether this is the unset sentinel.
    pub const fn is_invalid(self) -> bool {
        self.0 == Self::INVALID.0
    }
}

impl From<u32> for TagId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagId({:#010x})", self.0)
    }
}

/// Decode a fixed-width, NUL-padded string field.
pub fn fixed_str(bytes: &[u8]) -> Cow<'_, str> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
}
