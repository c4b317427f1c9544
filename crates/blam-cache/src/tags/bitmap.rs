//! Bitmap tag (`bitm`)
//!
//! A bitmap tag owns a list of sequences (sprite groups) and a list of
//! [`BitmapData`] records, one per texture. Pixel data is addressed by file
//! offset, either in this image or in the shared `bitmaps.map` resource file.

use zerocopy::little_endian::{F32, U16, U32};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::TagLayout;
use crate::directory::{TagMap, file_bytes, file_range};
use crate::error::{MapError, Result};
use crate::primitives::{DataReference, Point2, TagBlock, TagClass, TagId, Vector2, fixed_str};

/// Bitmap tag body (0x6C bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Bitmap {
    pub(crate) bitmap_type: U16,
    pub(crate) format: U16,
    pub(crate) usage: U16,
    pub(crate) flags: U16,
    pub(crate) detail_fade_factor: F32,
    pub(crate) sharpen_amount: F32,
    pub(crate) bump_height: F32,
    pub(crate) sprite_budget_size: U16,
    pub(crate) sprite_budget_count: U16,
    pub(crate) color_plate_width: U16,
    pub(crate) color_plate_height: U16,
    pub(crate) compressed_color_plate: DataReference,
    pub(crate) processed_pixel_data: DataReference,
    pub(crate) blur_filter_size: F32,
    pub(crate) alpha_bias: F32,
    pub(crate) mipmap_count: U16,
    pub(crate) sprite_usage: U16,
    pub(crate) sprite_spacing: U16,
    pub(crate) pad0: [u8; 2],
    pub(crate) sequences: TagBlock,
    pub(crate) bitmaps: TagBlock,
}

impl TagLayout for Bitmap {
    const CLASS: TagClass = TagClass::BITMAP;
}

impl Bitmap {
    /// Build a body with the given sequence and bitmap arrays.
    pub fn new(sequences: TagBlock, bitmaps: TagBlock) -> Self {
        let mut body = Self::new_zeroed();
        body.sequences = sequences;
        body.bitmaps = bitmaps;
        body
    }

    /// Declared bitmap type.
    pub fn bitmap_type(&self) -> Option<BitmapType> {
        BitmapType::from_u16(self.bitmap_type.get())
    }

    /// Raw import format.
    pub fn format(&self) -> u16 {
        self.format.get()
    }

    /// Raw usage.
    pub fn usage(&self) -> u16 {
        self.usage.get()
    }

    /// Raw flags.
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Detail fade factor.
    pub fn detail_fade_factor(&self) -> f32 {
        self.detail_fade_factor.get()
    }

    /// Bump height in repeats.
    pub fn bump_height(&self) -> f32 {
        self.bump_height.get()
    }

    /// Color plate dimensions.
    pub fn color_plate_size(&self) -> (u16, u16) {
        (self.color_plate_width.get(), self.color_plate_height.get())
    }

    /// Requested mipmap count (0 = all).
    pub fn mipmap_count(&self) -> u16 {
        self.mipmap_count.get()
    }

    /// Compressed source color plate.
    pub fn compressed_color_plate(&self) -> &DataReference {
        &self.compressed_color_plate
    }

    /// Processed pixel data of the whole tag.
    pub fn processed_pixel_data(&self) -> &DataReference {
        &self.processed_pixel_data
    }

    /// Bytes of the compressed color plate.
    pub fn color_plate_bytes<'a>(&self, map: &TagMap<'a>) -> Result<&'a [u8]> {
        file_range(map.image(), &self.compressed_color_plate)
    }

    /// Sprite sequences.
    pub fn sequences<'a>(&self, map: &TagMap<'a>) -> Result<&'a [BitmapSequence]> {
        map.heap().read_array(&self.sequences)
    }

    /// Texture records.
    pub fn bitmaps<'a>(&self, map: &TagMap<'a>) -> Result<&'a [BitmapData]> {
        map.heap().read_array(&self.bitmaps)
    }

    /// Number of texture records, without resolving them.
    pub fn bitmap_count(&self) -> u32 {
        self.bitmaps.count()
    }
}

/// A named run of bitmaps or sprites (64 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BitmapSequence {
    pub(crate) name: [u8; 32],
    pub(crate) first_bitmap_index: U16,
    pub(crate) bitmap_count: U16,
    pub(crate) pad0: [u8; 16],
    pub(crate) sprites: TagBlock,
}

impl BitmapSequence {
    /// Sequence name.
    pub fn name(&self) -> std::borrow::Cow<'_, str> {
        fixed_str(&self.name)
    }

    /// Index of the first bitmap of the sequence.
    pub fn first_bitmap_index(&self) -> u16 {
        self.first_bitmap_index.get()
    }

    /// Number of bitmaps in the sequence.
    pub fn bitmap_count(&self) -> u16 {
        self.bitmap_count.get()
    }

    /// Sprites of the sequence.
    pub fn sprites<'a>(&self, map: &TagMap<'a>) -> Result<&'a [BitmapSprite]> {
        map.heap().read_array(&self.sprites)
    }
}

/// A rectangle within one bitmap (32 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BitmapSprite {
    pub(crate) bitmap_index: U16,
    pub(crate) pad0: [u8; 2],
    pub(crate) pad1: [u8; 4],
    pub(crate) left: F32,
    pub(crate) right: F32,
    pub(crate) top: F32,
    pub(crate) bottom: F32,
    pub(crate) registration_point: Vector2,
}

impl BitmapSprite {
    /// Bitmap the sprite is cut from.
    pub fn bitmap_index(&self) -> u16 {
        self.bitmap_index.get()
    }

    /// Texture coordinates as `[left, right, top, bottom]`.
    pub fn bounds(&self) -> [f32; 4] {
        [self.left.get(), self.right.get(), self.top.get(), self.bottom.get()]
    }

    /// Registration point.
    pub fn registration_point(&self) -> &Vector2 {
        &self.registration_point
    }
}

/// One texture and the location of its pixels (48 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BitmapData {
    pub(crate) class: U32,
    pub(crate) width: U16,
    pub(crate) height: U16,
    pub(crate) depth: U16,
    pub(crate) bitmap_type: U16,
    pub(crate) format: U16,
    pub(crate) flags: U16,
    pub(crate) registration_point: Point2,
    pub(crate) mipmap_count: U16,
    pub(crate) pad0: [u8; 2],
    pub(crate) pixel_data_offset: U32,
    pub(crate) pixel_data_size: U32,
    pub(crate) tag_id: U32,
    pub(crate) pointer: U32,
    pub(crate) pad1: [u8; 8],
}

impl BitmapData {
    /// Pixels live in the shared bitmap resource file
    pub const FLAG_EXTERNAL: u16 = 0x100;

    /// Build a texture record.
    pub fn new(width: u16, height: u16, format: BitmapFormat, pixel_data_offset: u32, pixel_data_size: u32) -> Self {
        let mut data = Self::new_zeroed();
        data.class = U32::new(TagClass::BITMAP.to_raw());
        data.width = U16::new(width);
        data.height = U16::new(height);
        data.depth = U16::new(1);
        data.format = U16::new(format as u16);
        data.pixel_data_offset = U32::new(pixel_data_offset);
        data.pixel_data_size = U32::new(pixel_data_size);
        data.tag_id = U32::new(TagId::INVALID.to_raw());
        data
    }

    /// Mark the pixels as stored in the resource file.
    #[must_use]
    pub fn with_external(mut self) -> Self {
        self.flags = U16::new(self.flags.get() | Self::FLAG_EXTERNAL);
        self
    }

    /// Width in pixels.
    pub fn width(&self) -> u16 {
        self.width.get()
    }

    /// Height in pixels.
    pub fn height(&self) -> u16 {
        self.height.get()
    }

    /// Depth in pixels (3D textures).
    pub fn depth(&self) -> u16 {
        self.depth.get()
    }

    /// Texture type.
    pub fn bitmap_type(&self) -> Option<BitmapType> {
        BitmapType::from_u16(self.bitmap_type.get())
    }

    /// Pixel format.
    pub fn format(&self) -> Option<BitmapFormat> {
        BitmapFormat::from_u16(self.format.get())
    }

    /// Raw flags.
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Registration point in pixels.
    pub fn registration_point(&self) -> &Point2 {
        &self.registration_point
    }

    /// Number of mipmaps below the base level.
    pub fn mipmap_count(&self) -> u16 {
        self.mipmap_count.get()
    }

    /// File offset of the pixel data.
    pub fn pixel_data_offset(&self) -> u32 {
        self.pixel_data_offset.get()
    }

    /// Pixel data size in bytes, all levels included.
    pub fn pixel_data_size(&self) -> u32 {
        self.pixel_data_size.get()
    }

    /// Whether the pixels are stored in the resource file.
    pub fn is_external(&self) -> bool {
        self.flags.get() & Self::FLAG_EXTERNAL != 0
    }

    /// Pixel bytes stored in this image.
    pub fn pixels<'a>(&self, map: &TagMap<'a>) -> Result<&'a [u8]> {
        if self.is_external() {
            return Err(MapError::ExternalData {
                offset: self.pixel_data_offset(),
                size: self.pixel_data_size(),
            });
        }
        file_bytes(map.image(), self.pixel_data_offset(), self.pixel_data_size())
    }

    /// Size in bytes of the base level, or `None` for an unknown format.
    pub fn base_level_size(&self) -> Option<usize> {
        let format = self.format()?;
        let (mut width, mut height) = (usize::from(self.width()), usize::from(self.height()));
        if format.is_block_compressed() {
            width = width.div_ceil(4) * 4;
            height = height.div_ceil(4) * 4;
        }
        let depth = usize::from(self.depth().max(1));
        Some(width * height * depth * format.bits_per_pixel() / 8)
    }
}

/// Texture type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BitmapType {
    /// 2D texture
    Texture2d = 0,
    /// 3D texture
    Texture3d = 1,
    /// Cube map
    CubeMap = 2,
    /// Solid white
    White = 3,
}

impl BitmapType {
    /// Parse from raw value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Texture2d),
            1 => Some(Self::Texture3d),
            2 => Some(Self::CubeMap),
            3 => Some(Self::White),
            _ => None,
        }
    }
}

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BitmapFormat {
    /// 8-bit alpha
    A8 = 0,
    /// 8-bit luminance
    Y8 = 1,
    /// 8-bit alpha-luminance
    Ay8 = 2,
    /// 8-bit alpha, 8-bit luminance
    A8y8 = 3,
    /// 16-bit 565 color
    R5g6b5 = 6,
    /// 16-bit 1555 color
    A1r5g5b5 = 8,
    /// 16-bit 4444 color
    A4r4g4b4 = 9,
    /// 32-bit color, unused alpha
    X8r8g8b8 = 10,
    /// 32-bit color
    A8r8g8b8 = 11,
    /// DXT1 block compression
    Dxt1 = 14,
    /// DXT3 block compression
    Dxt3 = 15,
    /// DXT5 block compression
    Dxt5 = 16,
    /// 8-bit palettized
    P8 = 17,
}

impl BitmapFormat {
    /// Parse from raw value
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::A8),
            1 => Some(Self::Y8),
            2 => Some(Self::Ay8),
            3 => Some(Self::A8y8),
            6 => Some(Self::R5g6b5),
            8 => Some(Self::A1r5g5b5),
            9 => Some(Self::A4r4g4b4),
            10 => Some(Self::X8r8g8b8),
            11 => Some(Self::A8r8g8b8),
            14 => Some(Self::Dxt1),
            15 => Some(Self::Dxt3),
            16 => Some(Self::Dxt5),
            17 => Some(Self::P8),
            _ => None,
        }
    }

    /// Storage cost per pixel
    pub fn bits_per_pixel(self) -> usize {
        match self {
            Self::Dxt1 => 4,
            Self::A8 | Self::Y8 | Self::Ay8 | Self::P8 | Self::Dxt3 | Self::Dxt5 => 8,
            Self::A8y8 | Self::R5g6b5 | Self::A1r5g5b5 | Self::A4r4g4b4 => 16,
            Self::X8r8g8b8 | Self::A8r8g8b8 => 32,
        }
    }

    /// Whether pixels are stored in 4x4 blocks
    pub fn is_block_compressed(self) -> bool {
        matches!(self, Self::Dxt1 | Self::Dxt3 | Self::Dxt5)
    }
}

const _: () = assert!(size_of::<Bitmap>() == 0x6C);
const _: () = assert!(std::mem::offset_of!(Bitmap, compressed_color_plate) == 0x1C);
const _: () = assert!(std::mem::offset_of!(Bitmap, processed_pixel_data) == 0x30);
const _: () = assert!(std::mem::offset_of!(Bitmap, mipmap_count) == 0x4C);
const _: () = assert!(std::mem::offset_of!(Bitmap, sequences) == 0x54);
const _: () = assert!(std::mem::offset_of!(Bitmap, bitmaps) == 0x60);
const _: () = assert!(size_of::<BitmapSequence>() == 64);
const _: () = assert!(std::mem::offset_of!(BitmapSequence, sprites) == 0x34);
const _: () = assert!(size_of::<BitmapSprite>() == 32);
const _: () = assert!(size_of::<BitmapData>() == 0x30);
const _: () = assert!(std::mem::offset_of!(BitmapData, registration_point) == 0x10);
const _: () = assert!(std::mem::offset_of!(BitmapData, pixel_data_offset) == 0x18);
const _: () = assert!(std::mem::offset_of!(BitmapData, tag_id) == 0x20);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::MapBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bitmap_pixels() {
        let mut builder = MapBuilder::new();
        let pixels = builder.append(&[0xAB; 64]);
        let records = builder.alloc_array(&[
            BitmapData::new(4, 4, BitmapFormat::A8r8g8b8, pixels, 64),
            BitmapData::new(256, 256, BitmapFormat::Dxt1, 0x10_0000, 0x8000).with_external(),
        ]);
        let id = builder.add_typed("ui\\cursor", &Bitmap::new(TagBlock::default(), records));
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();

        let bitmap = map.get_tag::<Bitmap>(id).unwrap();
        assert!(bitmap.sequences(&map).unwrap().is_empty());
        let data = bitmap.bitmaps(&map).unwrap();
        assert_eq!(data.len(), 2);

        assert_eq!(data[0].format(), Some(BitmapFormat::A8r8g8b8));
        assert_eq!(data[0].pixels(&map).unwrap(), &[0xAB; 64][..]);
        assert_eq!(data[0].base_level_size(), Some(64));

        let err = data[1].pixels(&map).unwrap_err();
        assert!(matches!(err, MapError::ExternalData { offset: 0x10_0000, size: 0x8000 }));
        assert_eq!(data[1].base_level_size(), Some(256 * 256 / 2));
    }

    #[test]
    fn test_sequences_and_sprites() {
        let mut builder = MapBuilder::new();
        let mut sprite = BitmapSprite::new_zeroed();
        sprite.bitmap_index = U16::new(1);
        sprite.right = F32::new(0.5);
        let sprites = builder.alloc_array(&[sprite]);
        let mut sequence = BitmapSequence::new_zeroed();
        sequence.name[..5].copy_from_slice(b"digit");
        sequence.bitmap_count = U16::new(10);
        sequence.sprites = sprites;
        let sequences = builder.alloc_array(&[sequence]);
        let id = builder.add_typed("ui\\hud\\numbers", &Bitmap::new(sequences, TagBlock::default()));
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();

        let bitmap = map.get_tag::<Bitmap>(id).unwrap();
        let sequences = bitmap.sequences(&map).unwrap();
        assert_eq!(sequences[0].name(), "digit");
        assert_eq!(sequences[0].bitmap_count(), 10);
        let sprites = sequences[0].sprites(&map).unwrap();
        assert_eq!(sprites[0].bitmap_index(), 1);
        assert_eq!(sprites[0].bounds(), [0.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_pixel_overrun() {
        let mut builder = MapBuilder::new();
        let records = builder.alloc_array(&[BitmapData::new(64, 64, BitmapFormat::A8, 0x7FFF_0000, 4096)]);
        let id = builder.add_typed("broken", &Bitmap::new(TagBlock::default(), records));
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();
        let data = map.get_tag::<Bitmap>(id).unwrap().bitmaps(&map).unwrap();
        assert!(data[0].pixels(&map).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_format_values() {
        assert_eq!(BitmapFormat::from_u16(14), Some(BitmapFormat::Dxt1));
        assert_eq!(BitmapFormat::from_u16(4), None);
        assert_eq!(BitmapFormat::P8.bits_per_pixel(), 8);
        assert_eq!(BitmapType::from_u16(2), Some(BitmapType::CubeMap));
    }
}
