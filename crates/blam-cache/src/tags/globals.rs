//! Game globals (`matg`)

use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::TagLayout;
use crate::directory::TagMap;
use crate::error::Result;
use crate::primitives::{TagBlock, TagClass, TagReference};

/// Globals tag body (0x1AC bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Globals {
    pub(crate) pad0: [u8; 248],
    pub(crate) sounds: TagBlock,
    pub(crate) camera: TagBlock,
    pub(crate) player_control: TagBlock,
    pub(crate) difficulty: TagBlock,
    pub(crate) grenades: TagBlock,
    pub(crate) rasterizer_data: TagBlock,
    pub(crate) interface_bitmaps: TagBlock,
    pub(crate) cheat_weapons: TagBlock,
    pub(crate) cheat_powerups: TagBlock,
    pub(crate) multiplayer_information: TagBlock,
    pub(crate) player_information: TagBlock,
    pub(crate) first_person_interface: TagBlock,
    pub(crate) falling_damage: TagBlock,
    pub(crate) materials: TagBlock,
    pub(crate) playlist_members: TagBlock,
}

impl TagLayout for Globals {
    const CLASS: TagClass = TagClass::GLOBALS;
}

impl Globals {
    /// The first globals tag in the directory, if the map carries one.
    pub fn load<'a>(map: &TagMap<'a>) -> Result<Option<&'a Self>> {
        map.tags_of_class(Self::CLASS)
            .next()
            .map(|entry| map.entry_body::<Self>(entry))
            .transpose()
    }

    /// Rasterizer defaults; normally exactly one element.
    pub fn rasterizer_data<'a>(&self, map: &TagMap<'a>) -> Result<&'a [RasterizerData]> {
        map.heap().read_array(&self.rasterizer_data)
    }

    /// Cheat weapon list.
    pub fn cheat_weapons<'a>(&self, map: &TagMap<'a>) -> Result<&'a [TagReference]> {
        map.heap().read_array(&self.cheat_weapons)
    }

    /// Cheat powerup list.
    pub fn cheat_powerups<'a>(&self, map: &TagMap<'a>) -> Result<&'a [TagReference]> {
        map.heap().read_array(&self.cheat_powerups)
    }

    /// Number of physics materials.
    pub fn material_count(&self) -> u32 {
        self.materials.count()
    }
}

/// Rasterizer defaults (264 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RasterizerData {
    pub(crate) distance_attenuation: TagReference,
    pub(crate) vector_normalization: TagReference,
    pub(crate) atmospheric_fog_density: TagReference,
    pub(crate) planar_fog_density: TagReference,
    pub(crate) linear_corner_fade: TagReference,
    pub(crate) active_camouflage_distortion: TagReference,
    pub(crate) glow: TagReference,
    pub(crate) pad0: [u8; 60],
    pub(crate) default_2d: TagReference,
    pub(crate) default_3d: TagReference,
    pub(crate) default_cube_map: TagReference,
    pub(crate) pad1: [u8; 44],
}

impl RasterizerData {
    /// Build a record with only the fallback textures set.
    pub fn with_defaults(default_2d: TagReference, default_3d: TagReference, default_cube_map: TagReference) -> Self {
        let mut data = Self::new_zeroed();
        for slot in [
            &mut data.distance_attenuation,
            &mut data.vector_normalization,
            &mut data.atmospheric_fog_density,
            &mut data.planar_fog_density,
            &mut data.linear_corner_fade,
            &mut data.active_camouflage_distortion,
            &mut data.glow,
        ] {
            *slot = TagReference::null();
        }
        data.default_2d = default_2d;
        data.default_3d = default_3d;
        data.default_cube_map = default_cube_map;
        data
    }

    /// Fallback 2D texture.
    pub fn default_2d(&self) -> &TagReference {
        &self.default_2d
    }

    /// Fallback 3D texture.
    pub fn default_3d(&self) -> &TagReference {
        &self.default_3d
    }

    /// Fallback cube map.
    pub fn default_cube_map(&self) -> &TagReference {
        &self.default_cube_map
    }

    /// Camouflage distortion map.
    pub fn active_camouflage_distortion(&self) -> &TagReference {
        &self.active_camouflage_distortion
    }

    /// Glow map.
    pub fn glow(&self) -> &TagReference {
        &self.glow
    }
}

const _: () = assert!(size_of::<Globals>() == 0x1AC);
const _: () = assert!(std::mem::offset_of!(Globals, sounds) == 0x0F8);
const _: () = assert!(std::mem::offset_of!(Globals, rasterizer_data) == 0x134);
const _: () = assert!(std::mem::offset_of!(Globals, multiplayer_information) == 0x164);
const _: () = assert!(std::mem::offset_of!(Globals, playlist_members) == 0x1A0);

const _: () = assert!(size_of::<RasterizerData>() == 264);
const _: () = assert!(std::mem::offset_of!(RasterizerData, default_2d) == 0xAC);
const _: () = assert!(std::mem::offset_of!(RasterizerData, default_3d) == 0xBC);
const _: () = assert!(std::mem::offset_of!(RasterizerData, default_cube_map) == 0xCC);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::MapBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rasterizer_defaults() {
        let mut builder = MapBuilder::new();
        let bitm = [TagClass::BITMAP, TagClass::NONE, TagClass::NONE];
        let white = builder.add_tag(bitm, "ui\\white", &[0; 0x6C]);
        let cube = builder.add_tag(bitm, "ui\\cube", &[0; 0x6C]);

        let (white_ref, cube_ref) = (builder.reference(white), builder.reference(cube));
        let data = RasterizerData::with_defaults(white_ref, TagReference::null(), cube_ref);
        let block = builder.alloc_array(&[data]);
        let mut globals = Globals::new_zeroed();
        globals.rasterizer_data = block;
        builder.add_typed("globals\\globals", &globals);

        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();
        let globals = Globals::load(&map).unwrap().unwrap();
        let data = globals.rasterizer_data(&map).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].default_2d().tag_id(), white);
        assert!(!data[0].default_3d().is_set());
        assert_eq!(map.reference_name(data[0].default_cube_map()), "ui\\cube");
        assert!(!data[0].glow().is_set());
    }

    #[test]
    fn test_missing_globals() {
        let bytes = MapBuilder::new().build();
        let map = TagMap::new(&bytes).unwrap();
        assert!(Globals::load(&map).unwrap().is_none());
    }
}
