//! Scenario tag (`scnr`)
//!
//! The scenario is the root of a map: it names the skies, object palettes
//! and placements, and the structure BSPs the level is built from. Each
//! [`ScenarioBsp`] record is the entry point into a BSP's private address
//! space (see [`BspRegion`](super::bsp::BspRegion)).

use zerocopy::little_endian::{F32, I16, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::TagLayout;
use super::bsp::BspRegion;
use crate::directory::{TagMap, file_range};
use crate::error::Result;
use crate::header::ScenarioType;
use crate::primitives::{DataReference, TagBlock, TagClass, TagReference, Vector3, fixed_str};

/// Scenario tag body (0x5B0 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Scenario {
    pub(crate) dont_use: TagReference,
    pub(crate) wont_use: TagReference,
    pub(crate) cant_use: TagReference,
    pub(crate) skies: TagBlock,
    pub(crate) scenario_type: U16,
    pub(crate) flags: U16,
    pub(crate) child_scenarios: TagBlock,
    pub(crate) local_north: F32,
    pub(crate) pad0: [u8; 156],
    pub(crate) predicted_resources: TagBlock,
    pub(crate) functions: TagBlock,
    pub(crate) editor_scenario_data: DataReference,
    pub(crate) comments: TagBlock,
    pub(crate) pad1: [u8; 224],
    pub(crate) object_names: TagBlock,
    pub(crate) scenery: TagBlock,
    pub(crate) scenery_palette: TagBlock,
    pub(crate) bipeds: TagBlock,
    pub(crate) biped_palette: TagBlock,
    pub(crate) vehicles: TagBlock,
    pub(crate) vehicle_palette: TagBlock,
    pub(crate) equipment: TagBlock,
    pub(crate) equipment_palette: TagBlock,
    pub(crate) weapons: TagBlock,
    pub(crate) weapon_palette: TagBlock,
    // Device, sound, light, AI, script and cutscene blocks
    pub(crate) pad2: [u8; 796],
    pub(crate) structure_bsps: TagBlock,
}

impl TagLayout for Scenario {
    const CLASS: TagClass = TagClass::SCENARIO;
}

impl Scenario {
    /// Scenario type recorded in the tag.
    pub fn scenario_type(&self) -> ScenarioType {
        ScenarioType::from_raw(self.scenario_type.get())
    }

    /// Scenario flags.
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Angle of local north in radians.
    pub fn local_north(&self) -> f32 {
        self.local_north.get()
    }

    /// Sky tags, in the order the BSPs index them.
    pub fn skies<'a>(&self, map: &TagMap<'a>) -> Result<&'a [TagReference]> {
        map.heap().read_array(&self.skies)
    }

    /// Child scenarios.
    pub fn child_scenarios<'a>(&self, map: &TagMap<'a>) -> Result<&'a [ChildScenario]> {
        map.heap().read_array(&self.child_scenarios)
    }

    /// Number of predicted resources.
    pub fn predicted_resource_count(&self) -> u32 {
        self.predicted_resources.count()
    }

    /// Editor-only scenario data.
    pub fn editor_scenario_data<'a>(&self, map: &TagMap<'a>) -> Result<&'a [u8]> {
        file_range(map.image(), &self.editor_scenario_data)
    }

    /// Names of placed objects.
    pub fn object_names<'a>(&self, map: &TagMap<'a>) -> Result<&'a [ObjectName]> {
        map.heap().read_array(&self.object_names)
    }

    /// Scenery placements.
    pub fn scenery<'a>(&self, map: &TagMap<'a>) -> Result<&'a [ScenerySpawn]> {
        map.heap().read_array(&self.scenery)
    }

    /// Scenery palette.
    pub fn scenery_palette<'a>(&self, map: &TagMap<'a>) -> Result<&'a [PaletteEntry]> {
        map.heap().read_array(&self.scenery_palette)
    }

    /// Biped palette.
    pub fn biped_palette<'a>(&self, map: &TagMap<'a>) -> Result<&'a [PaletteEntry]> {
        map.heap().read_array(&self.biped_palette)
    }

    /// Vehicle palette.
    pub fn vehicle_palette<'a>(&self, map: &TagMap<'a>) -> Result<&'a [PaletteEntry]> {
        map.heap().read_array(&self.vehicle_palette)
    }

    /// Equipment palette.
    pub fn equipment_palette<'a>(&self, map: &TagMap<'a>) -> Result<&'a [PaletteEntry]> {
        map.heap().read_array(&self.equipment_palette)
    }

    /// Weapon palette.
    pub fn weapon_palette<'a>(&self, map: &TagMap<'a>) -> Result<&'a [PaletteEntry]> {
        map.heap().read_array(&self.weapon_palette)
    }

    /// Placement counts as `[bipeds, vehicles, equipment, weapons]`.
    pub fn placement_counts(&self) -> [u32; 4] {
        [
            self.bipeds.count(),
            self.vehicles.count(),
            self.equipment.count(),
            self.weapons.count(),
        ]
    }

    /// Structure BSP records.
    pub fn structure_bsps<'a>(&self, map: &TagMap<'a>) -> Result<&'a [ScenarioBsp]> {
        map.heap().read_array(&self.structure_bsps)
    }
}

/// Child scenario reference (32 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ChildScenario {
    pub(crate) child: TagReference,
    pub(crate) pad0: [u8; 16],
}

impl ChildScenario {
    /// The child scenario tag.
    pub fn child(&self) -> &TagReference {
        &self.child
    }
}

/// Object palette entry (48 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct PaletteEntry {
    pub(crate) object: TagReference,
    pub(crate) pad0: [u8; 32],
}

impl PaletteEntry {
    /// Build an entry.
    pub fn new(object: TagReference) -> Self {
        Self {
            object,
            pad0: [0; 32],
        }
    }

    /// Object definition placed through this palette slot.
    pub fn object(&self) -> &TagReference {
        &self.object
    }
}

/// Named object (36 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ObjectName {
    pub(crate) name: [u8; 32],
    pub(crate) object_type: U16,
    pub(crate) placement_index: U16,
}

impl ObjectName {
    /// Object name.
    pub fn name(&self) -> std::borrow::Cow<'_, str> {
        fixed_str(&self.name)
    }

    /// Object type of the placement.
    pub fn object_type(&self) -> u16 {
        self.object_type.get()
    }

    /// Index of the placement in its type's array.
    pub fn placement_index(&self) -> u16 {
        self.placement_index.get()
    }
}

/// Scenery placement (72 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ScenerySpawn {
    pub(crate) palette_index: I16,
    pub(crate) name_index: I16,
    pub(crate) not_placed: U16,
    pub(crate) desired_permutation: U16,
    pub(crate) position: Vector3,
    pub(crate) rotation: Vector3,
    pub(crate) pad0: [u8; 40],
}

impl ScenerySpawn {
    /// Build a placement.
    pub fn new(palette_index: i16, position: Vector3, rotation: Vector3) -> Self {
        Self {
            palette_index: I16::new(palette_index),
            name_index: I16::new(-1),
            not_placed: U16::ZERO,
            desired_permutation: U16::ZERO,
            position,
            rotation,
            pad0: [0; 40],
        }
    }

    /// Index into the scenery palette, `None` when unset.
    pub fn palette_index(&self) -> Option<u16> {
        u16::try_from(self.palette_index.get()).ok()
    }

    /// Index into the object names, `None` when unnamed.
    pub fn name_index(&self) -> Option<u16> {
        u16::try_from(self.name_index.get()).ok()
    }

    /// World position.
    pub fn position(&self) -> &Vector3 {
        &self.position
    }

    /// Yaw, pitch and roll in radians.
    pub fn rotation(&self) -> &Vector3 {
        &self.rotation
    }
}

/// Structure BSP record (32 bytes)
///
/// Locates a BSP's private region in the file and the virtual address its
/// first byte had at runtime.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ScenarioBsp {
    pub(crate) bsp_start: U32,
    pub(crate) bsp_size: U32,
    pub(crate) bsp_address: U32,
    pub(crate) pad0: [u8; 4],
    pub(crate) structure_bsp: TagReference,
}

impl ScenarioBsp {
    /// Build a record.
    pub fn new(bsp_start: u32, bsp_size: u32, bsp_address: u32, structure_bsp: TagReference) -> Self {
        Self {
            bsp_start: U32::new(bsp_start),
            bsp_size: U32::new(bsp_size),
            bsp_address: U32::new(bsp_address),
            pad0: [0; 4],
            structure_bsp,
        }
    }

    /// File offset of the region.
    pub fn bsp_start(&self) -> u32 {
        self.bsp_start.get()
    }

    /// Region size in bytes.
    pub fn bsp_size(&self) -> u32 {
        self.bsp_size.get()
    }

    /// Virtual address of the region's first byte.
    pub fn bsp_address(&self) -> u32 {
        self.bsp_address.get()
    }

    /// The structure BSP tag.
    pub fn structure_bsp(&self) -> &TagReference {
        &self.structure_bsp
    }

    /// Open the BSP's private region.
    pub fn open<'a>(&self, map: &TagMap<'a>) -> Result<BspRegion<'a>> {
        BspRegion::open(map, self)
    }
}

const _: () = assert!(size_of::<Scenario>() == 0x5B0);
const _: () = assert!(std::mem::offset_of!(Scenario, skies) == 0x30);
const _: () = assert!(std::mem::offset_of!(Scenario, scenario_type) == 0x3C);
const _: () = assert!(std::mem::offset_of!(Scenario, child_scenarios) == 0x40);
const _: () = assert!(std::mem::offset_of!(Scenario, predicted_resources) == 0xEC);
const _: () = assert!(std::mem::offset_of!(Scenario, editor_scenario_data) == 0x104);
const _: () = assert!(std::mem::offset_of!(Scenario, comments) == 0x118);
const _: () = assert!(std::mem::offset_of!(Scenario, object_names) == 0x204);
const _: () = assert!(std::mem::offset_of!(Scenario, scenery) == 0x210);
const _: () = assert!(std::mem::offset_of!(Scenario, scenery_palette) == 0x21C);
const _: () = assert!(std::mem::offset_of!(Scenario, weapon_palette) == 0x27C);
const _: () = assert!(std::mem::offset_of!(Scenario, structure_bsps) == 0x5A4);
const _: () = assert!(size_of::<ChildScenario>() == 32);
const _: () = assert!(size_of::<PaletteEntry>() == 48);
const _: () = assert!(size_of::<ObjectName>() == 36);
const _: () = assert!(size_of::<ScenerySpawn>() == 72);
const _: () = assert!(std::mem::offset_of!(ScenerySpawn, position) == 0x08);
const _: () = assert!(size_of::<ScenarioBsp>() == 32);
const _: () = assert!(std::mem::offset_of!(ScenarioBsp, structure_bsp) == 0x10);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::MapBuilder;
    use pretty_assertions::assert_eq;
    use zerocopy::FromZeros;

    #[test]
    fn test_scenario_from_index_header() {
        let mut builder = MapBuilder::new();
        let sky = builder.add_tag([TagClass::SKY, TagClass::NONE, TagClass::NONE], "sky\\clear", &[0u8; 16]);
        let rock = builder.add_tag(
            [TagClass::from_fourcc(*b"scen"), TagClass::from_fourcc(*b"obje"), TagClass::NONE],
            "scenery\\rocks\\boulder",
            &[0u8; 16],
        );

        let sky = builder.reference(sky);
        let rock = builder.reference(rock);
        let skies = builder.alloc_array(&[sky]);
        let palette = builder.alloc_array(&[PaletteEntry::new(rock)]);
        let scenery = builder.alloc_array(&[
            ScenerySpawn::new(0, Vector3::new(1.0, 2.0, 3.0), Vector3::default()),
            ScenerySpawn::new(-1, Vector3::default(), Vector3::default()),
        ]);

        let mut body = Scenario::new_zeroed();
        body.scenario_type = U16::new(1);
        body.skies = skies;
        body.scenery_palette = palette;
        body.scenery = scenery;
        let scenario = builder.add_typed("levels\\test\\test", &body);
        builder.set_scenario(scenario);
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();

        let scenario = map.scenario().unwrap();
        assert_eq!(scenario.scenario_type(), ScenarioType::Multiplayer);

        let skies = scenario.skies(&map).unwrap();
        assert_eq!(map.reference_name(&skies[0]), "sky\\clear");
        assert_eq!(map.resolve_reference(&skies[0]).unwrap().primary_class(), TagClass::SKY);

        let palette = scenario.scenery_palette(&map).unwrap();
        let placements = scenario.scenery(&map).unwrap();
        assert_eq!(placements.len(), 2);
        let slot = placements[0].palette_index().unwrap();
        assert_eq!(map.tag_name(palette[usize::from(slot)].object().tag_id()), "scenery\\rocks\\boulder");
        assert_eq!(placements[0].position().to_array(), [1.0, 2.0, 3.0]);
        assert_eq!(placements[1].palette_index(), None);
        assert!(scenario.structure_bsps(&map).unwrap().is_empty());
    }

    #[test]
    fn test_scenario_missing() {
        let mut builder = MapBuilder::new();
        builder.add_tag([TagClass::SKY, TagClass::NONE, TagClass::NONE], "sky\\clear", &[0u8; 16]);
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();
        assert!(map.scenario().is_err());
    }

    #[test]
    fn test_object_names() {
        let mut builder = MapBuilder::new();
        let mut name = ObjectName::new_zeroed();
        name.name[..4].copy_from_slice(b"door");
        name.placement_index = U16::new(7);
        let names = builder.alloc_array(&[name]);
        let mut body = Scenario::new_zeroed();
        body.object_names = names;
        let id = builder.add_typed("levels\\test\\test", &body);
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();

        let names = map.get_tag::<Scenario>(id).unwrap().object_names(&map).unwrap();
        assert_eq!(names[0].name(), "door");
        assert_eq!(names[0].placement_index(), 7);
    }
}
