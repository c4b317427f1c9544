//! Structure BSP (`sbsp`) and its private address space
//!
//! A structure BSP body does not live in the tag heap. Each
//! [`ScenarioBsp`] record names a byte range of the file and the virtual
//! address that range had at runtime; every offset stored inside it is
//! relative to that address, never to the tag heap's base.
//!
//! ```text
//! file[bsp_start .. bsp_start + bsp_size]   virtual base = bsp_address
//! +0x00  BspHeader (24 bytes, "sbsp")
//! ...    StructureBsp body at header.body_offset
//! ...    surfaces, lightmaps -> materials -> vertex buffers
//! ```
//!
//! [`BspRegion`] carries that base, and every accessor below takes it
//! explicitly.

use tracing::debug;
use zerocopy::little_endian::{F32, I16, I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::scenario::ScenarioBsp;
use crate::directory::{TagMap, file_bytes};
use crate::error::{MapError, Result};
use crate::primitives::{
    Bounds3, ColorArgb, ColorRgb, DataReference, Plane3, TagBlock, TagClass, TagId, TagReference, Vector2,
    Vector3,
};
use crate::resolver::VirtualRegion;

/// Size of the BSP region header in bytes
pub const BSP_HEADER_SIZE: usize = 24;

/// BSP region header marker
pub const SBSP_MAGIC: TagClass = TagClass::SCENARIO_STRUCTURE_BSP;

/// Header at the start of a BSP region (24 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BspHeader {
    pub(crate) body_offset: U32,
    pub(crate) lightmap_material_count: U32,
    pub(crate) rendered_vertices_offset: U32,
    pub(crate) lightmap_material_count_again: U32,
    pub(crate) lightmap_vertices_offset: U32,
    pub(crate) magic: U32,
}

impl BspHeader {
    /// Build a header.
    pub fn new(body_offset: u32, lightmap_material_count: u32) -> Self {
        Self {
            body_offset: U32::new(body_offset),
            lightmap_material_count: U32::new(lightmap_material_count),
            rendered_vertices_offset: U32::ZERO,
            lightmap_material_count_again: U32::new(lightmap_material_count),
            lightmap_vertices_offset: U32::ZERO,
            magic: U32::new(SBSP_MAGIC.to_raw()),
        }
    }

    /// Virtual offset of the [`StructureBsp`] body.
    pub fn body_offset(&self) -> u32 {
        self.body_offset.get()
    }

    /// Total number of lightmap materials in the BSP.
    pub fn lightmap_material_count(&self) -> u32 {
        self.lightmap_material_count.get()
    }

    /// Virtual offset of the rendered vertex pool.
    pub fn rendered_vertices_offset(&self) -> u32 {
        self.rendered_vertices_offset.get()
    }

    /// Virtual offset of the lightmap vertex pool.
    pub fn lightmap_vertices_offset(&self) -> u32 {
        self.lightmap_vertices_offset.get()
    }

    /// Marker, `"sbsp"`.
    pub fn magic(&self) -> TagClass {
        TagClass::from(self.magic.get())
    }
}

/// An opened structure BSP: its private region, header and body.
#[derive(Debug, Clone, Copy)]
pub struct BspRegion<'a> {
    region: VirtualRegion<'a>,
    file_offset: u32,
    header: &'a BspHeader,
    body: &'a StructureBsp,
    tag_id: TagId,
}

impl<'a> BspRegion<'a> {
    /// Open the region a scenario's BSP record points at.
    ///
    /// The referenced tag, when set, must be a structure BSP.
    pub fn open(map: &TagMap<'a>, record: &ScenarioBsp) -> Result<Self> {
        let bytes = file_bytes(map.image(), record.bsp_start(), record.bsp_size())?;
        let start = u64::from(record.bsp_start());

        let reference = record.structure_bsp();
        if reference.is_set() {
            let entry = map
                .lookup(reference.tag_id())
                .ok_or(MapError::TagNotFound(reference.tag_id()))?;
            if !entry.is_a(TagClass::SCENARIO_STRUCTURE_BSP) {
                return Err(MapError::ClassMismatch {
                    tag_id: entry.tag_id(),
                    expected: TagClass::SCENARIO_STRUCTURE_BSP,
                    found: entry.primary_class(),
                });
            }
        }

        let header = bytes
            .get(..BSP_HEADER_SIZE)
            .and_then(|prefix| BspHeader::ref_from_bytes(prefix).ok())
            .ok_or_else(|| {
                MapError::malformed(
                    start,
                    format!("BSP region of {} bytes is shorter than its header", bytes.len()),
                )
            })?;
        if header.magic() != SBSP_MAGIC {
            return Err(MapError::malformed(
                start + 20,
                format!("BSP region marker is '{}', expected '{SBSP_MAGIC}'", header.magic()),
            ));
        }

        let region = VirtualRegion::new(bytes, record.bsp_address());
        let body = region.read::<StructureBsp>(header.body_offset())?;

        debug!(
            "Opened BSP '{}' at {:#x} ({} bytes, base {:#010x}, {} lightmap materials)",
            map.reference_name(reference),
            start,
            bytes.len(),
            record.bsp_address(),
            header.lightmap_material_count()
        );

        Ok(Self {
            region,
            file_offset: record.bsp_start(),
            header,
            body,
            tag_id: reference.tag_id(),
        })
    }

    /// The private region.
    pub fn region(&self) -> VirtualRegion<'a> {
        self.region
    }

    /// Virtual address of the region's first byte.
    pub fn base(&self) -> u32 {
        self.region.base()
    }

    /// File offset of the region.
    pub fn file_offset(&self) -> u32 {
        self.file_offset
    }

    /// The region header.
    pub fn header(&self) -> &'a BspHeader {
        self.header
    }

    /// The structure BSP body.
    pub fn body(&self) -> &'a StructureBsp {
        self.body
    }

    /// Identifier of the structure BSP tag, invalid when the record had none.
    pub fn tag_id(&self) -> TagId {
        self.tag_id
    }

    /// Bytes of a payload stored inside the region, by virtual offset.
    pub fn data(&self, reference: &DataReference) -> Result<&'a [u8]> {
        if reference.is_external() {
            return Err(MapError::ExternalData {
                offset: reference.file_offset(),
                size: reference.size(),
            });
        }
        self.region
            .read_bytes(reference.virtual_offset(), reference.size() as usize)
    }

    /// Shortcut for the body's lightmaps.
    pub fn lightmaps(&self) -> Result<&'a [BspLightmap]> {
        self.body.lightmaps(self)
    }
}

/// Structure BSP body (0x288 bytes)
///
/// Not a [`TagLayout`](super::TagLayout): the body is only reachable through
/// a [`BspRegion`].
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct StructureBsp {
    pub(crate) lightmaps_bitmap: TagReference,
    pub(crate) vehicle_floor: F32,
    pub(crate) vehicle_ceiling: F32,
    pub(crate) pad0: [u8; 20],
    pub(crate) default_ambient_color: ColorRgb,
    pub(crate) pad1: [u8; 4],
    pub(crate) default_distant_light_0_color: ColorRgb,
    pub(crate) default_distant_light_0_direction: Vector3,
    pub(crate) default_distant_light_1_color: ColorRgb,
    pub(crate) default_distant_light_1_direction: Vector3,
    pub(crate) pad2: [u8; 12],
    pub(crate) default_reflection_tint: ColorArgb,
    pub(crate) default_shadow_vector: Vector3,
    pub(crate) default_shadow_color: ColorRgb,
    pub(crate) pad3: [u8; 4],
    pub(crate) collision_materials: TagBlock,
    pub(crate) collision_bsp: TagBlock,
    pub(crate) nodes: TagBlock,
    pub(crate) world_bounds: Bounds3,
    pub(crate) leaves: TagBlock,
    pub(crate) leaf_surfaces: TagBlock,
    pub(crate) surfaces: TagBlock,
    pub(crate) lightmaps: TagBlock,
    pub(crate) pad4: [u8; 12],
    pub(crate) lens_flares: TagBlock,
    pub(crate) clusters: TagBlock,
    pub(crate) cluster_data: DataReference,
    pub(crate) cluster_portals: TagBlock,
    pub(crate) pad5: [u8; 12],
    pub(crate) breakable_surfaces: TagBlock,
    pub(crate) fog_planes: TagBlock,
    pub(crate) fog_regions: TagBlock,
    pub(crate) fog_palette: TagBlock,
    pub(crate) pad6: [u8; 24],
    pub(crate) weather_palette: TagBlock,
    pub(crate) weather_polyhedra: TagBlock,
    pub(crate) pad7: [u8; 24],
    pub(crate) pathfinding_surfaces: TagBlock,
    pub(crate) pathfinding_edges: TagBlock,
    pub(crate) background_sound_palette: TagBlock,
    pub(crate) sound_environment_palette: TagBlock,
    pub(crate) sound_pas_data: DataReference,
    pub(crate) pad8: [u8; 24],
    pub(crate) markers: TagBlock,
    pub(crate) detail_objects: TagBlock,
    pub(crate) runtime_decals: TagBlock,
    pub(crate) pad9: [u8; 12],
    pub(crate) leaf_map_leaves: TagBlock,
    pub(crate) leaf_map_portals: TagBlock,
    pub(crate) pad10: [u8; 12],
}

impl StructureBsp {
    /// Lightmap bitmap tag.
    pub fn lightmaps_bitmap(&self) -> &TagReference {
        &self.lightmaps_bitmap
    }

    /// Vehicle floor and ceiling heights.
    pub fn vehicle_limits(&self) -> (f32, f32) {
        (self.vehicle_floor.get(), self.vehicle_ceiling.get())
    }

    /// Default ambient color.
    pub fn default_ambient_color(&self) -> &ColorRgb {
        &self.default_ambient_color
    }

    /// Default shadow direction and color.
    pub fn default_shadow(&self) -> (&Vector3, &ColorRgb) {
        (&self.default_shadow_vector, &self.default_shadow_color)
    }

    /// Axis-aligned bounds of the level geometry.
    pub fn world_bounds(&self) -> &Bounds3 {
        &self.world_bounds
    }

    /// Collision materials.
    pub fn collision_materials<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [CollisionMaterial]> {
        bsp.region().read_array(&self.collision_materials)
    }

    /// Index triangles shared by every lightmap material.
    pub fn surfaces<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [Triangle]> {
        bsp.region().read_array(&self.surfaces)
    }

    /// Lightmaps, one per lightmap bitmap page.
    pub fn lightmaps<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [BspLightmap]> {
        bsp.region().read_array(&self.lightmaps)
    }

    /// Raw cluster data.
    pub fn cluster_data<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [u8]> {
        bsp.data(&self.cluster_data)
    }

    /// Raw sound PAS data.
    pub fn sound_pas_data<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [u8]> {
        bsp.data(&self.sound_pas_data)
    }

    /// Element counts of the blocks without a typed layout, by name.
    pub fn block_counts(&self) -> [(&'static str, u32); 8] {
        [
            ("nodes", self.nodes.count()),
            ("leaves", self.leaves.count()),
            ("clusters", self.clusters.count()),
            ("lens flares", self.lens_flares.count()),
            ("fog planes", self.fog_planes.count()),
            ("weather palette", self.weather_palette.count()),
            ("markers", self.markers.count()),
            ("detail objects", self.detail_objects.count()),
        ]
    }
}

/// Collision material (20 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CollisionMaterial {
    pub(crate) shader: TagReference,
    pub(crate) material: U16,
    pub(crate) pad0: [u8; 2],
}

impl CollisionMaterial {
    /// Shader of the surface.
    pub fn shader(&self) -> &TagReference {
        &self.shader
    }

    /// Physics material type.
    pub fn material(&self) -> u16 {
        self.material.get()
    }
}

/// Three vertex indices (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Triangle {
    pub(crate) vertices: [U16; 3],
}

impl Triangle {
    /// Build a triangle.
    pub fn new(a: u16, b: u16, c: u16) -> Self {
        Self {
            vertices: [U16::new(a), U16::new(b), U16::new(c)],
        }
    }

    /// Vertex indices.
    pub fn indices(&self) -> [u16; 3] {
        self.vertices.map(U16::get)
    }
}

/// One lightmap page (32 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BspLightmap {
    pub(crate) bitmap_index: I16,
    pub(crate) pad0: [u8; 18],
    pub(crate) materials: TagBlock,
}

impl BspLightmap {
    /// Build a lightmap record.
    pub fn new(bitmap_index: i16, materials: TagBlock) -> Self {
        Self {
            bitmap_index: I16::new(bitmap_index),
            pad0: [0; 18],
            materials,
        }
    }

    /// Index into the lightmap bitmap, `None` when unlit.
    pub fn bitmap_index(&self) -> Option<u16> {
        u16::try_from(self.bitmap_index.get()).ok()
    }

    /// Materials drawn with this lightmap page.
    pub fn materials<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [BspMaterial]> {
        bsp.region().read_array(&self.materials)
    }
}

/// One lightmap material: a shader plus a run of surfaces (256 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BspMaterial {
    pub(crate) shader: TagReference,
    pub(crate) shader_permutation: U16,
    pub(crate) flags: U16,
    pub(crate) surfaces: I32,
    pub(crate) surface_count: I32,
    pub(crate) centroid: Vector3,
    pub(crate) ambient_color: ColorRgb,
    pub(crate) distant_light_count: U16,
    pub(crate) pad0: [u8; 2],
    pub(crate) distant_light_0_color: ColorRgb,
    pub(crate) distant_light_0_direction: Vector3,
    pub(crate) distant_light_1_color: ColorRgb,
    pub(crate) distant_light_1_direction: Vector3,
    pub(crate) pad1: [u8; 12],
    pub(crate) reflection_tint: ColorArgb,
    pub(crate) shadow_vector: Vector3,
    pub(crate) shadow_color: ColorRgb,
    pub(crate) plane: Plane3,
    pub(crate) breakable_surface: I16,
    pub(crate) pad2: [u8; 6],
    pub(crate) rendered_vertices_type: U16,
    pub(crate) pad3: [u8; 2],
    pub(crate) rendered_vertices_count: U32,
    pub(crate) rendered_vertices_offset: U32,
    pub(crate) pad4: [u8; 8],
    pub(crate) lightmap_vertices_type: U16,
    pub(crate) pad5: [u8; 2],
    pub(crate) lightmap_vertices_count: U32,
    pub(crate) lightmap_vertices_offset: U32,
    pub(crate) pad6: [u8; 4],
    pub(crate) uncompressed_vertices: DataReference,
    pub(crate) compressed_vertices: DataReference,
}

impl BspMaterial {
    /// Shader the surfaces are drawn with.
    pub fn shader(&self) -> &TagReference {
        &self.shader
    }

    /// Shader permutation.
    pub fn shader_permutation(&self) -> u16 {
        self.shader_permutation.get()
    }

    /// Surface range as `(first, count)` in the BSP surface array.
    pub fn surface_range(&self) -> (i32, i32) {
        (self.surfaces.get(), self.surface_count.get())
    }

    /// Center of the material's geometry.
    pub fn centroid(&self) -> &Vector3 {
        &self.centroid
    }

    /// Ambient color.
    pub fn ambient_color(&self) -> &ColorRgb {
        &self.ambient_color
    }

    /// Plane of the surfaces.
    pub fn plane(&self) -> &Plane3 {
        &self.plane
    }

    /// Number of rendered vertices.
    pub fn rendered_vertex_count(&self) -> u32 {
        self.rendered_vertices_count.get()
    }

    /// Number of lightmap vertices.
    pub fn lightmap_vertex_count(&self) -> u32 {
        self.lightmap_vertices_count.get()
    }

    /// Vertex buffer offset recorded for the rendered vertices.
    ///
    /// Written by the engine at load time; vertices are read through
    /// [`Self::uncompressed_vertices`] instead.
    pub fn rendered_vertices_offset(&self) -> u32 {
        self.rendered_vertices_offset.get()
    }

    /// Vertex buffer offset recorded for the lightmap vertices.
    pub fn lightmap_vertices_offset(&self) -> u32 {
        self.lightmap_vertices_offset.get()
    }

    /// Uncompressed vertex buffer (rendered vertices, then lightmap vertices).
    pub fn uncompressed_vertices(&self) -> &DataReference {
        &self.uncompressed_vertices
    }

    /// Compressed vertex buffer.
    pub fn compressed_vertices(&self) -> &DataReference {
        &self.compressed_vertices
    }

    /// Rendered vertices from the uncompressed buffer.
    pub fn rendered_vertices<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [RenderedVertex]> {
        let buffer = bsp.data(&self.uncompressed_vertices)?;
        vertices_at(buffer, 0, self.rendered_vertices_count.get(), "rendered vertex")
    }

    /// Lightmap vertices, stored after the rendered vertices in the
    /// uncompressed buffer.
    pub fn lightmap_vertices<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [LightmapVertex]> {
        let buffer = bsp.data(&self.uncompressed_vertices)?;
        let rendered = self.rendered_vertices_count.get();
        let skip = (rendered as usize)
            .checked_mul(size_of::<RenderedVertex>())
            .ok_or_else(|| MapError::IndexOutOfRange {
                what: "rendered vertex",
                index: u64::from(rendered),
                len: buffer.len() / size_of::<RenderedVertex>(),
            })?;
        vertices_at(buffer, skip, self.lightmap_vertices_count.get(), "lightmap vertex")
    }

    /// Triangles of this material, sliced out of the BSP surface array.
    pub fn triangles<'a>(&self, bsp: &BspRegion<'a>) -> Result<&'a [Triangle]> {
        let surfaces = bsp.body().surfaces(bsp)?;
        let (first, count) = self.surface_range();
        let out_of_range = || MapError::IndexOutOfRange {
            what: "surface",
            index: u64::from(first.unsigned_abs()),
            len: surfaces.len(),
        };
        let first = usize::try_from(first).map_err(|_| out_of_range())?;
        let count = usize::try_from(count).map_err(|_| out_of_range())?;
        let end = first.checked_add(count).ok_or_else(out_of_range)?;
        surfaces.get(first..end).ok_or_else(out_of_range)
    }
}

fn vertices_at<'a, T>(buffer: &'a [u8], skip: usize, count: u32, what: &'static str) -> Result<&'a [T]>
where
    T: FromBytes + Immutable + Unaligned,
{
    let available = buffer.len().saturating_sub(skip) / size_of::<T>();
    let out_of_range = || MapError::IndexOutOfRange {
        what,
        index: u64::from(count),
        len: available,
    };
    let tail = buffer.get(skip..).ok_or_else(out_of_range)?;
    <[T]>::ref_from_prefix_with_elems(tail, count as usize)
        .map(|(vertices, _)| vertices)
        .map_err(|_| out_of_range())
}

/// Vertex with full tangent space (56 bytes)
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RenderedVertex {
    pub(crate) position: Vector3,
    pub(crate) normal: Vector3,
    pub(crate) binormal: Vector3,
    pub(crate) tangent: Vector3,
    pub(crate) texture_coords: Vector2,
}

impl RenderedVertex {
    /// Build a vertex.
    pub fn new(position: Vector3, normal: Vector3, texture_coords: Vector2) -> Self {
        Self {
            position,
            normal,
            binormal: Vector3::default(),
            tangent: Vector3::default(),
            texture_coords,
        }
    }

    /// Position.
    pub fn position(&self) -> &Vector3 {
        &self.position
    }

    /// Normal.
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Binormal.
    pub fn binormal(&self) -> &Vector3 {
        &self.binormal
    }

    /// Tangent.
    pub fn tangent(&self) -> &Vector3 {
        &self.tangent
    }

    /// Texture coordinates.
    pub fn texture_coords(&self) -> &Vector2 {
        &self.texture_coords
    }
}

/// Lightmap vertex (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct LightmapVertex {
    pub(crate) normal: Vector3,
    pub(crate) texture_coords: Vector2,
}

impl LightmapVertex {
    /// Build a vertex.
    pub fn new(normal: Vector3, texture_coords: Vector2) -> Self {
        Self { normal, texture_coords }
    }

    /// Incident light direction.
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Lightmap texture coordinates.
    pub fn texture_coords(&self) -> &Vector2 {
        &self.texture_coords
    }
}

const _: () = assert!(size_of::<BspHeader>() == BSP_HEADER_SIZE);
const _: () = assert!(std::mem::offset_of!(BspHeader, magic) == 20);

const _: () = assert!(size_of::<StructureBsp>() == 0x288);
const _: () = assert!(std::mem::offset_of!(StructureBsp, default_ambient_color) == 0x02C);
const _: () = assert!(std::mem::offset_of!(StructureBsp, default_reflection_tint) == 0x078);
const _: () = assert!(std::mem::offset_of!(StructureBsp, collision_materials) == 0x0A4);
const _: () = assert!(std::mem::offset_of!(StructureBsp, world_bounds) == 0x0C8);
const _: () = assert!(std::mem::offset_of!(StructureBsp, surfaces) == 0x0F8);
const _: () = assert!(std::mem::offset_of!(StructureBsp, lightmaps) == 0x104);
const _: () = assert!(std::mem::offset_of!(StructureBsp, cluster_data) == 0x134);
const _: () = assert!(std::mem::offset_of!(StructureBsp, breakable_surfaces) == 0x160);
const _: () = assert!(std::mem::offset_of!(StructureBsp, weather_palette) == 0x1A8);
const _: () = assert!(std::mem::offset_of!(StructureBsp, pathfinding_surfaces) == 0x1D8);
const _: () = assert!(std::mem::offset_of!(StructureBsp, sound_pas_data) == 0x208);
const _: () = assert!(std::mem::offset_of!(StructureBsp, markers) == 0x234);
const _: () = assert!(std::mem::offset_of!(StructureBsp, leaf_map_leaves) == 0x264);

const _: () = assert!(size_of::<CollisionMaterial>() == 20);
const _: () = assert!(size_of::<Triangle>() == 6);
const _: () = assert!(size_of::<BspLightmap>() == 32);
const _: () = assert!(std::mem::offset_of!(BspLightmap, materials) == 0x14);

const _: () = assert!(size_of::<BspMaterial>() == 0x100);
const _: () = assert!(std::mem::offset_of!(BspMaterial, surfaces) == 0x14);
const _: () = assert!(std::mem::offset_of!(BspMaterial, reflection_tint) == 0x74);
const _: () = assert!(std::mem::offset_of!(BspMaterial, plane) == 0x9C);
const _: () = assert!(std::mem::offset_of!(BspMaterial, rendered_vertices_type) == 0xB4);
const _: () = assert!(std::mem::offset_of!(BspMaterial, rendered_vertices_count) == 0xB8);
const _: () = assert!(std::mem::offset_of!(BspMaterial, rendered_vertices_offset) == 0xBC);
const _: () = assert!(std::mem::offset_of!(BspMaterial, lightmap_vertices_count) == 0xCC);
const _: () = assert!(std::mem::offset_of!(BspMaterial, lightmap_vertices_offset) == 0xD0);
const _: () = assert!(std::mem::offset_of!(BspMaterial, uncompressed_vertices) == 0xD8);
const _: () = assert!(std::mem::offset_of!(BspMaterial, compressed_vertices) == 0xEC);

const _: () = assert!(size_of::<RenderedVertex>() == 56);
const _: () = assert!(size_of::<LightmapVertex>() == 20);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tags::scenario::Scenario;
    use crate::test_utils::{BspBuilder, MapBuilder};
    use pretty_assertions::assert_eq;
    use zerocopy::FromZeros;

    const BSP_BASE: u32 = 0x4060_0000;
    const SBSP: [TagClass; 3] = [TagClass::SCENARIO_STRUCTURE_BSP, TagClass::NONE, TagClass::NONE];

    fn vertex(x: f32) -> RenderedVertex {
        RenderedVertex::new(Vector3::new(x, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0), Vector2::new(x, x))
    }

    /// A BSP with three surfaces, one lightmap and one material that owns
    /// surfaces 1..3 and four vertices of each kind.
    fn bsp_region(bsp: &mut BspBuilder, surface_range: (i32, i32)) -> Vec<u8> {
        let surfaces = bsp.alloc_array(&[Triangle::new(0, 1, 2), Triangle::new(2, 1, 3), Triangle::new(3, 1, 0)]);

        let mut buffer = Vec::new();
        for i in 0..4u8 {
            buffer.extend_from_slice(vertex(f32::from(i)).as_bytes());
        }
        for i in 0..4u8 {
            let lightmap = LightmapVertex::new(Vector3::new(0.0, 1.0, 0.0), Vector2::new(f32::from(i) / 4.0, 0.0));
            buffer.extend_from_slice(lightmap.as_bytes());
        }
        let vertices = bsp.alloc_data(&buffer);

        let mut material = BspMaterial::new_zeroed();
        material.surfaces = I32::new(surface_range.0);
        material.surface_count = I32::new(surface_range.1);
        material.rendered_vertices_count = U32::new(4);
        material.lightmap_vertices_count = U32::new(4);
        material.uncompressed_vertices = vertices;
        let materials = bsp.alloc_array(&[material]);
        let lightmaps = bsp.alloc_array(&[BspLightmap::new(0, materials)]);

        let mut body = StructureBsp::new_zeroed();
        body.surfaces = surfaces;
        body.lightmaps = lightmaps;
        body.vehicle_floor = F32::new(-10.0);
        let body = bsp.alloc_record(&body);
        bsp.finish(body, 1)
    }

    fn map_with_bsp(region: &[u8], bsp_class: [TagClass; 3]) -> Vec<u8> {
        let mut builder = MapBuilder::new();
        let start = builder.append(region);
        let sbsp = builder.add_tag(bsp_class, "levels\\test\\test", &[]);
        let record = ScenarioBsp::new(start, region.len() as u32, BSP_BASE, builder.reference(sbsp));
        let bsps = builder.alloc_array(&[record]);
        let mut scenario = Scenario::new_zeroed();
        scenario.structure_bsps = bsps;
        let id = builder.add_typed("levels\\test\\test", &scenario);
        builder.set_scenario(id);
        builder.build()
    }

    #[test]
    fn test_two_level_resolution() {
        let region = bsp_region(&mut BspBuilder::new(BSP_BASE), (1, 2));
        let bytes = map_with_bsp(&region, SBSP);
        let map = TagMap::new(&bytes).unwrap();

        let records = map.scenario().unwrap().structure_bsps(&map).unwrap();
        let bsp = records[0].open(&map).unwrap();
        assert_eq!(bsp.base(), BSP_BASE);
        assert_eq!(bsp.header().lightmap_material_count(), 1);
        assert_eq!(bsp.body().vehicle_limits().0, -10.0);

        let lightmaps = bsp.lightmaps().unwrap();
        assert_eq!(lightmaps.len(), 1);
        assert_eq!(lightmaps[0].bitmap_index(), Some(0));

        let materials = lightmaps[0].materials(&bsp).unwrap();
        let material = &materials[0];

        let triangles: Vec<[u16; 3]> = material.triangles(&bsp).unwrap().iter().map(Triangle::indices).collect();
        assert_eq!(triangles, vec![[2, 1, 3], [3, 1, 0]]);

        let rendered = material.rendered_vertices(&bsp).unwrap();
        assert_eq!(rendered.len(), 4);
        assert_eq!(rendered[3].position().to_array(), [3.0, 0.0, 0.0]);

        let lightmap = material.lightmap_vertices(&bsp).unwrap();
        assert_eq!(lightmap.len(), 4);
        assert_eq!(lightmap[2].texture_coords().to_array(), [0.5, 0.0]);
    }

    #[test]
    fn test_private_offsets_do_not_resolve_in_tag_heap() {
        let region = bsp_region(&mut BspBuilder::new(BSP_BASE), (0, 3));
        let bytes = map_with_bsp(&region, SBSP);
        let map = TagMap::new(&bytes).unwrap();

        let records = map.scenario().unwrap().structure_bsps(&map).unwrap();
        let bsp = records[0].open(&map).unwrap();
        assert_eq!(bsp.body().surfaces(&bsp).unwrap().len(), 3);

        let heap_view: Result<&[Triangle]> = map.heap().read_array(&bsp.body().surfaces);
        assert!(heap_view.unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_surface_range_checked() {
        for range in [(2, 5), (-1, 1), (0, -3)] {
            let region = bsp_region(&mut BspBuilder::new(BSP_BASE), range);
            let bytes = map_with_bsp(&region, SBSP);
            let map = TagMap::new(&bytes).unwrap();
            let records = map.scenario().unwrap().structure_bsps(&map).unwrap();
            let bsp = records[0].open(&map).unwrap();
            let material = &bsp.lightmaps().unwrap()[0].materials(&bsp).unwrap()[0];
            let err = material.triangles(&bsp).unwrap_err();
            assert!(matches!(err, MapError::IndexOutOfRange { what: "surface", .. }), "{range:?}: {err}");
        }
    }

    #[test]
    fn test_bad_region_marker() {
        let mut region = bsp_region(&mut BspBuilder::new(BSP_BASE), (0, 1));
        region[20..24].copy_from_slice(b"xxxx");
        let bytes = map_with_bsp(&region, SBSP);
        let map = TagMap::new(&bytes).unwrap();
        let records = map.scenario().unwrap().structure_bsps(&map).unwrap();
        assert!(records[0].open(&map).unwrap_err().is_malformed_header());
    }

    #[test]
    fn test_reference_must_be_structure_bsp() {
        let region = bsp_region(&mut BspBuilder::new(BSP_BASE), (0, 1));
        let bytes = map_with_bsp(&region, [TagClass::BITMAP, TagClass::NONE, TagClass::NONE]);
        let map = TagMap::new(&bytes).unwrap();
        let records = map.scenario().unwrap().structure_bsps(&map).unwrap();
        assert!(matches!(records[0].open(&map), Err(MapError::ClassMismatch { .. })));
    }

    #[test]
    fn test_region_past_end_of_image() {
        let mut builder = MapBuilder::new();
        let record = ScenarioBsp::new(0x10_0000, 0x1000, BSP_BASE, TagReference::null());
        let bsps = builder.alloc_array(&[record]);
        let mut scenario = Scenario::new_zeroed();
        scenario.structure_bsps = bsps;
        let id = builder.add_typed("levels\\test\\test", &scenario);
        builder.set_scenario(id);
        let bytes = builder.build();
        let map = TagMap::new(&bytes).unwrap();

        let records = map.scenario().unwrap().structure_bsps(&map).unwrap();
        assert!(matches!(records[0].open(&map), Err(MapError::RegionOutOfBounds { .. })));
    }

    #[test]
    fn test_vertex_count_past_buffer() {
        let mut bsp = BspBuilder::new(BSP_BASE);
        let vertices = bsp.alloc_data(&[0u8; 56]);
        let mut material = BspMaterial::new_zeroed();
        material.rendered_vertices_count = U32::new(2);
        material.uncompressed_vertices = vertices;
        let materials = bsp.alloc_array(&[material]);
        let lightmaps = bsp.alloc_array(&[BspLightmap::new(-1, materials)]);
        let mut body = StructureBsp::new_zeroed();
        body.lightmaps = lightmaps;
        let body = bsp.alloc_record(&body);
        let region = bsp.finish(body, 1);
        let bytes = map_with_bsp(&region, SBSP);
        let map = TagMap::new(&bytes).unwrap();

        let records = map.scenario().unwrap().structure_bsps(&map).unwrap();
        let bsp = records[0].open(&map).unwrap();
        let lightmap = &bsp.lightmaps().unwrap()[0];
        assert_eq!(lightmap.bitmap_index(), None);
        let material = &lightmap.materials(&bsp).unwrap()[0];
        assert!(material.rendered_vertices(&bsp).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_huge_rendered_count_does_not_wrap() {
        let mut bsp = BspBuilder::new(BSP_BASE);
        let vertices = bsp.alloc_data(&[0u8; 56 + 20]);
        let mut material = BspMaterial::new_zeroed();
        material.rendered_vertices_count = U32::new(u32::MAX);
        material.rendered_vertices_offset = U32::new(0x10);
        material.lightmap_vertices_count = U32::new(1);
        material.lightmap_vertices_offset = U32::new(0x48);
        material.uncompressed_vertices = vertices;
        let materials = bsp.alloc_array(&[material]);
        let lightmaps = bsp.alloc_array(&[BspLightmap::new(0, materials)]);
        let mut body = StructureBsp::new_zeroed();
        body.lightmaps = lightmaps;
        let body = bsp.alloc_record(&body);
        let region = bsp.finish(body, 1);
        let bytes = map_with_bsp(&region, SBSP);
        let map = TagMap::new(&bytes).unwrap();

        let records = map.scenario().unwrap().structure_bsps(&map).unwrap();
        let bsp = records[0].open(&map).unwrap();
        let material = &bsp.lightmaps().unwrap()[0].materials(&bsp).unwrap()[0];
        assert_eq!(material.rendered_vertices_offset(), 0x10);
        assert_eq!(material.lightmap_vertices_offset(), 0x48);

        let err = material.lightmap_vertices(&bsp).unwrap_err();
        assert!(matches!(err, MapError::IndexOutOfRange { .. }), "{err}");
        assert!(material.rendered_vertices(&bsp).unwrap_err().is_out_of_bounds());
    }
}
