//! Shader family (`shdr` and its subclasses)
//!
//! Every concrete shader body begins with the 40-byte [`Shader`] record and
//! appends its own fields directly after it:
//!
//! ```text
//! 0x00  Shader (radiosity, power, emitted light, material, kind)
//! 0x28  kind-specific fields ...
//! ```
//!
//! The chicago and generic transparent shaders additionally share the
//! 44-byte [`TransparentLayerHeader`] at 0x28.

use zerocopy::little_endian::{F32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::TagLayout;
use crate::directory::TagMap;
use crate::error::{MapError, Result};
use crate::primitives::{ColorRgb, TagBlock, TagClass, TagId, TagReference, Vector2};

/// Shared shader prefix (40 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Shader {
    pub(crate) radiosity_flags: U16,
    pub(crate) detail_level: U16,
    pub(crate) power: F32,
    pub(crate) emitted_light_color: ColorRgb,
    pub(crate) tint_color: ColorRgb,
    pub(crate) physics_flags: U16,
    pub(crate) material_type: U16,
    pub(crate) shader_type: U16,
    pub(crate) pad0: [u8; 2],
}

impl TagLayout for Shader {
    const CLASS: TagClass = TagClass::SHADER;
}

impl Shader {
    /// Radiosity flags.
    pub fn radiosity_flags(&self) -> u16 {
        self.radiosity_flags.get()
    }

    /// Radiosity detail level.
    pub fn detail_level(&self) -> u16 {
        self.detail_level.get()
    }

    /// Emitted light power.
    pub fn power(&self) -> f32 {
        self.power.get()
    }

    /// Emitted light color.
    pub fn emitted_light_color(&self) -> &ColorRgb {
        &self.emitted_light_color
    }

    /// Light tint color.
    pub fn tint_color(&self) -> &ColorRgb {
        &self.tint_color
    }

    /// Material type (physics).
    pub fn material_type(&self) -> u16 {
        self.material_type.get()
    }

    /// Concrete shader kind recorded in the body.
    pub fn kind(&self) -> ShaderKind {
        ShaderKind::from_u16(self.shader_type.get())
    }
}

/// Concrete shader kind as stored in [`Shader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    /// `senv`
    Environment,
    /// `soso`
    Model,
    /// `sotr`
    TransparentGeneric,
    /// `schi`
    TransparentChicago,
    /// `scex`
    TransparentChicagoExtended,
    /// `swat`
    TransparentWater,
    /// `sgla`
    TransparentGlass,
    /// `smet`
    TransparentMeter,
    /// `spla`
    TransparentPlasma,
    /// Any other value
    Other(u16),
}

impl ShaderKind {
    /// Decode a raw kind.
    pub fn from_u16(value: u16) -> Self {
        match value {
            3 => Self::Environment,
            4 => Self::Model,
            5 => Self::TransparentGeneric,
            6 => Self::TransparentChicago,
            7 => Self::TransparentChicagoExtended,
            8 => Self::TransparentWater,
            9 => Self::TransparentGlass,
            10 => Self::TransparentMeter,
            11 => Self::TransparentPlasma,
            other => Self::Other(other),
        }
    }

    /// Tag class of the concrete layout.
    pub fn class(self) -> Option<TagClass> {
        match self {
            Self::Environment => Some(TagClass::SHADER_ENVIRONMENT),
            Self::Model => Some(TagClass::SHADER_MODEL),
            Self::TransparentGeneric => Some(TagClass::SHADER_TRANSPARENT_GENERIC),
            Self::TransparentChicago => Some(TagClass::SHADER_TRANSPARENT_CHICAGO),
            Self::TransparentChicagoExtended => Some(TagClass::SHADER_TRANSPARENT_CHICAGO_EXTENDED),
            Self::TransparentWater => Some(TagClass::SHADER_TRANSPARENT_WATER),
            Self::TransparentGlass => Some(TagClass::SHADER_TRANSPARENT_GLASS),
            Self::TransparentMeter => Some(TagClass::SHADER_TRANSPARENT_METER),
            Self::TransparentPlasma => Some(TagClass::SHADER_TRANSPARENT_PLASMA),
            Self::Other(_) => None,
        }
    }
}

/// Environment shader (`senv`, 0x344 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ShaderEnvironment {
    pub(crate) shader: Shader,
    pub(crate) flags: U16,
    pub(crate) environment_type: U16,
    pub(crate) lens_flare_spacing: F32,
    pub(crate) lens_flare: TagReference,
    pub(crate) pad0: [u8; 44],
    pub(crate) diffuse_flags: U16,
    pub(crate) pad1: [u8; 26],
    pub(crate) base_map: TagReference,
    pub(crate) pad2: [u8; 24],
    pub(crate) detail_map_function: U16,
    pub(crate) pad3: [u8; 2],
    pub(crate) primary_detail_map_scale: F32,
    pub(crate) primary_detail_map: TagReference,
    pub(crate) secondary_detail_map_scale: F32,
    pub(crate) secondary_detail_map: TagReference,
    pub(crate) pad4: [u8; 24],
    pub(crate) micro_detail_map_function: U16,
    pub(crate) pad5: [u8; 2],
    pub(crate) micro_detail_map_scale: F32,
    pub(crate) micro_detail_map: TagReference,
    pub(crate) material_color: ColorRgb,
    pub(crate) pad6: [u8; 12],
    pub(crate) bump_map_scale: F32,
    pub(crate) bump_map: TagReference,
    pub(crate) bump_map_scale_xy: Vector2,
    pub(crate) pad7: [u8; 16],
    // Texture scrolling, self-illumination and specular blocks
    pub(crate) animation_illumination: [u8; 0x1A4],
    pub(crate) reflection_flags: U16,
    pub(crate) reflection_type: U16,
    pub(crate) lightmap_brightness_scale: F32,
    pub(crate) pad8: [u8; 28],
    pub(crate) perpendicular_brightness: F32,
    pub(crate) parallel_brightness: F32,
    pub(crate) pad9: [u8; 8],
    pub(crate) reflection_cube_map: TagReference,
    pub(crate) pad10: [u8; 12],
}

impl TagLayout for ShaderEnvironment {
    const CLASS: TagClass = TagClass::SHADER_ENVIRONMENT;
}

impl ShaderEnvironment {
    /// Shared shader fields.
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// Environment flags.
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Environment type (normal, blended, blended base specular).
    pub fn environment_type(&self) -> u16 {
        self.environment_type.get()
    }

    /// Lens flare.
    pub fn lens_flare(&self) -> &TagReference {
        &self.lens_flare
    }

    /// Base map.
    pub fn base_map(&self) -> &TagReference {
        &self.base_map
    }

    /// Primary detail map and its scale.
    pub fn primary_detail_map(&self) -> (&TagReference, f32) {
        (&self.primary_detail_map, self.primary_detail_map_scale.get())
    }

    /// Secondary detail map and its scale.
    pub fn secondary_detail_map(&self) -> (&TagReference, f32) {
        (&self.secondary_detail_map, self.secondary_detail_map_scale.get())
    }

    /// Micro detail map and its scale.
    pub fn micro_detail_map(&self) -> (&TagReference, f32) {
        (&self.micro_detail_map, self.micro_detail_map_scale.get())
    }

    /// Detail map blend function.
    pub fn detail_map_function(&self) -> u16 {
        self.detail_map_function.get()
    }

    /// Material color.
    pub fn material_color(&self) -> &ColorRgb {
        &self.material_color
    }

    /// Bump map and its scale.
    pub fn bump_map(&self) -> (&TagReference, f32) {
        (&self.bump_map, self.bump_map_scale.get())
    }

    /// Reflection type.
    pub fn reflection_type(&self) -> u16 {
        self.reflection_type.get()
    }

    /// Lightmap brightness scale.
    pub fn lightmap_brightness_scale(&self) -> f32 {
        self.lightmap_brightness_scale.get()
    }

    /// Reflection brightness at perpendicular and parallel view angles.
    pub fn reflection_brightness(&self) -> (f32, f32) {
        (self.perpendicular_brightness.get(), self.parallel_brightness.get())
    }

    /// Reflection cube map.
    pub fn reflection_cube_map(&self) -> &TagReference {
        &self.reflection_cube_map
    }

    /// Every bitmap reference of the shader, unset ones included.
    pub fn maps(&self) -> [&TagReference; 6] {
        [
            &self.base_map,
            &self.primary_detail_map,
            &self.secondary_detail_map,
            &self.micro_detail_map,
            &self.bump_map,
            &self.reflection_cube_map,
        ]
    }
}

/// Model shader (`soso`, 0x1B8 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ShaderModel {
    pub(crate) shader: Shader,
    pub(crate) flags: U16,
    pub(crate) pad0: [u8; 2],
    pub(crate) pad1: [u8; 12],
    pub(crate) translucency: F32,
    pub(crate) pad2: [u8; 16],
    pub(crate) change_color_source: U16,
    pub(crate) pad3: [u8; 2],
    pub(crate) pad4: [u8; 28],
    pub(crate) self_illumination_flags: U16,
    pub(crate) pad5: [u8; 2],
    pub(crate) pad6: [u8; 12],
    pub(crate) color_source: U16,
    pub(crate) animation_function: U16,
    pub(crate) animation_period: F32,
    pub(crate) animation_color_lower_bound: ColorRgb,
    pub(crate) animation_color_upper_bound: ColorRgb,
    pub(crate) pad7: [u8; 12],
    pub(crate) map_u_scale: F32,
    pub(crate) map_v_scale: F32,
    pub(crate) base_map: TagReference,
    pub(crate) pad8: [u8; 8],
    pub(crate) multipurpose_map: TagReference,
    pub(crate) pad9: [u8; 8],
    pub(crate) detail_function: U16,
    pub(crate) detail_mask: U16,
    pub(crate) detail_map_scale: F32,
    pub(crate) detail_map: TagReference,
    pub(crate) detail_map_v_scale: F32,
    pub(crate) pad10: [u8; 12],
    // Texture scrolling animation
    pub(crate) texture_animation: [u8; 0x58],
    pub(crate) reflection_falloff_distance: F32,
    pub(crate) reflection_cutoff_distance: F32,
    pub(crate) perpendicular_brightness: F32,
    pub(crate) perpendicular_tint_color: ColorRgb,
    pub(crate) parallel_brightness: F32,
    pub(crate) parallel_tint_color: ColorRgb,
    pub(crate) reflection_cube_map: TagReference,
    pub(crate) pad11: [u8; 16],
    pub(crate) unknown: F32,
    pub(crate) pad12: [u8; 12],
}

impl TagLayout for ShaderModel {
    const CLASS: TagClass = TagClass::SHADER_MODEL;
}

impl ShaderModel {
    /// Shared shader fields.
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// Model shader flags.
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Translucency.
    pub fn translucency(&self) -> f32 {
        self.translucency.get()
    }

    /// Base map texture coordinate scale.
    pub fn map_scale(&self) -> (f32, f32) {
        (self.map_u_scale.get(), self.map_v_scale.get())
    }

    /// Base map.
    pub fn base_map(&self) -> &TagReference {
        &self.base_map
    }

    /// Multipurpose map (specular, self-illumination, change color).
    pub fn multipurpose_map(&self) -> &TagReference {
        &self.multipurpose_map
    }

    /// Detail map and its scale.
    pub fn detail_map(&self) -> (&TagReference, f32) {
        (&self.detail_map, self.detail_map_scale.get())
    }

    /// Self-illumination animation color bounds.
    pub fn animation_colors(&self) -> (&ColorRgb, &ColorRgb) {
        (&self.animation_color_lower_bound, &self.animation_color_upper_bound)
    }

    /// Reflection falloff and cutoff distances.
    pub fn reflection_distances(&self) -> (f32, f32) {
        (self.reflection_falloff_distance.get(), self.reflection_cutoff_distance.get())
    }

    /// Reflection cube map.
    pub fn reflection_cube_map(&self) -> &TagReference {
        &self.reflection_cube_map
    }
}

/// Header shared by the chicago and generic transparent shaders (44 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TransparentLayerHeader {
    pub(crate) numeric_counter_limit: u8,
    pub(crate) flags: u8,
    pub(crate) first_map_type: U16,
    pub(crate) framebuffer_blend_function: U16,
    pub(crate) framebuffer_fade_mode: U16,
    pub(crate) framebuffer_fade_source: U16,
    pub(crate) pad0: [u8; 2],
    pub(crate) lens_flare_spacing: F32,
    pub(crate) lens_flare: TagReference,
    pub(crate) extra_layers: TagBlock,
}

impl TransparentLayerHeader {
    /// Flags.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// How the first map is projected.
    pub fn first_map_type(&self) -> u16 {
        self.first_map_type.get()
    }

    /// Framebuffer blend function.
    pub fn framebuffer_blend_function(&self) -> u16 {
        self.framebuffer_blend_function.get()
    }

    /// Lens flare.
    pub fn lens_flare(&self) -> &TagReference {
        &self.lens_flare
    }

    /// Extra shader layers drawn on top.
    pub fn extra_layers<'a>(&self, map: &TagMap<'a>) -> Result<&'a [TagReference]> {
        map.heap().read_array(&self.extra_layers)
    }
}

/// Texture coordinate animation shared by transparent shader maps (56 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TextureAnimation {
    pub(crate) u_source: U16,
    pub(crate) u_function: U16,
    pub(crate) u_period: F32,
    pub(crate) u_phase: F32,
    pub(crate) u_scale: F32,
    pub(crate) v_source: U16,
    pub(crate) v_function: U16,
    pub(crate) v_period: F32,
    pub(crate) v_phase: F32,
    pub(crate) v_scale: F32,
    pub(crate) rotation_source: U16,
    pub(crate) rotation_function: U16,
    pub(crate) rotation_period: F32,
    pub(crate) rotation_phase: F32,
    pub(crate) rotation_scale: F32,
    pub(crate) rotation_center: Vector2,
}

impl TextureAnimation {
    /// U animation function, period and scale.
    pub fn u(&self) -> (u16, f32, f32) {
        (self.u_function.get(), self.u_period.get(), self.u_scale.get())
    }

    /// V animation function, period and scale.
    pub fn v(&self) -> (u16, f32, f32) {
        (self.v_function.get(), self.v_period.get(), self.v_scale.get())
    }

    /// Rotation function, period and scale.
    pub fn rotation(&self) -> (u16, f32, f32) {
        (self.rotation_function.get(), self.rotation_period.get(), self.rotation_scale.get())
    }

    /// Rotation center.
    pub fn rotation_center(&self) -> &Vector2 {
        &self.rotation_center
    }
}

/// One map stage of a chicago shader (220 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ChicagoMap {
    pub(crate) flags: U16,
    pub(crate) pad0: [u8; 42],
    pub(crate) color_function: U16,
    pub(crate) alpha_function: U16,
    pub(crate) pad1: [u8; 36],
    pub(crate) map_u_scale: F32,
    pub(crate) map_v_scale: F32,
    pub(crate) map_u_offset: F32,
    pub(crate) map_v_offset: F32,
    pub(crate) map_rotation: F32,
    pub(crate) mipmap_bias: F32,
    pub(crate) map: TagReference,
    pub(crate) pad2: [u8; 40],
    pub(crate) animation: TextureAnimation,
}

impl ChicagoMap {
    /// Map flags.
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Color and alpha blend functions.
    pub fn functions(&self) -> (u16, u16) {
        (self.color_function.get(), self.alpha_function.get())
    }

    /// Texture coordinate scale.
    pub fn scale(&self) -> (f32, f32) {
        (self.map_u_scale.get(), self.map_v_scale.get())
    }

    /// Texture coordinate offset.
    pub fn offset(&self) -> (f32, f32) {
        (self.map_u_offset.get(), self.map_v_offset.get())
    }

    /// Bitmap sampled by the stage.
    pub fn map(&self) -> &TagReference {
        &self.map
    }

    /// Texture coordinate animation.
    pub fn animation(&self) -> &TextureAnimation {
        &self.animation
    }
}

/// One map of a generic transparent shader (100 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct GenericMap {
    pub(crate) flags: U16,
    pub(crate) pad0: [u8; 2],
    pub(crate) map_u_scale: F32,
    pub(crate) map_v_scale: F32,
    pub(crate) map_u_offset: F32,
    pub(crate) map_v_offset: F32,
    pub(crate) map_rotation: F32,
    pub(crate) mipmap_bias: F32,
    pub(crate) map: TagReference,
    pub(crate) animation: TextureAnimation,
}

impl GenericMap {
    /// Map flags.
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Texture coordinate scale.
    pub fn scale(&self) -> (f32, f32) {
        (self.map_u_scale.get(), self.map_v_scale.get())
    }

    /// Bitmap sampled by the map.
    pub fn map(&self) -> &TagReference {
        &self.map
    }

    /// Texture coordinate animation.
    pub fn animation(&self) -> &TextureAnimation {
        &self.animation
    }
}

/// Chicago transparent shader (`schi`, 108 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ShaderTransparentChicago {
    pub(crate) shader: Shader,
    pub(crate) layers: TransparentLayerHeader,
    pub(crate) maps: TagBlock,
    pub(crate) extra_flags: U32,
    pub(crate) pad0: [u8; 8],
}

impl TagLayout for ShaderTransparentChicago {
    const CLASS: TagClass = TagClass::SHADER_TRANSPARENT_CHICAGO;
}

impl ShaderTransparentChicago {
    /// Shared shader fields.
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// Transparent layer header.
    pub fn layers(&self) -> &TransparentLayerHeader {
        &self.layers
    }

    /// Map stages.
    pub fn maps<'a>(&self, map: &TagMap<'a>) -> Result<&'a [ChicagoMap]> {
        map.heap().read_array(&self.maps)
    }

    /// Extra flags.
    pub fn extra_flags(&self) -> u32 {
        self.extra_flags.get()
    }
}

/// Extended chicago transparent shader (`scex`, 120 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ShaderTransparentChicagoExtended {
    pub(crate) shader: Shader,
    pub(crate) layers: TransparentLayerHeader,
    pub(crate) maps_4_stage: TagBlock,
    pub(crate) maps_2_stage: TagBlock,
    pub(crate) extra_flags: U32,
    pub(crate) pad0: [u8; 8],
}

impl TagLayout for ShaderTransparentChicagoExtended {
    const CLASS: TagClass = TagClass::SHADER_TRANSPARENT_CHICAGO_EXTENDED;
}

impl ShaderTransparentChicagoExtended {
    /// Shared shader fields.
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// Transparent layer header.
    pub fn layers(&self) -> &TransparentLayerHeader {
        &self.layers
    }

    /// Map stages for four-stage hardware.
    pub fn maps_4_stage<'a>(&self, map: &TagMap<'a>) -> Result<&'a [ChicagoMap]> {
        map.heap().read_array(&self.maps_4_stage)
    }

    /// Map stages for two-stage hardware.
    pub fn maps_2_stage<'a>(&self, map: &TagMap<'a>) -> Result<&'a [ChicagoMap]> {
        map.heap().read_array(&self.maps_2_stage)
    }

    /// Extra flags.
    pub fn extra_flags(&self) -> u32 {
        self.extra_flags.get()
    }
}

/// Generic transparent shader (`sotr`, 108 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ShaderTransparentGeneric {
    pub(crate) shader: Shader,
    pub(crate) layers: TransparentLayerHeader,
    pub(crate) maps: TagBlock,
    pub(crate) stages: TagBlock,
}

impl TagLayout for ShaderTransparentGeneric {
    const CLASS: TagClass = TagClass::SHADER_TRANSPARENT_GENERIC;
}

impl ShaderTransparentGeneric {
    /// Shared shader fields.
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// Transparent layer header.
    pub fn layers(&self) -> &TransparentLayerHeader {
        &self.layers
    }

    /// Maps.
    pub fn maps<'a>(&self, map: &TagMap<'a>) -> Result<&'a [GenericMap]> {
        map.heap().read_array(&self.maps)
    }

    /// Number of combiner stages.
    pub fn stage_count(&self) -> u32 {
        self.stages.count()
    }
}

/// Water shader (`swat`, 320 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ShaderTransparentWater {
    pub(crate) shader: Shader,
    pub(crate) flags: U16,
    pub(crate) pad0: [u8; 34],
    pub(crate) base_map: TagReference,
    pub(crate) pad1: [u8; 16],
    pub(crate) perpendicular_brightness: F32,
    pub(crate) perpendicular_tint_color: ColorRgb,
    pub(crate) parallel_brightness: F32,
    pub(crate) parallel_tint_color: ColorRgb,
    pub(crate) pad2: [u8; 16],
    pub(crate) reflection_map: TagReference,
    pub(crate) pad3: [u8; 16],
    pub(crate) ripple_animation_angle: F32,
    pub(crate) ripple_animation_velocity: F32,
    pub(crate) ripple_scale: F32,
    pub(crate) ripple_maps: TagReference,
    pub(crate) ripple_mipmap_levels: U16,
    pub(crate) pad4: [u8; 2],
    pub(crate) ripple_mipmap_fade_factor: F32,
    pub(crate) ripple_mipmap_detail_bias: F32,
    pub(crate) pad5: [u8; 64],
    pub(crate) ripples: TagBlock,
    pub(crate) pad6: [u8; 16],
}

impl TagLayout for ShaderTransparentWater {
    const CLASS: TagClass = TagClass::SHADER_TRANSPARENT_WATER;
}

impl ShaderTransparentWater {
    /// Shared shader fields.
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// Water flags.
    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    /// Base map.
    pub fn base_map(&self) -> &TagReference {
        &self.base_map
    }

    /// Reflection map.
    pub fn reflection_map(&self) -> &TagReference {
        &self.reflection_map
    }

    /// Ripple maps.
    pub fn ripple_maps(&self) -> &TagReference {
        &self.ripple_maps
    }

    /// Ripple animation angle, velocity and scale.
    pub fn ripple_animation(&self) -> (f32, f32, f32) {
        (
            self.ripple_animation_angle.get(),
            self.ripple_animation_velocity.get(),
            self.ripple_scale.get(),
        )
    }

    /// Number of ripple mipmap levels.
    pub fn ripple_mipmap_levels(&self) -> u16 {
        self.ripple_mipmap_levels.get()
    }

    /// Ripple layers.
    pub fn ripples<'a>(&self, map: &TagMap<'a>) -> Result<&'a [WaterRipple]> {
        map.heap().read_array(&self.ripples)
    }
}

/// One ripple layer of a water shader (76 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct WaterRipple {
    pub(crate) pad0: [u8; 4],
    pub(crate) contribution_factor: F32,
    pub(crate) pad1: [u8; 32],
    pub(crate) animation_angle: F32,
    pub(crate) animation_velocity: F32,
    pub(crate) map_offset: Vector2,
    pub(crate) map_repeats: U16,
    pub(crate) map_index: U16,
    pub(crate) pad2: [u8; 16],
}

impl WaterRipple {
    /// Contribution of the layer.
    pub fn contribution_factor(&self) -> f32 {
        self.contribution_factor.get()
    }

    /// Animation angle and velocity.
    pub fn animation(&self) -> (f32, f32) {
        (self.animation_angle.get(), self.animation_velocity.get())
    }

    /// Map offset.
    pub fn map_offset(&self) -> &Vector2 {
        &self.map_offset
    }

    /// Map repeat count.
    pub fn map_repeats(&self) -> u16 {
        self.map_repeats.get()
    }

    /// Index into the ripple maps bitmap.
    pub fn map_index(&self) -> u16 {
        self.map_index.get()
    }
}

/// A shader tag viewed through the layout of its primary class.
///
/// Glass, meter and plasma shaders, and any unrecognised subclass, are
/// exposed through their shared prefix only.
#[derive(Debug, Clone, Copy)]
pub enum ShaderRef<'a> {
    /// `senv`
    Environment(&'a ShaderEnvironment),
    /// `soso`
    Model(&'a ShaderModel),
    /// `sotr`
    TransparentGeneric(&'a ShaderTransparentGeneric),
    /// `schi`
    TransparentChicago(&'a ShaderTransparentChicago),
    /// `scex`
    TransparentChicagoExtended(&'a ShaderTransparentChicagoExtended),
    /// `swat`
    TransparentWater(&'a ShaderTransparentWater),
    /// Any other shader subclass
    Other(TagClass, &'a Shader),
}

impl<'a> ShaderRef<'a> {
    /// Load a shader tag by identifier.
    pub fn load(map: &TagMap<'a>, tag_id: TagId) -> Result<Self> {
        let entry = map.lookup(tag_id).ok_or(MapError::TagNotFound(tag_id))?;
        let shader = match entry.primary_class() {
            TagClass::SHADER_ENVIRONMENT => Self::Environment(map.entry_body(entry)?),
            TagClass::SHADER_MODEL => Self::Model(map.entry_body(entry)?),
            TagClass::SHADER_TRANSPARENT_GENERIC => Self::TransparentGeneric(map.entry_body(entry)?),
            TagClass::SHADER_TRANSPARENT_CHICAGO => Self::TransparentChicago(map.entry_body(entry)?),
            TagClass::SHADER_TRANSPARENT_CHICAGO_EXTENDED => {
                Self::TransparentChicagoExtended(map.entry_body(entry)?)
            }
            TagClass::SHADER_TRANSPARENT_WATER => Self::TransparentWater(map.entry_body(entry)?),
            other => Self::Other(other, map.entry_body(entry)?),
        };
        Ok(shader)
    }

    /// Shared shader fields.
    pub fn shader(&self) -> &'a Shader {
        match *self {
            Self::Environment(s) => &s.shader,
            Self::Model(s) => &s.shader,
            Self::TransparentGeneric(s) => &s.shader,
            Self::TransparentChicago(s) => &s.shader,
            Self::TransparentChicagoExtended(s) => &s.shader,
            Self::TransparentWater(s) => &s.shader,
            Self::Other(_, s) => s,
        }
    }

    /// Class of the layout the shader was viewed through.
    pub fn class(&self) -> TagClass {
        match self {
            Self::Environment(_) => ShaderEnvironment::CLASS,
            Self::Model(_) => ShaderModel::CLASS,
            Self::TransparentGeneric(_) => ShaderTransparentGeneric::CLASS,
            Self::TransparentChicago(_) => ShaderTransparentChicago::CLASS,
            Self::TransparentChicagoExtended(_) => ShaderTransparentChicagoExtended::CLASS,
            Self::TransparentWater(_) => ShaderTransparentWater::CLASS,
            Self::Other(class, _) => *class,
        }
    }
}

const _: () = assert!(size_of::<Shader>() == 0x28);
const _: () = assert!(std::mem::offset_of!(Shader, emitted_light_color) == 0x08);
const _: () = assert!(std::mem::offset_of!(Shader, shader_type) == 0x24);

const _: () = assert!(size_of::<ShaderEnvironment>() == 0x344);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, lens_flare) == 0x30);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, diffuse_flags) == 0x6C);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, base_map) == 0x88);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, primary_detail_map) == 0xB8);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, secondary_detail_map) == 0xCC);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, micro_detail_map) == 0xFC);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, material_color) == 0x10C);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, bump_map) == 0x128);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, animation_illumination) == 0x150);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, reflection_flags) == 0x2F4);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, perpendicular_brightness) == 0x318);
const _: () = assert!(std::mem::offset_of!(ShaderEnvironment, reflection_cube_map) == 0x328);

const _: () = assert!(size_of::<ShaderModel>() == 0x1B8);
const _: () = assert!(std::mem::offset_of!(ShaderModel, translucency) == 0x38);
const _: () = assert!(std::mem::offset_of!(ShaderModel, color_source) == 0x7C);
const _: () = assert!(std::mem::offset_of!(ShaderModel, map_u_scale) == 0xA8);
const _: () = assert!(std::mem::offset_of!(ShaderModel, base_map) == 0xB0);
const _: () = assert!(std::mem::offset_of!(ShaderModel, multipurpose_map) == 0xC8);
const _: () = assert!(std::mem::offset_of!(ShaderModel, detail_map) == 0xE8);
const _: () = assert!(std::mem::offset_of!(ShaderModel, reflection_falloff_distance) == 0x160);
const _: () = assert!(std::mem::offset_of!(ShaderModel, reflection_cube_map) == 0x188);
const _: () = assert!(std::mem::offset_of!(ShaderModel, unknown) == 0x1A8);

const _: () = assert!(size_of::<TransparentLayerHeader>() == 44);
const _: () = assert!(size_of::<TextureAnimation>() == 56);
const _: () = assert!(size_of::<ChicagoMap>() == 220);
const _: () = assert!(std::mem::offset_of!(ChicagoMap, color_function) == 0x2C);
const _: () = assert!(std::mem::offset_of!(ChicagoMap, map_u_scale) == 0x54);
const _: () = assert!(std::mem::offset_of!(ChicagoMap, map) == 0x6C);
const _: () = assert!(std::mem::offset_of!(ChicagoMap, animation) == 0xA4);
const _: () = assert!(size_of::<GenericMap>() == 100);
const _: () = assert!(std::mem::offset_of!(GenericMap, map) == 0x1C);

const _: () = assert!(size_of::<ShaderTransparentChicago>() == 108);
const _: () = assert!(std::mem::offset_of!(ShaderTransparentChicago, maps) == 0x54);
const _: () = assert!(size_of::<ShaderTransparentChicagoExtended>() == 120);
const _: () = assert!(std::mem::offset_of!(ShaderTransparentChicagoExtended, maps_2_stage) == 0x60);
const _: () = assert!(size_of::<ShaderTransparentGeneric>() == 108);
const _: () = assert!(std::mem::offset_of!(ShaderTransparentGeneric, stages) == 0x60);

const _: () = assert!(size_of::<ShaderTransparentWater>() == 320);
const _: () = assert!(std::mem::offset_of!(ShaderTransparentWater, base_map) == 0x4C);
const _: () = assert!(std::mem::offset_of!(ShaderTransparentWater, reflection_map) == 0x9C);
const _: () = assert!(std::mem::offset_of!(ShaderTransparentWater, ripple_maps) == 0xC8);
const _: () = assert!(std::mem::offset_of!(ShaderTransparentWater, ripples) == 0x124);
const _: () = assert!(size_of::<WaterRipple>() == 76);
const _: () = assert!(std::mem::offset_of!(WaterRipple, map_index) == 0x3A);
