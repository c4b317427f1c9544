//! Vector, color and bounds records

use zerocopy::little_endian::{F32, I16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Two 32-bit floats
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Vector2 {
    pub(crate) x: F32,
    pub(crate) y: F32,
}

impl Vector2 {
    /// Create a vector.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: F32::new(x),
            y: F32::new(y),
        }
    }

    /// Components as an array.
    pub fn to_array(&self) -> [f32; 2] {
        [self.x.get(), self.y.get()]
    }
}

/// Three 32-bit floats
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Vector3 {
    pub(crate) x: F32,
    pub(crate) y: F32,
    pub(crate) z: F32,
}

impl Vector3 {
    /// Create a vector.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: F32::new(x),
            y: F32::new(y),
            z: F32::new(z),
        }
    }

    /// X component.
    pub fn x(&self) -> f32 {
        self.x.get()
    }

    /// Y component.
    pub fn y(&self) -> f32 {
        self.y.get()
    }

    /// Z component.
    pub fn z(&self) -> f32 {
        self.z.get()
    }

    /// Components as an array.
    pub fn to_array(&self) -> [f32; 3] {
        [self.x.get(), self.y.get(), self.z.get()]
    }
}

/// Two signed 16-bit integers (e.g. a registration point)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Point2 {
    pub(crate) x: I16,
    pub(crate) y: I16,
}

impl Point2 {
    /// Components as an array.
    pub fn to_array(&self) -> [i16; 2] {
        [self.x.get(), self.y.get()]
    }
}

/// Red, green, blue as floats in `0.0..=1.0`
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ColorRgb {
    pub(crate) r: F32,
    pub(crate) g: F32,
    pub(crate) b: F32,
}

impl ColorRgb {
    /// Create a color.
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: F32::new(r),
            g: F32::new(g),
            b: F32::new(b),
        }
    }

    /// Components as an array.
    pub fn to_array(&self) -> [f32; 3] {
        [self.r.get(), self.g.get(), self.b.get()]
    }
}

/// Alpha, red, green, blue as floats in `0.0..=1.0`
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ColorArgb {
    pub(crate) a: F32,
    pub(crate) r: F32,
    pub(crate) g: F32,
    pub(crate) b: F32,
}

impl ColorArgb {
    /// Components as `[a, r, g, b]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.a.get(), self.r.get(), self.g.get(), self.b.get()]
    }
}

/// Plane as normal plus distance
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Plane3 {
    pub(crate) normal: Vector3,
    pub(crate) distance: F32,
}

impl Plane3 {
    /// Plane normal.
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from the origin.
    pub fn distance(&self) -> f32 {
        self.distance.get()
    }
}

/// Lower and upper float bound
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Bounds {
    pub(crate) lower: F32,
    pub(crate) upper: F32,
}

impl Bounds {
    /// Create a bound.
    pub fn new(lower: f32, upper: f32) -> Self {
        Self {
            lower: F32::new(lower),
            upper: F32::new(upper),
        }
    }

    /// Lower bound.
    pub fn lower(&self) -> f32 {
        self.lower.get()
    }

    /// Upper bound.
    pub fn upper(&self) -> f32 {
        self.upper.get()
    }

    /// Whether `value` lies within the bound (inclusive).
    pub fn contains(&self, value: f32) -> bool {
        value >= self.lower.get() && value <= self.upper.get()
    }
}

/// Axis-aligned box as three per-axis bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Bounds3 {
    pub(crate) x: Bounds,
    pub(crate) y: Bounds,
    pub(crate) z: Bounds,
}

impl Bounds3 {
    /// Create a box.
    pub fn new(x: Bounds, y: Bounds, z: Bounds) -> Self {
        Self { x, y, z }
    }

    /// Per-axis bounds as `[x, y, z]`.
    pub fn axes(&self) -> [Bounds; 3] {
        [self.x, self.y, self.z]
    }

    /// Whether the point lies inside the box.
    pub fn contains(&self, point: &Vector3) -> bool {
        self.x.contains(point.x()) && self.y.contains(point.y()) && self.z.contains(point.z())
    }
}

const _: () = assert!(size_of::<Vector2>() == 8);
const _: () = assert!(size_of::<Vector3>() == 12);
const _: () = assert!(size_of::<Point2>() == 4);
const _: () = assert!(size_of::<ColorRgb>() == 12);
const _: () = assert!(size_of::<ColorArgb>() == 16);
const _: () = assert!(size_of::<Plane3>() == 16);
const _: () = assert!(size_of::<Bounds>() == 8);
const _: () = assert!(size_of::<Bounds3>() == 24);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds3_contains() {
        let bounds = Bounds3::new(
            Bounds::new(-10.0, 10.0),
            Bounds::new(0.0, 5.0),
            Bounds::new(-1.0, 1.0),
        );
        assert!(bounds.contains(&Vector3::new(0.0, 2.5, 0.0)));
        assert!(bounds.contains(&Vector3::new(10.0, 5.0, -1.0)));
        assert!(!bounds.contains(&Vector3::new(0.0, 6.0, 0.0)));
    }

    #[test]
    fn test_vector_little_endian_bytes() {
        let v = Vector3::new(1.0, -2.0, 0.5);
        assert_eq!(&v.as_bytes()[0..4], &1.0f32.to_le_bytes());
        assert_eq!(v.to_array(), [1.0, -2.0, 0.5]);
    }
}
