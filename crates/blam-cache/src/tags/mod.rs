//! Typed tag layouts
//!
//! Each supported tag class has one fixed `#[repr(C)]` layout whose size and
//! field offsets are asserted at compile time. Layouts are viewed in place
//! through [`TagMap::get_tag`](crate::TagMap::get_tag); nested arrays are
//! resolved on access against the virtual base that owns them:
//!
//! | Owner                  | Base                                   |
//! |------------------------|----------------------------------------|
//! | Tag heap bodies        | [`TagMap::heap`](crate::TagMap::heap)  |
//! | Structure BSP content  | [`bsp::BspRegion`] private base        |

pub mod bitmap;
pub mod bsp;
pub mod globals;
pub mod scenario;
pub mod shader;

use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::primitives::TagClass;

/// A fixed tag body layout and the class it belongs to.
pub trait TagLayout: FromBytes + KnownLayout + Immutable + Unaligned {
    /// Class an entry must be (or derive from) to be viewed as this layout
    const CLASS: TagClass;
}
