//! Dependency-ordered tag visitors for Blam cache maps
//!
//! A consumer that builds runtime resources from a map (textures before
//! shaders, shaders before level geometry) registers one [`TagVisitor`] per
//! tag class, each naming the classes it depends on. [`TagDispatcher`]
//! orders the batch so every visitor runs after the visitors of its
//! dependencies, partitions the directory by primary class once, and runs
//! each visitor's `begin`/`visit`/`end` callbacks strictly one visitor at a
//! time.
//!
//! ```no_run
//! use blam_cache::{MapFile, TagClass};
//! use blam_visitor::{FnVisitor, TagDispatcher};
//!
//! let file = MapFile::open("maps/bloodgulch.map")?;
//! let map = file.directory()?;
//!
//! let mut dispatcher = TagDispatcher::new();
//! dispatcher.register(
//!     FnVisitor::new(TagClass::SHADER_ENVIRONMENT, |_map, shaders| {
//!         println!("{} environment shaders", shaders.len());
//!         Ok(())
//!     })
//!     .depends_on(TagClass::BITMAP),
//! )?;
//! dispatcher.register(FnVisitor::new(TagClass::BITMAP, |_map, bitmaps| {
//!     println!("{} bitmaps", bitmaps.len());
//!     Ok(())
//! }))?;
//! // Bitmaps run first
//! dispatcher.run(&map)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

mod dispatcher;
pub mod error;
mod visitor;

pub use dispatcher::TagDispatcher;
pub use error::{DispatchError, Result, VisitError, VisitPhase, VisitResult};
pub use visitor::{FnVisitor, TagVisitor};
