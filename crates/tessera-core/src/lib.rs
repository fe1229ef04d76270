//! Tessera Core - Foundational types for the Tessera scene editor
//!
//! This crate provides the types every other Tessera crate depends on:
//! - `SceneId` - 128-bit node identifiers with a null sentinel
//! - `AlignedBox`, `Color`, `Shear` - Spatial and display types
//! - `PivotComponents` and the pivot-aware compose/decompose math
//! - Error types and Result alias

mod error;
mod id;
pub mod math;
mod types;

pub use error::{Result, TesseraError};
pub use id::SceneId;
pub use math::PivotComponents;
pub use types::{AlignedBox, Color, Shear};
