//! CPU software rendering pipeline
//!
//! Stages, in frame order:
//! - Transform: model -> clip space with `P * R * T`
//! - Clip: homogeneous frustum clipping with re-triangulation
//! - Transform: perspective divide and viewport mapping
//! - Render: scanline fill, nearest-surface selection, Gouraud shading
//!   with per-vertex Phong lighting

mod math;
mod types;
mod clip;
mod light;
mod transform;
mod render;

pub use math::*;
pub use types::*;
pub use clip::*;
pub use light::*;
pub use transform::*;
pub use render::*;

/// Default view size in pixels
pub const DEFAULT_WIDTH: usize = 512;
pub const DEFAULT_HEIGHT: usize = 512;
