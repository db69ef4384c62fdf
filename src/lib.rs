//! Scanline Engine: CPU-only 3D software renderer
//!
//! Turns a model-space triangle list into a shaded RGBA pixel buffer:
//! - Perspective transform with homogeneous frustum clipping
//! - Scanline rasterization with per-pixel nearest-surface selection
//! - Phong-style per-vertex lighting, interpolated across each triangle

pub mod app;
pub mod assets;
pub mod config;
pub mod rasterizer;

pub use assets::LoadError;
pub use config::RenderConfig;
