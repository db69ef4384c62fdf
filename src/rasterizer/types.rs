//! Core types for the rasterizer

use super::math::Vec4;

/// A vertex flowing through the pipeline.
///
/// `origin` and `normal` stay in model space for lighting; only `position`
/// is rewritten stage by stage (model -> clip -> NDC -> screen).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub origin: Vec4,
    pub position: Vec4,
    pub color: Vec4,
    pub normal: Vec4,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            origin: Vec4::point(0.0, 0.0, 0.0),
            position: Vec4::point(0.0, 0.0, 0.0),
            color: Vec4::WHITE,
            normal: Vec4::ZERO,
        }
    }
}

impl Vertex {
    /// Model-space vertex; `position` starts equal to `origin`
    pub fn new(origin: Vec4, color: Vec4, normal: Vec4) -> Self {
        Self {
            origin,
            position: origin,
            color,
            normal,
        }
    }

    pub fn from_pos(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vec4::point(x, y, z), Vec4::WHITE, Vec4::ZERO)
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_normal(mut self, normal: Vec4) -> Self {
        self.normal = normal;
        self
    }

    /// Interpolate every attribute with the same parameter
    pub fn lerp(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            origin: self.origin.lerp(other.origin, t),
            position: self.position.lerp(other.position, t),
            color: self.color.lerp(other.color, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

/// Point or ambient light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    /// Model-space position (w = 0)
    pub position: Vec4,
    pub intensity: f64,
    pub color: Vec4,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            position: Vec4::ZERO,
            intensity: 1.0,
            color: Vec4::WHITE,
        }
    }
}

impl LightSource {
    pub fn new(position: Vec4, intensity: f64, color: Vec4) -> Self {
        Self {
            position: position.with_w(0.0),
            intensity,
            color,
        }
    }
}

/// Surface reflection coefficients.
///
/// Build with [`Material::new`] so the coefficients are clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Per-channel, clamped to [0, 1]
    pub ambient_reflection: Vec4,
    /// Per-channel, clamped to >= 0
    pub diffuse_reflection: Vec4,
    /// Per-channel, clamped to >= 0
    pub specular_reflection: Vec4,
    /// Specular exponent, >= 0
    pub shininess: f64,
    /// Distance attenuation offset, >= 0
    pub suppression: f64,
}

impl Default for Material {
    /// Full ambient reflection and no diffuse or specular response, so an
    /// unlit render shows the albedo colors unchanged.
    fn default() -> Self {
        Self::new(
            Vec4::WHITE,
            Vec4::BLACK,
            Vec4::BLACK,
            1.0,
            1.0,
        )
    }
}

impl Material {
    pub fn new(
        ambient_reflection: Vec4,
        diffuse_reflection: Vec4,
        specular_reflection: Vec4,
        shininess: f64,
        suppression: f64,
    ) -> Self {
        Self {
            ambient_reflection: ambient_reflection.map(|c| c.clamp(0.0, 1.0)),
            diffuse_reflection: diffuse_reflection.map(|c| c.max(0.0)),
            specular_reflection: specular_reflection.map(|c| c.max(0.0)),
            shininess: shininess.max(0.0),
            suppression: suppression.max(0.0),
        }
    }
}

/// Dense RGBA pixel buffer, row-major, origin at the top-left
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub pixels: Vec<Vec4>,
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![Vec4::BLACK; width * height],
            width,
            height,
        }
    }

    /// Reallocate if the size changed, then fill with `color`
    pub fn resize(&mut self, width: usize, height: usize, color: Vec4) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, color);
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Vec4 {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Vec4::BLACK
        }
    }

    /// Convert to 8-bit RGBA, 4 bytes per pixel
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            bytes.extend_from_slice(&to_bytes(*p));
        }
        bytes
    }
}

/// Map a [0, 1] color to bytes, clamping out-of-range channels
pub fn to_bytes(color: Vec4) -> [u8; 4] {
    let c = color.map(|v| (v.clamp(0.0, 1.0) * 255.0).round());
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}
