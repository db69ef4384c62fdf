//! Homogeneous vector and matrix math for the transform pipeline

use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 4-component homogeneous vector.
///
/// Used for positions (w = 1), directions and normals (w = 0) and RGBA colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
    pub const WHITE: Vec4 = Vec4 { x: 1.0, y: 1.0, z: 1.0, w: 1.0 };
    pub const BLACK: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Position with w = 1
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    /// Direction with w = 0
    pub fn direction(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, w: 0.0 }
    }

    /// Opaque color
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { x: r, y: g, z: b, w: 1.0 }
    }

    /// Length over all four components
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(self) -> Vec4 {
        let l = self.length();
        if l == 0.0 {
            return self;
        }
        self.scale(1.0 / l)
    }

    /// Dot product over x, y and z only
    pub fn dot3(self, other: Vec4) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean distance over x, y and z
    pub fn distance3(self, other: Vec4) -> f64 {
        let d = self - other;
        d.dot3(d).sqrt()
    }

    /// Copy with the w component replaced
    pub fn with_w(self, w: f64) -> Vec4 {
        Vec4 { w, ..self }
    }

    pub fn scale(self, s: f64) -> Vec4 {
        Vec4 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
            w: self.w * s,
        }
    }

    /// Componentwise product
    pub fn mul_elem(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
            w: self.w * other.w,
        }
    }

    /// Linear interpolation, `t = 0` yields `self`
    pub fn lerp(self, other: Vec4, t: f64) -> Vec4 {
        self + (other - self) * t
    }

    /// Apply `f` to each component
    pub fn map(self, f: impl Fn(f64) -> f64) -> Vec4 {
        Vec4 {
            x: f(self.x),
            y: f(self.y),
            z: f(self.z),
            w: f(self.w),
        }
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w,
        }
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, other: Vec4) -> Vec4 {
        Vec4 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w,
        }
    }
}

impl Mul<f64> for Vec4 {
    type Output = Vec4;
    fn mul(self, s: f64) -> Vec4 {
        self.scale(s)
    }
}

impl Neg for Vec4 {
    type Output = Vec4;
    fn neg(self) -> Vec4 {
        self.scale(-1.0)
    }
}

impl Index<usize> for Vec4 {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Vec4 index out of range: {}", i),
        }
    }
}

impl IndexMut<usize> for Vec4 {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            3 => &mut self.w,
            _ => panic!("Vec4 index out of range: {}", i),
        }
    }
}

/// 4x4 matrix, row-major. `a * b` applies `b` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f64; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Mat4 {
    pub const ZERO: Mat4 = Mat4 { m: [[0.0; 4]; 4] };

    pub fn identity() -> Self {
        let mut m = Self::ZERO;
        for i in 0..4 {
            m.m[i][i] = 1.0;
        }
        m
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.m[row][col] = value;
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        let mut m = Self::identity();
        m.set(0, 3, x);
        m.set(1, 3, y);
        m.set(2, 3, z);
        m
    }

    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::identity();
        m.set(1, 1, c);
        m.set(1, 2, -s);
        m.set(2, 1, s);
        m.set(2, 2, c);
        m
    }

    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::identity();
        m.set(0, 0, c);
        m.set(0, 2, s);
        m.set(2, 0, -s);
        m.set(2, 2, c);
        m
    }

    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Self::identity();
        m.set(0, 0, c);
        m.set(0, 1, -s);
        m.set(1, 0, s);
        m.set(1, 1, c);
        m
    }

    /// Rz * Ry * Rx: the X rotation is applied to the vector first
    pub fn rotation(angle_x: f64, angle_y: f64, angle_z: f64) -> Self {
        Self::rotation_z(angle_z) * Self::rotation_y(angle_y) * Self::rotation_x(angle_x)
    }

    /// Perspective projection with `w = -z`.
    ///
    /// Eye-space depth `z_near` maps to NDC z = 1 and `z_far` to NDC z = -1.
    pub fn perspective(fovy: f64, z_near: f64, z_far: f64, aspect: f64) -> Self {
        let f = 1.0 / (fovy / 2.0).tan();
        let mut m = Self::ZERO;
        m.set(0, 0, f / aspect);
        m.set(1, 1, f);
        m.set(2, 2, (z_far + z_near) / (z_far - z_near));
        m.set(2, 3, (2.0 * z_far * z_near) / (z_near - z_far));
        m.set(3, 2, -1.0);
        m
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut result = Mat4::ZERO;
        for i in 0..4 {
            for j in 0..4 {
                result.m[i][j] = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        result
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        let mut result = Vec4::ZERO;
        for i in 0..4 {
            result[i] = (0..4).map(|j| self.m[i][j] * v[j]).sum();
        }
        result
    }
}
