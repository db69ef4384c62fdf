//! Model -> screen transform stage
//!
//! Builds `P * R * T`, clips in homogeneous space, divides by w and maps
//! NDC onto the viewport.

use std::path::Path;

use tracing::{debug, info};

use super::clip::ClipEngine;
use super::math::{Mat4, Vec4};
use super::types::Vertex;
use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::assets::{self, LoadError};

/// Camera and projection state plus the model being drawn
#[derive(Debug, Clone)]
pub struct TransformEngine {
    clip_engine: ClipEngine,
    view_width: f64,
    view_height: f64,
    view_translation: Vec4,
    view_rotation: Vec4,
    fovy: f64,
    z_near: f64,
    z_far: f64,
    model_vertices: Vec<Vertex>,
    transformed_vertices: Vec<Vertex>,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformEngine {
    pub fn new() -> Self {
        Self {
            clip_engine: ClipEngine::new(),
            view_width: DEFAULT_WIDTH as f64,
            view_height: DEFAULT_HEIGHT as f64,
            view_translation: Vec4::ZERO,
            view_rotation: Vec4::ZERO,
            fovy: std::f64::consts::FRAC_PI_3,
            z_near: 0.1,
            z_far: 100.0,
            model_vertices: Vec::new(),
            transformed_vertices: Vec::new(),
        }
    }

    pub fn clip_engine(&self) -> &ClipEngine {
        &self.clip_engine
    }

    pub fn view_width(&self) -> f64 {
        self.view_width
    }

    pub fn view_height(&self) -> f64 {
        self.view_height
    }

    pub fn set_view_size(&mut self, width: f64, height: f64) {
        self.view_width = width;
        self.view_height = height;
    }

    pub fn view_translation(&self) -> Vec4 {
        self.view_translation
    }

    pub fn set_view_translation(&mut self, translation: Vec4) {
        self.view_translation = translation;
    }

    /// Euler angles in radians, packed as (x, y, z)
    pub fn view_rotation(&self) -> Vec4 {
        self.view_rotation
    }

    pub fn set_view_rotation(&mut self, rotation: Vec4) {
        self.view_rotation = rotation;
    }

    pub fn fovy(&self) -> f64 {
        self.fovy
    }

    pub fn z_near(&self) -> f64 {
        self.z_near
    }

    pub fn z_far(&self) -> f64 {
        self.z_far
    }

    /// No validation; callers clamp `fovy`
    pub fn set_perspective(&mut self, fovy: f64, z_near: f64, z_far: f64) {
        self.fovy = fovy;
        self.z_near = z_near;
        self.z_far = z_far;
    }

    pub fn model_vertices(&self) -> &[Vertex] {
        &self.model_vertices
    }

    /// Replace the model. The transformed list is cleared until the next `run`.
    pub fn load_model_from_vertex_array(&mut self, vertices: Vec<Vertex>) {
        self.model_vertices = vertices;
        self.transformed_vertices.clear();
    }

    pub fn load_model_from_str(&mut self, buffer: &str) -> Result<(), LoadError> {
        let vertices = assets::parse_model(buffer)?;
        info!(vertices = vertices.len(), triangles = vertices.len() / 3, "Loaded model");
        self.load_model_from_vertex_array(vertices);
        Ok(())
    }

    /// Load a model from a file. An empty path is a no-op.
    pub fn load_model_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        match assets::read_source(path.as_ref())? {
            Some(buffer) => self.load_model_from_str(&buffer),
            None => Ok(()),
        }
    }

    pub fn clear_model(&mut self) {
        self.model_vertices.clear();
        self.transformed_vertices.clear();
    }

    /// Composite model -> clip matrix `P * R * T`
    pub fn transform_matrix(&self) -> Mat4 {
        let r = self.view_rotation;
        let t = self.view_translation;
        Mat4::perspective(self.fovy, self.z_near, self.z_far, self.view_width / self.view_height)
            * Mat4::rotation(r.x, r.y, r.z)
            * Mat4::translation(t.x, t.y, t.z)
    }

    /// Recompute the screen-space triangle list from the model.
    ///
    /// Screen x, y are pixel coordinates (`(1 + ndc) * size / 2`); screen z
    /// is `(1 + ndc_z) / 2`, which puts the near plane at 1 and the far plane
    /// at 0. Larger z is nearer.
    pub fn run(&mut self) {
        self.transformed_vertices.clear();

        if self.model_vertices.is_empty() {
            return;
        }

        let matrix = self.transform_matrix();

        // Visible points come out with w = -z < 0. Negating keeps the same
        // projective point but puts it in the w > 0 half the clipper expects.
        let mut vertices: Vec<Vertex> = self
            .model_vertices
            .iter()
            .map(|v| Vertex {
                position: -(matrix * v.origin),
                ..*v
            })
            .collect();

        let before = vertices.len() / 3;
        vertices = self.clip_engine.clip_triangles(&vertices);
        debug!(before, after = vertices.len() / 3, "Clipped triangles");

        let (half_w, half_h) = (self.view_width / 2.0, self.view_height / 2.0);
        for v in &mut vertices {
            let ndc = v.position.scale(1.0 / v.position.w);
            v.position = Vec4::new(
                (1.0 + ndc.x) * half_w,
                (1.0 + ndc.y) * half_h,
                (1.0 + ndc.z) / 2.0,
                ndc.w,
            );
        }

        self.transformed_vertices = vertices;
    }

    pub fn transformed_vertices(&self) -> &[Vertex] {
        &self.transformed_vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn engine_looking_at_origin() -> TransformEngine {
        let mut engine = TransformEngine::new();
        engine.set_view_size(64.0, 64.0);
        engine.set_view_translation(Vec4::direction(0.0, 0.0, 5.0));
        engine
    }

    #[test]
    fn test_empty_model_runs() {
        let mut engine = TransformEngine::new();
        engine.run();
        assert!(engine.transformed_vertices().is_empty());
    }

    #[test]
    fn test_centered_point_maps_to_view_center() {
        let mut engine = engine_looking_at_origin();
        engine.load_model_from_vertex_array(vec![
            Vertex::from_pos(0.0, 0.0, 0.0),
            Vertex::from_pos(0.1, 0.0, 0.0),
            Vertex::from_pos(0.0, 0.1, 0.0),
        ]);
        engine.run();

        let out = engine.transformed_vertices();
        assert_eq!(out.len(), 3);
        let center = out.iter().find(|v| v.origin == Vec4::point(0.0, 0.0, 0.0)).unwrap();
        assert!((center.position.x - 32.0).abs() < EPS);
        assert!((center.position.y - 32.0).abs() < EPS);
        assert!((center.position.w - 1.0).abs() < EPS);
        assert!(center.position.z > 0.0 && center.position.z < 1.0);

        // Model +y lands above the center on screen, model +x to the left
        let up = out.iter().find(|v| v.origin == Vec4::point(0.0, 0.1, 0.0)).unwrap();
        assert!(up.position.y < 32.0);
        let right = out.iter().find(|v| v.origin == Vec4::point(0.1, 0.0, 0.0)).unwrap();
        assert!(right.position.x < 32.0);
    }

    #[test]
    fn test_nearer_surface_has_larger_screen_z() {
        let mut engine = engine_looking_at_origin();
        let tri = |z: f64| {
            vec![
                Vertex::from_pos(-0.1, 0.0, z),
                Vertex::from_pos(0.1, 0.0, z),
                Vertex::from_pos(0.0, 0.1, z),
            ]
        };
        // The camera sits at model z = -5 looking toward +z, so z = -1 is nearer
        let mut vertices = tri(1.0);
        vertices.extend(tri(-1.0));
        engine.load_model_from_vertex_array(vertices);
        engine.run();

        let out = engine.transformed_vertices();
        assert_eq!(out.len(), 6);
        let near_z = out.iter().find(|v| v.origin.z == -1.0).unwrap().position.z;
        let far_z = out.iter().find(|v| v.origin.z == 1.0).unwrap().position.z;
        assert!(near_z > far_z);
    }

    #[test]
    fn test_geometry_behind_camera_is_clipped() {
        let mut engine = engine_looking_at_origin();
        engine.load_model_from_vertex_array(vec![
            Vertex::from_pos(0.0, 0.0, -10.0),
            Vertex::from_pos(0.1, 0.0, -10.0),
            Vertex::from_pos(0.0, 0.1, -10.0),
        ]);
        engine.run();
        assert!(engine.transformed_vertices().is_empty());
    }

    #[test]
    fn test_partially_visible_triangle_stays_in_viewport() {
        let mut engine = engine_looking_at_origin();
        engine.load_model_from_vertex_array(vec![
            Vertex::from_pos(0.0, 0.0, 0.0),
            Vertex::from_pos(50.0, 0.0, 0.0),
            Vertex::from_pos(0.0, 1.0, 0.0),
        ]);
        engine.run();

        let out = engine.transformed_vertices();
        assert!(out.len() >= 3);
        for v in out {
            assert!(v.position.x >= -EPS && v.position.x <= 64.0 + EPS);
            assert!(v.position.y >= -EPS && v.position.y <= 64.0 + EPS);
            assert!(v.position.z >= -EPS && v.position.z <= 1.0 + EPS);
        }
    }

    #[test]
    fn test_load_model_from_file_empty_path_keeps_model() {
        let mut engine = TransformEngine::new();
        engine.load_model_from_str("0 0 0\n1 0 0\n0 1 0\n").unwrap();
        engine.load_model_from_file("").unwrap();
        assert_eq!(engine.model_vertices().len(), 3);
        assert!(engine.load_model_from_file("/no/such/model.txt").is_err());
        assert_eq!(engine.model_vertices().len(), 3);
    }

    #[test]
    fn test_failed_model_parse_keeps_model() {
        let mut engine = TransformEngine::new();
        engine.load_model_from_str("0 0 0\n2 0 0\n0 2 0\n").unwrap();
        let before = engine.model_vertices().to_vec();

        assert!(engine.load_model_from_str("0 0 0\n1 x 0\n").is_err());
        assert_eq!(engine.model_vertices(), before.as_slice());
    }
}
