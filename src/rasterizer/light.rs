//! Per-point Phong-style lighting

use std::path::Path;

use tracing::info;

use super::math::Vec4;
use super::types::{LightSource, Material};
use crate::assets::{self, LoadError};

/// Evaluates lighting for model-space points.
///
/// Holds the material, the ambient light, the point lights and the viewer
/// position. Loading replaces state wholesale.
#[derive(Debug, Clone)]
pub struct LightEngine {
    view_translation: Vec4,
    material: Material,
    ambient_light: LightSource,
    light_sources: Vec<LightSource>,
}

impl Default for LightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LightEngine {
    pub fn new() -> Self {
        Self {
            view_translation: Vec4::ZERO,
            material: Material::default(),
            ambient_light: LightSource::default(),
            light_sources: Vec::new(),
        }
    }

    pub fn view_translation(&self) -> Vec4 {
        self.view_translation
    }

    /// Viewer position used for the specular term
    pub fn set_view_translation(&mut self, view_translation: Vec4) {
        self.view_translation = view_translation;
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn ambient_light(&self) -> &LightSource {
        &self.ambient_light
    }

    pub fn light_sources(&self) -> &[LightSource] {
        &self.light_sources
    }

    /// Replace the ambient light and all point lights
    pub fn load_light_sources_from_array(&mut self, light_sources: Vec<LightSource>, ambient_light: LightSource) {
        self.light_sources = light_sources;
        self.ambient_light = ambient_light;
    }

    /// Parse a light sources buffer. An empty buffer keeps the current lights.
    pub fn load_light_sources_from_str(&mut self, buffer: &str) -> Result<(), LoadError> {
        if let Some((ambient, lights)) = assets::parse_light_sources(buffer)? {
            info!(point_lights = lights.len(), "Loaded light sources");
            self.load_light_sources_from_array(lights, ambient);
        }
        Ok(())
    }

    /// Load light sources from a file. An empty path is a no-op.
    pub fn load_light_sources_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        match assets::read_source(path.as_ref())? {
            Some(buffer) => self.load_light_sources_from_str(&buffer),
            None => Ok(()),
        }
    }

    /// Replace the material. Coefficients are clamped by [`Material::new`].
    pub fn load_material_from_values(&mut self, material: Material) {
        self.material = Material::new(
            material.ambient_reflection,
            material.diffuse_reflection,
            material.specular_reflection,
            material.shininess,
            material.suppression,
        );
    }

    pub fn load_material_from_str(&mut self, buffer: &str) -> Result<(), LoadError> {
        let material = assets::parse_material(buffer)?;
        info!(?material, "Loaded material");
        self.load_material_from_values(material);
        Ok(())
    }

    /// Load a material from a file. An empty path is a no-op.
    pub fn load_material_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        match assets::read_source(path.as_ref())? {
            Some(buffer) => self.load_material_from_str(&buffer),
            None => Ok(()),
        }
    }

    /// Light reaching the viewer from a model-space point with the given normal
    pub fn get_light(&self, position: Vec4, normal: Vec4) -> Vec4 {
        let m = &self.material;
        let ambient = &self.ambient_light;
        let mut light = m
            .ambient_reflection
            .mul_elem(ambient.color)
            .scale(ambient.intensity);

        let normal = normal.with_w(0.0).normalize();
        // Ambient only, unclamped
        if normal.length() == 0.0 {
            return light;
        }

        let position = position.with_w(0.0);
        let viewer_direction = (self.view_translation.with_w(0.0) - position).normalize();

        for source in &self.light_sources {
            let light_direction = (source.position.with_w(0.0) - position).normalize();
            // Elementwise mirror about the normal: l - 2 l n n per axis
            let reflection_direction = Vec4::direction(
                light_direction.x - 2.0 * light_direction.x * normal.x * normal.x,
                light_direction.y - 2.0 * light_direction.y * normal.y * normal.y,
                light_direction.z - 2.0 * light_direction.z * normal.z * normal.z,
            )
            .normalize();

            let distance = position.distance3(source.position);
            let attenuation = 1.0 / (m.suppression + distance);
            let strength = source.intensity * attenuation;

            let cos_diffuse = normal.dot3(light_direction);
            if cos_diffuse > 0.0 {
                light = light + m.diffuse_reflection.mul_elem(source.color).scale(strength * cos_diffuse);
            }

            let cos_specular = reflection_direction.dot3(viewer_direction);
            if cos_specular > 0.0 {
                light = light + m.specular_reflection.scale(strength * cos_specular.powf(m.shininess));
            }
        }

        light.map(|c| c.min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn unlit_engine(material: Material) -> LightEngine {
        let mut engine = LightEngine::new();
        engine.load_material_from_values(material);
        engine
    }

    #[test]
    fn test_defaults_return_full_ambient() {
        let engine = LightEngine::new();
        let light = engine.get_light(Vec4::point(1.0, 2.0, 3.0), Vec4::direction(0.0, 1.0, 0.0));
        assert_eq!(light, Vec4::WHITE);
    }

    #[test]
    fn test_zero_normal_returns_ambient_only() {
        let mut engine = unlit_engine(Material::new(
            Vec4::new(0.5, 0.25, 1.0, 1.0),
            Vec4::WHITE,
            Vec4::WHITE,
            1.0,
            0.0,
        ));
        engine.load_light_sources_from_array(
            vec![LightSource::new(Vec4::direction(0.0, 1.0, 0.0), 5.0, Vec4::WHITE)],
            LightSource::new(Vec4::ZERO, 0.5, Vec4::WHITE),
        );
        let light = engine.get_light(Vec4::point(0.0, 0.0, 0.0), Vec4::ZERO);
        assert!((light - Vec4::new(0.25, 0.125, 0.5, 0.5)).length() < EPS);
    }

    #[test]
    fn test_zero_normal_ambient_is_not_clamped() {
        let mut engine = LightEngine::new();
        engine.load_light_sources_from_array(Vec::new(), LightSource::new(Vec4::ZERO, 2.0, Vec4::WHITE));
        let light = engine.get_light(Vec4::point(0.0, 0.0, 0.0), Vec4::ZERO);
        assert_eq!(light, Vec4::new(2.0, 2.0, 2.0, 2.0));

        // The lit path still clamps
        let light = engine.get_light(Vec4::point(0.0, 0.0, 0.0), Vec4::direction(0.0, 1.0, 0.0));
        assert_eq!(light, Vec4::WHITE);
    }

    #[test]
    fn test_diffuse_light_directly_above() {
        let mut engine = unlit_engine(Material::new(Vec4::WHITE, Vec4::WHITE, Vec4::BLACK, 1.0, 0.0));
        engine.load_light_sources_from_array(
            vec![LightSource::new(Vec4::direction(0.0, 2.0, 0.0), 1.0, Vec4::new(0.8, 0.4, 0.2, 1.0))],
            LightSource::new(Vec4::ZERO, 0.0, Vec4::WHITE),
        );
        engine.set_view_translation(Vec4::direction(0.0, 2.0, 0.0));

        let light = engine.get_light(Vec4::point(0.0, 0.0, 0.0), Vec4::direction(0.0, 1.0, 0.0));
        // intensity * (1 / d) * diffuse * cos * color with d = 2, cos = 1
        assert!((light - Vec4::new(0.4, 0.2, 0.1, 0.5)).length() < EPS);
    }

    #[test]
    fn test_light_behind_surface_adds_nothing() {
        let mut engine = unlit_engine(Material::new(Vec4::WHITE, Vec4::WHITE, Vec4::BLACK, 1.0, 1.0));
        engine.load_light_sources_from_array(
            vec![LightSource::new(Vec4::direction(0.0, -3.0, 0.0), 10.0, Vec4::WHITE)],
            LightSource::new(Vec4::ZERO, 0.0, Vec4::WHITE),
        );
        let light = engine.get_light(Vec4::point(0.0, 0.0, 0.0), Vec4::direction(0.0, 1.0, 0.0));
        assert_eq!(light, Vec4::ZERO);
    }

    #[test]
    fn test_specular_uses_elementwise_reflection() {
        let mut engine = unlit_engine(Material::new(Vec4::BLACK, Vec4::ZERO, Vec4::WHITE, 2.0, 0.0));
        // Light and viewer both up the diagonal (1,1,0) from the origin, normal +y
        engine.load_light_sources_from_array(
            vec![LightSource::new(Vec4::direction(1.0, 1.0, 0.0), 1.0, Vec4::WHITE)],
            LightSource::new(Vec4::ZERO, 0.0, Vec4::WHITE),
        );
        engine.set_view_translation(Vec4::direction(-1.0, 1.0, 0.0));

        let light = engine.get_light(Vec4::point(0.0, 0.0, 0.0), Vec4::direction(0.0, 2.0, 0.0));
        // l = (1,1)/sqrt2, r = (l.x, -l.y) normalized = (1,-1)/sqrt2,
        // v = (-1,1)/sqrt2 so r.v = -1 and no specular is added
        assert_eq!(light.x, 0.0);

        engine.set_view_translation(Vec4::direction(1.0, -1.0, 0.0));
        let light = engine.get_light(Vec4::point(0.0, 0.0, 0.0), Vec4::direction(0.0, 2.0, 0.0));
        // r.v = 1, attenuation = 1 / sqrt2
        let expected = 1.0 / 2.0_f64.sqrt();
        assert!((light.x - expected).abs() < EPS);
        assert!((light.w - expected).abs() < EPS);
    }

    #[test]
    fn test_channels_clamped_to_one() {
        let mut engine = unlit_engine(Material::new(Vec4::WHITE, Vec4::WHITE, Vec4::BLACK, 1.0, 0.0));
        engine.load_light_sources_from_array(
            vec![LightSource::new(Vec4::direction(0.0, 1.0, 0.0), 100.0, Vec4::WHITE)],
            LightSource::new(Vec4::ZERO, 3.0, Vec4::WHITE),
        );
        let light = engine.get_light(Vec4::point(0.0, 0.0, 0.0), Vec4::direction(0.0, 1.0, 0.0));
        assert_eq!(light, Vec4::WHITE);
    }

    #[test]
    fn test_failed_material_load_keeps_previous() {
        let mut engine = LightEngine::new();
        let before = *engine.material();
        assert!(engine.load_material_from_str("1 1 1\n0.5 0.5 0.5\n").is_err());
        assert_eq!(*engine.material(), before);
    }

    fn engine_with_one_light() -> LightEngine {
        let mut engine = LightEngine::new();
        engine.load_light_sources_from_str("0.3 0 0 0 1 0 0\n2 0 5 0\n").unwrap();
        engine
    }

    #[test]
    fn test_failed_light_load_keeps_previous() {
        let mut engine = engine_with_one_light();
        let (ambient, lights) = (*engine.ambient_light(), engine.light_sources().to_vec());

        assert!(engine.load_light_sources_from_str("1 0 0").is_err());
        assert_eq!(*engine.ambient_light(), ambient);
        assert_eq!(engine.light_sources(), lights.as_slice());

        // A bad line after good ones must not commit the good ones
        assert!(engine.load_light_sources_from_str("1 1 1 1\nbright 0 0 0\n").is_err());
        assert_eq!(*engine.ambient_light(), ambient);
        assert_eq!(engine.light_sources(), lights.as_slice());
    }

    #[test]
    fn test_empty_light_buffer_keeps_lights() {
        let mut engine = engine_with_one_light();
        assert_eq!(engine.ambient_light().intensity, 0.3);
        assert_eq!(engine.light_sources().len(), 1);

        engine.load_light_sources_from_str("# nothing\n").unwrap();
        assert_eq!(engine.ambient_light().intensity, 0.3);
        assert_eq!(engine.ambient_light().color, Vec4::rgb(1.0, 0.0, 0.0));
        assert_eq!(engine.light_sources().len(), 1);
    }

    #[test]
    fn test_light_load_from_empty_path_is_noop() {
        let mut engine = engine_with_one_light();
        engine.load_light_sources_from_file("").unwrap();
        assert_eq!(engine.ambient_light().intensity, 0.3);
        assert_eq!(engine.light_sources()[0].position, Vec4::direction(0.0, 5.0, 0.0));
        assert!(engine.load_light_sources_from_file("/no/such/lights.txt").is_err());
        assert_eq!(engine.light_sources().len(), 1);
    }
}
