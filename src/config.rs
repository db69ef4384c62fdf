//! Render configuration
//!
//! Uses RON for human-readable config files. Missing fields take their
//! defaults, so a config only needs to name what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::{read_source, LoadError};
use crate::rasterizer::{RenderEngine, TransformEngine, Vec4, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// View, projection and viewer-control settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub view_width: usize,
    pub view_height: usize,
    /// Vertical field of view in radians
    pub fovy: f64,
    pub z_near: f64,
    pub z_far: f64,
    pub view_translation: Vec4,
    /// Euler angles in radians
    pub view_rotation: Vec4,
    pub background: Vec4,
    /// Distance moved per key press
    pub translation_step: f64,
    /// Radians turned per key press
    pub rotation_step: f64,
    /// Radians of fovy change per key press; also the fovy margin from 0 and pi
    pub fovy_step: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            view_width: DEFAULT_WIDTH,
            view_height: DEFAULT_HEIGHT,
            fovy: std::f64::consts::FRAC_PI_3,
            z_near: 0.1,
            z_far: 100.0,
            // Camera at model z = -5 facing the origin
            view_translation: Vec4::direction(0.0, 0.0, 5.0),
            view_rotation: Vec4::ZERO,
            background: Vec4::BLACK,
            translation_step: 0.1,
            rotation_step: std::f64::consts::PI / 12.0,
            fovy_step: std::f64::consts::PI / 12.0,
        }
    }
}

impl RenderConfig {
    /// Push the view settings into both engines
    pub fn apply(&self, transform: &mut TransformEngine, render: &mut RenderEngine) {
        transform.set_view_size(self.view_width as f64, self.view_height as f64);
        transform.set_perspective(self.fovy, self.z_near, self.z_far);
        transform.set_view_translation(self.view_translation);
        transform.set_view_rotation(self.view_rotation);

        render.set_view_size(self.view_width, self.view_height);
        render.set_background_color(self.background);
        render.light_engine_mut().set_view_translation(self.view_translation);
    }
}

/// Parse a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, LoadError> {
    Ok(ron::from_str(s)?)
}

/// Load a config from a RON file. An empty path yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, LoadError> {
    match read_source(path.as_ref())? {
        Some(contents) => load_config_from_str(&contents),
        None => Ok(RenderConfig::default()),
    }
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), LoadError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(2)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = load_config_from_str("(view_width: 320, view_height: 240, fovy: 1.0)").unwrap();
        assert_eq!(config.view_width, 320);
        assert_eq!(config.view_height, 240);
        assert_eq!(config.fovy, 1.0);
        assert_eq!(config.z_far, 100.0);
        assert_eq!(config.view_translation, Vec4::direction(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(matches!(load_config_from_str("(view_width: \"wide\")"), Err(LoadError::Config(_))));
    }

    #[test]
    fn test_empty_path_gives_defaults() {
        assert_eq!(load_config("").unwrap(), RenderConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let config = RenderConfig {
            view_width: 100,
            background: Vec4::new(0.1, 0.2, 0.3, 1.0),
            ..Default::default()
        };
        let path = std::env::temp_dir().join(format!("scanline_config_{}.ron", std::process::id()));
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_apply_sets_engines() {
        let config = RenderConfig {
            view_width: 80,
            view_height: 60,
            ..Default::default()
        };
        let mut transform = TransformEngine::new();
        let mut render = RenderEngine::new();
        config.apply(&mut transform, &mut render);
        assert_eq!(transform.view_width(), 80.0);
        assert_eq!(render.view_height(), 60);
        assert_eq!(render.light_engine().view_translation(), config.view_translation);
        assert_eq!(transform.fovy(), config.fovy);
    }
}
