//! Viewer state and controls
//!
//! Owns both engines and drives one frame: transform -> clip -> raster.
//! Input handling is expressed as [`ViewerAction`]s so the window loop in
//! `main.rs` stays a thin key-to-action mapping.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::assets::LoadError;
use crate::config::RenderConfig;
use crate::rasterizer::{Framebuffer, RenderEngine, TransformEngine};

/// Camera and display changes the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerAction {
    MoveForward,
    MoveBackward,
    TurnLeft,
    TurnRight,
    NarrowFov,
    WidenFov,
    ToggleStatistics,
    Resize(usize, usize),
}

/// Everything needed to render frames of one scene
pub struct ViewerState {
    pub transform: TransformEngine,
    pub render: RenderEngine,
    pub config: RenderConfig,
    pub show_statistics: bool,
}

impl ViewerState {
    pub fn new(config: RenderConfig) -> Self {
        let mut transform = TransformEngine::new();
        let mut render = RenderEngine::new();
        config.apply(&mut transform, &mut render);

        Self {
            transform,
            render,
            config,
            show_statistics: true,
        }
    }

    pub fn view_size(&self) -> (usize, usize) {
        (self.render.view_width(), self.render.view_height())
    }

    /// Apply an action. Returns true when the frame must be re-rendered.
    pub fn handle(&mut self, action: ViewerAction) -> bool {
        let mut translation = self.transform.view_translation();
        let mut rotation = self.transform.view_rotation();
        let mut fovy = self.transform.fovy();
        let step = self.config.translation_step;
        // Heading in the xz plane for the current yaw
        let heading = rotation.y - std::f64::consts::FRAC_PI_2;

        match action {
            ViewerAction::MoveForward => {
                translation.x += step * heading.cos();
                translation.z += step * heading.sin();
            }
            ViewerAction::MoveBackward => {
                translation.x -= step * heading.cos();
                translation.z -= step * heading.sin();
            }
            ViewerAction::TurnLeft => rotation.y -= self.config.rotation_step,
            ViewerAction::TurnRight => rotation.y += self.config.rotation_step,
            ViewerAction::NarrowFov | ViewerAction::WidenFov => {
                let fovy_step = self.config.fovy_step;
                fovy = if action == ViewerAction::NarrowFov {
                    fovy - fovy_step
                } else {
                    fovy + fovy_step
                };
                fovy = fovy.clamp(fovy_step, std::f64::consts::PI - fovy_step);
            }
            ViewerAction::ToggleStatistics => {
                self.show_statistics = !self.show_statistics;
                return false;
            }
            ViewerAction::Resize(width, height) => {
                if width == 0 || height == 0 || (width, height) == self.view_size() {
                    return false;
                }
                self.transform.set_view_size(width as f64, height as f64);
                self.render.set_view_size(width, height);
                return true;
            }
        }

        self.transform.set_view_translation(translation);
        self.transform.set_view_rotation(rotation);
        let (z_near, z_far) = (self.transform.z_near(), self.transform.z_far());
        self.transform.set_perspective(fovy, z_near, z_far);
        true
    }

    /// Run the full pipeline and return the finished image
    pub fn render_frame(&mut self) -> &Framebuffer {
        self.transform.run();

        self.render.set_vertex_array(self.transform.transformed_vertices());
        self.render
            .light_engine_mut()
            .set_view_translation(self.transform.view_translation());
        self.render.run();

        self.render.image()
    }

    /// Overlay text: translation, rotation and field of view
    pub fn statistics_lines(&self) -> Vec<String> {
        let t = self.transform.view_translation();
        let r = self.transform.view_rotation();
        vec![
            format!("Translation: {:.2}, {:.2}, {:.2}", t.x, t.y, t.z),
            format!(
                "Rotation: {:.2}, {:.2}, {:.2} degrees",
                to_degrees(r.x),
                to_degrees(r.y),
                to_degrees(r.z)
            ),
            format!("Field of view: {:.2} degrees", to_degrees(self.transform.fovy())),
        ]
    }

    /// Save the last rendered image as a PNG
    pub fn save_screenshot<P: AsRef<Path>>(&self, path: P) -> Result<(), LoadError> {
        save_png(self.render.image(), path.as_ref())
    }
}

/// Radians to degrees, wrapped to [-180, 180]
pub fn to_degrees(radians: f64) -> f64 {
    let degrees = radians.to_degrees() % 360.0;
    if degrees < -180.0 {
        degrees + 360.0
    } else if degrees > 180.0 {
        degrees - 360.0
    } else {
        degrees
    }
}

/// `image_<unix timestamp>.png`
pub fn screenshot_file_name() -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("image_{}.png", timestamp))
}

/// Write a framebuffer as an 8-bit RGBA PNG
pub fn save_png(fb: &Framebuffer, path: &Path) -> Result<(), LoadError> {
    let image = image::RgbaImage::from_raw(fb.width as u32, fb.height as u32, fb.to_rgba8())
        .ok_or_else(|| {
            LoadError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "framebuffer size does not match its pixel count",
            ))
        })?;
    image.save(path)?;
    info!(path = %path.display(), "Saved image");
    Ok(())
}
