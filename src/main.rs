//! Scanline viewer: renders a model with the CPU rasterizer
//!
//! Opens a window by default. With `--output` it renders a single frame
//! to a PNG and exits without creating a window.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use macroquad::prelude::*;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use scanline_engine::app::{save_png, screenshot_file_name, ViewerAction, ViewerState};
use scanline_engine::assets::{generate_sphere, save_model};
use scanline_engine::config::{load_config, save_config, RenderConfig};
use scanline_engine::rasterizer::Vec4;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const EXIT_MODEL: i32 = 1;
const EXIT_MATERIAL: i32 = 2;
const EXIT_LIGHTS: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_OUTPUT: i32 = 5;

/// Key bindings, checked once per frame
const KEY_BINDINGS: [(KeyCode, ViewerAction); 7] = [
    (KeyCode::W, ViewerAction::MoveForward),
    (KeyCode::S, ViewerAction::MoveBackward),
    (KeyCode::A, ViewerAction::TurnLeft),
    (KeyCode::D, ViewerAction::TurnRight),
    (KeyCode::Q, ViewerAction::NarrowFov),
    (KeyCode::E, ViewerAction::WidenFov),
    (KeyCode::Z, ViewerAction::ToggleStatistics),
];

#[derive(Parser, Debug)]
#[command(name = "scanline-viewer", version, about = "CPU scanline renderer")]
struct Cli {
    /// Model file: one `x y z [r g b [nx ny nz]]` vertex per line
    model: Option<PathBuf>,

    /// Material file: ambient, diffuse and specular RGB, then shininess and suppression
    material: Option<PathBuf>,

    /// Light file: `intensity x y z [r g b]` per line, ambient light first
    lights: Option<PathBuf>,

    /// RON render config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render one frame to this PNG and exit
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use a generated sphere instead of a model file
    #[arg(long)]
    sphere: bool,

    /// Write the model in use to this file
    #[arg(long)]
    save_model: Option<PathBuf>,

    /// Write the effective config to this file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn window_conf(config: &RenderConfig) -> Conf {
    Conf {
        window_title: format!("Scanline Viewer v{}", VERSION),
        window_width: config.view_width as i32,
        window_height: config.view_height as i32,
        window_resizable: true,
        ..Default::default()
    }
}

/// Load config and assets. On failure returns the process exit code.
fn build_viewer(cli: &Cli) -> Result<ViewerState, i32> {
    let config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| {
            error!("Failed to load config {}: {}", path.display(), e);
            EXIT_CONFIG
        })?,
        None => RenderConfig::default(),
    };

    let mut viewer = ViewerState::new(config);

    if cli.sphere {
        let sphere = generate_sphere(1.0, 24, 32, Vec4::point(0.0, 0.0, 0.0), Vec4::rgb(0.8, 0.3, 0.2));
        info!(triangles = sphere.len() / 3, "Generated sphere");
        viewer.transform.load_model_from_vertex_array(sphere);
    } else if let Some(path) = &cli.model {
        viewer.transform.load_model_from_file(path).map_err(|e| {
            error!("Failed to load model {}: {}", path.display(), e);
            EXIT_MODEL
        })?;
    }

    if let Some(path) = &cli.material {
        viewer.render.light_engine_mut().load_material_from_file(path).map_err(|e| {
            error!("Failed to load material {}: {}", path.display(), e);
            EXIT_MATERIAL
        })?;
    }

    if let Some(path) = &cli.lights {
        viewer.render.light_engine_mut().load_light_sources_from_file(path).map_err(|e| {
            error!("Failed to load light sources {}: {}", path.display(), e);
            EXIT_LIGHTS
        })?;
    }

    Ok(viewer)
}

fn upload(viewer: &mut ViewerState) -> Texture2D {
    let frame = viewer.render_frame();
    let texture = Texture2D::from_rgba8(frame.width as u16, frame.height as u16, &frame.to_rgba8());
    texture.set_filter(FilterMode::Nearest);
    texture
}

async fn run_viewer(mut viewer: ViewerState) {
    let mut texture = upload(&mut viewer);

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let mut dirty = viewer.handle(ViewerAction::Resize(screen_width() as usize, screen_height() as usize));
        for (key, action) in KEY_BINDINGS {
            if is_key_pressed(key) {
                dirty |= viewer.handle(action);
            }
        }
        if dirty {
            texture = upload(&mut viewer);
        }

        if is_key_pressed(KeyCode::X) {
            if let Err(e) = viewer.save_screenshot(screenshot_file_name()) {
                error!("Failed to save screenshot: {}", e);
            }
        }

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(screen_width(), screen_height())),
                ..Default::default()
            },
        );

        if viewer.show_statistics {
            for (i, line) in viewer.statistics_lines().iter().enumerate() {
                draw_text(line, 10.0, 24.0 + i as f32 * 20.0, 20.0, WHITE);
            }
        }

        next_frame().await;
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut viewer = match build_viewer(&cli) {
        Ok(viewer) => viewer,
        Err(code) => process::exit(code),
    };

    if let Some(path) = &cli.save_config {
        if let Err(e) = save_config(&viewer.config, path) {
            error!("Failed to save config {}: {}", path.display(), e);
            process::exit(EXIT_OUTPUT);
        }
    }

    if let Some(path) = &cli.save_model {
        if let Err(e) = save_model(path, viewer.transform.model_vertices()) {
            error!("Failed to save model {}: {}", path.display(), e);
            process::exit(EXIT_OUTPUT);
        }
    }

    if let Some(path) = &cli.output {
        if let Err(e) = save_png(viewer.render_frame(), path) {
            error!("Failed to write {}: {}", path.display(), e);
            process::exit(EXIT_OUTPUT);
        }
        return;
    }

    let conf = window_conf(&viewer.config);
    macroquad::Window::from_config(conf, run_viewer(viewer));
}
