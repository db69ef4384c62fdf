//! Model, material and light source loading

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::rasterizer::{LightSource, Material, Vec4, Vertex};

/// Error type for asset and config loading
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required numeric field is missing or malformed
    #[error("line {line}: {message}")]
    Format { line: usize, message: String },

    /// The file ended before all required values were read
    #[error("expected {expected} {what}, found {found}")]
    MissingValues {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Config parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("Config serialize error: {0}")]
    ConfigWrite(#[from] ron::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Read a whole file. An empty path yields `None`, meaning "skip this load".
pub fn read_source(path: &Path) -> Result<Option<String>, LoadError> {
    if path.as_os_str().is_empty() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(path)?))
}

/// Non-comment lines with their 1-based line numbers, trimmed
fn content_lines(buffer: &str) -> impl Iterator<Item = (usize, &str)> {
    buffer
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse exactly `N` leading numbers from `fields`, or `None`
fn parse_fields<const N: usize>(fields: &[&str]) -> Option<[f64; N]> {
    if fields.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field.parse().ok()?;
    }
    Some(out)
}

fn required<const N: usize>(fields: &[&str], line: usize, what: &str) -> Result<[f64; N], LoadError> {
    parse_fields::<N>(fields).ok_or_else(|| LoadError::Format {
        line,
        message: format!("expected {} numbers for {}", N, what),
    })
}

/// Parse a model buffer: `x y z [r g b [nx ny nz]]` per line.
///
/// Every three vertices form one triangle. A missing or malformed color
/// falls back to opaque white; the normal is only read after a color and
/// falls back to zero.
pub fn parse_model(buffer: &str) -> Result<Vec<Vertex>, LoadError> {
    let mut vertices = Vec::new();

    for (line, text) in content_lines(buffer) {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let [x, y, z] = required::<3>(&fields, line, "a position")?;

        let color = parse_fields::<3>(&fields[3..]).map(|[r, g, b]| Vec4::rgb(r, g, b));
        let normal = color
            .and_then(|_| fields.get(6..).and_then(parse_fields::<3>))
            .map(|[nx, ny, nz]| Vec4::direction(nx, ny, nz));

        vertices.push(Vertex::new(
            Vec4::point(x, y, z),
            color.unwrap_or(Vec4::WHITE),
            normal.unwrap_or(Vec4::ZERO),
        ));
    }

    Ok(vertices)
}

/// Parse a material buffer.
///
/// Three `r g b [a]` lines (ambient, diffuse, specular reflection; alpha
/// defaults to 1) followed by two scalar lines (shininess, suppression).
/// Anything after that is ignored.
pub fn parse_material(buffer: &str) -> Result<Material, LoadError> {
    let mut vectors: Vec<Vec4> = Vec::with_capacity(3);
    let mut scalars: Vec<f64> = Vec::with_capacity(2);

    for (line, text) in content_lines(buffer) {
        let fields: Vec<&str> = text.split_whitespace().collect();

        if vectors.len() < 3 {
            let [r, g, b] = required::<3>(&fields, line, "a reflection vector")?;
            let a = fields.get(3).and_then(|f| f.parse().ok()).unwrap_or(1.0);
            vectors.push(Vec4::new(r, g, b, a));
        } else if scalars.len() < 2 {
            let [value] = required::<1>(&fields, line, "a material scalar")?;
            scalars.push(value);
        } else {
            break;
        }
    }

    if vectors.len() < 3 {
        return Err(LoadError::MissingValues {
            what: "reflection vectors",
            expected: 3,
            found: vectors.len(),
        });
    }
    if scalars.len() < 2 {
        return Err(LoadError::MissingValues {
            what: "material scalars",
            expected: 2,
            found: scalars.len(),
        });
    }

    Ok(Material::new(vectors[0], vectors[1], vectors[2], scalars[0], scalars[1]))
}

/// Parse a light sources buffer: `intensity x y z [r g b]` per line.
///
/// The first light is the ambient light, the rest are point lights.
/// Returns `None` when the buffer holds no lights.
pub fn parse_light_sources(buffer: &str) -> Result<Option<(LightSource, Vec<LightSource>)>, LoadError> {
    let mut lights = Vec::new();

    for (line, text) in content_lines(buffer) {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let [intensity] = required::<1>(&fields, line, "the intensity")?;
        let [x, y, z] = required::<3>(&fields[1..], line, "the light position")?;
        let color = fields
            .get(4..)
            .and_then(parse_fields::<3>)
            .map(|[r, g, b]| Vec4::rgb(r, g, b))
            .unwrap_or(Vec4::WHITE);

        lights.push(LightSource::new(Vec4::direction(x, y, z), intensity, color));
    }

    if lights.is_empty() {
        return Ok(None);
    }

    let ambient = lights.remove(0);
    Ok(Some((ambient, lights)))
}
