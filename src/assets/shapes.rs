//! Procedural meshes and model writing

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::LoadError;
use crate::rasterizer::{Vec4, Vertex};

/// Generate a UV sphere as a triangle list.
///
/// `ring_count` latitude rings (poles included) and `edge_count` segments
/// per ring. Normals point outward and have unit length. Returns no
/// vertices for `ring_count < 6` or `edge_count < 4`.
pub fn generate_sphere(radius: f64, ring_count: usize, edge_count: usize, origin: Vec4, color: Vec4) -> Vec<Vertex> {
    let mut vertices = Vec::new();

    if ring_count < 6 || edge_count < 4 {
        return vertices;
    }

    let vertex_at = |ring: usize, edge: usize| {
        let theta = std::f64::consts::PI * ring as f64 / (ring_count - 1) as f64;
        let phi = std::f64::consts::TAU * (edge % edge_count) as f64 / edge_count as f64;
        let dir = Vec4::direction(theta.sin() * phi.sin(), theta.cos(), theta.sin() * phi.cos());
        let position = Vec4::point(origin.x, origin.y, origin.z) + dir * radius;
        Vertex::new(position, color, dir)
    };

    for ring in 0..ring_count - 1 {
        for edge in 0..edge_count {
            let a = vertex_at(ring, edge);
            let b = vertex_at(ring, edge + 1);
            let c = vertex_at(ring + 1, edge);
            let d = vertex_at(ring + 1, edge + 1);

            // Skip the zero-area halves at the poles
            if ring != 0 {
                vertices.extend_from_slice(&[a, c, b]);
            }
            if ring != ring_count - 2 {
                vertices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    vertices
}

/// Write vertices as `x y z r g b nx ny nz` lines, readable by the model loader
pub fn save_model<P: AsRef<Path>>(path: P, vertices: &[Vertex]) -> Result<(), LoadError> {
    let mut contents = String::new();
    for v in vertices {
        let (p, c, n) = (v.origin, v.color, v.normal);
        // Writing into a String cannot fail
        let _ = writeln!(
            contents,
            "{} {} {} {} {} {} {} {} {}",
            p.x, p.y, p.z, c.x, c.y, c.z, n.x, n.y, n.z
        );
    }
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::parse_model;

    #[test]
    fn test_sphere_too_coarse_is_empty() {
        assert!(generate_sphere(1.0, 5, 8, Vec4::ZERO, Vec4::WHITE).is_empty());
        assert!(generate_sphere(1.0, 8, 3, Vec4::ZERO, Vec4::WHITE).is_empty());
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let origin = Vec4::point(1.0, -2.0, 3.0);
        let vertices = generate_sphere(2.0, 8, 12, origin, Vec4::rgb(0.0, 1.0, 0.0));
        assert!(!vertices.is_empty());
        assert_eq!(vertices.len() % 3, 0);
        for v in &vertices {
            assert!(((v.origin - origin).length() - 2.0).abs() < 1e-9);
            assert!((v.normal.length() - 1.0).abs() < 1e-9);
            assert_eq!(v.origin.w, 1.0);
            assert_eq!(v.normal.w, 0.0);
            assert_eq!(v.color, Vec4::rgb(0.0, 1.0, 0.0));
        }
        // Two triangles per quad, minus one per quad in each polar band
        assert_eq!(vertices.len(), 3 * (2 * 7 * 12 - 2 * 12));
    }

    #[test]
    fn test_save_model_round_trips_through_loader() {
        let vertices = generate_sphere(1.0, 6, 4, Vec4::ZERO, Vec4::rgb(0.25, 0.5, 0.75));
        let path = std::env::temp_dir().join(format!("scanline_sphere_{}.txt", std::process::id()));
        save_model(&path, &vertices).unwrap();

        let loaded = parse_model(&fs::read_to_string(&path).unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), vertices.len());
        for (a, b) in loaded.iter().zip(&vertices) {
            assert!((a.origin - b.origin).length() < 1e-9);
            assert!((a.normal - b.normal).length() < 1e-9);
            assert_eq!(a.color, b.color);
        }
    }
}
