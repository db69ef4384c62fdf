//! Homogeneous frustum clipping
//!
//! Triangles are clipped against `-w <= x, y, z <= w` before the perspective
//! divide. The six frustum planes are handled as three passes over axis
//! pairs (y,z), (x,z), (x,y); each pass clips against the four half-planes of
//! a 2D square with Sutherland-Hodgman and fans the result back into
//! triangles.

use super::types::Vertex;

/// Axis pairs clipped in order: (y,z), (x,z), (x,y)
const AXIS_PAIRS: [[usize; 2]; 3] = [[1, 2], [0, 2], [0, 1]];

/// One clipping half-plane: `sign * v[axis] <= v.w`
#[derive(Debug, Clone, Copy)]
struct HalfPlane {
    axis: usize,
    sign: f64,
}

impl HalfPlane {
    /// Signed distance scaled by w; inside when >= 0
    fn distance(&self, v: &Vertex) -> f64 {
        v.position.w - self.sign * v.position[self.axis]
    }

    fn contains(&self, v: &Vertex) -> bool {
        self.distance(v) >= 0.0
    }

    /// Point where edge `a -> b` crosses the plane.
    ///
    /// Both the axis component and w vary linearly along the edge, so
    /// `t` solves `a.w + t(b.w - a.w) = sign * (a[axis] + t(b[axis] - a[axis]))`.
    /// Every attribute is carried with the same `t`.
    fn intersect(&self, a: &Vertex, b: &Vertex) -> Vertex {
        let da = self.distance(a);
        let db = self.distance(b);
        let denom = da - db;
        let t = if denom.abs() < f64::EPSILON { 0.0 } else { (da / denom).clamp(0.0, 1.0) };
        let mut v = a.lerp(b, t);
        // Land exactly on the boundary so later passes see it as inside
        v.position[self.axis] = self.sign * v.position.w;
        v
    }
}

/// Stateless frustum clipper
#[derive(Debug, Default, Clone)]
pub struct ClipEngine;

impl ClipEngine {
    pub fn new() -> Self {
        Self
    }

    /// Clip a triangle list (vertex triples) to the view frustum.
    ///
    /// Fully inside triangles pass through untouched, fully outside ones are
    /// dropped and straddling ones are replaced by a fan of sub-triangles.
    /// Triangle order is preserved. Trailing vertices that do not form a
    /// full triangle are ignored.
    pub fn clip_triangles(&self, vertices: &[Vertex]) -> Vec<Vertex> {
        let mut output: Vec<Vertex> = vertices.chunks_exact(3).flatten().copied().collect();

        for axes in AXIS_PAIRS {
            let input = std::mem::take(&mut output);

            for tri in input.chunks_exact(3) {
                if tri.iter().all(|v| is_inside_square(v, axes)) {
                    output.extend_from_slice(tri);
                    continue;
                }

                let polygon = clip_polygon(tri, axes);
                triangulate_fan(&polygon, &mut output);
            }
        }

        output
    }
}

/// Strict inside test for both axes of a pair. Points on the boundary count
/// as outside so they go through the polygon clipper.
fn is_inside_square(v: &Vertex, axes: [usize; 2]) -> bool {
    let w = v.position.w;
    axes.iter().all(|&a| {
        let c = v.position[a];
        c > -w && c < w
    })
}

/// Sutherland-Hodgman against the four half-planes of an axis pair
fn clip_polygon(polygon: &[Vertex], axes: [usize; 2]) -> Vec<Vertex> {
    let planes = [
        HalfPlane { axis: axes[0], sign: 1.0 },
        HalfPlane { axis: axes[1], sign: 1.0 },
        HalfPlane { axis: axes[0], sign: -1.0 },
        HalfPlane { axis: axes[1], sign: -1.0 },
    ];

    let mut output = polygon.to_vec();

    for plane in planes {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);

        for (i, a) in input.iter().enumerate() {
            let b = &input[(i + 1) % input.len()];

            match (plane.contains(a), plane.contains(b)) {
                (true, true) => output.push(*b),
                (true, false) => output.push(plane.intersect(a, b)),
                (false, true) => {
                    output.push(plane.intersect(a, b));
                    output.push(*b);
                }
                (false, false) => {}
            }
        }
    }

    output
}

/// Fan from the first vertex; fewer than 3 vertices yield nothing
fn triangulate_fan(polygon: &[Vertex], output: &mut Vec<Vertex>) {
    if polygon.len() < 3 {
        return;
    }
    for i in 1..polygon.len() - 1 {
        output.push(polygon[0]);
        output.push(polygon[i]);
        output.push(polygon[i + 1]);
    }
}
