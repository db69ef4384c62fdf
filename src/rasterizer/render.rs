//! Scanline rasterization
//!
//! Screen-space triangles are swept row by row with an active-edge list.
//! Each row yields one span per triangle, the nearest span (largest z) wins
//! each pixel, and the pixel color is the interpolated albedo multiplied by
//! the interpolated per-vertex lighting.

use std::collections::BTreeMap;

use tracing::debug;

use super::light::LightEngine;
use super::math::Vec4;
use super::types::{Framebuffer, Vertex};
use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Extents below this are treated as degenerate
const EPSILON: f64 = 0.0001;

/// Linear interpolation of `(x0, y0) - (x1, y1)` at `x`.
/// Falls back to the midpoint when the x extent is degenerate.
fn interpolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if (x1 - x0).abs() < EPSILON {
        return (y0 + y1) / 2.0;
    }
    (y0 * (x1 - x) + y1 * (x - x0)) / (x1 - x0)
}

/// Position of `v` between `a` and `b`, clamped to [0, 1]
fn ratio(a: f64, b: f64, v: f64) -> f64 {
    if (b - a).abs() < EPSILON {
        return 0.5;
    }
    ((v - a) / (b - a)).clamp(0.0, 1.0)
}

/// Directed triangle edge. Holds indices into the frame's vertex array.
#[derive(Debug, Clone, Copy)]
struct Edge {
    begin: usize,
    end: usize,
    triangle: usize,
    top: f64,
    bottom: f64,
}

impl Edge {
    fn new(vertices: &[Vertex], begin: usize, end: usize, triangle: usize) -> Self {
        let (a, b) = (vertices[begin].position.y, vertices[end].position.y);
        Self {
            begin,
            end,
            triangle,
            top: a.min(b),
            bottom: a.max(b),
        }
    }

    /// Screen (x, z) where the edge crosses row `y`
    fn intersect_row(&self, vertices: &[Vertex], y: f64) -> (f64, f64) {
        let a = vertices[self.begin].position;
        let b = vertices[self.end].position;
        let x = interpolate(a.y, a.x, b.y, b.x, y);
        // Interpolate depth along whichever axis the edge actually spans
        let z = if (b.y - a.y).abs() < EPSILON {
            interpolate(a.x, a.z, b.x, b.z, x)
        } else {
            interpolate(a.y, a.z, b.y, b.z, y)
        };
        (x, z)
    }
}

/// Horizontal interval of one triangle on one row
#[derive(Debug, Clone, Copy)]
struct Span {
    left: (f64, f64),
    right: (f64, f64),
    triangle: usize,
}

impl Span {
    fn new(a: (f64, f64), b: (f64, f64), triangle: usize) -> Self {
        let (left, right) = if a.0 <= b.0 { (a, b) } else { (b, a) };
        Self { left, right, triangle }
    }

    fn contains(&self, x: f64) -> bool {
        x >= self.left.0 && x <= self.right.0
    }

    fn depth_at(&self, x: f64) -> f64 {
        interpolate(self.left.0, self.left.1, self.right.0, self.right.1, x)
    }
}

/// Derive the three edges of every triangle, sorted by topmost y.
/// Edges with non-finite coordinates are dropped.
fn build_edges(vertices: &[Vertex]) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(vertices.len());
    for triangle in 0..vertices.len() / 3 {
        let base = triangle * 3;
        for j in 0..3 {
            let edge = Edge::new(vertices, base + j, base + (j + 1) % 3, triangle);
            if edge.top.is_finite() && edge.bottom.is_finite() {
                edges.push(edge);
            }
        }
    }
    edges.sort_by(|a, b| a.top.total_cmp(&b.top));
    edges
}

/// Sweep rows top to bottom and collect each row's spans.
///
/// Edge activity is half-open on purpose: an edge is active on rows
/// `top <= y < bottom`. Horizontal edges are therefore never active, and a
/// vertex shared by two edges is counted on one of them only, so the row
/// through it still has exactly two edges. A triangle's top row is drawn
/// and its bottom row is not. A triangle yields a span only when exactly
/// two of its edges are active; anything else is skipped.
fn build_spans(vertices: &[Vertex], edges: &[Edge], height: usize) -> Vec<Vec<Span>> {
    let mut rows = Vec::with_capacity(height);
    let mut active: Vec<usize> = Vec::new();
    let mut next_edge = 0;

    for row in 0..height {
        let y = row as f64;

        while next_edge < edges.len() && edges[next_edge].top <= y {
            active.push(next_edge);
            next_edge += 1;
        }
        active.retain(|&e| edges[e].bottom > y);

        let mut by_triangle: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &e in &active {
            by_triangle.entry(edges[e].triangle).or_default().push(e);
        }

        let spans: Vec<Span> = by_triangle
            .into_iter()
            .filter_map(|(triangle, list)| match list.as_slice() {
                &[a, b] => Some(Span::new(
                    edges[a].intersect_row(vertices, y),
                    edges[b].intersect_row(vertices, y),
                    triangle,
                )),
                _ => None,
            })
            .collect();

        rows.push(spans);
    }

    rows
}

/// Bilinear interpolation of per-vertex `values` at pixel (x, y).
///
/// Each edge that crosses row `y` gives a point with x and value
/// interpolated along the edge; the pixel value is then interpolated
/// between the two crossings. With no crossing the first vertex's value is
/// used, with one (or more than two) the first crossing's.
fn gradient(positions: [Vec4; 3], values: [Vec4; 3], x: f64, y: f64) -> Vec4 {
    let mut crossings: [(f64, Vec4); 3] = [(0.0, Vec4::ZERO); 3];
    let mut count = 0;

    for i in 0..3 {
        let (mut top, mut bottom) = (i, (i + 1) % 3);
        if positions[top].y > positions[bottom].y {
            std::mem::swap(&mut top, &mut bottom);
        }
        let (pt, pb) = (positions[top], positions[bottom]);

        if pt.y <= y && y < pb.y {
            let cx = interpolate(pt.y, pt.x, pb.y, pb.x, y);
            let t = ratio(pt.y, pb.y, y);
            crossings[count] = (cx, values[top].lerp(values[bottom], t));
            count += 1;
        }
    }

    match count {
        0 => values[0],
        2 => {
            let (mut left, mut right) = (crossings[0], crossings[1]);
            if left.0 > right.0 {
                std::mem::swap(&mut left, &mut right);
            }
            left.1.lerp(right.1, ratio(left.0, right.0, x))
        }
        _ => crossings[0].1,
    }
}

/// Read-only frame data shared by every row
struct RowContext<'a> {
    vertices: &'a [Vertex],
    lights: &'a [Vec4],
    background: Vec4,
}

impl RowContext<'_> {
    fn triangle<T: Copy>(&self, triangle: usize, f: impl Fn(usize) -> T) -> [T; 3] {
        let base = triangle * 3;
        [f(base), f(base + 1), f(base + 2)]
    }

    fn shade_row(&self, y: usize, spans: &[Span], row: &mut [Vec4]) {
        let fy = y as f64;

        for (x, pixel) in row.iter_mut().enumerate() {
            let fx = x as f64;

            let front = spans
                .iter()
                .filter(|s| s.contains(fx))
                .fold(None, |best: Option<(&Span, f64)>, s| {
                    let depth = s.depth_at(fx);
                    match best {
                        Some((_, d)) if d >= depth => best,
                        _ => Some((s, depth)),
                    }
                });

            *pixel = match front {
                None => self.background,
                Some((span, _)) => {
                    let positions = self.triangle(span.triangle, |i| self.vertices[i].position);
                    let colors = self.triangle(span.triangle, |i| self.vertices[i].color);
                    let lights = self.triangle(span.triangle, |i| self.lights[i]);

                    let base = gradient(positions, colors, fx, fy);
                    let light = gradient(positions, lights, fx, fy);
                    base.mul_elem(light)
                }
            };
        }
    }
}

/// Scanline renderer. Owns the lighting evaluator and the output image.
#[derive(Debug, Clone)]
pub struct RenderEngine {
    light_engine: LightEngine,
    view_width: usize,
    view_height: usize,
    background_color: Vec4,
    vertices: Vec<Vertex>,
    image: Framebuffer,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine {
    pub fn new() -> Self {
        Self {
            light_engine: LightEngine::new(),
            view_width: DEFAULT_WIDTH,
            view_height: DEFAULT_HEIGHT,
            background_color: Vec4::BLACK,
            vertices: Vec::new(),
            image: Framebuffer::new(0, 0),
        }
    }

    pub fn light_engine(&self) -> &LightEngine {
        &self.light_engine
    }

    pub fn light_engine_mut(&mut self) -> &mut LightEngine {
        &mut self.light_engine
    }

    pub fn view_width(&self) -> usize {
        self.view_width
    }

    pub fn view_height(&self) -> usize {
        self.view_height
    }

    pub fn set_view_size(&mut self, width: usize, height: usize) {
        self.view_width = width;
        self.view_height = height;
    }

    pub fn background_color(&self) -> Vec4 {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Vec4) {
        self.background_color = color;
    }

    /// Screen-space triangle list for the next `run`
    pub fn set_vertex_array(&mut self, vertices: &[Vertex]) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
    }

    /// Rasterize the current vertex array into a fresh image
    pub fn run(&mut self) {
        let (width, height) = (self.view_width, self.view_height);
        self.image.resize(width, height, self.background_color);
        if width == 0 || height == 0 {
            return;
        }

        let edges = build_edges(&self.vertices);
        let spans = build_spans(&self.vertices, &edges, height);
        let lights: Vec<Vec4> = self
            .vertices
            .iter()
            .map(|v| self.light_engine.get_light(v.origin, v.normal))
            .collect();

        debug!(
            triangles = self.vertices.len() / 3,
            edges = edges.len(),
            width,
            height,
            "Rasterizing frame"
        );

        let ctx = RowContext {
            vertices: &self.vertices,
            lights: &lights,
            background: self.background_color,
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.image
                .pixels
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| ctx.shade_row(y, &spans[y], row));
        }

        #[cfg(not(feature = "parallel"))]
        for (y, row) in self.image.pixels.chunks_mut(width).enumerate() {
            ctx.shade_row(y, &spans[y], row);
        }
    }

    pub fn image(&self) -> &Framebuffer {
        &self.image
    }
}
