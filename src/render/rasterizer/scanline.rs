//! Edge-table scanline rasterization with a z-buffer.
//!
//! # Algorithm Overview
//!
//! 1. **Build edges**: map every vertex to pixels and connect consecutive
//!    vertices (wrapping). Edges whose endpoints share a truncated y are
//!    horizontal for our purposes and dropped. Each remaining edge is stored
//!    top-down together with its inverse slopes.
//! 2. **Sort** edges by `(y1, y2, x1, dx/dy, z1, dz/dy)`. This makes the
//!    left/right pairing deterministic when several edges start on the same
//!    scanline.
//! 3. **Walk scanlines**, keeping two active edges. When a scanline reaches
//!    the bottom of an active edge, the next edge from the sorted list takes
//!    its place.
//! 4. **Fill spans** between the two edge crossings, interpolating depth
//!    linearly across the span and testing it against the depth buffer.
//!
//! ```text
//!          e1 /\ e2
//!            /  \
//!   y ----> x1--x2      span: ceil(x1) ..= trunc(x2)
//!          /      \
//!       e3 \      / e4  (replace e1 / e2 once y >= their y2)
//!           \    /
//!            \  /
//!             \/
//! ```
//!
//! # Assumptions
//!
//! Input polygons are convex and not self-intersecting, so every scanline
//! crosses the outline at most twice. Concave input renders incorrectly.
//!
//! # Compositing
//!
//! Opaque polygons write colour and depth where `0 < z <= depth`. Translucent
//! polygons blend `(1 - a) * dst + a * src` over whatever is already in the
//! colour buffer and never write depth; callers draw them after all opaque
//! polygons.

use std::cmp::Ordering;

use super::{Polygon, RasterOptions, Rasterizer};
use crate::colour::Rgb;
use crate::math::vec3::Vec3;
use crate::render::framebuffer::{pack_argb, FrameBuffer};

/// Depth beyond which spans are not drawn.
pub const Z_MAX: f64 = 65536.0;

/// A non-horizontal polygon edge in pixel space, `p1.y < p2.y`.
#[derive(Debug, Clone, Copy)]
struct Edge {
    p1: Vec3,
    p2: Vec3,
    dx_dy: f64,
    dz_dy: f64,
}

impl Edge {
    fn new(p1: Vec3, p2: Vec3) -> Self {
        let dy = p2.y - p1.y;
        Self {
            p1,
            p2,
            dx_dy: (p2.x - p1.x) / dy,
            dz_dy: (p2.z - p1.z) / dy,
        }
    }

    fn sort_key(&self) -> [f64; 6] {
        [
            self.p1.y, self.p2.y, self.p1.x, self.dx_dy, self.p1.z, self.dz_dy,
        ]
    }

    /// (x, z) where the edge crosses scanline `y`.
    #[inline]
    fn at(&self, y: f64) -> (f64, f64) {
        let dy = y - self.p1.y;
        (self.p1.x + dy * self.dx_dy, self.p1.z + dy * self.dz_dy)
    }
}

fn compare_keys(a: &Edge, b: &Edge) -> Ordering {
    a.sort_key()
        .iter()
        .zip(b.sort_key().iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// One horizontal run of a polygon on scanline `y`.
#[derive(Debug, Clone, Copy)]
struct Span {
    y: i64,
    left: (f64, f64),
    right: (f64, f64),
}

/// Scanline rasterizer over an edge table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanlineRasterizer {
    options: RasterOptions,
}

impl ScanlineRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RasterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    /// Maps a viewport point to pixel coordinates, keeping depth.
    #[inline]
    fn to_pixels(point: Vec3, width: f64, height: f64) -> Vec3 {
        let scale = width.min(height);
        Vec3::new(
            width / 2.0 + point.x * scale,
            height / 2.0 - point.y * scale,
            point.z,
        )
    }

    /// Builds the sorted edge table for `points`.
    fn edges(points: &[Vec3], width: f64, height: f64) -> Vec<Edge> {
        let n = points.len();
        let mut edges: Vec<Edge> = (0..n)
            .filter_map(|i| {
                let a = Self::to_pixels(points[i], width, height);
                let b = Self::to_pixels(points[(i + 1) % n], width, height);
                match (a.y.trunc() as i64).cmp(&(b.y.trunc() as i64)) {
                    Ordering::Less => Some(Edge::new(a, b)),
                    Ordering::Greater => Some(Edge::new(b, a)),
                    Ordering::Equal => None,
                }
            })
            .collect();
        edges.sort_by(compare_keys);
        edges
    }

    /// Walks the edge table and hands every drawable span to `draw`.
    fn spans(edges: Vec<Edge>, width: i64, height: i64, mut draw: impl FnMut(Span)) {
        if edges.len() < 2 {
            return;
        }
        let end_y = edges[edges.len() - 1].p2.y;
        if end_y < 0.0 {
            return;
        }

        let mut remaining = edges.into_iter();
        let (Some(mut edge1), Some(mut edge2)) = (remaining.next(), remaining.next()) else {
            return;
        };
        if edge1.p1.y >= height as f64 {
            return;
        }

        let mut y = edge1.p1.y.trunc() as i64;
        if (y as f64) < edge1.p1.y || (y as f64) < edge2.p1.y {
            y += 1;
        }
        if y < 0 {
            // Rows above the image draw nothing: retire the edges that end
            // before row 0, earliest first, then start there.
            loop {
                let ended = if edge1.p2.y <= edge2.p2.y {
                    &mut edge1
                } else {
                    &mut edge2
                };
                if ended.p2.y > -1.0 {
                    break;
                }
                match remaining.next() {
                    Some(next) => *ended = next,
                    None => return,
                }
            }
            y = 0;
        }

        while (y as f64) <= end_y && y < height {
            let row = y;
            y += 1;

            if row as f64 >= edge1.p2.y {
                match remaining.next() {
                    Some(next) => edge1 = next,
                    None => break,
                }
            }
            if row as f64 >= edge2.p2.y {
                match remaining.next() {
                    Some(next) => edge2 = next,
                    None => break,
                }
            }
            let mut left = edge1.at(row as f64);
            let mut right = edge2.at(row as f64);
            if left.0 > right.0 {
                std::mem::swap(&mut left, &mut right);
            }

            if left.1 <= 0.0 && right.1 <= 0.0 {
                continue;
            }
            if left.1 >= Z_MAX && right.1 >= Z_MAX {
                continue;
            }
            if left.0.ceil() as i64 >= width || (right.0.trunc() as i64) < 0 {
                continue;
            }

            draw(Span {
                y: row,
                left,
                right,
            });
        }
    }

    fn draw_span(&self, span: Span, polygon: &Polygon, color: u32, buffer: &mut FrameBuffer) {
        let width = buffer.width() as i64;
        let (x1, z1) = span.left;
        let (x2, z2) = span.right;
        let dz_dx = if x1 != x2 { (z2 - z1) / (x2 - x1) } else { 0.0 };

        let start_x = (x1.ceil() as i64).max(0);
        let end_x = (x2.trunc() as i64).min(width - 1);
        let y = span.y as i32;

        for x in start_x..=end_x {
            let z = (z1 + dz_dx * (x as f64 - x1)) as f32;
            let x = x as i32;
            if polygon.is_opaque() {
                buffer.set_pixel_with_depth(x, y, z, color);
            } else if !self.options.translucent_depth_test || buffer.depth_test(x, y, z) {
                buffer.blend_pixel(x, y, polygon.rgb, polygon.alpha);
            }
        }

        if let Some(stroke) = self.options.stroke {
            self.stroke_boundary(span.left, y, width, stroke, buffer);
            self.stroke_boundary(span.right, y, width, stroke, buffer);
        }
    }

    fn stroke_boundary(
        &self,
        (x, z): (f64, f64),
        y: i32,
        width: i64,
        stroke: Rgb,
        buffer: &mut FrameBuffer,
    ) {
        if x >= 0.0 && (x as i64) < width && buffer.depth_test(x as i32, y, z as f32) {
            buffer.set_pixel(x as i32, y, pack_argb(stroke, 255));
        }
    }
}

impl Rasterizer for ScanlineRasterizer {
    /// Fills `polygon`, skipping it silently when it has no non-horizontal
    /// edges or lies entirely outside the buffer or depth range.
    fn fill_polygon(&self, polygon: &Polygon, buffer: &mut FrameBuffer) {
        let width = buffer.width();
        let height = buffer.height();
        let edges = Self::edges(&polygon.points, width as f64, height as f64);
        let color = pack_argb(polygon.rgb, 255);

        let mut spans = Vec::new();
        Self::spans(edges, width as i64, height as i64, |span| spans.push(span));
        for span in spans {
            self.draw_span(span, polygon, color, buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::framebuffer::unpack_argb;

    const RED: Rgb = Rgb::new(255, 0, 0);

    /// Square with half-size `half` (viewport units) at `depth`.
    fn square(half: f64, depth: f64, rgb: Rgb, alpha: f32) -> Polygon {
        Polygon::new(
            vec![
                Vec3::new(-half, -half, depth),
                Vec3::new(half, -half, depth),
                Vec3::new(half, half, depth),
                Vec3::new(-half, half, depth),
            ],
            rgb,
            alpha,
        )
    }

    fn covered(fb: &FrameBuffer) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..fb.height() as i32 {
            for x in 0..fb.width() as i32 {
                if fb.get_pixel(x, y) != Some(0) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn fills_square_span_range() {
        // Edges land on 2.5 and 7.5 pixels: rows and columns 3..=7.
        let mut fb = FrameBuffer::new(10, 10, None);
        ScanlineRasterizer::new().fill_polygon(&square(0.25, 50.0, RED, 1.0), &mut fb);
        let pixels = covered(&fb);
        assert_eq!(pixels.len(), 25);
        assert!(pixels
            .iter()
            .all(|&(x, y)| (3..=7).contains(&x) && (3..=7).contains(&y)));
        assert_eq!(fb.get_depth(5, 5), Some(50.0));
    }

    #[test]
    fn polygon_reaching_far_above_the_image_starts_at_row_zero() {
        // In pixels: apex at y = -1e7, shoulders at y = -5, base at 7.5,
        // sides at x = 2.5 and 7.5. Both apex edges end above the image.
        let mut fb = FrameBuffer::new(10, 10, None);
        let spire = Polygon::new(
            vec![
                Vec3::new(0.0, 1_000_000.5, 5.0),
                Vec3::new(0.25, 1.0, 5.0),
                Vec3::new(0.25, -0.25, 5.0),
                Vec3::new(-0.25, -0.25, 5.0),
                Vec3::new(-0.25, 1.0, 5.0),
            ],
            RED,
            1.0,
        );
        ScanlineRasterizer::new().fill_polygon(&spire, &mut fb);
        let pixels = covered(&fb);
        assert_eq!(pixels.len(), 40);
        assert!(pixels
            .iter()
            .all(|&(x, y)| (3..=7).contains(&x) && (0..=7).contains(&y)));
    }

    #[test]
    fn flat_polygon_has_no_edges() {
        let mut fb = FrameBuffer::new(10, 10, None);
        let sliver = Polygon::new(
            vec![
                Vec3::new(-0.3, 0.01, 5.0),
                Vec3::new(0.3, 0.01, 5.0),
                Vec3::new(0.0, 0.02, 5.0),
            ],
            RED,
            1.0,
        );
        ScanlineRasterizer::new().fill_polygon(&sliver, &mut fb);
        assert!(covered(&fb).is_empty());
    }

    #[test]
    fn skips_spans_outside_depth_range() {
        let mut fb = FrameBuffer::new(10, 10, None);
        let r = ScanlineRasterizer::new();
        r.fill_polygon(&square(0.25, -3.0, RED, 1.0), &mut fb);
        r.fill_polygon(&square(0.25, Z_MAX + 1.0, RED, 1.0), &mut fb);
        assert!(covered(&fb).is_empty());
    }

    #[test]
    fn skips_polygons_outside_buffer() {
        let mut fb = FrameBuffer::new(10, 10, None);
        let mut offscreen = square(0.1, 5.0, RED, 1.0);
        for p in &mut offscreen.points {
            p.x += 3.0;
        }
        ScanlineRasterizer::new().fill_polygon(&offscreen, &mut fb);
        assert!(covered(&fb).is_empty());
    }

    #[test]
    fn nearer_opaque_polygon_wins_in_any_order() {
        let near = square(0.25, 10.0, RED, 1.0);
        let far = square(0.4, 20.0, Rgb::new(0, 0, 255), 1.0);
        let r = ScanlineRasterizer::new();

        let mut a = FrameBuffer::new(10, 10, None);
        r.fill_polygon(&near, &mut a);
        r.fill_polygon(&far, &mut a);

        let mut b = FrameBuffer::new(10, 10, None);
        r.fill_polygon(&far, &mut b);
        r.fill_polygon(&near, &mut b);

        assert_eq!(a.color_buffer(), b.color_buffer());
        assert_eq!(unpack_argb(a.get_pixel(5, 5).unwrap()), (255, 0, 0, 255));
    }

    #[test]
    fn translucent_blends_without_depth() {
        let r = ScanlineRasterizer::new();
        let mut fb = FrameBuffer::new(10, 10, Some(Rgb::new(0, 0, 0)));
        r.fill_polygon(&square(0.25, 10.0, Rgb::new(0, 0, 200), 1.0), &mut fb);
        // Behind the opaque square, yet still blended over it.
        r.fill_polygon(&square(0.25, 90.0, RED, 0.5), &mut fb);
        assert_eq!(unpack_argb(fb.get_pixel(5, 5).unwrap()), (127, 0, 100, 255));
        assert_eq!(fb.get_depth(5, 5), Some(10.0));
    }

    #[test]
    fn translucent_depth_test_option_respects_opaque_image() {
        let r = ScanlineRasterizer::with_options(RasterOptions {
            translucent_depth_test: true,
            ..RasterOptions::default()
        });
        let mut fb = FrameBuffer::new(10, 10, Some(Rgb::new(0, 0, 0)));
        r.fill_polygon(&square(0.25, 10.0, Rgb::new(0, 0, 200), 1.0), &mut fb);
        r.fill_polygon(&square(0.25, 90.0, RED, 0.5), &mut fb);
        assert_eq!(unpack_argb(fb.get_pixel(5, 5).unwrap()), (0, 0, 200, 255));
    }

    #[test]
    fn stroke_marks_span_ends() {
        let r = ScanlineRasterizer::with_options(RasterOptions {
            stroke: Some(Rgb::new(0, 255, 0)),
            ..RasterOptions::default()
        });
        let mut fb = FrameBuffer::new(10, 10, None);
        r.fill_polygon(&square(0.25, 10.0, RED, 1.0), &mut fb);
        // Left edge sits at x = 2.5, right edge at x = 7.5.
        assert_eq!(unpack_argb(fb.get_pixel(2, 5).unwrap()), (0, 255, 0, 255));
        assert_eq!(unpack_argb(fb.get_pixel(7, 5).unwrap()), (0, 255, 0, 255));
        assert_eq!(unpack_argb(fb.get_pixel(5, 5).unwrap()), (255, 0, 0, 255));
    }
}
