//! The hand-off from the geometry stage to a rasterizer.
//!
//! Triangles arrive in screen space: x and y in pixels (y down), z still
//! holding camera-space depth.

use crate::{Rgb, ShadeMode, Triangle};

/// Anything that can draw a list of screen-space triangles.
pub trait Rasterizer {
    /// What the rasterizer draws into.
    type Target;

    /// Draws `triangles` in the given order, returning how many were drawn.
    fn draw_list<'a, I>(&mut self, triangles: I, target: &mut Self::Target) -> usize
    where
        I: IntoIterator<Item = &'a Triangle>;
}

/// A 1/z depth buffer. Larger values are nearer.
#[derive(Debug, Clone)]
pub struct ZBuffer {
    pub depth: Vec<f32>,
    /// Entries per row.
    pub pitch: usize,
}

impl ZBuffer {
    /// Resets every entry to "infinitely far".
    pub fn clear(&mut self) {
        self.depth.fill(0.0);
    }
}

/// A software render target: packed `0xAARRGGBB` pixels with an optional
/// depth buffer.
#[derive(Debug, Clone)]
pub struct FrameTarget {
    pub pixels: Vec<u32>,
    /// Pixels per row.
    pub pitch: usize,
    pub width: usize,
    pub height: usize,
    pub zbuffer: Option<ZBuffer>,
}

impl FrameTarget {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height],
            pitch: width,
            width,
            height,
            zbuffer: None,
        }
    }

    pub fn with_zbuffer(mut self) -> Self {
        self.zbuffer = Some(ZBuffer {
            depth: vec![0.0; self.width * self.height],
            pitch: self.width,
        });
        self
    }

    /// Fills the pixels with `color` and resets the depth buffer.
    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color.to_argb());
        if let Some(z) = &mut self.zbuffer {
            z.clear();
        }
    }

    /// The pixel at column `x`, row `y`; `None` outside the target.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.pitch + x).copied()
    }
}

/// Scan converts solid triangles into a [`FrameTarget`].
///
/// Flat, constant and textured faces are filled with their first lit
/// color; Gouraud faces interpolate all three. With a depth buffer present
/// pixels are depth tested on 1/z, otherwise later triangles simply paint
/// over earlier ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftRasterizer;

impl Rasterizer for SoftRasterizer {
    type Target = FrameTarget;

    fn draw_list<'a, I>(&mut self, triangles: I, target: &mut FrameTarget) -> usize
    where
        I: IntoIterator<Item = &'a Triangle>,
    {
        triangles
            .into_iter()
            .filter(|tri| fill_triangle(tri, target))
            .count()
    }
}

#[inline]
fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

fn fill_triangle(tri: &Triangle, target: &mut FrameTarget) -> bool {
    let [a, b, c] = tri.trans().map(|v| (v.position.x, v.position.y));
    let inv_z = tri.trans().map(|v| 1.0 / v.position.z);
    let area = edge(a, b, c);
    if area.abs() < f32::EPSILON || !area.is_finite() {
        return false;
    }

    let (lo_x, hi_x) = (a.0.min(b.0).min(c.0), a.0.max(b.0).max(c.0));
    let (lo_y, hi_y) = (a.1.min(b.1).min(c.1), a.1.max(b.1).max(c.1));
    if hi_x < 0.0 || hi_y < 0.0 || lo_x >= target.width as f32 || lo_y >= target.height as f32 {
        return false;
    }

    let min_x = lo_x.floor().max(0.0) as usize;
    let min_y = lo_y.floor().max(0.0) as usize;
    let max_x = (hi_x.ceil() as usize).min(target.width.saturating_sub(1));
    let max_y = (hi_y.ceil() as usize).min(target.height.saturating_sub(1));

    let colors = match tri.mode {
        ShadeMode::Gouraud => tri.lit.map(|c| c.channels().map(|v| v as f32)),
        _ => [tri.lit[0].channels().map(|v| v as f32); 3],
    };

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = (x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b, c, p) / area;
            let w1 = edge(c, a, p) / area;
            let w2 = edge(a, b, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            if let Some(z) = &mut target.zbuffer {
                let depth = w0 * inv_z[0] + w1 * inv_z[1] + w2 * inv_z[2];
                let Some(slot) = z.depth.get_mut(y * z.pitch + x) else {
                    continue;
                };
                if depth <= *slot {
                    continue;
                }
                *slot = depth;
            }

            let channel = |k: usize| (w0 * colors[0][k] + w1 * colors[1][k] + w2 * colors[2][k]) as u8;
            if let Some(px) = target.pixels.get_mut(y * target.pitch + x) {
                *px = Rgb::new(channel(0), channel(1), channel(2)).to_argb();
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;

    fn screen_tri(z: f32, color: Rgb) -> Triangle {
        // Covers the upper-left half of an 8x8 target, either winding works
        Triangle::new([
            Vertex::at(0.0, 0.0, z),
            Vertex::at(8.0, 0.0, z),
            Vertex::at(0.0, 8.0, z),
        ])
        .with_color(color)
    }

    #[test]
    fn fills_covered_pixels() {
        let mut target = FrameTarget::new(8, 8);
        target.clear(Rgb::BLACK);

        let drawn = SoftRasterizer.draw_list([&screen_tri(5.0, Rgb::gray(100))], &mut target);
        assert_eq!(drawn, 1);
        assert_eq!(target.pixel(0, 0), Some(Rgb::gray(100).to_argb()));
        assert_eq!(target.pixel(7, 7), Some(Rgb::BLACK.to_argb()));
    }

    #[test]
    fn pixel_outside_the_target_is_none() {
        let mut target = FrameTarget::new(8, 4);
        target.clear(Rgb::WHITE);
        assert_eq!(target.pixel(7, 3), Some(Rgb::WHITE.to_argb()));
        // x = 8 would land on the first pixel of the next row
        assert_eq!(target.pixel(8, 0), None);
        assert_eq!(target.pixel(0, 4), None);
    }

    #[test]
    fn zbuffer_keeps_nearest() {
        let mut target = FrameTarget::new(8, 8).with_zbuffer();
        target.clear(Rgb::BLACK);

        let near = screen_tri(2.0, Rgb::gray(200));
        let far = screen_tri(9.0, Rgb::gray(50));
        SoftRasterizer.draw_list([&near, &far], &mut target);
        assert_eq!(target.pixel(0, 0), Some(Rgb::gray(200).to_argb()));
    }

    #[test]
    fn without_zbuffer_last_wins() {
        let mut target = FrameTarget::new(8, 8);

        let near = screen_tri(2.0, Rgb::gray(200));
        let far = screen_tri(9.0, Rgb::gray(50));
        SoftRasterizer.draw_list([&near, &far], &mut target);
        assert_eq!(target.pixel(0, 0), Some(Rgb::gray(50).to_argb()));
    }

    #[test]
    fn gouraud_blends_vertex_colors() {
        let mut target = FrameTarget::new(8, 8);
        let mut tri = screen_tri(1.0, Rgb::BLACK).with_mode(ShadeMode::Gouraud);
        tri.lit = [Rgb::gray(0), Rgb::gray(240), Rgb::gray(0)];
        SoftRasterizer.draw_list([&tri], &mut target);

        let left = target.pixel(0, 3).unwrap() & 0xFF;
        let right = target.pixel(6, 0).unwrap() & 0xFF;
        assert!(right > left);
    }

    #[test]
    fn off_screen_triangle_is_not_drawn() {
        let mut target = FrameTarget::new(8, 8);
        let mut tri = screen_tri(1.0, Rgb::WHITE);
        tri.set_trans(tri.trans().map(|mut v| {
            v.position.x -= 100.0;
            v
        }));
        assert_eq!(SoftRasterizer.draw_list([&tri], &mut target), 0);
    }
}
