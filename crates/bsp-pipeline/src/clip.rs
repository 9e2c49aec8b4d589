//! View frustum clipping of camera-space triangles.

use bitflags::bitflags;
use log::warn;

use crate::error::{RenderError, Result};
use crate::{Camera, FaceState, PolygonBuffer, Triangle, Vertex};

bitflags! {
    /// Frustum planes to clip against.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClipPlanes: u8 {
        /// Left and right planes.
        const X = 0x01;
        /// Top and bottom planes.
        const Y = 0x02;
        /// Near and far planes.
        const Z = 0x04;
    }
}

/// Counters reported by [`clip_polys`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipStats {
    pub x_rejected: usize,
    pub y_rejected: usize,
    pub far_rejected: usize,
    pub near_rejected: usize,
    /// One vertex inside the near plane: trimmed in place.
    pub trimmed: usize,
    /// Two vertices inside: trimmed in place plus one appended triangle.
    pub split: usize,
    pub degenerate: usize,
}

/// Result of clipping one triangle against the near plane.
#[derive(Debug, Clone, PartialEq)]
pub enum NearClip {
    /// All three vertices are on or beyond the near plane.
    Inside,
    /// Nothing is left; the triangle was marked CLIPPED.
    Rejected,
    /// The triangle was shrunk in place.
    Trimmed,
    /// The triangle was shrunk in place and this second triangle covers
    /// the rest of the visible part.
    Split(Triangle),
}

/// Clips `tri` against the plane `z = near`. Points with `z < near` are
/// outside.
///
/// Intersections interpolate position, texture coordinates, normals and
/// lit colors, and get their z snapped to `near`. A triangle that needs clipping but
/// has zero area or non-finite vertices is marked CLIPPED and reported as
/// `DegenerateGeometry`.
pub fn clip_near(tri: &mut Triangle, near: f32) -> Result<NearClip> {
    let inside = tri.trans.map(|v| v.position.z >= near);
    let count = inside.iter().filter(|&&i| i).count();

    match count {
        3 => return Ok(NearClip::Inside),
        0 => {
            tri.state |= FaceState::CLIPPED;
            return Ok(NearClip::Rejected);
        }
        _ => {}
    }

    if tri.is_degenerate() || !tri.trans.iter().all(Vertex::is_finite) {
        tri.state |= FaceState::CLIPPED;
        return Err(RenderError::DegenerateGeometry(
            "cannot near-clip a zero-area or non-finite triangle",
        ));
    }

    if count == 1 {
        let k = inside.iter().position(|&i| i).unwrap_or(0);
        let v_in = tri.trans[k];
        let mut verts = tri.trans;
        let mut lit = tri.lit;
        for j in [(k + 1) % 3, (k + 2) % 3] {
            let (v, t) = intersect_near(&v_in, &tri.trans[j], near);
            verts[j] = v;
            lit[j] = tri.lit[k].lerp(tri.lit[j], t);
        }
        tri.set_trans(verts);
        tri.lit = lit;

        if tri.is_degenerate() {
            tri.state |= FaceState::CLIPPED;
            return Ok(NearClip::Rejected);
        }
        return Ok(NearClip::Trimmed);
    }

    // Two inside: o is the outside vertex, a and b follow it in winding order
    let o = inside.iter().position(|&i| !i).unwrap_or(0);
    let (a, b) = ((o + 1) % 3, (o + 2) % 3);
    let [v_o, v_a, v_b] = [tri.trans[o], tri.trans[a], tri.trans[b]];
    let (i01, t01) = intersect_near(&v_a, &v_o, near);
    let (i02, t02) = intersect_near(&v_b, &v_o, near);
    let [lit_o, lit_a, lit_b] = [tri.lit[o], tri.lit[a], tri.lit[b]];
    let lit01 = lit_a.lerp(lit_o, t01);
    let lit02 = lit_b.lerp(lit_o, t02);

    let mut second = tri.clone();
    let mut verts = tri.trans;
    verts[o] = i01;
    tri.set_trans(verts);
    tri.lit[o] = lit01;

    // i02, i01, b keeps the winding of the original
    let mut tail = [Vertex::default(); 3];
    tail[o] = i02;
    tail[a] = i01;
    tail[b] = v_b;
    second.local = tail;
    second.set_trans(tail);
    second.lit[o] = lit02;
    second.lit[a] = lit01;
    second.lit[b] = lit_b;

    if tri.is_degenerate() {
        tri.state |= FaceState::CLIPPED;
    }
    if second.is_degenerate() {
        return Ok(if tri.state.contains(FaceState::CLIPPED) {
            NearClip::Rejected
        } else {
            NearClip::Trimmed
        });
    }
    Ok(NearClip::Split(second))
}

/// Point on the edge from `inside` to `outside` where `z = near`, and its
/// parameter along that edge.
fn intersect_near(inside: &Vertex, outside: &Vertex, near: f32) -> (Vertex, f32) {
    let t = (near - inside.position.z) / (outside.position.z - inside.position.z);
    let mut v = inside.lerp(outside, t);
    v.position.z = near;
    (v, t)
}

/// True when all three values are beyond the same side of `±limit`.
fn all_beyond(tri: &Triangle, coord: impl Fn(&Vertex) -> (f32, f32)) -> bool {
    let sides = tri.trans.map(|v| {
        let (value, limit) = coord(&v);
        (value > limit, value < -limit)
    });
    sides.iter().all(|s| s.0) || sides.iter().all(|s| s.1)
}

/// Clips every renderable triangle of `buffer` against the selected planes.
///
/// Triangles appended by near-plane splits are not revisited in the same
/// pass. The pass always runs to the end; the first error encountered is
/// returned once it is done.
pub fn clip_polys(buffer: &mut PolygonBuffer, camera: &Camera, planes: ClipPlanes) -> (ClipStats, Result<()>) {
    let mut stats = ClipStats::default();
    let mut first_error: Option<RenderError> = None;
    let x_slope = camera.x_slope();
    let y_slope = camera.y_slope();

    let end = buffer.len();
    for idx in 0..end {
        let Some(tri) = buffer.get_mut(idx) else {
            break;
        };
        if !tri.is_renderable() {
            continue;
        }

        if planes.contains(ClipPlanes::X)
            && all_beyond(tri, |v| (v.position.x, x_slope * v.position.z))
        {
            tri.state |= FaceState::CLIPPED;
            stats.x_rejected += 1;
            continue;
        }
        if planes.contains(ClipPlanes::Y)
            && all_beyond(tri, |v| (v.position.y, y_slope * v.position.z))
        {
            tri.state |= FaceState::CLIPPED;
            stats.y_rejected += 1;
            continue;
        }
        if !planes.contains(ClipPlanes::Z) {
            continue;
        }
        if tri.trans.iter().all(|v| v.position.z > camera.far_z()) {
            tri.state |= FaceState::CLIPPED;
            stats.far_rejected += 1;
            continue;
        }

        let appended = match clip_near(tri, camera.near_z()) {
            Ok(NearClip::Inside) => None,
            Ok(NearClip::Rejected) => {
                stats.near_rejected += 1;
                None
            }
            Ok(NearClip::Trimmed) => {
                stats.trimmed += 1;
                None
            }
            Ok(NearClip::Split(second)) => {
                stats.split += 1;
                Some(second)
            }
            Err(err) => {
                stats.degenerate += 1;
                first_error.get_or_insert(err);
                None
            }
        };

        if let Some(second) = appended {
            if let Err(err) = buffer.insert(second) {
                warn!("dropping near-plane split of triangle {idx}: {err}");
                first_error.get_or_insert(err);
            }
        }
    }

    (stats, first_error.map_or(Ok(()), Err))
}
