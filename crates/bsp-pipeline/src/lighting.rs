//! Fixed-point style diffuse lighting for flat and Gouraud shaded faces.
//!
//! Every light contributes `light[c] · base[c] · i / (256 · 128)` per
//! channel, where `i` is a 0..=128 intensity scaled from the cosine term.
//! Contributions are truncated to integers, summed over all enabled lights
//! and clamped to 255.

use nalgebra::{Point3, Vector3};
use serde::Deserialize;

use crate::triangle::AREA_EPSILON;
use crate::{FaceState, Light, LightKind, Lights, Rgb, ShadeMode, Triangle};

/// Which position/direction values of the lights are used.
///
/// Must match the space the triangles' `trans` vertices are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightSpace {
    /// `Light::position` / `Light::direction`.
    #[default]
    World,
    /// `Light::position_trans` / `Light::direction_trans`.
    Camera,
}

/// Intensity scale: a head-on light yields `i = 128`.
const INTENSITY_SCALE: f32 = 128.0;

/// Computes the lit color of a surface point.
///
/// `normal` does not need to be unit length; `normal_length` is its length.
/// A zero-length normal receives ambient light only.
pub fn shade_point<'a>(
    lights: impl IntoIterator<Item = &'a Light>,
    space: LightSpace,
    base: Rgb,
    point: &Point3<f32>,
    normal: &Vector3<f32>,
    normal_length: f32,
) -> Rgb {
    let base_c = base.channels();
    let mut sums = [0u32; 3];
    let has_normal = normal_length > AREA_EPSILON;

    for light in lights {
        if light.kind == LightKind::Ambient {
            let amb = light.ambient.channels();
            for c in 0..3 {
                sums[c] += amb[c] * base_c[c] / 256;
            }
            continue;
        }
        if !has_normal {
            continue;
        }

        let i = intensity(light, space, point, normal, normal_length);
        if !(i > 0.0) {
            continue;
        }
        let diffuse = light.diffuse.channels();
        for c in 0..3 {
            let contribution = (diffuse[c] * base_c[c]) as f32 * i / (256.0 * INTENSITY_SCALE);
            sums[c] = sums[c].saturating_add(contribution as u32);
        }
    }

    Rgb::from_sums(sums)
}

/// The `i` term of a directional light, 0 when the light does not reach
/// the surface.
fn intensity(
    light: &Light,
    space: LightSpace,
    point: &Point3<f32>,
    normal: &Vector3<f32>,
    nl: f32,
) -> f32 {
    let dir = light.direction_in(space);
    let pos = light.position_in(space);

    match light.kind {
        LightKind::Ambient => 0.0,
        LightKind::Infinite => {
            let dp = normal.dot(&dir);
            if dp > 0.0 {
                INTENSITY_SCALE * dp / nl
            } else {
                0.0
            }
        }
        LightKind::Point => {
            let l = pos - point;
            let d = l.norm();
            let dp = normal.dot(&l);
            if dp > 0.0 {
                INTENSITY_SCALE * dp / (nl * d * light.attenuation(d))
            } else {
                0.0
            }
        }
        LightKind::SpotSimple => {
            // Gated and scaled by the spot direction, not the to-light vector
            let dp = normal.dot(&dir);
            if dp > 0.0 {
                let d = (pos - point).norm();
                INTENSITY_SCALE * dp / (nl * light.attenuation(d))
            } else {
                0.0
            }
        }
        LightKind::SpotCone => {
            let dp = normal.dot(&dir);
            if dp <= 0.0 {
                return 0.0;
            }
            let s = pos - point;
            let d = s.norm();
            let Some(s) = s.try_normalize(f32::EPSILON) else {
                return 0.0;
            };
            let dpsl = s.dot(&dir);
            if dpsl <= 0.0 {
                return 0.0;
            }
            let falloff = (1..light.pf.max(1)).fold(dpsl, |acc, _| acc * dpsl);
            INTENSITY_SCALE * dp * falloff / (nl * light.attenuation(d))
        }
    }
}

/// Lights one triangle in place.
///
/// Only renderable triangles that are not yet LIT are touched. Returns
/// `true` if the triangle was lit.
pub fn light_triangle(tri: &mut Triangle, lights: &Lights, space: LightSpace) -> bool {
    if !tri.is_renderable() || tri.state.contains(FaceState::LIT) {
        return false;
    }

    match tri.mode {
        ShadeMode::Constant => tri.lit = [tri.color; 3],
        ShadeMode::Flat | ShadeMode::Textured => {
            let normal = tri.normal();
            let color = shade_point(
                lights.active(),
                space,
                tri.color,
                &tri.trans[0].position,
                &normal,
                tri.normal_length(),
            );
            tri.lit = [color; 3];
        }
        ShadeMode::Gouraud => {
            let face = tri.normal();
            let face_len = tri.normal_length();
            for k in 0..3 {
                let v = tri.trans[k];
                let (n, len) = if v.has_normal() {
                    (v.normal, 1.0)
                } else {
                    (face, face_len)
                };
                tri.lit[k] = shade_point(lights.active(), space, tri.color, &v.position, &n, len);
            }
        }
    }

    tri.state |= FaceState::LIT;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;

    /// Unit right triangle in the z = 0 plane facing -z, normal length 1.
    fn facing_minus_z(color: Rgb) -> Triangle {
        Triangle::new([
            Vertex::at(0.0, 1.0, 0.0),
            Vertex::at(1.0, 1.0, 0.0),
            Vertex::at(0.0, 0.0, 0.0),
        ])
        .with_color(color)
    }

    fn lit(tri: &mut Triangle, lights: &[Light]) -> Rgb {
        let table = Lights::from_lights(lights.iter().cloned()).unwrap();
        assert!(light_triangle(tri, &table, LightSpace::World));
        tri.lit[0]
    }

    #[test]
    fn ambient_scales_base() {
        let mut tri = facing_minus_z(Rgb::gray(200));
        assert_eq!(lit(&mut tri, &[Light::ambient(Rgb::gray(50))]), Rgb::gray(39));
        assert!(tri.state.contains(FaceState::LIT));
    }

    #[test]
    fn ambients_sum() {
        let mut tri = facing_minus_z(Rgb::gray(200));
        let lights = [Light::ambient(Rgb::gray(50)), Light::ambient(Rgb::gray(50))];
        assert_eq!(lit(&mut tri, &lights), Rgb::gray(78));
    }

    #[test]
    fn black_lights_give_black() {
        let mut tri = facing_minus_z(Rgb::WHITE);
        let lights = [
            Light::ambient(Rgb::BLACK),
            Light::infinite(Rgb::BLACK, -Vector3::z()),
            Light::point(Rgb::BLACK, Point3::new(0.0, 0.0, -5.0), [1.0, 0.0, 0.0]),
        ];
        assert_eq!(lit(&mut tri, &lights), Rgb::BLACK);
    }

    #[test]
    fn infinite_light_head_on_is_full_strength() {
        let mut tri = facing_minus_z(Rgb::gray(200));
        let color = lit(&mut tri, &[Light::infinite(Rgb::WHITE, -Vector3::z())]);
        // 255 · 200 · 128 / (256 · 128)
        assert_eq!(color, Rgb::gray(199));
    }

    #[test]
    fn lights_behind_the_face_contribute_nothing() {
        let mut tri = facing_minus_z(Rgb::WHITE);
        let lights = [
            Light::infinite(Rgb::WHITE, Vector3::z()),
            Light::infinite(Rgb::WHITE, Vector3::x()),
            Light::point(Rgb::WHITE, Point3::new(0.0, 0.0, 5.0), [1.0, 0.0, 0.0]),
            Light::spot_simple(Rgb::WHITE, Point3::new(0.0, 0.0, -5.0), Vector3::z(), [1.0, 0.0, 0.0]),
        ];
        assert_eq!(lit(&mut tri, &lights), Rgb::BLACK);
    }

    #[test]
    fn sums_clamp_to_255() {
        let mut tri = facing_minus_z(Rgb::WHITE);
        let lights = [
            Light::ambient(Rgb::WHITE),
            Light::infinite(Rgb::WHITE, -Vector3::z()),
            Light::infinite(Rgb::WHITE, -Vector3::z()),
        ];
        assert_eq!(lit(&mut tri, &lights), Rgb::WHITE);
    }

    #[test]
    fn point_light_attenuates_with_distance() {
        let mut near = facing_minus_z(Rgb::WHITE);
        let mut far = facing_minus_z(Rgb::WHITE);
        let atten = [1.0, 0.1, 0.0];
        let near_c = lit(&mut near, &[Light::point(Rgb::WHITE, Point3::new(0.0, 1.0, -1.0), atten)]);
        let far_c = lit(&mut far, &[Light::point(Rgb::WHITE, Point3::new(0.0, 1.0, -10.0), atten)]);
        assert!(near_c.r > far_c.r);
        // d = 1: i = 128 / 1.1
        assert_eq!(near_c.r, (255.0 * 255.0 / (256.0 * 1.1)) as u8);
    }

    #[test]
    fn point_light_divides_by_distance_and_attenuation() {
        let mut tri = facing_minus_z(Rgb::WHITE);
        // d = 2, attenuation 1 + 0.5·2 = 2: i = 128 · 2 / (2 · 2) = 64
        let light = Light::point(Rgb::WHITE, Point3::new(0.0, 1.0, -2.0), [1.0, 0.5, 0.0]);
        assert_eq!(lit(&mut tri, &[light]), Rgb::gray(127));
    }

    #[test]
    fn intensity_ignores_normal_length() {
        // Three times larger than `facing_minus_z`: normal length 9
        let big = || {
            Triangle::new([
                Vertex::at(0.0, 3.0, 0.0),
                Vertex::at(3.0, 3.0, 0.0),
                Vertex::at(0.0, 0.0, 0.0),
            ])
            .with_color(Rgb::gray(200))
        };
        assert!((big().normal_length() - 9.0).abs() < 1e-5);

        let infinite = Light::infinite(Rgb::WHITE, -Vector3::z());
        let mut unit = facing_minus_z(Rgb::gray(200));
        let mut scaled = big();
        assert_eq!(lit(&mut scaled, &[infinite.clone()]), lit(&mut unit, &[infinite]));
        assert_eq!(scaled.lit[0], Rgb::gray(199));

        let atten = [1.0, 0.5, 0.0];
        let mut unit = facing_minus_z(Rgb::WHITE);
        let mut scaled = big().with_color(Rgb::WHITE);
        let near_unit = Light::point(Rgb::WHITE, Point3::new(0.0, 1.0, -2.0), atten);
        let near_scaled = Light::point(Rgb::WHITE, Point3::new(0.0, 3.0, -2.0), atten);
        assert_eq!(lit(&mut scaled, &[near_scaled]), lit(&mut unit, &[near_unit]));
        assert_eq!(scaled.lit[0], Rgb::gray(127));
    }

    #[test]
    fn spot_cone_falls_off_off_axis() {
        let atten = [1.0, 0.0, 0.0];
        let mut on_axis = facing_minus_z(Rgb::WHITE);
        let mut off_axis = facing_minus_z(Rgb::WHITE);
        let straight = lit(
            &mut on_axis,
            &[Light::spot_cone(Rgb::WHITE, Point3::new(0.0, 1.0, -4.0), -Vector3::z(), atten, 4)],
        );
        let slanted = lit(
            &mut off_axis,
            &[Light::spot_cone(Rgb::WHITE, Point3::new(4.0, 1.0, -4.0), -Vector3::z(), atten, 4)],
        );
        assert_eq!(straight, Rgb::gray(254));
        // cos(45°)^4 = 0.25
        assert_eq!(slanted.r, (255.0 * 255.0 * 0.25 / 256.0) as u8);
    }

    #[test]
    fn constant_mode_bypasses_lights() {
        let mut tri = facing_minus_z(Rgb::new(10, 20, 30)).with_mode(ShadeMode::Constant);
        assert_eq!(lit(&mut tri, &[Light::ambient(Rgb::BLACK)]), Rgb::new(10, 20, 30));
    }

    #[test]
    fn gouraud_lights_each_vertex() {
        let mut tri = Triangle::new([
            Vertex::at(0.0, 1.0, 0.0).with_normal(-Vector3::z()),
            Vertex::at(1.0, 1.0, 0.0).with_normal(Vector3::z()),
            Vertex::at(0.0, 0.0, 0.0),
        ])
        .with_color(Rgb::gray(200))
        .with_mode(ShadeMode::Gouraud);

        let table = Lights::from_lights([Light::infinite(Rgb::WHITE, -Vector3::z())]).unwrap();
        assert!(light_triangle(&mut tri, &table, LightSpace::World));

        assert_eq!(tri.lit[0], Rgb::gray(199));
        assert_eq!(tri.lit[1], Rgb::BLACK);
        // No vertex normal: falls back to the face normal
        assert_eq!(tri.lit[2], Rgb::gray(199));
    }

    #[test]
    fn already_lit_or_hidden_faces_are_skipped() {
        let table = Lights::from_lights([Light::ambient(Rgb::gray(50))]).unwrap();

        let mut tri = facing_minus_z(Rgb::gray(200));
        tri.state |= FaceState::LIT;
        assert!(!light_triangle(&mut tri, &table, LightSpace::World));
        assert_eq!(tri.lit[0], Rgb::gray(200));

        let mut tri = facing_minus_z(Rgb::gray(200));
        tri.state |= FaceState::BACKFACE;
        assert!(!light_triangle(&mut tri, &table, LightSpace::World));
    }

    #[test]
    fn camera_space_uses_transformed_values() {
        let mut light = Light::infinite(Rgb::WHITE, Vector3::z());
        light.direction_trans = -Vector3::z();
        let table = Lights::from_lights([light]).unwrap();

        let mut tri = facing_minus_z(Rgb::gray(200));
        assert!(light_triangle(&mut tri, &table, LightSpace::Camera));
        assert_eq!(tri.lit[0], Rgb::gray(199));
    }
}
