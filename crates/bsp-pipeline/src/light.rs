//! Light sources and the fixed-slot light table.

use nalgebra::{Matrix4, Point3, Vector3};
use serde::Deserialize;

use crate::error::{RenderError, Result};
use crate::lighting::LightSpace;
use crate::{Rgb, TransformMode};

/// Number of light slots in a [`Lights`] table.
pub const MAX_LIGHTS: usize = 8;

/// The shape of a light's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    /// Uniform light from everywhere.
    Ambient,
    /// Parallel rays from infinitely far away.
    Infinite,
    /// Radiates in all directions from a position, attenuated by distance.
    Point,
    /// Directional spot attenuated by distance, without a cone falloff.
    SpotSimple,
    /// Spot with a falloff of `cos(angle)^pf` around its direction.
    SpotCone,
}

/// A single light source.
///
/// Positions and directions exist twice: the values the light was created
/// with and the `*_trans` values produced by [`Lights::transform`].
/// Directions are unit vectors pointing from the lit surface toward the
/// light.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub enabled: bool,
    pub ambient: Rgb,
    pub diffuse: Rgb,
    pub specular: Rgb,
    pub position: Point3<f32>,
    pub position_trans: Point3<f32>,
    pub direction: Vector3<f32>,
    pub direction_trans: Vector3<f32>,
    /// Constant, linear and quadratic attenuation.
    pub kc: f32,
    pub kl: f32,
    pub kq: f32,
    /// Spot cone angles in degrees.
    pub spot_inner: f32,
    pub spot_outer: f32,
    /// Spot falloff exponent.
    pub pf: u32,
}

impl Light {
    fn with_kind(kind: LightKind) -> Self {
        Self {
            kind,
            enabled: true,
            ambient: Rgb::BLACK,
            diffuse: Rgb::BLACK,
            specular: Rgb::BLACK,
            position: Point3::origin(),
            position_trans: Point3::origin(),
            direction: Vector3::y(),
            direction_trans: Vector3::y(),
            kc: 1.0,
            kl: 0.0,
            kq: 0.0,
            spot_inner: 0.0,
            spot_outer: 0.0,
            pf: 1,
        }
    }

    pub fn ambient(color: Rgb) -> Self {
        Self {
            ambient: color,
            ..Self::with_kind(LightKind::Ambient)
        }
    }

    /// A directional light shining from `direction` (surface toward light).
    pub fn infinite(color: Rgb, direction: Vector3<f32>) -> Self {
        Self::with_kind(LightKind::Infinite)
            .with_diffuse(color)
            .with_direction(direction)
    }

    pub fn point(color: Rgb, position: Point3<f32>, attenuation: [f32; 3]) -> Self {
        Self::with_kind(LightKind::Point)
            .with_diffuse(color)
            .with_position(position)
            .with_attenuation(attenuation)
    }

    pub fn spot_simple(
        color: Rgb,
        position: Point3<f32>,
        direction: Vector3<f32>,
        attenuation: [f32; 3],
    ) -> Self {
        Self::with_kind(LightKind::SpotSimple)
            .with_diffuse(color)
            .with_position(position)
            .with_direction(direction)
            .with_attenuation(attenuation)
    }

    pub fn spot_cone(
        color: Rgb,
        position: Point3<f32>,
        direction: Vector3<f32>,
        attenuation: [f32; 3],
        pf: u32,
    ) -> Self {
        Self {
            pf,
            ..Self::with_kind(LightKind::SpotCone)
                .with_diffuse(color)
                .with_position(position)
                .with_direction(direction)
                .with_attenuation(attenuation)
        }
    }

    pub fn with_diffuse(mut self, color: Rgb) -> Self {
        self.diffuse = color;
        self
    }

    pub fn with_specular(mut self, color: Rgb) -> Self {
        self.specular = color;
        self
    }

    /// Sets both the local and the transformed position.
    pub fn with_position(mut self, position: Point3<f32>) -> Self {
        self.position = position;
        self.position_trans = position;
        self
    }

    /// Sets both the local and the transformed direction (normalized here).
    pub fn with_direction(mut self, direction: Vector3<f32>) -> Self {
        let unit = direction.try_normalize(f32::EPSILON).unwrap_or(direction);
        self.direction = unit;
        self.direction_trans = unit;
        self
    }

    pub fn with_attenuation(mut self, [kc, kl, kq]: [f32; 3]) -> Self {
        self.kc = kc;
        self.kl = kl;
        self.kq = kq;
        self
    }

    pub fn with_spot_angles(mut self, inner: f32, outer: f32) -> Self {
        self.spot_inner = inner;
        self.spot_outer = outer;
        self
    }

    #[inline]
    pub fn position_in(&self, space: LightSpace) -> Point3<f32> {
        match space {
            LightSpace::World => self.position,
            LightSpace::Camera => self.position_trans,
        }
    }

    #[inline]
    pub fn direction_in(&self, space: LightSpace) -> Vector3<f32> {
        match space {
            LightSpace::World => self.direction,
            LightSpace::Camera => self.direction_trans,
        }
    }

    /// `kc + kl·d + kq·d²`
    #[inline]
    pub fn attenuation(&self, d: f32) -> f32 {
        self.kc + self.kl * d + self.kq * d * d
    }

    /// Applies `m` to position and direction, choosing source and
    /// destination by `mode`.
    pub fn transform(&mut self, m: &Matrix4<f32>, mode: TransformMode) {
        mode.apply_with(&mut self.position, &mut self.position_trans, |p| {
            m.transform_point(p)
        });
        mode.apply_with(&mut self.direction, &mut self.direction_trans, |d| {
            let v = m.transform_vector(d);
            v.try_normalize(f32::EPSILON).unwrap_or(v)
        });
    }
}

/// A fixed table of [`MAX_LIGHTS`] light slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lights {
    slots: [Option<Light>; MAX_LIGHTS],
}

impl Lights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from up to [`MAX_LIGHTS`] lights, filling slots in order.
    pub fn from_lights(lights: impl IntoIterator<Item = Light>) -> Result<Self> {
        let mut table = Self::new();
        for (index, light) in lights.into_iter().enumerate() {
            table.set(index, light)?;
        }
        Ok(table)
    }

    fn check(index: usize) -> Result<()> {
        if index < MAX_LIGHTS {
            Ok(())
        } else {
            Err(RenderError::InvalidLightIndex(index))
        }
    }

    /// Puts `light` into slot `index`, replacing whatever was there.
    pub fn set(&mut self, index: usize, light: Light) -> Result<()> {
        Self::check(index)?;
        self.slots[index] = Some(light);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Empties slot `index`, returning the light it held.
    pub fn remove(&mut self, index: usize) -> Result<Option<Light>> {
        Self::check(index)?;
        Ok(self.slots[index].take())
    }

    /// Turns the light in slot `index` on or off.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<()> {
        Self::check(index)?;
        let light = self.slots[index]
            .as_mut()
            .ok_or(RenderError::InvalidLightIndex(index))?;
        light.enabled = enabled;
        Ok(())
    }

    /// Occupied slots, enabled or not.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enabled lights in slot order.
    pub fn active(&self) -> impl Iterator<Item = &Light> {
        self.slots.iter().flatten().filter(|l| l.enabled)
    }

    /// Transforms every light, e.g. with the world to camera matrix before
    /// lighting in camera space.
    pub fn transform(&mut self, m: &Matrix4<f32>, mode: TransformMode) {
        for light in self.slots.iter_mut().flatten() {
            light.transform(m, mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_bounded() {
        let mut lights = Lights::new();
        assert!(lights.set(7, Light::ambient(Rgb::gray(10))).is_ok());
        assert_eq!(
            lights.set(MAX_LIGHTS, Light::ambient(Rgb::gray(10))),
            Err(RenderError::InvalidLightIndex(MAX_LIGHTS))
        );
        assert!(lights.get(MAX_LIGHTS).is_none());
        assert_eq!(lights.len(), 1);
    }

    #[test]
    fn disabled_lights_are_not_active() {
        let mut lights = Lights::from_lights([
            Light::ambient(Rgb::gray(10)),
            Light::infinite(Rgb::WHITE, Vector3::y()),
        ])
        .unwrap();
        lights.set_enabled(0, false).unwrap();

        let active: Vec<_> = lights.active().map(|l| l.kind).collect();
        assert_eq!(active, vec![LightKind::Infinite]);
        assert!(lights.set_enabled(5, true).is_err());
    }

    #[test]
    fn remove_empties_slot() {
        let mut lights = Lights::from_lights([Light::ambient(Rgb::gray(10))]).unwrap();
        assert!(lights.remove(0).unwrap().is_some());
        assert!(lights.is_empty());
        assert!(lights.remove(0).unwrap().is_none());
    }

    #[test]
    fn too_many_lights() {
        let many = (0..=MAX_LIGHTS).map(|_| Light::ambient(Rgb::BLACK));
        assert!(Lights::from_lights(many).is_err());
    }

    #[test]
    fn transform_fills_trans_variants() {
        let mut lights = Lights::from_lights([Light::spot_cone(
            Rgb::WHITE,
            Point3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 0.0, 2.0),
            [1.0, 0.0, 0.0],
            3,
        )])
        .unwrap();

        let m = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 10.0));
        lights.transform(&m, TransformMode::LocalToTrans);

        let light = lights.get(0).unwrap();
        assert_eq!(light.kind, LightKind::SpotCone);
        assert_eq!(light.pf, 3);
        assert_eq!(light.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(light.position_trans, Point3::new(1.0, 2.0, 13.0));
        // Directions ignore translation and stay unit length
        assert!((light.direction_trans - Vector3::z()).norm() < 1e-6);
        assert_eq!(light.position_in(LightSpace::Camera), light.position_trans);
    }

    #[test]
    fn attenuation_polynomial() {
        let light = Light::point(Rgb::WHITE, Point3::origin(), [1.0, 0.5, 0.25]);
        assert!((light.attenuation(2.0) - 3.0).abs() < 1e-6);
    }
}
