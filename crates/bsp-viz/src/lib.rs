//! Shared utilities for the interactive pipeline viewer.

use bsp_pipeline::config::CameraConfig;
use bsp_pipeline::{Camera, FrameTarget};
use macroquad::prelude::*;
use nalgebra::{Point3, Vector3};

pub mod navigator;
pub use navigator::TreeNavigator;

/// Converts packed `0xAARRGGBB` pixels into RGBA bytes.
pub fn argb_to_rgba(pixels: &[u32], bytes: &mut Vec<u8>) {
    bytes.clear();
    bytes.extend(pixels.iter().flat_map(|&p| {
        let [a, r, g, b] = p.to_be_bytes();
        [r, g, b, a]
    }));
}

/// A macroquad texture mirroring a [`FrameTarget`].
pub struct ScreenTexture {
    texture: Texture2D,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl ScreenTexture {
    pub fn new(width: u32, height: u32) -> Self {
        let bytes = vec![0; (width * height * 4) as usize];
        let texture = Texture2D::from_rgba8(width as u16, height as u16, &bytes);
        texture.set_filter(FilterMode::Nearest);
        Self {
            texture,
            bytes,
            width,
            height,
        }
    }

    /// Copies the target's pixels into the texture.
    pub fn upload(&mut self, target: &FrameTarget) {
        argb_to_rgba(&target.pixels, &mut self.bytes);
        self.texture
            .update_from_bytes(self.width, self.height, &self.bytes);
    }

    /// Draws the texture stretched over the window. Returns the scale from
    /// frame pixels to window pixels.
    pub fn draw(&self) -> Vec2 {
        let size = vec2(screen_width(), screen_height());
        draw_texture_ex(
            &self.texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(size),
                ..Default::default()
            },
        );
        size / vec2(self.width as f32, self.height as f32)
    }
}

/// First person camera flying through the level.
pub struct FlyCamera {
    pub position: Point3<f32>,
    /// Radians around +y, 0 looking down +z.
    pub yaw: f32,
    pub pitch: f32,
    /// Units per second.
    pub speed: f32,
    /// Radians per second.
    pub turn_speed: f32,
}

impl FlyCamera {
    pub fn new(position: Point3<f32>, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            speed: 8.0,
            turn_speed: 1.8,
        }
    }

    /// Starts where the scene's camera stands, looking at its target.
    pub fn from_config(config: &CameraConfig) -> Self {
        let position = Point3::from(config.position);
        let dir = Point3::from(config.target) - position;
        let yaw = dir.x.atan2(dir.z);
        let pitch = dir.y.atan2(dir.xz().norm());
        Self::new(position, yaw, pitch)
    }

    pub fn forward(&self) -> Vector3<f32> {
        Vector3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        )
    }

    /// Right-hand side as seen by the viewer, on the ground plane.
    pub fn right(&self) -> Vector3<f32> {
        Vector3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Arrow keys turn, W/S move, A/D strafe, Q/E rise and sink.
    pub fn update(&mut self, dt: f32) {
        let turn = self.turn_speed * dt;
        if is_key_down(KeyCode::Left) {
            self.yaw -= turn;
        }
        if is_key_down(KeyCode::Right) {
            self.yaw += turn;
        }
        if is_key_down(KeyCode::Up) {
            self.pitch += turn;
        }
        if is_key_down(KeyCode::Down) {
            self.pitch -= turn;
        }
        self.pitch = self.pitch.clamp(-1.4, 1.4);

        let step = self.speed * dt;
        let flat = Vector3::new(self.yaw.sin(), 0.0, self.yaw.cos());
        if is_key_down(KeyCode::W) {
            self.position += flat * step;
        }
        if is_key_down(KeyCode::S) {
            self.position -= flat * step;
        }
        if is_key_down(KeyCode::D) {
            self.position += self.right() * step;
        }
        if is_key_down(KeyCode::A) {
            self.position -= self.right() * step;
        }
        if is_key_down(KeyCode::Q) {
            self.position.y += step;
        }
        if is_key_down(KeyCode::E) {
            self.position.y -= step;
        }
    }

    /// The pipeline camera for this frame, with the lens settings from
    /// `config`.
    pub fn camera(&self, config: &CameraConfig) -> Camera {
        let [w, h] = config.viewport;
        Camera::looking(
            self.position,
            self.forward(),
            config.fov,
            config.near,
            config.far,
            (w, h),
        )
    }
}
