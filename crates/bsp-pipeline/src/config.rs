//! Scene description files.
//!
//! A scene is a TOML document with four optional tables:
//!
//! ```toml
//! [pipeline]
//! traversal = "frustum_cull"
//! sort = "average_z"
//!
//! [camera]
//! position = [0.0, 1.5, -20.0]
//! target = [0.0, 1.5, 0.0]
//!
//! [[lights]]
//! kind = "ambient"
//! color = [40, 40, 40]
//!
//! [[walls]]
//! start = [-10.0, 5.0]
//! end = [10.0, 5.0]
//! top = 3.0
//! color = [200, 60, 60]
//!
//! [[objects]]
//! position = [0.0, 1.0, 0.0]
//! size = 2.0
//! ```
//!
//! Every field has a default, so an empty document is a valid (empty) scene.

use std::path::{Path, PathBuf};

use nalgebra::{Point2, Point3, Vector3};
use serde::Deserialize;
use thiserror::Error;

use crate::bsp::TraversalMode;
use crate::error::RenderError;
use crate::{
    Camera, ClipPlanes, Light, LightKind, Lights, Object, Rgb, ShadeMode, SortMode, Wall,
    DEFAULT_CAPACITY,
};

/// Errors raised while loading a scene.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// A light kind that needs a position or direction was given none.
    #[error("light {index} ({kind:?}) is missing `{field}`")]
    MissingField {
        index: usize,
        kind: LightKind,
        field: &'static str,
    },
}

/// Which stages [`Pipeline::run_frame`](crate::Pipeline::run_frame) runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Triangle slots in the polygon buffer.
    pub capacity: usize,
    pub traversal: TraversalMode,
    pub remove_backfaces: bool,
    pub lighting: bool,
    /// Bounding sphere test for objects before they enter the buffer.
    pub cull_objects: bool,
    pub clip_xy: bool,
    pub clip_z: bool,
    /// Depth sort applied when the frame holds more than BSP-ordered walls.
    /// `None` disables sorting.
    pub sort: Option<SortMode>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            traversal: TraversalMode::default(),
            remove_backfaces: true,
            lighting: true,
            cull_objects: true,
            clip_xy: true,
            clip_z: true,
            sort: Some(SortMode::default()),
        }
    }
}

impl PipelineConfig {
    pub fn clip_planes(&self) -> ClipPlanes {
        let mut planes = ClipPlanes::empty();
        if self.clip_xy {
            planes |= ClipPlanes::X | ClipPlanes::Y;
        }
        if self.clip_z {
            planes |= ClipPlanes::Z;
        }
        planes
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Horizontal field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: [u32; 2],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.5, -20.0],
            target: [0.0, 1.5, 0.0],
            fov: 90.0,
            near: 0.5,
            far: 500.0,
            viewport: [640, 480],
        }
    }
}

impl CameraConfig {
    pub fn camera(&self) -> Camera {
        let [w, h] = self.viewport;
        Camera::look_at(
            Point3::from(self.position),
            Point3::from(self.target),
            self.fov,
            self.near,
            self.far,
            (w, h),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LightConfig {
    pub kind: LightKind,
    pub color: [u8; 3],
    #[serde(default)]
    pub position: Option<[f32; 3]>,
    /// From the lit surface toward the light.
    #[serde(default)]
    pub direction: Option<[f32; 3]>,
    #[serde(default = "default_attenuation")]
    pub attenuation: [f32; 3],
    #[serde(default = "default_pf")]
    pub pf: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_attenuation() -> [f32; 3] {
    [1.0, 0.0, 0.0]
}
fn default_pf() -> u32 {
    1
}
fn default_true() -> bool {
    true
}

impl LightConfig {
    /// Builds the light; `index` only labels errors.
    pub fn light(&self, index: usize) -> Result<Light, ConfigError> {
        let missing = |field| ConfigError::MissingField {
            index,
            kind: self.kind,
            field,
        };
        let position = || self.position.map(Point3::from).ok_or_else(|| missing("position"));
        let direction = || self.direction.map(Vector3::from).ok_or_else(|| missing("direction"));
        let color = Rgb::from(self.color);

        let mut light = match self.kind {
            LightKind::Ambient => Light::ambient(color),
            LightKind::Infinite => Light::infinite(color, direction()?),
            LightKind::Point => Light::point(color, position()?, self.attenuation),
            LightKind::SpotSimple => {
                Light::spot_simple(color, position()?, direction()?, self.attenuation)
            }
            LightKind::SpotCone => {
                Light::spot_cone(color, position()?, direction()?, self.attenuation, self.pf)
            }
        };
        light.enabled = self.enabled;
        Ok(light)
    }
}

/// A vertical wall standing on the floor plan segment `start`..`end`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WallConfig {
    /// Floor plan coordinates, `[x, z]`.
    pub start: [f32; 2],
    pub end: [f32; 2],
    #[serde(default)]
    pub bottom: f32,
    #[serde(default = "default_wall_top")]
    pub top: f32,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    #[serde(default)]
    pub mode: ShadeMode,
    /// Defaults to the wall's position in the list, starting at 1.
    #[serde(default)]
    pub id: Option<u32>,
}

fn default_wall_top() -> f32 {
    3.0
}
fn default_color() -> [u8; 3] {
    [255, 255, 255]
}

impl WallConfig {
    pub fn wall(&self, index: usize) -> Wall {
        let id = self.id.unwrap_or(index as u32 + 1);
        Wall::vertical(
            id,
            Point2::from(self.start),
            Point2::from(self.end),
            self.bottom,
            self.top,
        )
        .with_color(Rgb::from(self.color))
        .with_mode(self.mode)
    }
}

/// A cube placed in the level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_size")]
    pub size: f32,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    #[serde(default)]
    pub smooth: bool,
}

fn default_size() -> f32 {
    1.0
}

impl ObjectConfig {
    pub fn object(&self, id: u32) -> Object {
        let name = self.name.clone().unwrap_or_else(|| format!("cube{id}"));
        let mut object = Object::cube(id, name, self.size, Rgb::from(self.color))
            .at(Point3::from(self.position));
        if self.smooth {
            object.compute_vertex_normals();
            object.set_shade_mode(ShadeMode::Gouraud);
        }
        object
    }
}

/// A complete scene file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub pipeline: PipelineConfig,
    pub camera: CameraConfig,
    pub lights: Vec<LightConfig>,
    pub walls: Vec<WallConfig>,
    pub objects: Vec<ObjectConfig>,
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn camera(&self) -> Camera {
        self.camera.camera()
    }

    /// Fills the light table in file order. More than
    /// [`MAX_LIGHTS`](crate::MAX_LIGHTS) lights is an error.
    pub fn lights(&self) -> Result<Lights, ConfigError> {
        let lights = self
            .lights
            .iter()
            .enumerate()
            .map(|(i, l)| l.light(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Lights::from_lights(lights)?)
    }

    pub fn walls(&self) -> Vec<Wall> {
        self.walls
            .iter()
            .enumerate()
            .map(|(i, w)| w.wall(i))
            .collect()
    }

    /// Objects get ids after the highest wall id so triangle tags stay
    /// unambiguous.
    pub fn objects(&self) -> Vec<Object> {
        let first = self
            .walls()
            .iter()
            .map(|w| w.id)
            .max()
            .unwrap_or(0)
            + 1;
        self.objects
            .iter()
            .zip(first..)
            .map(|(o, id)| o.object(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
        [pipeline]
        traversal = "skip_backfaces"
        clip_xy = false
        sort = "far_z"

        [camera]
        position = [0.0, 0.0, -10.0]
        target = [0.0, 0.0, 0.0]
        viewport = [320, 200]

        [[lights]]
        kind = "ambient"
        color = [50, 50, 50]

        [[lights]]
        kind = "point"
        color = [255, 255, 255]
        position = [0.0, 5.0, 0.0]
        attenuation = [1.0, 0.1, 0.0]

        [[walls]]
        start = [-5.0, 0.0]
        end = [5.0, 0.0]
        color = [200, 0, 0]

        [[walls]]
        id = 40
        start = [5.0, 0.0]
        end = [5.0, 5.0]
        mode = "gouraud"

        [[objects]]
        position = [0.0, 1.0, 2.0]
        size = 0.5
    "#;

    #[test]
    fn empty_document_uses_defaults() {
        let scene = SceneConfig::from_toml_str("").unwrap();
        assert_eq!(scene, SceneConfig::default());
        assert_eq!(scene.pipeline.capacity, DEFAULT_CAPACITY);
        assert_eq!(scene.pipeline.clip_planes(), ClipPlanes::all());
        assert!(scene.lights().unwrap().is_empty());
        assert!(scene.walls().is_empty());
    }

    #[test]
    fn parses_full_scene() {
        let scene = SceneConfig::from_toml_str(SCENE).unwrap();

        assert_eq!(scene.pipeline.traversal, TraversalMode::SkipBackfaces);
        assert_eq!(scene.pipeline.sort, Some(SortMode::FarZ));
        assert_eq!(scene.pipeline.clip_planes(), ClipPlanes::Z);
        assert!(scene.pipeline.lighting);

        let camera = scene.camera();
        assert_eq!(camera.position(), Point3::new(0.0, 0.0, -10.0));
        assert_eq!(camera.viewport_width(), 320.0);

        let lights = scene.lights().unwrap();
        assert_eq!(lights.len(), 2);
        assert_eq!(lights.get(1).unwrap().kind, LightKind::Point);
        assert!((lights.get(1).unwrap().kl - 0.1).abs() < 1e-6);

        let walls = scene.walls();
        assert_eq!(walls[0].id, 1);
        assert_eq!(walls[0].color, Rgb::new(200, 0, 0));
        assert_eq!(walls[1].id, 40);
        assert_eq!(walls[1].mode, ShadeMode::Gouraud);

        let objects = scene.objects();
        assert_eq!(objects[0].id, 41);
        assert_eq!(objects[0].world_pos, Point3::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn light_without_position_is_rejected() {
        let scene = SceneConfig::from_toml_str(
            r#"
            [[lights]]
            kind = "spot_cone"
            color = [1, 2, 3]
            direction = [0.0, -1.0, 0.0]
            "#,
        )
        .unwrap();
        assert!(matches!(
            scene.lights(),
            Err(ConfigError::MissingField { index: 0, field: "position", .. })
        ));
    }

    #[test]
    fn too_many_lights() {
        let toml = "[[lights]]\nkind = \"ambient\"\ncolor = [1, 1, 1]\n".repeat(9);
        let scene = SceneConfig::from_toml_str(&toml).unwrap();
        assert!(matches!(
            scene.lights(),
            Err(ConfigError::Render(RenderError::InvalidLightIndex(8)))
        ));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            SceneConfig::from_toml_str("[pipeline]\ntraversal = \"sideways\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SceneConfig::load("/nonexistent/scene.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scene.toml"));
    }
}
