//! Per-frame control flow from level and objects to rasterizer.

use log::{debug, warn};

use crate::bsp::{BspTree, TraversalStats};
use crate::clip::ClipStats;
use crate::config::PipelineConfig;
use crate::error::RenderError;
use crate::raster::Rasterizer;
use crate::{Camera, Lights, Object, PolygonBuffer, TransformMode, VertexSource};

/// Everything drawn in one frame.
pub struct Scene<'a> {
    pub camera: &'a Camera,
    pub lights: &'a Lights,
    pub level: Option<&'a BspTree>,
    /// Per-frame object state (culling, world-space vertices) is written
    /// back into these.
    pub objects: &'a mut [Object],
}

/// What happened during [`Pipeline::run_frame`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub traversal: TraversalStats,
    pub objects_inserted: usize,
    pub objects_culled: usize,
    pub backfaces: usize,
    pub lit: usize,
    pub clip: ClipStats,
    pub sorted: bool,
    pub drawn: usize,
    /// Non-fatal errors; the frame was still rendered with what survived.
    pub issues: Vec<RenderError>,
}

impl FrameStats {
    fn record(&mut self, err: RenderError) {
        warn!("frame degraded: {err}");
        self.issues.push(err);
    }
}

/// Owns the polygon buffer and runs the geometry stages over it.
#[derive(Debug, Clone)]
pub struct Pipeline {
    buffer: PolygonBuffer,
    config: PipelineConfig,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            buffer: PolygonBuffer::with_capacity(config.capacity),
            config,
        }
    }

    /// The buffer as left by the last frame, in screen space.
    #[inline]
    pub fn buffer(&self) -> &PolygonBuffer {
        &self.buffer
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Changes the stage switches. A new capacity reallocates the buffer.
    pub fn set_config(&mut self, config: PipelineConfig) {
        if config.capacity != self.buffer.capacity() {
            self.buffer = PolygonBuffer::with_capacity(config.capacity);
        }
        self.config = config;
    }

    /// Renders one frame.
    ///
    /// 1. reset the buffer
    /// 2. traverse the level back-to-front into the buffer
    /// 3. move objects to world space, cull them and append their faces
    /// 4. remove backfaces, light (world space)
    /// 5. world to camera, clip
    /// 6. depth sort when the buffer holds more than BSP-ordered walls
    /// 7. project to screen and hand the list to `rasterizer`
    pub fn run_frame<R: Rasterizer>(
        &mut self,
        scene: Scene<'_>,
        rasterizer: &mut R,
        target: &mut R::Target,
    ) -> FrameStats {
        let Scene {
            camera,
            lights,
            level,
            objects,
        } = scene;
        let mut stats = FrameStats::default();

        self.buffer.reset();

        if let Some(tree) = level {
            match tree.traverse_with(self.config.traversal, camera, &mut self.buffer) {
                Ok(traversal) => stats.traversal = traversal,
                Err(err) => stats.record(err),
            }
        }

        let planes = self.config.clip_planes();
        for object in objects.iter_mut() {
            object.reset();
            if self.config.cull_objects && object.cull(camera, planes) {
                stats.objects_culled += 1;
                continue;
            }
            object.model_to_world(TransformMode::LocalToTrans);
            match self.buffer.insert_object(object, VertexSource::Trans) {
                Ok(0) => {}
                Ok(_) => stats.objects_inserted += 1,
                Err(err) => stats.record(err),
            }
        }

        if self.config.remove_backfaces {
            stats.backfaces = self.buffer.remove_backfaces(camera);
        }
        if self.config.lighting {
            stats.lit = self.buffer.light_world(lights);
        }

        self.buffer.world_to_camera(camera);
        let (clip, result) = self.buffer.clip_polys(camera, planes);
        stats.clip = clip;
        if let Err(err) = result {
            stats.record(err);
        }

        // BSP output is already back-to-front; only mixed frames need a sort
        if let Some(mode) = self.config.sort {
            if stats.objects_inserted > 0 || level.is_none() {
                self.buffer.sort(mode);
                stats.sorted = true;
            }
        }

        self.buffer.camera_to_perspective(camera);
        self.buffer.perspective_to_screen(camera);
        stats.drawn = self.buffer.render(rasterizer, target);

        debug!(
            "frame: {} triangles, {} drawn, {} issues",
            self.buffer.len(),
            stats.drawn,
            stats.issues.len()
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::TraversalMode;
    use crate::{FrameTarget, Light, ObjectPoly, Rgb, SoftRasterizer, Vertex, Wall};
    use nalgebra::{Point2, Point3};

    /// Unit quad at the origin facing -z.
    fn quad() -> Object {
        let vertices = vec![
            Vertex::at(-0.5, 0.5, 0.0),
            Vertex::at(0.5, 0.5, 0.0),
            Vertex::at(0.5, -0.5, 0.0),
            Vertex::at(-0.5, -0.5, 0.0),
        ];
        let gray = Rgb::gray(200);
        let polys = vec![
            ObjectPoly::new([0, 1, 3]).with_color(gray),
            ObjectPoly::new([1, 2, 3]).with_color(gray),
        ];
        Object::new(1, "quad", vertices, polys).unwrap()
    }

    fn camera() -> Camera {
        Camera::look_at(
            Point3::new(0.0, 0.0, -10.0),
            Point3::origin(),
            90.0,
            1.0,
            100.0,
            (400, 400),
        )
    }

    fn ambient(level: u8) -> Lights {
        Lights::from_lights([Light::ambient(Rgb::gray(level))]).unwrap()
    }

    #[test]
    fn quad_under_ambient_light() {
        let cam = camera();
        let lights = ambient(50);
        let mut objects = vec![quad()];
        let mut target = FrameTarget::new(400, 400).with_zbuffer();
        target.clear(Rgb::BLACK);

        let mut pipeline = Pipeline::default();
        let stats = pipeline.run_frame(
            Scene {
                camera: &cam,
                lights: &lights,
                level: None,
                objects: &mut objects,
            },
            &mut SoftRasterizer,
            &mut target,
        );

        assert!(stats.issues.is_empty());
        assert_eq!(stats.objects_inserted, 1);
        assert_eq!(stats.backfaces, 0);
        assert_eq!(stats.lit, 2);
        assert_eq!(stats.clip, ClipStats::default());
        assert!(stats.sorted);
        assert_eq!(stats.drawn, 2);

        // Both halves sit at the same depth, so sorting keeps their order
        assert_eq!(pipeline.buffer().order(), &[0, 1]);
        for tri in pipeline.buffer().visible() {
            assert_eq!(tri.lit[0], Rgb::gray(39));
        }
        assert_eq!(target.pixel(200, 200), Some(Rgb::gray(39).to_argb()));
        assert_eq!(target.pixel(0, 0), Some(Rgb::BLACK.to_argb()));
    }

    #[test]
    fn culled_object_is_counted_not_drawn() {
        let cam = camera();
        let lights = ambient(50);
        let mut objects = vec![quad().at(Point3::new(0.0, 0.0, -30.0))];
        let mut target = FrameTarget::new(400, 400);

        let stats = Pipeline::default().run_frame(
            Scene {
                camera: &cam,
                lights: &lights,
                level: None,
                objects: &mut objects,
            },
            &mut SoftRasterizer,
            &mut target,
        );
        assert_eq!(stats.objects_culled, 1);
        assert_eq!(stats.drawn, 0);
        assert!(objects[0].state.contains(crate::ObjectState::CULLED));
    }

    #[test]
    fn level_only_frame_is_not_sorted() {
        let walls = vec![
            Wall::vertical(1, Point2::new(-2.0, 5.0), Point2::new(2.0, 5.0), -1.0, 1.0),
            Wall::vertical(2, Point2::new(-2.0, 8.0), Point2::new(2.0, 8.0), -1.0, 1.0),
        ];
        let tree = BspTree::from_walls(walls).unwrap();
        let cam = camera();
        let lights = ambient(255);
        let mut target = FrameTarget::new(400, 400);

        let mut pipeline = Pipeline::new(PipelineConfig {
            traversal: TraversalMode::Ordered,
            ..PipelineConfig::default()
        });
        let stats = pipeline.run_frame(
            Scene {
                camera: &cam,
                lights: &lights,
                level: Some(&tree),
                objects: &mut [],
            },
            &mut SoftRasterizer,
            &mut target,
        );

        assert_eq!(stats.traversal.walls_emitted, 2);
        assert!(!stats.sorted);
        assert_eq!(stats.drawn, 4);
        let tags: Vec<u32> = pipeline.buffer().visible().map(|t| t.tag).collect();
        assert_eq!(tags, vec![2, 2, 1, 1]);
    }

    #[test]
    fn single_wall_through_every_traversal_mode() {
        let wall = Wall::vertical(7, Point2::new(-0.5, 0.0), Point2::new(0.5, 0.0), -0.5, 0.5)
            .with_color(Rgb::gray(200));
        let tree = BspTree::from_walls(vec![wall]).unwrap();
        let cam = camera();
        let lights = ambient(50);

        for mode in [
            TraversalMode::Ordered,
            TraversalMode::SkipBackfaces,
            TraversalMode::FrustumCull,
        ] {
            let mut target = FrameTarget::new(400, 400).with_zbuffer();
            let mut pipeline = Pipeline::new(PipelineConfig {
                traversal: mode,
                ..PipelineConfig::default()
            });
            let stats = pipeline.run_frame(
                Scene {
                    camera: &cam,
                    lights: &lights,
                    level: Some(&tree),
                    objects: &mut [],
                },
                &mut SoftRasterizer,
                &mut target,
            );

            assert!(stats.issues.is_empty(), "{mode:?}");
            assert_eq!(stats.traversal.triangles_emitted, 2, "{mode:?}");
            assert_eq!(stats.backfaces, 0, "{mode:?}");
            assert_eq!(stats.clip, ClipStats::default(), "{mode:?}");
            assert_eq!(stats.drawn, 2, "{mode:?}");
            assert!(!stats.sorted, "{mode:?}");
            assert_eq!(pipeline.buffer().order(), &[0, 1], "{mode:?}");
            for tri in pipeline.buffer().visible() {
                assert_eq!(tri.tag, 7);
                assert_eq!(tri.lit, [Rgb::gray(39); 3], "{mode:?}");
            }

            // Both halves share one depth, so an explicit sort keeps them
            let mut buffer = pipeline.buffer().clone();
            buffer.sort(crate::SortMode::AverageZ);
            assert_eq!(buffer.order(), &[0, 1], "{mode:?}");
        }
    }

    #[test]
    fn overflow_is_reported_and_frame_still_drawn() {
        let cam = camera();
        let lights = ambient(50);
        let mut objects = vec![quad()];
        let mut target = FrameTarget::new(400, 400);

        let mut pipeline = Pipeline::new(PipelineConfig {
            capacity: 1,
            ..PipelineConfig::default()
        });
        let stats = pipeline.run_frame(
            Scene {
                camera: &cam,
                lights: &lights,
                level: None,
                objects: &mut objects,
            },
            &mut SoftRasterizer,
            &mut target,
        );

        assert_eq!(stats.issues, vec![RenderError::CapacityExceeded { capacity: 1 }]);
        assert_eq!(pipeline.buffer().len(), 1);
        assert_eq!(stats.drawn, 1);
    }

    #[test]
    fn disabled_stages_are_skipped() {
        let cam = camera();
        let lights = ambient(50);
        let mut objects = vec![quad()];
        let mut target = FrameTarget::new(400, 400);

        let mut pipeline = Pipeline::default();
        pipeline.set_config(PipelineConfig {
            lighting: false,
            sort: None,
            capacity: 16,
            ..PipelineConfig::default()
        });
        assert_eq!(pipeline.buffer().capacity(), 16);

        let stats = pipeline.run_frame(
            Scene {
                camera: &cam,
                lights: &lights,
                level: None,
                objects: &mut objects,
            },
            &mut SoftRasterizer,
            &mut target,
        );
        assert_eq!(stats.lit, 0);
        assert!(!stats.sorted);
        // Unlit faces keep their base color
        assert_eq!(target.pixel(200, 200), Some(Rgb::gray(200).to_argb()));
    }
}
