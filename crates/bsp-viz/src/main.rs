use std::env;

use bsp_pipeline::bsp::{BspTree, FewestSplits, TraversalMode};
use bsp_pipeline::config::{ConfigError, SceneConfig};
use bsp_pipeline::{FrameTarget, Pipeline, Rgb, Scene, SoftRasterizer, TransformMode};
use bsp_viz::{FlyCamera, ScreenTexture, TreeNavigator};
use log::{error, info};
use macroquad::prelude::*;
use nalgebra::Matrix4;

const BUILTIN_SCENE: &str = include_str!("../scenes/maze.toml");

const BACKGROUND: Rgb = Rgb::new(20, 20, 30);

/// Radians per second.
const SPIN: f32 = 0.8;

fn load_scene() -> Result<SceneConfig, ConfigError> {
    match env::args().nth(1) {
        Some(path) => {
            info!("Loading scene from {path}");
            SceneConfig::load(path)
        }
        None => SceneConfig::from_toml_str(BUILTIN_SCENE),
    }
}

fn next_mode(mode: TraversalMode) -> TraversalMode {
    match mode {
        TraversalMode::Ordered => TraversalMode::SkipBackfaces,
        TraversalMode::SkipBackfaces => TraversalMode::FrustumCull,
        TraversalMode::FrustumCull => TraversalMode::Ordered,
    }
}

#[macroquad::main("BSP Pipeline")]
async fn main() {
    env_logger::init();

    let scene = match load_scene() {
        Ok(scene) => scene,
        Err(err) => {
            error!("{err}");
            return;
        }
    };
    let lights = match scene.lights() {
        Ok(lights) => lights,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let walls = scene.walls();
    let wall_count = walls.len();
    let tree = match BspTree::build(walls, &FewestSplits) {
        Ok(tree) => tree,
        Err(err) => {
            error!("Failed to build BSP tree: {err}");
            return;
        }
    };
    info!(
        "BSP tree built: {} walls in, {} nodes, depth {}",
        wall_count,
        tree.len(),
        tree.depth()
    );

    let mut objects = scene.objects();
    let mut pipeline = Pipeline::new(scene.pipeline.clone());
    let mut fly = FlyCamera::from_config(&scene.camera);
    let mut navigator = TreeNavigator::new();

    let [width, height] = scene.camera.viewport;
    let mut target = FrameTarget::new(width as usize, height as usize).with_zbuffer();
    let mut screen = ScreenTexture::new(width, height);

    loop {
        let dt = get_frame_time();
        fly.update(dt);
        navigator.update(&tree);

        if is_key_pressed(KeyCode::T) {
            let mut config = pipeline.config().clone();
            config.traversal = next_mode(config.traversal);
            info!("Traversal mode: {:?}", config.traversal);
            pipeline.set_config(config);
        }
        if is_key_pressed(KeyCode::L) {
            let mut config = pipeline.config().clone();
            config.lighting = !config.lighting;
            pipeline.set_config(config);
        }

        let spin = Matrix4::from_euler_angles(0.0, SPIN * dt, 0.0);
        for object in &mut objects {
            object.transform(&spin, TransformMode::LocalInPlace);
        }

        let camera = fly.camera(&scene.camera);
        target.clear(BACKGROUND);
        let stats = pipeline.run_frame(
            Scene {
                camera: &camera,
                lights: &lights,
                level: Some(&tree),
                objects: &mut objects,
            },
            &mut SoftRasterizer,
            &mut target,
        );
        screen.upload(&target);

        clear_background(BLACK);
        let scale = screen.draw();
        navigator.draw_outlines(&tree, pipeline.buffer(), scale);

        let p = camera.position();
        draw_text(
            &format!(
                "{:?} | nodes {} | walls {} | drawn {} | fps {}",
                pipeline.config().traversal,
                stats.traversal.nodes_visited,
                stats.traversal.walls_emitted,
                stats.drawn,
                get_fps()
            ),
            10.0,
            20.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!(
                "eye ({:.1}, {:.1}, {:.1}) | backfaces {} | clipped x{} y{} z{} | split {} | issues {}",
                p.x,
                p.y,
                p.z,
                stats.backfaces,
                stats.clip.x_rejected,
                stats.clip.y_rejected,
                stats.clip.near_rejected + stats.clip.far_rejected,
                stats.clip.split,
                stats.issues.len()
            ),
            10.0,
            40.0,
            18.0,
            LIGHTGRAY,
        );
        navigator.draw_ui(&tree, 70.0);
        draw_text(
            "Arrows: look | WASD: move | Q/E: up/down | T: traversal | L: lighting",
            10.0,
            screen_height() - 10.0,
            16.0,
            GRAY,
        );

        next_frame().await
    }
}
