//! # Headless Demo
//!
//! Spins a field of lit, textured cubes over a floor while a particle
//! fountain burns in the middle, then dumps PNG frames. No window - the
//! point is the pipeline, and the pipeline is CPU.
//!
//! Usage: `basilisk-demo [config.toml]`

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use basilisk::{
    Camera, Emitter, EmitterMode, Engine, EngineConfig, EngineError, Entity, Material, Mesh,
    PixelShader, Shading, SpawnParams, Sprite, Texture,
};

const FRAMES: u32 = 120;
const DUMP_EVERY: u32 = 30;

fn main() {
    tracing_subscriber::fmt().init();
    if let Err(error) = run() {
        tracing::error!(%error, "demo failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_toml_file(&path)?,
        None => EngineConfig {
            width: 640,
            height: 360,
            ..EngineConfig::default()
        },
    };
    let mut engine = Engine::new(config)?;
    build_scene(&mut engine);

    let aspect = engine.config().width as f32 / engine.config().height as f32;
    let dt = 1.0 / 60.0;
    for frame in 0..FRAMES {
        // Slow orbit around the scene.
        let angle = frame as f32 * dt * 0.4;
        engine.set_camera(Camera::perspective(
            Vec3::new(angle.sin() * 8.0, 3.0, angle.cos() * 8.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::Y,
            std::f32::consts::FRAC_PI_3,
            aspect,
            0.1,
            100.0,
        ));

        let stats = engine.frame(dt);
        if frame % DUMP_EVERY == 0 {
            tracing::info!(
                frame,
                triangles = stats.triangles_drawn,
                particles = stats.particles_alive,
                total_us = stats.total_us,
                "frame"
            );
            dump_frame(&engine, frame);
        }
    }
    Ok(())
}

/// Floor, a ring of spinning cubes, a fountain, and a HUD backdrop sprite.
fn build_scene(engine: &mut Engine) {
    let mut rng = ChaCha8Rng::seed_from_u64(0xBA51_115C);

    let checker = Arc::new(Texture::checkerboard(
        128,
        128,
        16,
        0xFFC8_C8C8,
        0xFF40_4048,
    ));
    let floor_material = Arc::new(Material {
        shading: Shading::Lambert,
        color: Vec4::ONE,
        texture: Some(Arc::clone(&checker)),
        shader: PixelShader::Textured,
    });
    let cube_material = Arc::new(Material {
        shading: Shading::Gouraud,
        color: Vec4::new(0.9, 0.4, 0.2, 1.0),
        texture: None,
        shader: PixelShader::Flat,
    });

    // Floor: a big quad rotated flat.
    let mut floor = Entity::new(Arc::new(Mesh::quad(16.0)), floor_material);
    floor.transform = Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2);
    engine.entities.create(floor);

    // Ring of cubes with randomized spins.
    let cube = Arc::new(Mesh::cube(1.0));
    for i in 0..8 {
        let angle = i as f32 / 8.0 * std::f32::consts::TAU;
        let mut entity = Entity::new(Arc::clone(&cube), Arc::clone(&cube_material));
        entity.transform =
            Mat4::from_translation(Vec3::new(angle.cos() * 4.0, 0.75, angle.sin() * 4.0));
        entity.angular_velocity = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-1.0..1.0),
        );
        engine.entities.create(entity);
    }

    // The fountain.
    engine.emitters.create(Emitter::new(
        Vec3::new(0.0, 0.2, 0.0),
        EmitterMode::Rate(4000.0),
        SpawnParams {
            position_jitter: 0.1,
            velocity: Vec3::new(0.0, 6.0, 0.0),
            velocity_jitter: Vec3::new(2.0, 1.0, 2.0),
            duration_min: 0.8,
            duration_max: 1.6,
            color: Vec3::new(1.0, 0.6, 0.2),
            color_jitter: 0.2,
        },
        rng.gen(),
    ));

    // HUD backdrop.
    engine.sprites.create(Sprite::new(
        Vec2::new(8.0, 8.0),
        Vec2::new(160.0, 24.0),
        Vec4::new(0.0, 0.0, 0.0, 0.5),
    ));
}

/// Encodes the ARGB color buffer as RGBA and writes a PNG.
fn dump_frame(engine: &Engine, frame: u32) {
    let target = engine.target();
    let (width, height) = (target.width(), target.height());
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for &pixel in target.color_buffer() {
        rgba.push(((pixel >> 16) & 0xFF) as u8);
        rgba.push(((pixel >> 8) & 0xFF) as u8);
        rgba.push((pixel & 0xFF) as u8);
        rgba.push(((pixel >> 24) & 0xFF) as u8);
    }
    let path = format!("basilisk_frame_{frame:04}.png");
    match image::RgbaImage::from_raw(width, height, rgba) {
        Some(img) => {
            if let Err(error) = img.save(&path) {
                tracing::warn!(%error, %path, "failed to write frame dump");
            }
        }
        None => tracing::warn!(%path, "frame dump buffer size mismatch"),
    }
}
