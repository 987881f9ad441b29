//! # Engine Context & Frame Orchestrator
//!
//! One explicit object owns everything: the worker pool, the tile grid, the
//! render target, the object pools, and the particle store. The application
//! creates it, mutates the pools between frames, calls [`Engine::frame`],
//! and blits [`Engine::target`] however it presents.
//!
//! The frame sequence is strict: parallel phases are separated by the job
//! barrier, pools mutate only in the single-threaded purge step, and the
//! buffers are only ever touched tile-wise. Four dispatches per frame:
//! particle physics, entity render, particle binning, particle compositing.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::Ordering;
use std::time::Instant;

use basilisk_core::{
    ConfigError, EngineConfig, FrameStats, JobSystem, Pool, Poolable, TileGrid, TileRect,
};
use basilisk_render::{
    draw_mesh, Camera, DrawContext, Emitter, Lighting, ParticleParams, Particles, RenderTarget,
    DEFAULT_AREA_EPSILON,
};
use glam::{Vec3, Vec4Swizzles};
use thiserror::Error;

use crate::entity::Entity;
use crate::fsm::StateMachine;
use crate::offscreen::OffscreenTarget;
use crate::sprite::Sprite;

/// Fatal construction-time errors. Nothing inside the frame loop errors;
/// it degrades by omission.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The engine context.
///
/// Pools are public: applications stage creations and releases directly;
/// the next [`Engine::frame`] commits them at its purge point.
pub struct Engine {
    config: EngineConfig,
    jobs: JobSystem,
    grid: TileGrid,
    target: RenderTarget,

    /// Renderable entities.
    pub entities: Pool<Entity>,
    /// Particle emitters.
    pub emitters: Pool<Emitter>,
    /// Screen-space UI sprites.
    pub sprites: Pool<Sprite>,
    /// Gameplay state machines.
    pub state_machines: Pool<StateMachine>,
    /// Offscreen render-to-texture surfaces.
    pub offscreen_targets: Pool<OffscreenTarget>,

    particles: Particles,
    particle_params: ParticleParams,
    camera: Camera,
    lighting: Lighting,
    frame_count: u64,
}

impl Engine {
    /// Builds an engine from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the configuration fails validation -
    /// the engine's one fatal path.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let threads = config.resolved_threads();
        let jobs = JobSystem::new(threads);
        let grid = TileGrid::new(config.width, config.height, threads);
        let target = RenderTarget::new(config.width, config.height);

        let camera = Camera::perspective(
            Vec3::new(0.0, 1.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            std::f32::consts::FRAC_PI_3,
            config.width as f32 / config.height as f32,
            0.1,
            500.0,
        );
        let lighting = Lighting::new(Vec3::from(config.light_dir), config.ambient);
        let particle_params = ParticleParams {
            gravity: Vec3::from(config.particle_gravity),
            drag: config.particle_drag,
            max_speed: config.particle_max_speed,
            bounce: None,
        };

        tracing::info!(
            width = config.width,
            height = config.height,
            threads,
            tiles = grid.tile_count(),
            "engine online"
        );

        Ok(Self {
            entities: Pool::with_capacity(config.max_entities),
            emitters: Pool::with_capacity(config.max_emitters),
            sprites: Pool::with_capacity(config.max_sprites),
            state_machines: Pool::with_capacity(config.max_state_machines),
            offscreen_targets: Pool::with_capacity(config.max_offscreen_targets),
            particles: Particles::new(config.max_particles),
            particle_params,
            camera,
            lighting,
            frame_count: 0,
            config,
            jobs,
            grid,
            target,
        })
    }

    /// The engine configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The finished frame, ready to blit.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// The tile grid.
    #[inline]
    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Current camera.
    #[inline]
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replaces the camera for subsequent frames.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Replaces the global particle physics parameters.
    pub fn set_particle_params(&mut self, params: ParticleParams) {
        self.particle_params = params;
    }

    /// Alive particle count after the last frame.
    #[inline]
    #[must_use]
    pub fn particles_alive(&self) -> usize {
        self.particles.alive()
    }

    /// Runs one frame and returns its statistics.
    #[allow(clippy::too_many_lines)]
    pub fn frame(&mut self, dt: f32) -> FrameStats {
        let frame_start = Instant::now();
        let mut stats = FrameStats {
            frame: self.frame_count,
            threads: self.jobs.thread_count(),
            tiles: self.grid.tile_count(),
            ..FrameStats::default()
        };

        // Reset per-frame tile counters.
        self.grid.reset_frame_counters();

        // Serial updates: entity physics, state machines, particle
        // emission and aging.
        let update_start = Instant::now();
        for entity in self.entities.iter_mut() {
            entity.integrate(dt);
        }
        for machine in self.state_machines.iter_mut() {
            machine.update(dt);
        }
        let viewport_height = self.config.height as f32;
        for emitter in self.emitters.iter_mut() {
            if emitter.header().dead {
                continue;
            }
            self.particles.emit(emitter, dt, &self.camera, viewport_height);
        }
        self.particles.age_pass(dt);

        // Barrier 1: particle physics over contiguous index ranges.
        {
            let job_count = self.grid.tile_count();
            let params = self.particle_params;
            let view = self.particles.view();
            let job = move |i: usize| view.integrate_range(i, job_count, dt, &params);
            self.jobs.dispatch(job_count, &job);
        }
        stats.update_us = elapsed_us(update_start);

        // Purge: the one point per frame where pools change shape.
        let prepare_start = Instant::now();
        self.entities.purge();
        self.emitters.purge();
        self.sprites.purge();
        self.state_machines.purge();
        self.offscreen_targets.purge();

        // Depth sort the render permutation front-to-back so the depth test
        // rejects occluded fragments early.
        let eye = self.camera.eye;
        self.entities.sort_by(|a, b| {
            let da = (a.transform.w_axis.xyz() - eye).length_squared();
            let db = (b.transform.w_axis.xyz() - eye).length_squared();
            da.partial_cmp(&db).unwrap_or(CmpOrdering::Equal)
        });

        // Clip/tile-assign: recompute bounds, cull, derive tile masks.
        for entity in self.entities.iter_mut() {
            if entity.update_bounds(&self.camera, &self.grid) {
                stats.entities_drawn += 1;
            } else {
                stats.entities_clipped += 1;
            }
        }
        stats.prepare_us = elapsed_us(prepare_start);

        // Clear, then barrier 2: render entities per tile.
        let raster_start = Instant::now();
        self.target.clear(self.config.clear_color);
        {
            let view = self.target.view();
            let camera = self.camera;
            let lighting = self.lighting;
            let winding = self.config.winding;
            let grid = &self.grid;
            let entities = &self.entities;
            let job = move |tile_index: usize| {
                let tile = grid.tile(tile_index);
                let ctx = DrawContext {
                    target: &view,
                    camera: &camera,
                    lighting: &lighting,
                    winding,
                    area_epsilon: DEFAULT_AREA_EPSILON,
                };
                let bit = 1u64 << tile_index;
                let mut drawn = 0u32;
                for entity in entities.iter_sorted() {
                    if entity.tile_mask & bit == 0 {
                        continue;
                    }
                    let (Some(mesh), Some(material)) = (&entity.mesh, &entity.material) else {
                        continue;
                    };
                    drawn += draw_mesh(
                        &ctx,
                        mesh,
                        &entity.transform,
                        material,
                        entity.depth_mode,
                        &tile.rect,
                    );
                }
                tile.triangles_drawn.fetch_add(drawn, Ordering::Relaxed);
            };
            self.jobs.dispatch(self.grid.tile_count(), &job);
        }
        stats.raster_us = elapsed_us(raster_start);

        // Barrier 3: particle tile binning, then the serial counting sort.
        let particles_start = Instant::now();
        {
            let job_count = self.grid.tile_count();
            let camera = self.camera;
            let grid = &self.grid;
            let view = self.particles.view();
            let job = move |i: usize| view.bin_range(i, job_count, &camera, grid);
            self.jobs.dispatch(job_count, &job);
        }
        Particles::prefix_sum(&self.grid);
        self.particles.scatter(&self.grid);

        // Barrier 4: per-tile particle compositing.
        {
            let grid = &self.grid;
            let particles = self.particles.view();
            let target = self.target.view();
            let job = move |tile_index: usize| {
                particles.composite_tile(tile_index, grid, &target);
            };
            self.jobs.dispatch(self.grid.tile_count(), &job);
        }
        stats.particles_us = elapsed_us(particles_start);

        // UI: serial sprite pass over the finished 3D frame.
        {
            let view = self.target.view();
            for sprite in self.sprites.iter_sorted() {
                sprite.draw(&view);
            }
        }

        stats.triangles_drawn = self.grid.triangles_drawn();
        stats.particles_alive = self.particles.alive();
        stats.total_us = elapsed_us(frame_start);
        self.frame_count += 1;

        tracing::trace!(
            frame = stats.frame,
            triangles = stats.triangles_drawn,
            particles = stats.particles_alive,
            total_us = stats.total_us,
            "frame complete"
        );
        stats
    }

    /// The full-target rectangle, for callers drawing outside the tile jobs.
    #[must_use]
    pub fn target_rect(&self) -> TileRect {
        TileRect {
            left: 0,
            top: 0,
            right: self.config.width as i32,
            bottom: self.config.height as i32,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_us(since: Instant) -> u64 {
    since.elapsed().as_micros() as u64
}
