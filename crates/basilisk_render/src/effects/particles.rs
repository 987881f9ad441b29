//! # SoA Particle Store & Frame Phases
//!
//! ## Safety Note
//!
//! This module requires unsafe code for the worker-facing view used by the
//! parallel phases. All unsafe blocks are carefully reviewed and documented.

#![allow(unsafe_code)]
//!
//! ## Phase Protocol
//!
//! ```text
//! emit      serial    accumulator spawns, Wang-hash parameters
//! age       serial    expiry by swap-remove
//! physics   parallel  partitioned by contiguous index range
//! binning   parallel  partitioned by index range, atomic tile counts
//! prefix    serial    exclusive offsets over tile counts
//! scatter   serial    counting sort into the permutation array
//! composite parallel  partitioned by tile, additive blend
//! ```
//!
//! Parallel phases run behind the job barrier; the serial ones run on the
//! orchestrator thread strictly between dispatches. The store's shape
//! (`alive`) never changes while a view exists.

use std::sync::atomic::Ordering;

use basilisk_core::{TileGrid, MAX_THREADS};
use glam::{Vec3, Vec4Swizzles};

use crate::camera::Camera;
use crate::color::blend_add;
use crate::effects::emitter::{hash_signed, hash_unit, wang_hash, Emitter, EmitterMode};
use crate::target::TargetView;

/// Sentinel destination for particles culled during binning.
pub const INVALID_TILE: u32 = u32::MAX;

const EPS_W: f32 = 1e-6;

/// Axis-aligned bounce volume for the physics pass.
#[derive(Clone, Copy, Debug)]
pub struct BounceBounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
    /// Velocity retained after a bounce, in [0, 1].
    pub restitution: f32,
}

/// Global physics parameters for the particle store.
#[derive(Clone, Copy, Debug)]
pub struct ParticleParams {
    /// Acceleration applied every step.
    pub gravity: Vec3,
    /// Velocity decay coefficient: velocity scales by `1/(1 + drag*dt)`.
    pub drag: f32,
    /// Speed clamp; `0` disables it.
    pub max_speed: f32,
    /// Optional axis-aligned bounce volume.
    pub bounce: Option<BounceBounds>,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            drag: 0.5,
            max_speed: 0.0,
            bounce: None,
        }
    }
}

/// Structure-of-arrays particle store.
///
/// All arrays describing particle *i* are mutated together; removal copies
/// the last alive record over slot *i* and decrements `alive`. Capacity is
/// fixed - when the store is full, spawning stops silently.
pub struct Particles {
    capacity: usize,
    alive: usize,
    /// Monotonic spawn sequence feeding the hash streams.
    spawn_seq: u32,

    px: Box<[f32]>,
    py: Box<[f32]>,
    pz: Box<[f32]>,
    vx: Box<[f32]>,
    vy: Box<[f32]>,
    vz: Box<[f32]>,
    age: Box<[f32]>,
    duration: Box<[f32]>,
    inv_duration: Box<[f32]>,
    r: Box<[f32]>,
    g: Box<[f32]>,
    b: Box<[f32]>,

    // Per-frame transients, valid from binning to compositing.
    tile: Box<[u32]>,
    sx: Box<[f32]>,
    sy: Box<[f32]>,
    sz: Box<[f32]>,
    sort: Box<[u32]>,
}

impl Particles {
    /// Allocates a store with the given fixed capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "particle capacity must be greater than zero");
        let zeros = || vec![0.0f32; capacity].into_boxed_slice();
        Self {
            capacity,
            alive: 0,
            spawn_seq: 0,
            px: zeros(),
            py: zeros(),
            pz: zeros(),
            vx: zeros(),
            vy: zeros(),
            vz: zeros(),
            age: zeros(),
            duration: zeros(),
            inv_duration: zeros(),
            r: zeros(),
            g: zeros(),
            b: zeros(),
            tile: vec![INVALID_TILE; capacity].into_boxed_slice(),
            sx: zeros(),
            sy: zeros(),
            sz: zeros(),
            sort: vec![0u32; capacity].into_boxed_slice(),
        }
    }

    /// Number of alive particles.
    #[inline]
    #[must_use]
    pub const fn alive(&self) -> usize {
        self.alive
    }

    /// Fixed capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Serial emission for one emitter.
    ///
    /// The accumulator gains `rate * dt` (or density x projected-screen-area
    /// x dt), the integer part spawns, the fraction carries over - long-run
    /// emission converges exactly regardless of frame-time jitter.
    /// `viewport_height` sizes the projected disc for screen-density mode.
    pub fn emit(&mut self, emitter: &mut Emitter, dt: f32, camera: &Camera, viewport_height: f32) {
        let budget = match emitter.mode {
            EmitterMode::Rate(rate) => rate * dt,
            EmitterMode::ScreenDensity { density, radius } => {
                let clip = camera.view_proj * emitter.position.extend(1.0);
                if clip.w < EPS_W {
                    return;
                }
                let r_px = radius * camera.proj.y_axis.y / clip.w * viewport_height * 0.5;
                density * std::f32::consts::PI * r_px * r_px * dt
            }
        };
        emitter.accum += budget.max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = emitter.accum.floor() as u32;
        emitter.accum -= count as f32;

        for _ in 0..count {
            if self.alive == self.capacity {
                // Fixed capacity: stop spawning, keep the fraction honest.
                return;
            }
            self.spawn_from(emitter);
        }
    }

    /// Spawns one particle with parameters drawn from the emitter's hash
    /// stream at the current spawn sequence number.
    fn spawn_from(&mut self, emitter: &Emitter) {
        let seed = wang_hash(self.spawn_seq) ^ emitter.seed;
        self.spawn_seq = self.spawn_seq.wrapping_add(1);

        let s = &emitter.spawn;
        let position = emitter.position
            + Vec3::new(
                hash_signed(seed, 1),
                hash_signed(seed, 2),
                hash_signed(seed, 3),
            ) * s.position_jitter;
        let velocity = s.velocity
            + Vec3::new(
                hash_signed(seed, 4) * s.velocity_jitter.x,
                hash_signed(seed, 5) * s.velocity_jitter.y,
                hash_signed(seed, 6) * s.velocity_jitter.z,
            );
        let duration = (s.duration_min
            + (s.duration_max - s.duration_min) * hash_unit(seed, 7))
        .max(1e-3);
        let color = (s.color
            + Vec3::splat(hash_signed(seed, 8)) * s.color_jitter)
            .clamp(Vec3::ZERO, Vec3::ONE);

        let i = self.alive;
        self.px[i] = position.x;
        self.py[i] = position.y;
        self.pz[i] = position.z;
        self.vx[i] = velocity.x;
        self.vy[i] = velocity.y;
        self.vz[i] = velocity.z;
        self.age[i] = 0.0;
        self.duration[i] = duration;
        self.inv_duration[i] = 1.0 / duration;
        self.r[i] = color.x;
        self.g[i] = color.y;
        self.b[i] = color.z;
        self.alive += 1;
    }

    /// Serial age pass: advance every age, then expire by swap-remove.
    ///
    /// Aging and expiry are separate sweeps so a record swapped in from the
    /// tail is never double-aged or skipped.
    pub fn age_pass(&mut self, dt: f32) {
        for i in 0..self.alive {
            self.age[i] += dt;
        }
        let mut i = 0;
        while i < self.alive {
            if self.age[i] >= self.duration[i] {
                self.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Copies the last alive record over slot `i` and shrinks the store.
    fn swap_remove(&mut self, i: usize) {
        let last = self.alive - 1;
        if i != last {
            self.px[i] = self.px[last];
            self.py[i] = self.py[last];
            self.pz[i] = self.pz[last];
            self.vx[i] = self.vx[last];
            self.vy[i] = self.vy[last];
            self.vz[i] = self.vz[last];
            self.age[i] = self.age[last];
            self.duration[i] = self.duration[last];
            self.inv_duration[i] = self.inv_duration[last];
            self.r[i] = self.r[last];
            self.g[i] = self.g[last];
            self.b[i] = self.b[last];
        }
        self.alive = last;
    }

    /// Serial prefix sum: gives every tile a disjoint contiguous range in
    /// the permutation array. Runs after the binning barrier.
    pub fn prefix_sum(grid: &TileGrid) {
        let mut running = 0u32;
        for tile in grid.tiles() {
            tile.particle_offset.store(running, Ordering::Relaxed);
            running += tile.particle_count.load(Ordering::Relaxed);
        }
    }

    /// Serial scatter: one O(alive) walk placing each binned particle's
    /// index at its tile's write cursor - a counting sort by tile.
    pub fn scatter(&mut self, grid: &TileGrid) {
        let mut cursors = [0u32; MAX_THREADS];
        for (t, tile) in grid.tiles().iter().enumerate() {
            cursors[t] = tile.particle_offset.load(Ordering::Relaxed);
        }
        for i in 0..self.alive {
            let t = self.tile[i];
            if t == INVALID_TILE {
                continue;
            }
            let cursor = &mut cursors[t as usize];
            self.sort[*cursor as usize] = i as u32;
            *cursor += 1;
        }
    }

    /// Creates the worker-facing view for the parallel phases.
    ///
    /// The exclusive borrow guarantees the store cannot be reshaped (no
    /// emit, no age pass) while workers hold the view.
    #[inline]
    pub fn view(&mut self) -> ParticlesView<'_> {
        ParticlesView {
            alive: self.alive,
            px: self.px.as_mut_ptr(),
            py: self.py.as_mut_ptr(),
            pz: self.pz.as_mut_ptr(),
            vx: self.vx.as_mut_ptr(),
            vy: self.vy.as_mut_ptr(),
            vz: self.vz.as_mut_ptr(),
            age: self.age.as_mut_ptr(),
            inv_duration: self.inv_duration.as_mut_ptr(),
            r: self.r.as_mut_ptr(),
            g: self.g.as_mut_ptr(),
            b: self.b.as_mut_ptr(),
            tile: self.tile.as_mut_ptr(),
            sx: self.sx.as_mut_ptr(),
            sy: self.sy.as_mut_ptr(),
            sz: self.sz.as_mut_ptr(),
            sort: self.sort.as_mut_ptr(),
            _store: std::marker::PhantomData,
        }
    }
}

/// Shared worker view over a [`Particles`] store.
///
/// Two access patterns are sound, and they are the only ones used:
/// - `integrate_range`/`bin_range`: job *j* of *J* touches only indices in
///   its contiguous partition of `0..alive` - ranges are disjoint
/// - `composite_tile`: read-only over the store, writes go to the frame
///   buffer pixels of the claimed tile only
pub struct ParticlesView<'a> {
    alive: usize,
    px: *mut f32,
    py: *mut f32,
    pz: *mut f32,
    vx: *mut f32,
    vy: *mut f32,
    vz: *mut f32,
    age: *mut f32,
    inv_duration: *mut f32,
    r: *mut f32,
    g: *mut f32,
    b: *mut f32,
    tile: *mut u32,
    sx: *mut f32,
    sy: *mut f32,
    sz: *mut f32,
    sort: *mut u32,
    _store: std::marker::PhantomData<&'a mut Particles>,
}

// SAFETY: the view crosses threads by design; the range/tile partitioning
// documented on the type is the synchronization contract, and the pointers
// outlive the view because the constructor borrows the store mutably.
unsafe impl Send for ParticlesView<'_> {}
unsafe impl Sync for ParticlesView<'_> {}

/// Contiguous partition of `0..len` for job `job` of `jobs`.
#[inline]
fn partition(len: usize, job: usize, jobs: usize) -> (usize, usize) {
    (len * job / jobs, len * (job + 1) / jobs)
}

impl ParticlesView<'_> {
    /// Number of alive particles frozen into this view.
    #[inline]
    #[must_use]
    pub const fn alive(&self) -> usize {
        self.alive
    }

    #[inline]
    unsafe fn read(ptr: *const f32, i: usize) -> f32 {
        // SAFETY: caller holds a partition containing `i < alive <= capacity`.
        unsafe { *ptr.add(i) }
    }

    #[inline]
    unsafe fn write(ptr: *mut f32, i: usize, value: f32) {
        // SAFETY: as in `read`.
        unsafe { *ptr.add(i) = value }
    }

    /// Parallel physics for job `job` of `jobs`: drag decay, gravity,
    /// optional speed clamp, semi-implicit Euler, optional axis-aligned
    /// bounce.
    pub fn integrate_range(&self, job: usize, jobs: usize, dt: f32, params: &ParticleParams) {
        let (start, end) = partition(self.alive, job, jobs);
        let damp = 1.0 / (1.0 + params.drag * dt);
        for i in start..end {
            // SAFETY: indices in [start, end) belong exclusively to this job.
            unsafe {
                let mut v = Vec3::new(
                    Self::read(self.vx, i),
                    Self::read(self.vy, i),
                    Self::read(self.vz, i),
                ) * damp
                    + params.gravity * dt;

                if params.max_speed > 0.0 {
                    let speed_sq = v.length_squared();
                    if speed_sq > params.max_speed * params.max_speed {
                        v *= params.max_speed / speed_sq.sqrt();
                    }
                }

                let mut p = Vec3::new(
                    Self::read(self.px, i),
                    Self::read(self.py, i),
                    Self::read(self.pz, i),
                ) + v * dt;

                if let Some(bounce) = &params.bounce {
                    for axis in 0..3 {
                        let (lo, hi) = (bounce.min[axis], bounce.max[axis]);
                        if p[axis] < lo {
                            p[axis] = lo;
                            v[axis] = -v[axis] * bounce.restitution;
                        } else if p[axis] > hi {
                            p[axis] = hi;
                            v[axis] = -v[axis] * bounce.restitution;
                        }
                    }
                }

                Self::write(self.vx, i, v.x);
                Self::write(self.vy, i, v.y);
                Self::write(self.vz, i, v.z);
                Self::write(self.px, i, p.x);
                Self::write(self.py, i, p.y);
                Self::write(self.pz, i, p.z);
            }
        }
    }

    /// Parallel tile binning for job `job` of `jobs`: project, cull against
    /// the NDC cube, record screen position/depth and destination tile, and
    /// bump that tile's count.
    ///
    /// Jobs are partitioned by particle index, not destination tile, so the
    /// count increment is a relaxed atomic - the counts are only read after
    /// the dispatch barrier.
    pub fn bin_range(&self, job: usize, jobs: usize, camera: &Camera, grid: &TileGrid) {
        let (start, end) = partition(self.alive, job, jobs);
        let width = grid.width() as f32;
        let height = grid.height() as f32;
        for i in start..end {
            // SAFETY: indices in [start, end) belong exclusively to this job.
            unsafe {
                let position = Vec3::new(
                    Self::read(self.px, i),
                    Self::read(self.py, i),
                    Self::read(self.pz, i),
                );
                let clip = camera.view_proj * position.extend(1.0);
                if clip.w < EPS_W {
                    *self.tile.add(i) = INVALID_TILE;
                    continue;
                }
                let ndc = clip.xyz() / clip.w;
                if !(-1.0..=1.0).contains(&ndc.x)
                    || !(-1.0..=1.0).contains(&ndc.y)
                    || !(0.0..=1.0).contains(&ndc.z)
                {
                    *self.tile.add(i) = INVALID_TILE;
                    continue;
                }

                let sx = (ndc.x * 0.5 + 0.5) * width;
                let sy = (0.5 - ndc.y * 0.5) * height;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let pixel_x = (sx as u32).min(grid.width() - 1);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let pixel_y = (sy as u32).min(grid.height() - 1);
                let destination = grid.tile_for_pixel(pixel_x, pixel_y);

                *self.tile.add(i) = destination as u32;
                Self::write(self.sx, i, pixel_x as f32);
                Self::write(self.sy, i, pixel_y as f32);
                Self::write(self.sz, i, ndc.z);
                grid.tile(destination)
                    .particle_count
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Parallel compositing for one tile: walk the tile's permutation
    /// range, depth-test each particle against the shared depth buffer, and
    /// additively blend a fading color - intensity falls off as
    /// `(1 - age/duration)^2`.
    pub fn composite_tile(&self, tile_index: usize, grid: &TileGrid, target: &TargetView<'_>) {
        let tile = grid.tile(tile_index);
        let start = tile.particle_offset.load(Ordering::Relaxed) as usize;
        let count = tile.particle_count.load(Ordering::Relaxed) as usize;
        for k in start..start + count {
            // SAFETY: the permutation range [start, start+count) belongs to
            // this tile alone, and every particle in it was binned to a
            // pixel inside this tile's rectangle.
            unsafe {
                let i = *self.sort.add(k) as usize;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let px = Self::read(self.sx, i) as u32;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let py = Self::read(self.sy, i) as u32;
                let depth = Self::read(self.sz, i);
                if depth >= target.depth(px, py) {
                    continue;
                }
                let life = 1.0 - Self::read(self.age, i) * Self::read(self.inv_duration, i);
                let fade = (life.max(0.0)) * (life.max(0.0));
                let color = Vec3::new(
                    Self::read(self.r, i),
                    Self::read(self.g, i),
                    Self::read(self.b, i),
                ) * fade;
                target.write_color(px, py, blend_add(target.color(px, py), color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::emitter::SpawnParams;

    fn burst_emitter(rate: f32) -> Emitter {
        Emitter::new(
            Vec3::ZERO,
            EmitterMode::Rate(rate),
            SpawnParams {
                duration_min: 1.0,
                duration_max: 1.0,
                ..SpawnParams::default()
            },
            0xB515,
        )
    }

    fn test_camera() -> Camera {
        Camera::perspective(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            std::f32::consts::FRAC_PI_3,
            1.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn test_accumulator_converges_to_rate() {
        let mut particles = Particles::new(100_000);
        let mut emitter = burst_emitter(600.0);
        let camera = test_camera();
        let dt = 1.0 / 60.0;
        // Long durations so nothing expires during the measurement.
        emitter.spawn.duration_min = 100.0;
        emitter.spawn.duration_max = 100.0;

        for _ in 0..120 {
            particles.emit(&mut emitter, dt, &camera, 720.0);
        }
        // 600/s over 2 simulated seconds: within one particle of 1200.
        let alive = particles.alive() as i64;
        assert!((alive - 1200).abs() <= 1, "spawned {alive}");
    }

    #[test]
    fn test_spawn_stops_silently_at_capacity() {
        let mut particles = Particles::new(16);
        let mut emitter = burst_emitter(10_000.0);
        let camera = test_camera();
        particles.emit(&mut emitter, 1.0, &camera, 720.0);
        assert_eq!(particles.alive(), 16);
    }

    #[test]
    fn test_expiry_returns_to_zero() {
        let mut particles = Particles::new(1024);
        let mut emitter = burst_emitter(512.0);
        let camera = test_camera();
        particles.emit(&mut emitter, 1.0, &camera, 720.0);
        assert!(particles.alive() > 0);

        // Step just past the 1-second duration.
        let dt = 1.0 / 60.0;
        for _ in 0..62 {
            particles.age_pass(dt);
        }
        assert_eq!(particles.alive(), 0);
    }

    #[test]
    fn test_swap_remove_keeps_records_consistent() {
        let mut particles = Particles::new(64);
        let mut emitter = burst_emitter(8.0);
        emitter.spawn.velocity = Vec3::new(1.0, 2.0, 3.0);
        emitter.spawn.duration_min = 5.0;
        emitter.spawn.duration_max = 5.0;
        let camera = test_camera();
        particles.emit(&mut emitter, 1.0, &camera, 720.0);
        assert_eq!(particles.alive(), 8);

        // Tag each record so pairs stay identifiable: position.x = color.r.
        for i in 0..particles.alive() {
            particles.px[i] = i as f32;
            particles.r[i] = i as f32;
            particles.age[i] = if i % 2 == 0 { 10.0 } else { 0.0 };
        }
        particles.age_pass(0.0);
        assert_eq!(particles.alive(), 4);
        for i in 0..particles.alive() {
            assert!(
                (particles.px[i] - particles.r[i]).abs() < f32::EPSILON,
                "record fields moved together"
            );
        }
    }

    #[test]
    fn test_physics_integrates_gravity() {
        let mut particles = Particles::new(8);
        let mut emitter = burst_emitter(4.0);
        emitter.spawn.duration_min = 10.0;
        emitter.spawn.duration_max = 10.0;
        let camera = test_camera();
        particles.emit(&mut emitter, 1.0, &camera, 720.0);

        let params = ParticleParams {
            gravity: Vec3::new(0.0, -10.0, 0.0),
            drag: 0.0,
            max_speed: 0.0,
            bounce: None,
        };
        let before: Vec<f32> = particles.py[..particles.alive()].to_vec();
        let view = particles.view();
        view.integrate_range(0, 1, 0.1, &params);
        drop(view);
        for (i, &y0) in before.iter().enumerate() {
            // v = -1 after one step, p moved by v*dt.
            assert!(particles.py[i] < y0);
        }
    }

    #[test]
    fn test_bounce_reflects_and_clamps() {
        let mut particles = Particles::new(4);
        let mut emitter = burst_emitter(1.0);
        emitter.position = Vec3::new(0.0, 0.05, 0.0);
        emitter.spawn.velocity = Vec3::new(0.0, -10.0, 0.0);
        emitter.spawn.duration_min = 10.0;
        emitter.spawn.duration_max = 10.0;
        let camera = test_camera();
        particles.emit(&mut emitter, 1.0, &camera, 720.0);
        assert_eq!(particles.alive(), 1);

        let params = ParticleParams {
            gravity: Vec3::ZERO,
            drag: 0.0,
            max_speed: 0.0,
            bounce: Some(BounceBounds {
                min: Vec3::new(-100.0, 0.0, -100.0),
                max: Vec3::splat(100.0),
                restitution: 0.5,
            }),
        };
        let view = particles.view();
        view.integrate_range(0, 1, 0.1, &params);
        drop(view);
        assert!((particles.py[0] - 0.0).abs() < f32::EPSILON, "clamped to the floor");
        assert!(particles.vy[0] > 0.0, "velocity reflected");
        assert!((particles.vy[0] - 5.0).abs() < 1e-3, "restitution applied");
    }

    #[test]
    fn test_binning_partitions_alive_particles() {
        let grid = TileGrid::new(64, 64, 4);
        let mut particles = Particles::new(256);
        let mut emitter = burst_emitter(200.0);
        emitter.spawn.position_jitter = 1.5;
        emitter.spawn.duration_min = 10.0;
        emitter.spawn.duration_max = 10.0;
        let camera = test_camera();
        particles.emit(&mut emitter, 1.0, &camera, 64.0);
        let alive = particles.alive();
        assert!(alive > 0);

        grid.reset_frame_counters();
        {
            let view = particles.view();
            // Several index-range jobs, as in the real dispatch.
            for job in 0..4 {
                view.bin_range(job, 4, &camera, &grid);
            }
        }
        Particles::prefix_sum(&grid);
        particles.scatter(&grid);

        // Per-tile ranges must partition exactly the binned particles, with
        // no duplicate indices across ranges.
        let mut seen = vec![false; alive];
        let mut total = 0usize;
        for (t, tile) in grid.tiles().iter().enumerate() {
            let start = tile.particle_offset.load(Ordering::Relaxed) as usize;
            let count = tile.particle_count.load(Ordering::Relaxed) as usize;
            for k in start..start + count {
                let i = particles.sort[k] as usize;
                assert!(!seen[i], "index {i} appears in two tile ranges");
                seen[i] = true;
                assert_eq!(particles.tile[i], t as u32, "range matches destination");
                total += 1;
            }
        }
        let binned = particles.tile[..alive]
            .iter()
            .filter(|&&t| t != INVALID_TILE)
            .count();
        assert_eq!(total, binned);
    }

    #[test]
    fn test_behind_camera_particles_are_culled() {
        let grid = TileGrid::new(32, 32, 2);
        let mut particles = Particles::new(8);
        let mut emitter = burst_emitter(4.0);
        // Behind the eye at z = +5, looking toward -Z.
        emitter.position = Vec3::new(0.0, 0.0, 50.0);
        emitter.spawn.duration_min = 10.0;
        emitter.spawn.duration_max = 10.0;
        let camera = test_camera();
        particles.emit(&mut emitter, 1.0, &camera, 32.0);

        grid.reset_frame_counters();
        let view = particles.view();
        view.bin_range(0, 1, &camera, &grid);
        drop(view);
        assert!(particles.tile[..particles.alive()]
            .iter()
            .all(|&t| t == INVALID_TILE));
        assert_eq!(
            grid.tiles()
                .iter()
                .map(|t| t.particle_count.load(Ordering::Relaxed))
                .sum::<u32>(),
            0
        );
    }
}
