//! # Engine Configuration
//!
//! Loaded once at startup, validated, then treated as immutable. Nothing in
//! the frame loop reads a file or parses anything.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::tile::MAX_THREADS;

/// Which screen-space winding is considered front-facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum Winding {
    /// Clockwise triangles face the camera.
    #[default]
    Clockwise,
    /// Counter-clockwise triangles face the camera.
    CounterClockwise,
}

/// Top-level engine configuration.
///
/// Deserializable from TOML; every field has a default so a partial file
/// (or no file at all) yields a runnable engine.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Render target width in pixels.
    pub width: u32,
    /// Render target height in pixels.
    pub height: u32,
    /// Worker thread count. `0` means "use available parallelism".
    pub threads: usize,
    /// Entity pool capacity.
    pub max_entities: usize,
    /// Particle emitter pool capacity.
    pub max_emitters: usize,
    /// Sprite pool capacity.
    pub max_sprites: usize,
    /// State machine pool capacity.
    pub max_state_machines: usize,
    /// Offscreen render target pool capacity.
    pub max_offscreen_targets: usize,
    /// Particle store capacity. Spawning stops silently when full.
    pub max_particles: usize,
    /// Front-face winding for back-face rejection.
    pub winding: Winding,
    /// Packed ARGB clear color.
    pub clear_color: u32,
    /// Ambient lighting term added after the Lambert product.
    pub ambient: f32,
    /// Directional light vector (normalized at load).
    pub light_dir: [f32; 3],
    /// Particle gravity.
    pub particle_gravity: [f32; 3],
    /// Particle velocity drag coefficient.
    pub particle_drag: f32,
    /// Particle speed clamp. `0` disables the clamp.
    pub particle_max_speed: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            threads: 0,
            max_entities: 4096,
            max_emitters: 256,
            max_sprites: 1024,
            max_state_machines: 1024,
            max_offscreen_targets: 8,
            max_particles: 262_144,
            winding: Winding::Clockwise,
            clear_color: 0xFF10_1018,
            ambient: 0.25,
            light_dir: [-0.4, -1.0, -0.3],
            particle_gravity: [0.0, -9.81, 0.0],
            particle_drag: 0.5,
            particle_max_speed: 0.0,
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on a zero-sized render target or a zero
    /// capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroTarget {
                width: self.width,
                height: self.height,
            });
        }
        for (name, value) in [
            ("max_entities", self.max_entities),
            ("max_emitters", self.max_emitters),
            ("max_sprites", self.max_sprites),
            ("max_state_machines", self.max_state_machines),
            ("max_offscreen_targets", self.max_offscreen_targets),
            ("max_particles", self.max_particles),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity { name });
            }
        }
        Ok(())
    }

    /// Resolves the worker thread count.
    ///
    /// `0` expands to the machine's available parallelism; the result is
    /// clamped to `1..=MAX_THREADS` so the per-entity tile mask stays a u64.
    #[must_use]
    pub fn resolved_threads(&self) -> usize {
        let requested = if self.threads == 0 {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            self.threads
        };
        requested.clamp(1, MAX_THREADS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_target_rejected() {
        let config = EngineConfig {
            width: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = EngineConfig {
            max_particles: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threads_clamped() {
        let config = EngineConfig {
            threads: 10_000,
            ..EngineConfig::default()
        };
        assert_eq!(config.resolved_threads(), MAX_THREADS);

        let config = EngineConfig {
            threads: 3,
            ..EngineConfig::default()
        };
        assert_eq!(config.resolved_threads(), 3);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("width = 640\nheight = 480\n").unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.max_entities, EngineConfig::default().max_entities);
    }
}
