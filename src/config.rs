//! Tunable game constants.
//!
//! Every number the physics or the screen flow depends on lives here so it
//! can be overridden from a TOML file. Units are "world units" (the playfield
//! is `playfield_height` units tall) and ticks (one call to `Engine::step`).

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Downward acceleration added to the avatar velocity every tick.
    pub gravity: f64,
    /// Velocity set by a flap. Negative is up.
    pub flap_strength: f64,
    /// Multiplier applied to `flap_strength` for the flap that starts a run.
    pub first_flap_factor: f64,
    pub terminal_velocity: f64,
    pub pipe_speed: f64,
    pub min_gap: f64,
    pub max_gap: f64,
    pub gap_margin_top: f64,
    pub gap_margin_bottom: f64,
    pub pipe_width: f64,
    /// A new pipe spawns once the newest one is this far left of the right edge.
    pub spawn_distance: f64,
    /// Avatar diameter.
    pub avatar_size: f64,
    /// Avatar x as a fraction of the playfield width.
    pub avatar_x_ratio: f64,
    pub particle_cap: usize,
    pub particle_gravity: f64,
    pub scroll_per_tick: f64,
    pub debounce_ms: u64,
    pub playfield_height: f64,
    pub frame_ms: u64,
    pub bob_amplitude: f64,
    pub bob_rate: f64,
    /// Edge length of the square avatar photo, in pixels.
    pub photo_size: u32,
    pub max_upload_bytes: u64,
    /// External capture program and its arguments. `{out}` is replaced with
    /// the path the program must write a JPEG or PNG to.
    pub camera_command: Option<Vec<String>>,
    pub timings: Timings,
}

/// Delays (milliseconds) of the scheduled screen transitions.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Timings {
    pub compliment_reveal: u64,
    pub compliment_done: u64,
    pub word_interval: u64,
    pub camera_fallback: u64,
    pub message_clear: u64,
    pub photo_timeout: u64,
    pub game_over_panel: u64,
    pub shake_step: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            gravity: 0.4,
            flap_strength: -9.0,
            first_flap_factor: 0.7,
            terminal_velocity: 8.0,
            pipe_speed: 1.8,
            min_gap: 170.0,
            max_gap: 230.0,
            gap_margin_top: 80.0,
            gap_margin_bottom: 80.0,
            pipe_width: 60.0,
            spawn_distance: 350.0,
            avatar_size: 50.0,
            avatar_x_ratio: 0.2,
            particle_cap: 50,
            particle_gravity: 0.2,
            scroll_per_tick: 1.0,
            debounce_ms: 100,
            playfield_height: 600.0,
            frame_ms: 16,
            bob_amplitude: 3.0,
            bob_rate: 0.005,
            photo_size: 256,
            max_upload_bytes: 10 * 1024 * 1024,
            camera_command: None,
            timings: Timings::default(),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            compliment_reveal: 800,
            compliment_done: 3200,
            word_interval: 200,
            camera_fallback: 2000,
            message_clear: 5000,
            photo_timeout: 10_000,
            game_over_panel: 500,
            shake_step: 50,
        }
    }
}

impl Settings {
    /// Read settings from a TOML file. Keys that are absent keep their
    /// default value.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_gap <= 0.0 || self.min_gap > self.max_gap {
            return Err(ConfigError::Invalid(format!(
                "gap range [{}, {}] is empty",
                self.min_gap, self.max_gap
            )));
        }
        if self.flap_strength >= 0.0 {
            return Err(ConfigError::Invalid(
                "flap_strength must be negative (up is negative)".into(),
            ));
        }
        if self.gravity <= 0.0 || self.terminal_velocity <= 0.0 {
            return Err(ConfigError::Invalid(
                "gravity and terminal_velocity must be positive".into(),
            ));
        }
        let needed = self.max_gap + self.gap_margin_top + self.gap_margin_bottom;
        if self.playfield_height < needed {
            return Err(ConfigError::Invalid(format!(
                "playfield_height {} cannot fit a {} gap plus margins",
                self.playfield_height, self.max_gap
            )));
        }
        if self.particle_cap == 0 {
            return Err(ConfigError::Invalid("particle_cap must be at least 1".into()));
        }
        if self.photo_size == 0 {
            return Err(ConfigError::Invalid("photo_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn avatar_radius(&self) -> f64 {
        self.avatar_size / 2.0
    }
}
