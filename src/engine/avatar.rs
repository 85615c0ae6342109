use crate::config::Settings;

use super::Playfield;

/// Largest tilt, in degrees, either way.
const MAX_TILT: f64 = 30.0;
/// Degrees of tilt per unit of vertical velocity.
const TILT_PER_VELOCITY: f64 = 3.0;
/// Fraction of the remaining tilt closed each tick.
const TILT_EASING: f64 = 0.3;

/// The player's photo disc.
#[derive(Clone, Debug, PartialEq)]
pub struct Avatar {
    pub x: f64,
    pub y: f64,
    /// Vertical velocity; positive is down.
    pub velocity: f64,
    /// Degrees, positive tilts nose-down.
    pub rotation: f64,
    pub radius: f64,
    pub alive: bool,
}

impl Avatar {
    /// A fresh avatar at rest, vertically centred.
    pub fn spawn(settings: &Settings, playfield: Playfield) -> Avatar {
        Avatar {
            x: playfield.width * settings.avatar_x_ratio,
            y: playfield.height * 0.5,
            velocity: 0.0,
            rotation: 0.0,
            radius: settings.avatar_radius(),
            alive: true,
        }
    }

    /// One tick of free fall: accelerate, clamp, move, tilt.
    pub fn fall(&mut self, gravity: f64, terminal_velocity: f64) {
        self.velocity = (self.velocity + gravity).min(terminal_velocity);
        self.y += self.velocity;

        let target = (self.velocity * TILT_PER_VELOCITY).clamp(-MAX_TILT, MAX_TILT);
        self.rotation += (target - self.rotation) * TILT_EASING;
    }

    pub fn top(&self) -> f64 {
        self.y - self.radius
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.radius
    }

    pub fn left(&self) -> f64 {
        self.x - self.radius
    }

    pub fn right(&self) -> f64 {
        self.x + self.radius
    }

    /// True once any part of the disc leaves the playfield vertically.
    pub fn out_of_bounds(&self, playfield: Playfield) -> bool {
        self.top() < 0.0 || self.bottom() > playfield.height
    }
}
