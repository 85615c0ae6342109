//! The simulation: avatar physics, pipes, scoring, particles.
//!
//! The engine knows nothing about screens or terminals. The caller tells it
//! which [`Mode`] the game is in and drains the [`EngineEvent`]s it emits
//! (sound cues, screen shake) after each call.

pub mod avatar;
pub mod obstacle;
pub mod particle;

use rand::rngs::StdRng;
use tracing::debug;

use crate::audio::Cue;
use crate::config::Settings;
use crate::mode::Mode;

pub use avatar::Avatar;
pub use obstacle::{Obstacle, collides};
pub use particle::{Burst, Particle};

/// Size of the simulated area in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playfield {
    pub width: f64,
    pub height: f64,
}

impl Playfield {
    /// A playfield `height` units tall with the same aspect ratio as a
    /// `cols` x `rows` pixel surface.
    pub fn fit(height: f64, cols: usize, rows: usize) -> Playfield {
        let aspect = cols.max(1) as f64 / rows.max(1) as f64;
        Playfield {
            width: height * aspect,
            height,
        }
    }
}

/// Side effects the engine asks its owner to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Cue(Cue),
    Shake,
}

/// What an input did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEffect {
    /// Arrived inside the debounce window of the previous input.
    Debounced,
    /// Accepted but meaningless in the current mode.
    Ignored,
    /// First flap from the ready screen; the game should start playing.
    Started,
    Flapped,
}

/// What a tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing moved (not playing, or the avatar is dead).
    Idle,
    Advanced,
    Collided,
    OutOfBounds,
}

impl StepOutcome {
    pub fn is_over(self) -> bool {
        matches!(self, StepOutcome::Collided | StepOutcome::OutOfBounds)
    }
}

pub struct Engine {
    settings: Settings,
    playfield: Playfield,
    rng: StdRng,
    pub avatar: Avatar,
    pub obstacles: Vec<Obstacle>,
    pub particles: Vec<Particle>,
    score: u32,
    scroll: f64,
    last_input: Option<u64>,
    ticks: u64,
    events: Vec<EngineEvent>,
}

impl Engine {
    pub fn new(settings: Settings, playfield: Playfield, rng: StdRng) -> Engine {
        let avatar = Avatar::spawn(&settings, playfield);
        Engine {
            settings,
            playfield,
            rng,
            avatar,
            obstacles: Vec::new(),
            particles: Vec::new(),
            score: 0,
            scroll: 0.0,
            last_input: None,
            ticks: 0,
            events: Vec::new(),
        }
    }

    /// Throw away the current run and start over with a fresh avatar.
    pub fn reset(&mut self) {
        self.avatar = Avatar::spawn(&self.settings, self.playfield);
        self.obstacles.clear();
        self.particles.clear();
        self.score = 0;
        self.scroll = 0.0;
        self.last_input = None;
        self.ticks = 0;
        self.events.clear();
    }

    /// The player's single action. `now_ms` is any monotonic clock in
    /// milliseconds; only differences between calls matter.
    pub fn apply_input(&mut self, mode: Mode, now_ms: u64) -> InputEffect {
        if let Some(last) = self.last_input {
            if now_ms.saturating_sub(last) < self.settings.debounce_ms {
                return InputEffect::Debounced;
            }
        }

        let effect = match mode {
            Mode::Ready => {
                self.avatar.velocity = self.settings.flap_strength * self.settings.first_flap_factor;
                self.flap_feedback();
                InputEffect::Started
            }
            Mode::Playing if self.avatar.alive => {
                self.avatar.velocity = self.settings.flap_strength;
                self.flap_feedback();
                self.events.push(EngineEvent::Shake);
                InputEffect::Flapped
            }
            _ => InputEffect::Ignored,
        };
        self.last_input = Some(now_ms);
        effect
    }

    fn flap_feedback(&mut self) {
        let burst = particle::flap_burst(self.avatar.x, self.avatar.y, self.avatar.radius, &mut self.rng);
        self.particles.extend(burst);
        self.events.push(EngineEvent::Cue(Cue::Flap));
    }

    /// Advance the simulation by one frame.
    pub fn step(&mut self, mode: Mode) -> StepOutcome {
        if mode != Mode::Playing || !self.avatar.alive {
            return StepOutcome::Idle;
        }
        self.ticks += 1;

        self.avatar.fall(self.settings.gravity, self.settings.terminal_velocity);
        self.scroll += self.settings.scroll_per_tick;

        let spawn = match self.obstacles.last() {
            None => true,
            Some(newest) => newest.x < self.playfield.width - self.settings.spawn_distance,
        };
        if spawn {
            let pipe = Obstacle::generate(&self.settings, self.playfield, &mut self.rng);
            debug!(gap = pipe.gap, top = pipe.top_height, "pipe_spawned");
            self.obstacles.push(pipe);
        }

        self.advance_obstacles();
        self.advance_particles();

        if self.obstacles.iter().any(|pipe| collides(&self.avatar, pipe)) {
            self.end_run();
            return StepOutcome::Collided;
        }
        if self.avatar.out_of_bounds(self.playfield) {
            self.end_run();
            return StepOutcome::OutOfBounds;
        }
        StepOutcome::Advanced
    }

    fn advance_obstacles(&mut self) {
        let mut cleared = 0;
        for pipe in &mut self.obstacles {
            pipe.x -= self.settings.pipe_speed;
            if pipe.x < self.avatar.x {
                pipe.passed = true;
            }
            if !pipe.scored && pipe.right() < self.avatar.x {
                pipe.scored = true;
                cleared += 1;
            }
        }
        for _ in 0..cleared {
            self.score += 1;
            self.events.push(EngineEvent::Cue(Cue::Score));
            let burst = particle::score_burst(self.avatar.x, self.avatar.y, &mut self.rng);
            self.particles.extend(burst);
        }
        self.obstacles.retain(|pipe| !pipe.off_screen());
    }

    fn advance_particles(&mut self) {
        let gravity = self.settings.particle_gravity;
        self.particles.retain_mut(|p| p.advance(gravity));

        let cap = self.settings.particle_cap;
        if self.particles.len() > cap {
            let excess = self.particles.len() - cap;
            self.particles.drain(..excess);
        }
    }

    fn end_run(&mut self) {
        self.avatar.alive = false;
        self.events.push(EngineEvent::Cue(Cue::Collision));
        debug!(score = self.score, ticks = self.ticks, "run_ended");
    }

    /// Idle animation for the ready screen: the avatar bobs around the
    /// middle of the playfield on a wall-clock sine instead of falling.
    pub fn idle(&mut self, now_ms: u64) {
        let bob = (now_ms as f64 * self.settings.bob_rate).sin() * self.settings.bob_amplitude;
        self.avatar.y = self.playfield.height * 0.5 + bob;
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Background scroll offset, for parallax.
    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn playfield(&self) -> Playfield {
        self.playfield
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
