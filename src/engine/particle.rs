use rand::Rng;

/// What spawned a particle; the renderer picks its colour from this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Burst {
    Flap,
    Score,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub burst: Burst,
    pub life: i32,
    pub max_life: i32,
    pub opacity: f64,
}

const FLAP_COUNT: usize = 5;
const FLAP_LIFE: i32 = 30;
const SCORE_COUNT: usize = 8;
const SCORE_LIFE: i32 = 60;

impl Particle {
    fn new(x: f64, y: f64, vx: f64, vy: f64, size: f64, burst: Burst, life: i32) -> Particle {
        Particle {
            x,
            y,
            vx,
            vy,
            size,
            burst,
            life,
            max_life: life,
            opacity: 1.0,
        }
    }

    /// Move one tick and age. Returns false once the particle has expired.
    pub fn advance(&mut self, gravity: f64) -> bool {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += gravity;
        self.life -= 1;
        self.opacity = self.life as f64 / self.max_life as f64;
        self.life > 0
    }
}

/// Puffs trailing behind the avatar, drifting left.
pub fn flap_burst(x: f64, y: f64, radius: f64, rng: &mut impl Rng) -> Vec<Particle> {
    (0..FLAP_COUNT)
        .map(|_| {
            Particle::new(
                x - radius,
                y + rng.gen_range(-10.0..10.0),
                -2.0 - rng.gen_range(0.0..2.0),
                rng.gen_range(-2.0..2.0),
                2.0 + rng.gen_range(0.0..3.0),
                Burst::Flap,
                FLAP_LIFE,
            )
        })
        .collect()
}

/// Sparks thrown upwards from the avatar when a pipe is cleared.
pub fn score_burst(x: f64, y: f64, rng: &mut impl Rng) -> Vec<Particle> {
    (0..SCORE_COUNT)
        .map(|_| {
            Particle::new(
                x,
                y,
                rng.gen_range(-3.0..3.0),
                -rng.gen_range(0.0..4.0) - 2.0,
                3.0 + rng.gen_range(0.0..2.0),
                Burst::Score,
                SCORE_LIFE,
            )
        })
        .collect()
}
