use rand::Rng;

use crate::config::Settings;

use super::Playfield;
use super::avatar::Avatar;

/// A top and bottom pipe with an open gap between them.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    /// Left edge.
    pub x: f64,
    /// Height of the top pipe, which is also where the gap starts.
    pub top_height: f64,
    pub gap: f64,
    /// Where the bottom pipe starts (`top_height + gap`).
    pub bottom_y: f64,
    pub bottom_height: f64,
    pub width: f64,
    /// The avatar has moved past the left edge.
    pub passed: bool,
    /// Already counted towards the score.
    pub scored: bool,
}

impl Obstacle {
    /// A new pipe pair at the right edge of the playfield with a random gap.
    pub fn generate(settings: &Settings, playfield: Playfield, rng: &mut impl Rng) -> Obstacle {
        let gap = rng.gen_range(settings.min_gap..=settings.max_gap);

        let min_top = settings.gap_margin_top;
        let max_top = (playfield.height - gap - settings.gap_margin_bottom).max(min_top);
        let top_height = rng.gen_range(min_top..=max_top);

        Obstacle::with_gap(playfield, settings.pipe_width, top_height, gap)
    }

    pub fn with_gap(playfield: Playfield, width: f64, top_height: f64, gap: f64) -> Obstacle {
        let bottom_y = top_height + gap;
        Obstacle {
            x: playfield.width,
            top_height,
            gap,
            bottom_y,
            bottom_height: playfield.height - bottom_y,
            width,
            passed: false,
            scored: false,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn off_screen(&self) -> bool {
        self.right() < 0.0
    }
}

/// Whether the avatar disc touches either pipe. The avatar counts as its
/// bounding square.
pub fn collides(avatar: &Avatar, obstacle: &Obstacle) -> bool {
    let overlaps_x = avatar.right() > obstacle.x && avatar.left() < obstacle.right();
    if !overlaps_x {
        return false;
    }
    avatar.top() < obstacle.top_height || avatar.bottom() > obstacle.bottom_y
}
