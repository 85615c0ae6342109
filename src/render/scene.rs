//! The playfield: sky, clouds, pipes, particles and the avatar.
//!
//! Everything here reads engine state and writes pixels; nothing mutates
//! the simulation.

use crate::engine::{Avatar, Burst, Engine, Obstacle, Particle, Playfield};
use crate::photo::PhotoAsset;

use super::{
    BLACK, GOLD, MINT, PEACH, PIPE_CAP, PIPE_DARK, PIPE_LIGHT, PixelBuf, Rgb, SKY_BOT, SKY_TOP,
    WHITE, draw_number,
};

const CLOUD_ALPHA: f64 = 0.3;
const CAP_HEIGHT: f64 = 25.0;
const CAP_OVERHANG: f64 = 5.0;
/// Pipes closer than this ahead of the avatar get their gap outlined.
const GLOW_RANGE: f64 = 150.0;

/// Maps world units onto buffer pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    sx: f64,
    sy: f64,
    /// Horizontal offset in pixels, for screen shake.
    shift: f64,
}

impl View {
    pub fn new(playfield: Playfield, buf: &PixelBuf, shift: i32) -> View {
        View {
            sx: buf.width() as f64 / playfield.width,
            sy: buf.height() as f64 / playfield.height,
            shift: shift as f64,
        }
    }

    pub fn x(&self, wx: f64) -> f64 {
        wx * self.sx + self.shift
    }

    pub fn y(&self, wy: f64) -> f64 {
        wy * self.sy
    }

    /// A world rectangle as whole pixels: (x, y, w, h).
    fn rect(&self, x: f64, y: f64, w: f64, h: f64) -> (i32, i32, i32, i32) {
        let x0 = self.x(x).floor() as i32;
        let y0 = self.y(y).floor() as i32;
        let x1 = self.x(x + w).floor() as i32;
        let y1 = self.y(y + h).floor() as i32;
        (x0, y0, x1 - x0, y1 - y0)
    }
}

/// Draw one frame of the game.
pub fn draw_scene(buf: &mut PixelBuf, view: View, engine: &Engine, photo: Option<&PhotoAsset>, best: u32) {
    let playfield = engine.playfield();
    draw_background(buf, view, playfield, engine.scroll());

    for pipe in &engine.obstacles {
        draw_pipe(buf, view, playfield, pipe, &engine.avatar);
    }
    for particle in &engine.particles {
        draw_particle(buf, view, particle);
    }
    if engine.avatar.alive {
        draw_avatar(buf, view, &engine.avatar, photo);
    }

    let w = buf.width() as i32;
    draw_number(buf, w / 2, 3, engine.score(), WHITE);
    draw_number(buf, w - 10, 3, best, GOLD);
}

/// Sky gradient with three slow clouds.
pub fn draw_background(buf: &mut PixelBuf, view: View, playfield: Playfield, scroll: f64) {
    buf.gradient(SKY_TOP, SKY_BOT);

    for i in 0..3 {
        let i = i as f64;
        let x = (scroll * 0.3 + i * 200.0) % (playfield.width + 100.0) - 50.0;
        let y = 50.0 + i * 30.0;
        let size = 40.0 + i * 10.0;
        for (dx, scale) in [(0.0, 1.0), (0.7, 0.8), (1.4, 0.6)] {
            let r = size * scale;
            buf.fill_ellipse(
                view.x(x + size * dx),
                view.y(y),
                r * view.sx,
                r * view.sy,
                WHITE,
                CLOUD_ALPHA,
            );
        }
    }
}

fn pipe_shade(col: i32, width: i32) -> Rgb {
    if width <= 1 {
        return PIPE_LIGHT;
    }
    let t = (col * 256 / (width - 1)).clamp(0, 256) as u16;
    Rgb::lerp(PIPE_LIGHT, PIPE_DARK, t)
}

fn draw_pipe(buf: &mut PixelBuf, view: View, playfield: Playfield, pipe: &Obstacle, avatar: &Avatar) {
    let (px, top_y, pw, top_h) = view.rect(pipe.x, 0.0, pipe.width, pipe.top_height);
    let (_, bot_y, _, bot_h) = view.rect(pipe.x, pipe.bottom_y, pipe.width, playfield.height - pipe.bottom_y);

    for col in 0..pw {
        let c = pipe_shade(col, pw);
        buf.fill_rect(px + col, top_y, 1, top_h, c);
        buf.fill_rect(px + col, bot_y, 1, bot_h, c);
    }

    let cap_w = pipe.width + CAP_OVERHANG * 2.0;
    let (cx, cy, cw, ch) = view.rect(pipe.x - CAP_OVERHANG, pipe.top_height - CAP_HEIGHT, cap_w, CAP_HEIGHT);
    buf.fill_rect(cx, cy, cw, ch.max(1), PIPE_CAP);
    let (cx, cy, cw, ch) = view.rect(pipe.x - CAP_OVERHANG, pipe.bottom_y, cap_w, CAP_HEIGHT);
    buf.fill_rect(cx, cy, cw, ch.max(1), PIPE_CAP);

    if !pipe.passed && pipe.x < avatar.x + GLOW_RANGE {
        let (gx, gy, gw, gh) = view.rect(pipe.x + 5.0, pipe.top_height + 5.0, pipe.width - 10.0, pipe.gap - 10.0);
        buf.stroke_rect(gx, gy, gw, gh, MINT, 0.3);
    }
}

fn draw_particle(buf: &mut PixelBuf, view: View, p: &Particle) {
    let color = match p.burst {
        Burst::Flap => PEACH,
        Burst::Score => MINT,
    };
    let r = p.size * p.opacity;
    buf.fill_ellipse(view.x(p.x), view.y(p.y), r * view.sx, r * view.sy, color, p.opacity);
}

fn draw_avatar(buf: &mut PixelBuf, view: View, avatar: &Avatar, photo: Option<&PhotoAsset>) {
    let cx = view.x(avatar.x);
    let cy = view.y(avatar.y);
    let rx = avatar.radius * view.sx;
    let ry = avatar.radius * view.sy;

    match photo {
        Some(photo) => {
            buf.fill_ellipse(cx + 2.0 * view.sx, cy + 2.0 * view.sy, rx, ry, BLACK, 0.3);
            draw_photo_disc(buf, cx, cy, rx, ry, avatar.rotation, photo);
        }
        None => buf.fill_ellipse(cx, cy, rx, ry, PEACH, 1.0),
    }
}

/// The photo clipped to an ellipse, turned by `rotation` degrees, with a
/// soft highlight towards the top left.
pub fn draw_photo_disc(buf: &mut PixelBuf, cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64, photo: &PhotoAsset) {
    let (sin, cos) = rotation.to_radians().sin_cos();
    buf.each_in_ellipse(cx, cy, rx, ry, |buf, x, y, u, v| {
        // undo the rotation to find where this pixel came from in the photo
        let pu = u * cos + v * sin;
        let pv = -u * sin + v * cos;
        let c = Rgb::from_array(photo.sample((pu + 1.0) / 2.0, (pv + 1.0) / 2.0));

        let (gu, gv) = (u + 0.3, v + 0.3);
        let gloss = 0.4 * (1.0 - (gu * gu + gv * gv).sqrt()).max(0.0);
        buf.set(x, y, WHITE.over(c, gloss));
    });
}
