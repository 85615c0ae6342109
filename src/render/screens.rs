use std::io::{self, Write};

use crate::app::App;
use crate::engine::Playfield;
use crate::mode::{Acquire, Mode};
use crate::photo::PhotoSource;
use crate::store::ScoreStore;

use super::scene::{draw_background, draw_photo_disc};
use super::{
    ALERT, BLACK, GOLD, PANEL, PANEL_EDGE, PEACH, PixelBuf, Rgb, SHADOW, View, WHITE, draw_number,
    draw_scene,
};

/// A label printed as terminal cells, centred on its row.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub row: u16,
    pub text: String,
    pub fg: Rgb,
    pub bg: Rgb,
}

fn label(row: usize, text: impl Into<String>) -> TextLine {
    TextLine {
        row: row as u16,
        text: text.into(),
        fg: WHITE,
        bg: SHADOW,
    }
}

/// Draws whichever screen the app is on.
///
/// The playfield is kept in its own buffer and only redrawn while the
/// simulation runs, so overlays such as the pause dim are applied to a
/// fresh copy every frame instead of compounding.
pub struct Renderer {
    scene: PixelBuf,
    screen: PixelBuf,
    scene_valid: bool,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Renderer {
        Renderer {
            scene: PixelBuf::new(width, height),
            screen: PixelBuf::new(width, height),
            scene_valid: false,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.scene.resize(width, height);
        self.screen.resize(width, height);
        self.scene_valid = false;
    }

    pub fn screen(&self) -> &PixelBuf {
        &self.screen
    }

    pub fn present(&self, out: &mut impl Write, text: &[TextLine]) -> io::Result<()> {
        self.screen.present(out, text)
    }

    /// Compose the current frame. `live` says whether the simulation moved
    /// since the last call.
    pub fn draw<S: ScoreStore, P: PhotoSource>(&mut self, app: &App<S, P>, live: bool, now: u64) -> Vec<TextLine> {
        let rows = self.screen.height() / 2;
        let mut text = Vec::new();

        match (app.mode(), app.engine()) {
            (mode, Some(engine)) if mode.in_game() => {
                if live || !self.scene_valid {
                    let view = View::new(engine.playfield(), &self.scene, app.shake());
                    draw_scene(&mut self.scene, view, engine, app.photo(), app.best());
                    self.scene_valid = true;
                }
                self.screen.copy_from(&self.scene);
                self.game_overlay(app, mode, rows, &mut text);
            }
            (mode, _) => {
                self.scene_valid = false;
                let playfield = Playfield::fit(app.settings().playfield_height, self.screen.width(), self.screen.height());
                let view = View::new(playfield, &self.screen, 0);
                draw_background(&mut self.screen, view, playfield, now as f64 * 0.06);
                self.flow_overlay(app, mode, rows, &mut text);
            }
        }

        if let Some(message) = app.message() {
            text.push(TextLine {
                row: rows.saturating_sub(2) as u16,
                text: format!(" {message} "),
                fg: WHITE,
                bg: ALERT,
            });
        }
        text
    }

    fn game_overlay<S: ScoreStore, P: PhotoSource>(&mut self, app: &App<S, P>, mode: Mode, rows: usize, text: &mut Vec<TextLine>) {
        match mode {
            Mode::Ready => {
                text.push(label(rows / 3, "Get Ready!"));
                text.push(label(rows / 3 + 2, "Tap / Space to start flying"));
            }
            Mode::Paused => {
                self.screen.dim();
                text.push(label(rows / 3, "Paused"));
                text.push(label(rows / 3 + 2, "[P] Resume   [Q] Menu"));
            }
            Mode::Ended if app.game_over_panel() => {
                self.screen.dim();
                let score = app.engine().map_or(0, |e| e.score());
                self.game_over_panel(score, app.best());
                text.push(label(rows / 4, "Game Over"));
                text.push(label(rows * 3 / 4, "[R] Try again   [N] New selfie   [Q] Menu"));
            }
            _ => {}
        }
    }

    fn game_over_panel(&mut self, score: u32, best: u32) {
        let w = self.screen.width() as i32;
        let h = self.screen.height() as i32;
        let (pw, ph) = (30, 22);
        let (px, py) = (w / 2 - pw / 2, h / 2 - ph / 2);
        self.screen.blend_rect(px + 2, py + 2, pw, ph, BLACK, 0.4);
        self.screen.fill_rect(px, py, pw, ph, PANEL);
        self.screen.stroke_rect(px, py, pw, ph, PANEL_EDGE, 1.0);

        draw_number(&mut self.screen, w / 2, py + 4, score, WHITE);
        draw_number(&mut self.screen, w / 2, py + 13, best, GOLD);
    }

    fn flow_overlay<S: ScoreStore, P: PhotoSource>(&mut self, app: &App<S, P>, mode: Mode, rows: usize, text: &mut Vec<TextLine>) {
        let sound = if app.audio_enabled() { "on" } else { "off" };
        match mode {
            Mode::Acquiring(Acquire::Camera) => {
                text.push(label(rows / 3, "Camera ready. Smile!"));
                text.push(label(rows / 3 + 2, "[Space] Capture   [U] Upload instead   [Esc] Back"));
                if app.photo_pending() {
                    text.push(label(rows / 2 + 2, "Processing..."));
                }
            }
            Mode::Acquiring(Acquire::Upload) => {
                text.push(label(rows / 4, "Upload a photo"));
                text.push(label(rows / 4 + 2, "Type or drop an image path (JPG, PNG) and press Enter"));
                text.push(label(rows / 2, format!("> {}_", app.path_input())));
                if app.photo_pending() {
                    text.push(label(rows / 2 + 2, "Processing..."));
                }
                text.push(label(rows * 3 / 4, "[Esc] Back"));
            }
            Mode::Compliment => {
                let w = self.screen.width() as f64;
                let h = self.screen.height() as f64;
                let r = w.min(h) * 0.3;
                match app.photo() {
                    Some(photo) => draw_photo_disc(&mut self.screen, w / 2.0, h * 0.4, r, r, 0.0, photo),
                    None => self.screen.fill_ellipse(w / 2.0, h * 0.4, r, r, PEACH, 1.0),
                }
                if let Some(words) = app.compliment_text() {
                    text.push(label(rows * 4 / 5, words));
                }
            }
            _ => {
                text.push(label(rows / 4, "SELFIE FLAPPY"));
                text.push(label(rows / 4 + 2, format!("Best: {}", app.best())));
                text.push(label(rows / 2, "[C] Take a selfie   [U] Upload a photo"));
                text.push(label(rows / 2 + 2, format!("[M] Sound: {sound}   [Q] Quit")));
            }
        }
    }
}
