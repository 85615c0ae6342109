//! Drawing into an off-screen pixel buffer and pushing it to the terminal.
//!
//! Each terminal cell shows two vertically stacked pixels using the upper
//! half-block character, so a `cols x rows` terminal is a `cols x rows*2`
//! image. Text labels are printed as ordinary cells on top of the image.

mod scene;
mod screens;

use std::io::{self, Write};

use crossterm::{cursor, queue, style};

pub use scene::{View, draw_scene};
pub use screens::{Renderer, TextLine};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    /// `self` painted over `under` with opacity `alpha` in `[0, 1]`.
    pub fn over(self, under: Rgb, alpha: f64) -> Rgb {
        let t = (alpha.clamp(0.0, 1.0) * 256.0) as u16;
        Rgb::lerp(under, self, t)
    }

    pub const fn from_array(c: [u8; 3]) -> Rgb {
        Rgb(c[0], c[1], c[2])
    }

    fn term(self) -> style::Color {
        style::Color::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

pub const SKY_TOP: Rgb = Rgb(0x87, 0xCE, 0xEB);
pub const SKY_BOT: Rgb = Rgb(0xB3, 0xEB, 0xF2);
pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const SHADOW: Rgb = Rgb(30, 30, 30);
pub const PEACH: Rgb = Rgb(0xFF, 0xDA, 0xC1);
pub const MINT: Rgb = Rgb(0xB5, 0xEA, 0xD7);
pub const PIPE_LIGHT: Rgb = Rgb(0x90, 0xEE, 0x90);
pub const PIPE_DARK: Rgb = Rgb(0x5A, 0x9A, 0x5A);
pub const PIPE_CAP: Rgb = Rgb(0x4A, 0x7A, 0x4A);
pub const PANEL: Rgb = Rgb(220, 195, 120);
pub const PANEL_EDGE: Rgb = Rgb(210, 185, 110);
pub const GOLD: Rgb = Rgb(245, 200, 66);
pub const ALERT: Rgb = Rgb(200, 60, 60);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

#[derive(Clone, Debug)]
pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![SKY_TOP; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.clear();
        self.px.resize(w * h, SKY_TOP);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    pub fn blend(&mut self, x: i32, y: i32, c: Rgb, alpha: f64) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            let i = y as usize * self.w + x as usize;
            self.px[i] = c.over(self.px[i], alpha);
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    pub fn blend_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb, alpha: f64) {
        for dy in 0..h {
            for dx in 0..w {
                self.blend(x + dx, y + dy, c, alpha);
            }
        }
    }

    /// One-pixel outline of a rectangle.
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb, alpha: f64) {
        if w <= 0 || h <= 0 {
            return;
        }
        for dx in 0..w {
            self.blend(x + dx, y, c, alpha);
            self.blend(x + dx, y + h - 1, c, alpha);
        }
        for dy in 1..h - 1 {
            self.blend(x, y + dy, c, alpha);
            self.blend(x + w - 1, y + dy, c, alpha);
        }
    }

    /// Visit every pixel inside the ellipse centred at (`cx`, `cy`) with
    /// radii `rx`, `ry`. The callback gets the pixel and its offset from the
    /// centre normalised to the unit circle. Ellipses smaller than a pixel
    /// still cover the pixel under their centre.
    pub fn each_in_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, mut f: impl FnMut(&mut PixelBuf, i32, i32, f64, f64)) {
        if rx < 0.5 || ry < 0.5 {
            f(self, cx.floor() as i32, cy.floor() as i32, 0.0, 0.0);
            return;
        }
        let x0 = (cx - rx).floor() as i32;
        let x1 = (cx + rx).ceil() as i32;
        let y0 = (cy - ry).floor() as i32;
        let y1 = (cy + ry).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let u = (x as f64 + 0.5 - cx) / rx;
                let v = (y as f64 + 0.5 - cy) / ry;
                if u * u + v * v <= 1.0 {
                    f(self, x, y, u, v);
                }
            }
        }
    }

    pub fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, c: Rgb, alpha: f64) {
        self.each_in_ellipse(cx, cy, rx, ry, |buf, x, y, _, _| buf.blend(x, y, c, alpha));
    }

    /// Halve the brightness of everything.
    pub fn dim(&mut self) {
        for c in &mut self.px {
            *c = Rgb(c.0 / 2, c.1 / 2, c.2 / 2);
        }
    }

    pub fn copy_from(&mut self, other: &PixelBuf) {
        self.w = other.w;
        self.h = other.h;
        self.px.clone_from(&other.px);
    }

    /// Vertical gradient over the whole buffer.
    pub fn gradient(&mut self, top: Rgb, bottom: Rgb) {
        let h = self.h.max(1);
        for y in 0..self.h {
            let c = Rgb::lerp(top, bottom, (y * 256 / h) as u16);
            for x in 0..self.w {
                self.px[y * self.w + x] = c;
            }
        }
    }

    /// Write the image, then the text labels over it.
    pub fn present(&self, out: &mut impl Write, text: &[TextLine]) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = Rgb(0, 0, 0);
        let mut prev_bg = Rgb(0, 0, 0);
        let mut need_fg = true;
        let mut need_bg = true;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if need_bg || prev_bg != top {
                        queue!(out, style::SetBackgroundColor(top.term()))?;
                        prev_bg = top;
                        need_bg = false;
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if need_fg || prev_fg != top {
                        queue!(out, style::SetForegroundColor(top.term()))?;
                        prev_fg = top;
                        need_fg = false;
                    }
                    if need_bg || prev_bg != bot {
                        queue!(out, style::SetBackgroundColor(bot.term()))?;
                        prev_bg = bot;
                        need_bg = false;
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                need_fg = true;
                need_bg = true;
            }
        }

        for line in text {
            let len = line.text.chars().count();
            let col = (self.w.saturating_sub(len) / 2) as u16;
            queue!(
                out,
                cursor::MoveTo(col, line.row),
                style::SetForegroundColor(line.fg.term()),
                style::SetBackgroundColor(line.bg.term()),
                style::Print(&line.text)
            )?;
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

// ── 3x5 bitmap digits ──────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

fn draw_digit(buf: &mut PixelBuf, x: i32, y: i32, d: u8, fg: Rgb) {
    let glyph = &DIGITS[d as usize];
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as i32;
                let py = y + row as i32;
                buf.set(px + 1, py + 1, SHADOW);
                buf.set(px, py, fg);
            }
        }
    }
}

/// A number centred on `cx`, 3px per digit with 1px spacing.
pub fn draw_number(buf: &mut PixelBuf, cx: i32, y: i32, n: u32, fg: Rgb) {
    let s = n.to_string();
    let total_w = s.len() as i32 * 4 - 1;
    let start_x = cx - total_w / 2;
    for (i, ch) in s.bytes().enumerate() {
        draw_digit(buf, start_x + i as i32 * 4, y, ch - b'0', fg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_mixes_towards_the_new_colour() {
        let mut buf = PixelBuf::new(2, 2);
        buf.set(0, 0, BLACK);
        buf.blend(0, 0, WHITE, 0.5);
        assert_eq!(buf.get(0, 0), Rgb(127, 127, 127));
        buf.blend(9, 9, WHITE, 1.0); // off-buffer writes are dropped
    }

    #[test]
    fn ellipse_covers_its_centre_and_not_its_corners() {
        let mut buf = PixelBuf::new(10, 10);
        buf.fill_rect(0, 0, 10, 10, BLACK);
        buf.fill_ellipse(5.0, 5.0, 4.0, 4.0, WHITE, 1.0);
        assert_eq!(buf.get(5, 5), WHITE);
        assert_eq!(buf.get(0, 0), BLACK);
        assert_eq!(buf.get(9, 9), BLACK);
    }

    #[test]
    fn tiny_ellipse_still_marks_a_pixel() {
        let mut buf = PixelBuf::new(4, 4);
        buf.fill_rect(0, 0, 4, 4, BLACK);
        buf.fill_ellipse(2.2, 1.7, 0.1, 0.1, WHITE, 1.0);
        assert_eq!(buf.get(2, 1), WHITE);
    }

    #[test]
    fn present_writes_half_blocks_and_labels() {
        let mut buf = PixelBuf::new(3, 2);
        buf.set(0, 0, WHITE);
        let mut out = Vec::new();
        let label = TextLine {
            row: 0,
            text: "hi".into(),
            fg: WHITE,
            bg: BLACK,
        };
        buf.present(&mut out, &[label]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains('\u{2580}'));
        assert!(text.contains("hi"));
    }

    #[test]
    fn numbers_are_centred() {
        let mut buf = PixelBuf::new(20, 10);
        buf.fill_rect(0, 0, 20, 10, BLACK);
        draw_number(&mut buf, 10, 0, 7, WHITE);
        // "7" is 3px wide starting at 10 - 1
        assert_eq!(buf.get(9, 0), WHITE);
        assert_eq!(buf.get(11, 0), WHITE);
    }
}
