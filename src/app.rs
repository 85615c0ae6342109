//! The application state machine.
//!
//! [`App`] owns the current [`Mode`] and everything that hangs off it: the
//! engine while a run exists, the player's photo, the best score, the
//! scheduled screen transitions and the pending photo job. The terminal
//! adapter feeds it [`Input`]s and calls [`App::frame`] once per display
//! frame; the renderer only reads it.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, info, warn};

use crate::audio::Cue;
use crate::config::Settings;
use crate::engine::{Engine, EngineEvent, InputEffect, Playfield};
use crate::error::PhotoError;
use crate::mode::{Acquire, Mode};
use crate::photo::{PhotoAsset, PhotoJob, PhotoSource, Ticket};
use crate::schedule::{Scheduler, TimerKind};
use crate::store::ScoreStore;

const COMPLIMENTS: &[&str] = &[
    "Damn, looking fine!",
    "Iconic energy, I see",
    "Lookin pretty",
    "Main character vibes!",
    "Pure magic, did you fall from heaven or something?",
    "Total knockout",
    "Certified stunner",
    "Kinda blinded by your beauty right now",
    "Absolutely gorgeous",
];

/// Everything the adapter can tell the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// The one game button: flap, start, capture.
    Activate,
    /// Toggle pause.
    Pause,
    FocusLost,
    /// Leave the current screen for the menu, or exit from the menu.
    Quit,
    /// Leave the program from anywhere.
    Exit,
    Retry,
    NewPhoto,
    ChooseCamera,
    ChooseUpload,
    Capture,
    Back,
    ToggleAudio,
    /// Path entry on the upload screen.
    Type(char),
    Erase,
    Submit,
    SubmitPath(PathBuf),
    /// Pasted text, which is what dropping a file on a terminal produces.
    Paste(String),
    DismissMessage,
}

#[derive(Clone, Debug)]
struct Compliment {
    words: Vec<&'static str>,
    shown: usize,
}

pub struct App<S: ScoreStore, P: PhotoSource> {
    settings: Settings,
    mode: Mode,
    playfield: Playfield,
    engine: Option<Engine>,
    photo: Option<PhotoAsset>,
    best: u32,
    store: S,
    photos: P,
    rng: StdRng,
    timers: Scheduler,
    pending: Option<Ticket>,
    message: Option<String>,
    compliment: Option<Compliment>,
    path_input: String,
    audio_enabled: bool,
    cues: Vec<Cue>,
    frame_loop: bool,
    game_over_panel: bool,
    shake: i32,
    exit: bool,
}

impl<S: ScoreStore, P: PhotoSource> App<S, P> {
    pub fn new(settings: Settings, store: S, photos: P, rng: StdRng) -> Self {
        let best = store.load_best();
        let playfield = Playfield::fit(settings.playfield_height, 16, 9);
        info!(best, "app_started");
        App {
            settings,
            mode: Mode::Menu,
            playfield,
            engine: None,
            photo: None,
            best,
            store,
            photos,
            rng,
            timers: Scheduler::default(),
            pending: None,
            message: None,
            compliment: None,
            path_input: String::new(),
            audio_enabled: true,
            cues: Vec::new(),
            frame_loop: false,
            game_over_panel: false,
            shake: 0,
            exit: false,
        }
    }

    /// Match the playfield to a pixel surface. A run already in progress
    /// keeps its playfield; the next one picks the new shape up.
    pub fn set_surface(&mut self, width: usize, height: usize) {
        self.playfield = Playfield::fit(self.settings.playfield_height, width, height);
    }

    pub fn handle(&mut self, input: Input, now: u64) {
        match input {
            Input::Exit => {
                self.photos.release_camera();
                self.exit = true;
                return;
            }
            Input::ToggleAudio => {
                self.audio_enabled = !self.audio_enabled;
                info!(enabled = self.audio_enabled, "audio_toggled");
                return;
            }
            Input::DismissMessage => {
                self.message = None;
                self.timers.cancel(TimerKind::ClearMessage);
                return;
            }
            _ => {}
        }

        match self.mode {
            Mode::Menu => match input {
                Input::ChooseCamera => self.open_camera(now),
                Input::ChooseUpload => self.enter_upload(),
                Input::Quit => self.exit = true,
                _ => {}
            },
            Mode::Acquiring(Acquire::Camera) => match input {
                Input::Activate | Input::Capture => self.capture(now),
                Input::ChooseUpload => self.enter_upload(),
                Input::Back | Input::Quit => self.to_menu(),
                _ => {}
            },
            Mode::Acquiring(Acquire::Upload) => match input {
                Input::Type(c) => self.path_input.push(c),
                Input::Erase => {
                    self.path_input.pop();
                }
                Input::Submit => {
                    let path = PathBuf::from(clean_path(&self.path_input));
                    if !path.as_os_str().is_empty() {
                        self.submit(path, now);
                    }
                }
                Input::SubmitPath(path) => self.submit(path, now),
                Input::Paste(text) => {
                    let path = clean_path(&text);
                    if !path.is_empty() {
                        self.path_input = path.to_string();
                        self.submit(PathBuf::from(path), now);
                    }
                }
                Input::ChooseCamera => self.open_camera(now),
                Input::Back | Input::Quit => self.to_menu(),
                _ => {}
            },
            Mode::Compliment => {
                if matches!(input, Input::Back | Input::Quit) {
                    self.to_menu();
                }
            }
            Mode::Ready | Mode::Playing => match input {
                Input::Activate => self.flap(now),
                Input::Pause | Input::FocusLost if self.mode == Mode::Playing => {
                    self.set_mode(Mode::Paused);
                }
                Input::Quit => self.to_menu(),
                _ => {}
            },
            Mode::Paused => match input {
                Input::Pause | Input::Activate => self.set_mode(Mode::Playing),
                Input::Quit => self.to_menu(),
                _ => {}
            },
            Mode::Ended => match input {
                Input::Retry => self.retry(),
                Input::NewPhoto => {
                    self.photo = None;
                    self.to_menu();
                }
                Input::Quit => self.to_menu(),
                _ => {}
            },
        }
    }

    /// Run one display frame. Returns whether the simulation was live this
    /// frame, i.e. whether the playfield needs to be redrawn.
    pub fn frame(&mut self, now: u64) -> bool {
        let live = self.frame_loop;

        self.poll_photos(now);
        for kind in self.timers.due(now) {
            self.fire(kind, now);
        }

        if let Some(engine) = self.engine.as_mut() {
            match self.mode {
                Mode::Ready => engine.idle(now),
                Mode::Playing => {
                    if engine.step(Mode::Playing).is_over() {
                        self.game_over(now);
                    }
                }
                _ => {}
            }
        }
        self.drain_engine_events(now);

        live
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut Engine> {
        self.engine.as_mut()
    }

    pub fn photo(&self) -> Option<&PhotoAsset> {
        self.photo.as_ref()
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The words of the compliment revealed so far.
    pub fn compliment_text(&self) -> Option<String> {
        self.compliment
            .as_ref()
            .map(|c| c.words[..c.shown].join(" "))
    }

    pub fn path_input(&self) -> &str {
        &self.path_input
    }

    pub fn photo_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn frame_loop(&self) -> bool {
        self.frame_loop
    }

    pub fn game_over_panel(&self) -> bool {
        self.game_over_panel
    }

    /// Current horizontal screen-shake offset in pixels.
    pub fn shake(&self) -> i32 {
        self.shake
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        let from = self.mode;
        if let Mode::Acquiring(kind) = from {
            if let Some(ticket) = self.pending.take() {
                debug!(ticket, "photo_job_abandoned");
            }
            self.timers.cancel(TimerKind::PhotoTimeout);
            if kind == Acquire::Camera {
                self.photos.release_camera();
            }
        }
        info!(from = from.name(), to = mode.name(), "mode_changed");
        self.mode = mode;
    }

    fn cue(&mut self, cue: Cue) {
        if self.audio_enabled {
            self.cues.push(cue);
        }
    }

    fn show_message(&mut self, text: String, now: u64) {
        self.message = Some(text);
        self.timers
            .schedule(TimerKind::ClearMessage, now, self.settings.timings.message_clear);
    }

    fn open_camera(&mut self, now: u64) {
        self.timers.cancel(TimerKind::CameraFallback);
        match self.photos.open_camera() {
            Ok(()) => self.set_mode(Mode::Acquiring(Acquire::Camera)),
            Err(err) => self.photo_failed(err, now),
        }
    }

    fn enter_upload(&mut self) {
        self.timers.cancel(TimerKind::CameraFallback);
        self.set_mode(Mode::Acquiring(Acquire::Upload));
    }

    fn capture(&mut self, now: u64) {
        if self.pending.is_some() {
            return;
        }
        self.start_job(PhotoJob::Capture, now);
    }

    fn submit(&mut self, path: PathBuf, now: u64) {
        info!(path = %path.display(), "photo_submitted");
        self.start_job(PhotoJob::Upload(path), now);
    }

    fn start_job(&mut self, job: PhotoJob, now: u64) {
        let ticket = self.photos.start(job);
        self.pending = Some(ticket);
        self.timers
            .schedule(TimerKind::PhotoTimeout, now, self.settings.timings.photo_timeout);
    }

    fn poll_photos(&mut self, now: u64) {
        while let Some((ticket, result)) = self.photos.poll() {
            if self.pending != Some(ticket) {
                debug!(ticket, "stale_photo_discarded");
                continue;
            }
            self.pending = None;
            self.timers.cancel(TimerKind::PhotoTimeout);

            match result {
                Ok(asset) => {
                    if self.mode == Mode::Acquiring(Acquire::Camera) {
                        self.cue(Cue::Shutter);
                    }
                    info!(ticket, size = asset.size(), "photo_acquired");
                    self.photo = Some(asset);
                    self.path_input.clear();
                    self.enter_compliment(now);
                }
                Err(err) => self.photo_failed(err, now),
            }
        }
    }

    /// Camera problems send the player to the upload screen after a short
    /// delay; upload problems leave them where they are to try another file.
    fn photo_failed(&mut self, err: PhotoError, now: u64) {
        warn!(error = %err, "photo_failed");
        let fallback = err.is_camera();
        self.show_message(err.to_string(), now);
        if fallback {
            self.timers
                .schedule(TimerKind::CameraFallback, now, self.settings.timings.camera_fallback);
        }
    }

    fn enter_compliment(&mut self, now: u64) {
        self.compliment = None;
        self.set_mode(Mode::Compliment);
        let t = &self.settings.timings;
        let (reveal, done) = (t.compliment_reveal, t.compliment_done);
        self.timers.schedule(TimerKind::RevealCompliment, now, reveal);
        self.timers.schedule(TimerKind::EnterReady, now, done);
    }

    fn fire(&mut self, kind: TimerKind, now: u64) {
        debug!(?kind, "timer_fired");
        let interval = self.settings.timings.word_interval;
        match kind {
            TimerKind::RevealCompliment => {
                let text = COMPLIMENTS[self.rng.gen_range(0..COMPLIMENTS.len())];
                let words: Vec<_> = text.split_whitespace().collect();
                let more = words.len() > 1;
                self.compliment = Some(Compliment { words, shown: 1 });
                self.cue(Cue::Pop);
                if more {
                    self.timers.schedule(TimerKind::RevealWord, now, interval);
                }
            }
            TimerKind::RevealWord => {
                if let Some(c) = self.compliment.as_mut() {
                    c.shown = (c.shown + 1).min(c.words.len());
                    if c.shown < c.words.len() {
                        self.timers.schedule(TimerKind::RevealWord, now, interval);
                    }
                }
            }
            TimerKind::EnterReady => self.enter_ready(),
            TimerKind::CameraFallback => {
                if matches!(self.mode, Mode::Menu | Mode::Acquiring(Acquire::Camera)) {
                    self.enter_upload();
                }
            }
            TimerKind::ClearMessage => self.message = None,
            TimerKind::PhotoTimeout => {
                if let Some(ticket) = self.pending.take() {
                    debug!(ticket, "photo_job_timed_out");
                    self.photo_failed(PhotoError::Timeout, now);
                }
            }
            TimerKind::ShowGameOver => self.game_over_panel = true,
            TimerKind::ShakeBack => {
                self.shake = -1;
                self.timers
                    .schedule(TimerKind::EndShake, now, self.settings.timings.shake_step);
            }
            TimerKind::EndShake => self.shake = 0,
        }
    }

    fn enter_ready(&mut self) {
        let rng = StdRng::seed_from_u64(self.rng.next_u64());
        let mut engine = Engine::new(self.settings.clone(), self.playfield, rng);
        engine.reset();
        self.engine = Some(engine);
        self.compliment = None;
        self.timers.cancel(TimerKind::RevealWord);
        self.start_run();
    }

    fn retry(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.reset();
        }
        self.start_run();
    }

    fn start_run(&mut self) {
        for kind in [TimerKind::ShowGameOver, TimerKind::ShakeBack, TimerKind::EndShake] {
            self.timers.cancel(kind);
        }
        self.game_over_panel = false;
        self.shake = 0;
        self.set_mode(Mode::Ready);
        self.frame_loop = true;
    }

    fn flap(&mut self, now: u64) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if engine.apply_input(self.mode, now) == InputEffect::Started {
            self.set_mode(Mode::Playing);
        }
    }

    fn game_over(&mut self, now: u64) {
        self.set_mode(Mode::Ended);
        self.frame_loop = false;

        let (score, ticks) = match self.engine.as_ref() {
            Some(engine) => (engine.score(), engine.ticks()),
            None => (0, 0),
        };
        if score > self.best {
            self.best = score;
            match self.store.save_best(score) {
                Ok(()) => info!(best = score, "best_score_saved"),
                Err(err) => warn!(error = %err, "best_score_not_saved"),
            }
        }
        info!(score, best = self.best, ticks, "session_ended");
        self.timers
            .schedule(TimerKind::ShowGameOver, now, self.settings.timings.game_over_panel);
    }

    fn drain_engine_events(&mut self, now: u64) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        for event in engine.drain_events() {
            match event {
                EngineEvent::Cue(cue) => self.cue(cue),
                EngineEvent::Shake => {
                    self.shake = 1;
                    self.timers
                        .schedule(TimerKind::ShakeBack, now, self.settings.timings.shake_step);
                    self.timers.cancel(TimerKind::EndShake);
                }
            }
        }
    }

    fn to_menu(&mut self) {
        for kind in [
            TimerKind::RevealCompliment,
            TimerKind::RevealWord,
            TimerKind::EnterReady,
            TimerKind::CameraFallback,
            TimerKind::ShowGameOver,
            TimerKind::ShakeBack,
            TimerKind::EndShake,
        ] {
            self.timers.cancel(kind);
        }
        self.photos.release_camera();
        self.engine = None;
        self.compliment = None;
        self.frame_loop = false;
        self.game_over_panel = false;
        self.shake = 0;
        self.path_input.clear();
        self.set_mode(Mode::Menu);
    }
}

/// Trim what a terminal pastes for a dropped file: whitespace, quotes and
/// a `file://` prefix.
pub fn clean_path(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
        .unwrap_or(text);
    text.strip_prefix("file://").unwrap_or(text)
}
