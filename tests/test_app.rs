use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

use selfie_flappy::audio::Cue;
use selfie_flappy::config::Settings;
use selfie_flappy::engine::Obstacle;
use selfie_flappy::error::{PhotoError, StoreError};
use selfie_flappy::mode::{Acquire, Mode};
use selfie_flappy::photo::{PhotoAsset, PhotoJob, PhotoSource, Ticket};
use selfie_flappy::store::ScoreStore;
use selfie_flappy::{App, Input};

use rand::SeedableRng;
use rand::rngs::StdRng;

// ── fakes ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct PhotoState {
    has_camera: bool,
    camera_open: bool,
    next_ticket: Ticket,
    jobs: Vec<(Ticket, PhotoJob)>,
    finished: VecDeque<(Ticket, Result<PhotoAsset, PhotoError>)>,
}

#[derive(Clone, Default)]
struct FakePhotos(Rc<RefCell<PhotoState>>);

impl FakePhotos {
    fn with_camera() -> FakePhotos {
        let photos = FakePhotos::default();
        photos.0.borrow_mut().has_camera = true;
        photos
    }

    fn last_ticket(&self) -> Ticket {
        self.0.borrow().jobs.last().map(|(t, _)| *t).unwrap()
    }

    fn finish(&self, ticket: Ticket, result: Result<PhotoAsset, PhotoError>) {
        self.0.borrow_mut().finished.push_back((ticket, result));
    }

    fn finish_ok(&self, ticket: Ticket) {
        self.finish(ticket, Ok(PhotoAsset::solid(8, [200, 120, 90])));
    }
}

impl PhotoSource for FakePhotos {
    fn open_camera(&mut self) -> Result<(), PhotoError> {
        let mut s = self.0.borrow_mut();
        if !s.has_camera {
            return Err(PhotoError::CameraUnsupported);
        }
        s.camera_open = true;
        Ok(())
    }

    fn release_camera(&mut self) {
        self.0.borrow_mut().camera_open = false;
    }

    fn start(&mut self, job: PhotoJob) -> Ticket {
        let mut s = self.0.borrow_mut();
        s.next_ticket += 1;
        let ticket = s.next_ticket;
        s.jobs.push((ticket, job));
        ticket
    }

    fn poll(&mut self) -> Option<(Ticket, Result<PhotoAsset, PhotoError>)> {
        self.0.borrow_mut().finished.pop_front()
    }
}

/// Remembers every save.
#[derive(Default)]
struct RecordingStore {
    best: u32,
    saves: Vec<u32>,
}

impl ScoreStore for RecordingStore {
    fn load_best(&self) -> u32 {
        self.best
    }

    fn save_best(&mut self, score: u32) -> Result<(), StoreError> {
        self.best = score;
        self.saves.push(score);
        Ok(())
    }
}

/// Storage that is never there.
struct FailingStore;

impl ScoreStore for FailingStore {
    fn load_best(&self) -> u32 {
        0
    }

    fn save_best(&mut self, _score: u32) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }
}

type TestApp = App<RecordingStore, FakePhotos>;

fn make_app(best: u32, photos: &FakePhotos) -> TestApp {
    let store = RecordingStore {
        best,
        saves: Vec::new(),
    };
    App::new(Settings::default(), store, photos.clone(), StdRng::seed_from_u64(7))
}

/// Upload a photo and wait out the compliment. Returns the clock.
fn to_ready<S: ScoreStore>(app: &mut App<S, FakePhotos>, photos: &FakePhotos) -> u64 {
    app.handle(Input::ChooseUpload, 0);
    app.handle(Input::SubmitPath(PathBuf::from("me.png")), 0);
    photos.finish_ok(photos.last_ticket());
    app.frame(10);
    assert_eq!(app.mode(), Mode::Compliment);
    app.frame(3210);
    assert_eq!(app.mode(), Mode::Ready);
    3210
}

/// Line up `n` pipes that are cleared on the next tick, then drop the
/// avatar so the tick after ends the run.
fn score_and_crash<S: ScoreStore>(app: &mut App<S, FakePhotos>, n: u32, mut now: u64) -> u64 {
    let engine = app.engine_mut().unwrap();
    let ax = engine.avatar.x;
    let field = engine.playfield();
    for _ in 0..n {
        let mut pipe = Obstacle::with_gap(field, 60.0, 50.0, 500.0);
        pipe.x = ax - 59.0;
        engine.obstacles.push(pipe);
    }
    now += 16;
    app.frame(now);
    assert_eq!(app.mode(), Mode::Playing);
    assert_eq!(app.engine().unwrap().score(), n);

    app.engine_mut().unwrap().avatar.y = 10_000.0;
    now += 16;
    app.frame(now);
    assert_eq!(app.mode(), Mode::Ended);
    now
}

// ── photo flow ────────────────────────────────────────────────────────────────

#[test]
fn starts_on_the_menu_with_stored_best() {
    let photos = FakePhotos::default();
    let app = make_app(9, &photos);
    assert_eq!(app.mode(), Mode::Menu);
    assert_eq!(app.best(), 9);
    assert!(app.engine().is_none());
    assert!(!app.frame_loop());
}

#[test]
fn upload_leads_to_compliment_then_ready() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);

    app.handle(Input::ChooseUpload, 0);
    assert_eq!(app.mode(), Mode::Acquiring(Acquire::Upload));
    for c in "'/tmp/me.png'".chars() {
        app.handle(Input::Type(c), 0);
    }
    app.handle(Input::Submit, 0);
    assert!(app.photo_pending());
    assert_eq!(
        photos.0.borrow().jobs[0].1,
        PhotoJob::Upload(PathBuf::from("/tmp/me.png"))
    );

    photos.finish_ok(1);
    app.frame(10);
    assert_eq!(app.mode(), Mode::Compliment);
    assert!(app.photo().is_some());
    assert!(!app.photo_pending());
    assert_eq!(app.compliment_text(), None);

    app.frame(809);
    assert_eq!(app.compliment_text(), None);
    app.frame(810);
    let first = app.compliment_text().unwrap();
    assert_eq!(first.split(' ').count(), 1);
    assert_eq!(app.drain_cues(), vec![Cue::Pop]);
    app.frame(1010);
    assert_eq!(app.compliment_text().unwrap().split(' ').count(), 2);

    app.frame(3209);
    assert_eq!(app.mode(), Mode::Compliment);
    app.frame(3210);
    assert_eq!(app.mode(), Mode::Ready);
    let engine = app.engine().unwrap();
    assert!(engine.avatar.alive);
    assert_eq!(engine.score(), 0);
    assert!(app.frame_loop());
}

#[test]
fn pasted_path_is_submitted_straight_away() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    app.handle(Input::ChooseUpload, 0);
    app.handle(Input::Paste("file:///home/me/selfie.jpg\n".into()), 0);
    assert_eq!(
        photos.0.borrow().jobs[0].1,
        PhotoJob::Upload(PathBuf::from("/home/me/selfie.jpg"))
    );
}

#[test]
fn failed_upload_stays_on_the_upload_screen() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    app.handle(Input::ChooseUpload, 0);
    app.handle(Input::SubmitPath("notes.txt".into()), 0);
    photos.finish(1, Err(PhotoError::NotAnImage));
    app.frame(10);

    assert_eq!(app.mode(), Mode::Acquiring(Acquire::Upload));
    assert!(app.message().unwrap().contains("valid image file"));
    app.frame(5009);
    assert!(app.message().is_some());
    app.frame(5010);
    assert_eq!(app.message(), None);
}

#[test]
fn missing_camera_falls_back_to_upload() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    app.handle(Input::ChooseCamera, 100);

    assert_eq!(app.mode(), Mode::Menu);
    assert!(app.message().unwrap().contains("Camera not supported"));
    app.frame(2099);
    assert_eq!(app.mode(), Mode::Menu);
    app.frame(2100);
    assert_eq!(app.mode(), Mode::Acquiring(Acquire::Upload));
}

#[test]
fn camera_capture_plays_shutter_and_releases_camera() {
    let photos = FakePhotos::with_camera();
    let mut app = make_app(0, &photos);
    app.handle(Input::ChooseCamera, 0);
    assert_eq!(app.mode(), Mode::Acquiring(Acquire::Camera));
    assert!(photos.0.borrow().camera_open);

    app.handle(Input::Activate, 10);
    // a second press while processing does not start another capture
    app.handle(Input::Capture, 20);
    assert_eq!(photos.0.borrow().jobs.len(), 1);
    assert_eq!(photos.0.borrow().jobs[0].1, PhotoJob::Capture);

    photos.finish_ok(1);
    app.frame(30);
    assert_eq!(app.mode(), Mode::Compliment);
    assert!(app.drain_cues().contains(&Cue::Shutter));
    assert!(!photos.0.borrow().camera_open);
}

#[test]
fn leaving_discards_the_pending_photo() {
    let photos = FakePhotos::with_camera();
    let mut app = make_app(0, &photos);
    app.handle(Input::ChooseCamera, 0);
    app.handle(Input::Capture, 0);
    app.handle(Input::Back, 5);
    assert_eq!(app.mode(), Mode::Menu);
    assert!(!app.photo_pending());
    assert!(!photos.0.borrow().camera_open);

    photos.finish_ok(1);
    app.frame(50);
    assert_eq!(app.mode(), Mode::Menu);
    assert!(app.photo().is_none());
}

#[test]
fn slow_photo_times_out() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    app.handle(Input::ChooseUpload, 0);
    app.handle(Input::SubmitPath("huge.png".into()), 0);

    app.frame(9_999);
    assert!(app.photo_pending());
    app.frame(10_000);
    assert!(!app.photo_pending());
    assert!(app.message().unwrap().contains("timed out"));

    // a late result is ignored
    photos.finish_ok(1);
    app.frame(10_100);
    assert_eq!(app.mode(), Mode::Acquiring(Acquire::Upload));
    assert!(app.photo().is_none());
}

#[test]
fn quitting_during_compliment_cancels_the_game() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    app.handle(Input::ChooseUpload, 0);
    app.handle(Input::SubmitPath("me.png".into()), 0);
    photos.finish_ok(1);
    app.frame(10);
    app.handle(Input::Quit, 500);
    assert_eq!(app.mode(), Mode::Menu);

    app.frame(5000);
    assert_eq!(app.mode(), Mode::Menu);
    assert!(app.engine().is_none());
}

// ── playing ───────────────────────────────────────────────────────────────────

#[test]
fn ready_idles_until_the_first_input() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    let now = to_ready(&mut app, &photos);
    let half = app.engine().unwrap().playfield().height / 2.0;

    for t in 1..50 {
        app.frame(now + t * 16);
        let engine = app.engine().unwrap();
        assert!((engine.avatar.y - half).abs() <= 3.0);
        assert_eq!(engine.ticks(), 0);
    }
    assert_eq!(app.mode(), Mode::Ready);
}

#[test]
fn debounced_second_input_does_nothing() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    let now = to_ready(&mut app, &photos);

    app.handle(Input::Activate, now);
    assert_eq!(app.mode(), Mode::Playing);
    let v = app.engine().unwrap().avatar.velocity;
    assert!(v < 0.0);

    app.handle(Input::Activate, now + 50);
    assert_eq!(app.engine().unwrap().avatar.velocity, v);
    assert_eq!(app.mode(), Mode::Playing);
}

#[test]
fn free_fall_ends_the_game() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    let mut now = to_ready(&mut app, &photos);
    app.handle(Input::Activate, now);

    let mut frames = 0;
    while app.mode() == Mode::Playing {
        now += 16;
        assert!(app.frame(now));
        frames += 1;
        assert!(frames < 500, "run never ended");
    }
    assert_eq!(app.mode(), Mode::Ended);
    assert!(!app.engine().unwrap().avatar.alive);
    assert!(!app.frame_loop());
    assert!(!app.frame(now + 16));
    assert!(app.drain_cues().contains(&Cue::Collision));

    // score 0 never beats the stored best of 0
    assert!(app.store().saves.is_empty());

    assert!(!app.game_over_panel());
    app.frame(now + 499);
    assert!(!app.game_over_panel());
    app.frame(now + 500);
    assert!(app.game_over_panel());
}

#[test]
fn best_score_only_moves_up() {
    let photos = FakePhotos::default();
    let mut app = make_app(3, &photos);
    let mut now = to_ready(&mut app, &photos);

    app.handle(Input::Activate, now);
    now = score_and_crash(&mut app, 5, now);
    assert_eq!(app.best(), 5);
    assert_eq!(app.store().saves, vec![5]);

    app.handle(Input::Retry, now);
    assert_eq!(app.mode(), Mode::Ready);
    assert_eq!(app.engine().unwrap().score(), 0);
    assert!(app.frame_loop());

    now += 16;
    app.handle(Input::Activate, now);
    assert_eq!(app.mode(), Mode::Playing);
    score_and_crash(&mut app, 2, now);
    assert_eq!(app.best(), 5);
    assert_eq!(app.store().saves, vec![5]);
}

#[test]
fn failed_save_still_ends_the_game_normally() {
    let photos = FakePhotos::default();
    let mut app = App::new(Settings::default(), FailingStore, photos.clone(), StdRng::seed_from_u64(7));
    let mut now = to_ready(&mut app, &photos);

    app.handle(Input::Activate, now);
    now = score_and_crash(&mut app, 5, now);
    assert_eq!(app.mode(), Mode::Ended);
    assert_eq!(app.best(), 5);

    app.handle(Input::Retry, now);
    assert_eq!(app.mode(), Mode::Ready);
    assert_eq!(app.engine().unwrap().score(), 0);
}

#[test]
fn pause_freezes_the_simulation() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    let now = to_ready(&mut app, &photos);
    app.handle(Input::Activate, now);
    app.frame(now + 16);

    app.handle(Input::Pause, now + 20);
    assert_eq!(app.mode(), Mode::Paused);
    let ticks = app.engine().unwrap().ticks();
    for t in 1..10 {
        app.frame(now + 20 + t * 16);
    }
    assert_eq!(app.engine().unwrap().ticks(), ticks);

    app.handle(Input::Pause, now + 400);
    assert_eq!(app.mode(), Mode::Playing);
    app.frame(now + 416);
    assert_eq!(app.engine().unwrap().ticks(), ticks + 1);

    app.handle(Input::FocusLost, now + 420);
    assert_eq!(app.mode(), Mode::Paused);
}

#[test]
fn quit_from_a_run_returns_to_menu() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    let now = to_ready(&mut app, &photos);
    app.handle(Input::Activate, now);
    app.handle(Input::Quit, now + 100);

    assert_eq!(app.mode(), Mode::Menu);
    assert!(app.engine().is_none());
    assert!(!app.frame_loop());
    // the photo is kept for the next round
    assert!(app.photo().is_some());
}

#[test]
fn new_photo_discards_the_old_one() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    let mut now = to_ready(&mut app, &photos);
    app.handle(Input::Activate, now);
    now = score_and_crash(&mut app, 1, now);

    app.handle(Input::NewPhoto, now);
    assert_eq!(app.mode(), Mode::Menu);
    assert!(app.photo().is_none());
    assert!(app.engine().is_none());
}

#[test]
fn flap_shakes_the_screen_briefly() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    let now = to_ready(&mut app, &photos);
    app.handle(Input::Activate, now);
    app.frame(now);

    app.handle(Input::Activate, now + 200);
    app.frame(now + 200);
    assert_eq!(app.shake(), 1);
    app.frame(now + 250);
    assert_eq!(app.shake(), -1);
    app.frame(now + 300);
    assert_eq!(app.shake(), 0);
}

#[test]
fn retry_clears_a_shake_in_progress() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    let mut now = to_ready(&mut app, &photos);
    app.handle(Input::Activate, now);
    // a mid-air flap arms the shake, the crash lands before it settles
    now += 100;
    app.handle(Input::Activate, now);
    now = score_and_crash(&mut app, 1, now);
    assert_eq!(app.shake(), 1);

    app.handle(Input::Retry, now);
    assert_eq!(app.shake(), 0);
    app.frame(now + 60);
    assert_eq!(app.shake(), 0);
    app.frame(now + 120);
    assert_eq!(app.shake(), 0);
}

#[test]
fn muted_app_emits_no_cues() {
    let photos = FakePhotos::default();
    let mut app = make_app(0, &photos);
    app.handle(Input::ToggleAudio, 0);
    assert!(!app.audio_enabled());

    let now = to_ready(&mut app, &photos);
    app.handle(Input::Activate, now);
    app.frame(now + 16);
    assert!(app.drain_cues().is_empty());
}

#[test]
fn exit_is_honoured_from_any_screen() {
    let photos = FakePhotos::with_camera();
    let mut app = make_app(0, &photos);
    app.handle(Input::ChooseCamera, 0);
    app.handle(Input::Exit, 10);
    assert!(app.should_exit());
    assert!(!photos.0.borrow().camera_open);
}
