use std::fs::File;
use std::io::{self, Stdout, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use crossterm::{
    cursor,
    event::{
        self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute, terminal,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use selfie_flappy::audio::Audio;
use selfie_flappy::mode::Acquire;
use selfie_flappy::photo::ThreadedPhotos;
use selfie_flappy::render::Renderer;
use selfie_flappy::store::SessionStore;
use selfie_flappy::{App, Input, Mode, Settings};

type Game = App<SessionStore, ThreadedPhotos>;

const USAGE: &str = "\
Usage: selfie-flappy [options]

  --config <file>   read settings from a TOML file
  --photo <file>    start straight away with this picture
  --log <file>      write a log (filter with RUST_LOG, default info)
  --seed <n>        fixed random seed
  --mute            start with sound off
  --help            show this message";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    photo: Option<PathBuf>,
    log: Option<PathBuf>,
    seed: Option<u64>,
    mute: bool,
}

/// `None` when only help was asked for.
fn parse_args() -> Result<Option<Args>> {
    let mut parsed = Args::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = || args.next().with_context(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--config" => parsed.config = Some(value()?.into()),
            "--photo" => parsed.photo = Some(value()?.into()),
            "--log" => parsed.log = Some(value()?.into()),
            "--seed" => {
                let seed = value()?;
                parsed.seed = Some(seed.parse().with_context(|| format!("bad seed {seed:?}"))?);
            }
            "--mute" => parsed.mute = true,
            "-h" | "--help" => return Ok(None),
            other => bail!("unknown argument {other:?}\n\n{USAGE}"),
        }
    }
    Ok(Some(parsed))
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let Some(args) = parse_args()? else {
        println!("{USAGE}");
        return Ok(());
    };
    if let Some(path) = &args.log {
        init_logging(path)?;
    }

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let photos = ThreadedPhotos::new(&settings);
    let mut app = App::new(settings, SessionStore::default(), photos, rng);
    if args.mute {
        app.handle(Input::ToggleAudio, 0);
    }
    if let Some(path) = args.photo {
        app.handle(Input::ChooseUpload, 0);
        app.handle(Input::SubmitPath(path), 0);
    }
    let audio = Audio::open();

    let mut out = stdout();
    terminal::enable_raw_mode().context("enabling raw mode")?;
    let result = setup(&mut out)
        .context("setting up the terminal")
        .and_then(|()| run(&mut out, &mut app, audio.as_ref()));
    if let Err(err) = cleanup(&mut out) {
        warn!(error = %err, "terminal_restore_failed");
    }
    info!("exited");
    result
}

fn setup(out: &mut Stdout) -> io::Result<()> {
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste,
    )
}

fn cleanup(out: &mut Stdout) -> io::Result<()> {
    execute!(
        out,
        DisableBracketedPaste,
        DisableFocusChange,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

fn run(out: &mut Stdout, app: &mut Game, audio: Option<&Audio>) -> Result<()> {
    let (cols, rows) = terminal::size()?;
    let pw = cols as usize;
    let ph = rows as usize * 2;

    let mut renderer = Renderer::new(pw, ph);
    app.set_surface(pw, ph);

    let frame_dur = Duration::from_millis(app.settings().frame_ms);
    let clock = Instant::now();

    loop {
        let frame_start = Instant::now();
        let now = clock.elapsed().as_millis() as u64;

        // Input
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Resize(c, r) => {
                    let npw = c as usize;
                    let nph = r as usize * 2;
                    renderer.resize(npw, nph);
                    app.set_surface(npw, nph);
                }
                event => {
                    if let Some(input) = translate(app.mode(), event) {
                        app.handle(input, now);
                    }
                }
            }
        }
        if app.should_exit() {
            return Ok(());
        }

        // Update
        let live = app.frame(now);
        let cues = app.drain_cues();
        if let Some(audio) = audio {
            for cue in cues {
                audio.play(cue);
            }
        }

        // Render
        let text = renderer.draw(app, live, now);
        if let Err(err) = renderer.present(out, &text) {
            warn!(error = %err, "frame_dropped");
        }

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

fn translate(mode: Mode, event: Event) -> Option<Input> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => translate_key(mode, key),
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
            Some(Input::Activate)
        }
        Event::FocusLost => Some(Input::FocusLost),
        Event::Paste(text) => Some(Input::Paste(text)),
        _ => None,
    }
}

fn translate_key(mode: Mode, key: KeyEvent) -> Option<Input> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Input::Exit);
    }

    // the upload screen is a text field, so letters are not shortcuts there
    if mode == Mode::Acquiring(Acquire::Upload) {
        return match key.code {
            KeyCode::Char(c) => Some(Input::Type(c)),
            KeyCode::Backspace => Some(Input::Erase),
            KeyCode::Enter => Some(Input::Submit),
            KeyCode::Esc => Some(Input::Back),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => Some(Input::Activate),
        KeyCode::Char('q') | KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char('p') => Some(Input::Pause),
        KeyCode::Char('c') => Some(Input::ChooseCamera),
        KeyCode::Char('u') => Some(Input::ChooseUpload),
        KeyCode::Char('r') => Some(Input::Retry),
        KeyCode::Char('n') => Some(Input::NewPhoto),
        KeyCode::Char('m') => Some(Input::ToggleAudio),
        KeyCode::Char('x') => Some(Input::DismissMessage),
        _ => None,
    }
}
