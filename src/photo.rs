//! Getting the player's photo.
//!
//! Photos come from an image file (typed or dropped into the terminal) or
//! from an external capture program standing in for a camera. Either way the
//! result is a square [`PhotoAsset`] cropped from the centre of the source.
//! Decoding runs off the frame loop: [`ThreadedPhotos`] does each job on its
//! own thread and reports back through a channel, tagged with the ticket it
//! handed out so stale results can be recognised and dropped.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::PhotoError;

/// Identifies one acquisition request.
pub type Ticket = u64;

/// A square RGB image, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct PhotoAsset {
    size: u32,
    pixels: Vec<[u8; 3]>,
}

impl PhotoAsset {
    /// Centre-crop `img` to a square and scale it to `size` x `size`.
    /// `mirror` flips it horizontally, as a selfie preview would show it.
    pub fn from_image(img: &DynamicImage, size: u32, mirror: bool) -> PhotoAsset {
        let side = img.width().min(img.height());
        let x = (img.width() - side) / 2;
        let y = (img.height() - side) / 2;

        let mut square = img
            .crop_imm(x, y, side, side)
            .resize_exact(size, size, FilterType::Triangle);
        if mirror {
            square = square.fliph();
        }

        let rgb = square.to_rgb8();
        PhotoAsset {
            size,
            pixels: rgb.pixels().map(|p| p.0).collect(),
        }
    }

    /// A single-colour asset.
    pub fn solid(size: u32, rgb: [u8; 3]) -> PhotoAsset {
        PhotoAsset {
            size,
            pixels: vec![rgb; (size * size) as usize],
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Nearest-neighbour lookup with `u`, `v` in `[0, 1]`; values outside
    /// are clamped to the edge.
    pub fn sample(&self, u: f64, v: f64) -> [u8; 3] {
        let max = (self.size - 1) as f64;
        let x = (u * self.size as f64).clamp(0.0, max) as usize;
        let y = (v * self.size as f64).clamp(0.0, max) as usize;
        self.pixels[y * self.size as usize + x]
    }
}

/// Read, validate and normalise an image file.
pub fn load_file(path: &Path, size: u32, max_bytes: u64, mirror: bool) -> Result<PhotoAsset, PhotoError> {
    let len = std::fs::metadata(path)?.len();
    if len > max_bytes {
        return Err(PhotoError::TooLarge {
            limit_mb: max_bytes / (1024 * 1024),
        });
    }

    let bytes = std::fs::read(path)?;
    let format = image::guess_format(&bytes).map_err(|_| PhotoError::NotAnImage)?;
    let img = image::load_from_memory_with_format(&bytes, format).map_err(PhotoError::Decode)?;
    debug!(width = img.width(), height = img.height(), ?format, "photo_decoded");

    Ok(PhotoAsset::from_image(&img, size, mirror))
}

/// An open "camera": the configured capture program.
#[derive(Clone, Debug)]
pub struct CameraSession {
    command: Vec<String>,
}

static CAPTURE_SEQ: AtomicU64 = AtomicU64::new(0);

impl CameraSession {
    pub fn open(command: Option<&[String]>) -> Result<CameraSession, PhotoError> {
        match command {
            Some(argv) if !argv.is_empty() => Ok(CameraSession {
                command: argv.to_vec(),
            }),
            _ => Err(PhotoError::CameraUnsupported),
        }
    }

    /// Run the capture program and load the picture it wrote.
    pub fn capture(&self, size: u32, max_bytes: u64) -> Result<PhotoAsset, PhotoError> {
        let seq = CAPTURE_SEQ.fetch_add(1, Ordering::Relaxed);
        let out = std::env::temp_dir().join(format!("selfie-flappy-{}-{seq}.jpg", std::process::id()));
        let out_arg = out.to_string_lossy();

        let argv: Vec<String> = self
            .command
            .iter()
            .map(|arg| arg.replace("{out}", &out_arg))
            .collect();
        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .status()
            .map_err(|err| PhotoError::CameraFailed(err.to_string()))?;
        if !status.success() {
            return Err(PhotoError::CameraFailed(format!("capture exited with {status}")));
        }

        let result = load_file(&out, size, max_bytes, true);
        if let Err(err) = std::fs::remove_file(&out) {
            debug!(path = %out.display(), error = %err, "capture_cleanup_failed");
        }
        result
    }
}

/// What to acquire.
#[derive(Clone, Debug, PartialEq)]
pub enum PhotoJob {
    Upload(PathBuf),
    Capture,
}

/// The photo collaborator as seen by the state machine.
pub trait PhotoSource {
    /// Start the live camera. Fails when no camera is available.
    fn open_camera(&mut self) -> Result<(), PhotoError>;
    /// Release the camera if it is open. Safe to call at any time.
    fn release_camera(&mut self);
    /// Begin an acquisition; its result arrives later through [`poll`].
    ///
    /// [`poll`]: PhotoSource::poll
    fn start(&mut self, job: PhotoJob) -> Ticket;
    /// A finished job, if any.
    fn poll(&mut self) -> Option<(Ticket, Result<PhotoAsset, PhotoError>)>;
}

type JobResult = (Ticket, Result<PhotoAsset, PhotoError>);

/// Runs every job on a background thread.
pub struct ThreadedPhotos {
    size: u32,
    max_bytes: u64,
    camera_command: Option<Vec<String>>,
    camera: Option<CameraSession>,
    next_ticket: Ticket,
    tx: Sender<JobResult>,
    rx: Receiver<JobResult>,
}

impl ThreadedPhotos {
    pub fn new(settings: &Settings) -> ThreadedPhotos {
        let (tx, rx) = mpsc::channel();
        ThreadedPhotos {
            size: settings.photo_size,
            max_bytes: settings.max_upload_bytes,
            camera_command: settings.camera_command.clone(),
            camera: None,
            next_ticket: 0,
            tx,
            rx,
        }
    }
}

impl PhotoSource for ThreadedPhotos {
    fn open_camera(&mut self) -> Result<(), PhotoError> {
        let session = CameraSession::open(self.camera_command.as_deref())?;
        info!(program = %session.command[0], "camera_opened");
        self.camera = Some(session);
        Ok(())
    }

    fn release_camera(&mut self) {
        if self.camera.take().is_some() {
            info!("camera_released");
        }
    }

    fn start(&mut self, job: PhotoJob) -> Ticket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let tx = self.tx.clone();
        let (size, max_bytes) = (self.size, self.max_bytes);
        let camera = self.camera.clone();

        debug!(ticket, ?job, "photo_job_started");
        thread::spawn(move || {
            let result = match job {
                PhotoJob::Upload(path) => load_file(&path, size, max_bytes, false),
                PhotoJob::Capture => match camera {
                    Some(session) => session.capture(size, max_bytes),
                    None => Err(PhotoError::CameraFailed("camera is not open".into())),
                },
            };
            if tx.send((ticket, result)).is_err() {
                warn!(ticket, "photo_result_undeliverable");
            }
        });
        ticket
    }

    fn poll(&mut self) -> Option<JobResult> {
        self.rx.try_recv().ok()
    }
}
