//! Selfie Flappy: a Flappy Bird clone where the bird is a photo of the player.
//!
//! The library holds everything that can run without a terminal: the
//! simulation ([`engine`]), the screen/mode state machine ([`app`]) and the
//! collaborators it talks to (photos, best score, audio cues, rendering into
//! an off-screen pixel buffer). `main.rs` is the thin terminal adapter.

pub mod app;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod mode;
pub mod photo;
pub mod render;
pub mod schedule;
pub mod store;

pub use app::{App, Input};
pub use config::{Settings, Timings};
pub use engine::Engine;
pub use mode::Mode;
