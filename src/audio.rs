//! Short synthesized sound effects.
//!
//! Each cue is a single sine voice with a pitch envelope and an exponential
//! volume decay, rendered up front into a sample buffer and handed to a
//! detached rodio sink so it plays in the background.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

const SAMPLE_RATE: u32 = 44_100;
const VOICE_SECS: f64 = 0.5;
const GAIN_START: f64 = 0.3;
const GAIN_END: f64 = 0.01;
const GAIN_RAMP_SECS: f64 = 0.3;

/// Named sound events emitted by the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    Flap,
    Score,
    Collision,
    Shutter,
    Pop,
}

/// How a cue's pitch moves over time.
#[derive(Clone, Copy)]
enum Pitch {
    /// Exponential glide from one frequency to another over `secs`, then hold.
    Glide { from: f64, to: f64, secs: f64 },
    /// Jump from one frequency to another at `at` seconds.
    Step { from: f64, to: f64, at: f64 },
}

impl Cue {
    fn pitch(self) -> Pitch {
        match self {
            Cue::Flap => Pitch::Glide {
                from: 300.0,
                to: 150.0,
                secs: 0.1,
            },
            Cue::Score => Pitch::Step {
                from: 523.0,
                to: 659.0,
                at: 0.1,
            },
            Cue::Collision => Pitch::Glide {
                from: 200.0,
                to: 100.0,
                secs: 0.5,
            },
            Cue::Shutter => Pitch::Glide {
                from: 800.0,
                to: 400.0,
                secs: 0.1,
            },
            Cue::Pop => Pitch::Glide {
                from: 600.0,
                to: 300.0,
                secs: 0.2,
            },
        }
    }

    /// Render the cue as mono samples at [`SAMPLE_RATE`].
    pub fn samples(self) -> Vec<f32> {
        let pitch = self.pitch();
        let count = (SAMPLE_RATE as f64 * VOICE_SECS) as usize;
        let dt = 1.0 / SAMPLE_RATE as f64;
        let mut phase = 0.0f64;

        (0..count)
            .map(|i| {
                let t = i as f64 * dt;
                let freq = match pitch {
                    Pitch::Glide { from, to, secs } => {
                        from * (to / from).powf((t / secs).min(1.0))
                    }
                    Pitch::Step { from, to, at } => {
                        if t < at {
                            from
                        } else {
                            to
                        }
                    }
                };
                let gain = GAIN_START * (GAIN_END / GAIN_START).powf((t / GAIN_RAMP_SECS).min(1.0));
                phase = (phase + freq * dt).fract();
                ((phase * std::f64::consts::TAU).sin() * gain) as f32
            })
            .collect()
    }
}

/// The audio output device. Holds the stream open for the life of the game.
pub struct Audio {
    // Dropping the stream silences every sink.
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl Audio {
    /// Open the default output device, or `None` if there is none.
    pub fn open() -> Option<Audio> {
        match OutputStream::try_default() {
            Ok((stream, handle)) => Some(Audio {
                _stream: stream,
                handle,
            }),
            Err(err) => {
                warn!(error = %err, "audio_unavailable");
                None
            }
        }
    }

    /// Fire and forget. Failures are logged and otherwise ignored.
    pub fn play(&self, cue: Cue) {
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(err) => {
                debug!(?cue, error = %err, "cue_dropped");
                return;
            }
        };
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, cue.samples()));
        sink.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cue_renders_half_a_second() {
        for cue in [Cue::Flap, Cue::Score, Cue::Collision, Cue::Shutter, Cue::Pop] {
            let s = cue.samples();
            assert_eq!(s.len(), 22_050);
            assert!(s.iter().all(|x| x.abs() <= 0.3 + 1e-6));
        }
    }

    #[test]
    fn volume_decays() {
        let s = Cue::Pop.samples();
        let peak = |r: std::ops::Range<usize>| s[r].iter().fold(0.0f32, |m, x| m.max(x.abs()));
        assert!(peak(0..2000) > peak(15_000..17_000));
    }
}
