/// Which screen the application is on. Exactly one is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Menu,
    Acquiring(Acquire),
    Compliment,
    Ready,
    Playing,
    Paused,
    Ended,
}

/// The two ways of getting a photo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Acquire {
    Camera,
    Upload,
}

impl Mode {
    /// Modes in which the engine exists and is drawn.
    pub fn in_game(self) -> bool {
        matches!(self, Mode::Ready | Mode::Playing | Mode::Paused | Mode::Ended)
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Menu => "menu",
            Mode::Acquiring(Acquire::Camera) => "camera",
            Mode::Acquiring(Acquire::Upload) => "upload",
            Mode::Compliment => "compliment",
            Mode::Ready => "ready",
            Mode::Playing => "playing",
            Mode::Paused => "paused",
            Mode::Ended => "ended",
        }
    }
}
