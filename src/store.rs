use crate::error::StoreError;

/// Where the best score is kept between runs.
pub trait ScoreStore {
    /// The stored best, or 0 when there is none.
    fn load_best(&self) -> u32;
    fn save_best(&mut self, score: u32) -> Result<(), StoreError>;
}

/// Keeps the best score for as long as the process runs.
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    best: Option<u32>,
}

impl ScoreStore for SessionStore {
    fn load_best(&self) -> u32 {
        self.best.unwrap_or(0)
    }

    fn save_best(&mut self, score: u32) -> Result<(), StoreError> {
        self.best = Some(score);
        Ok(())
    }
}
