//! Deadlock detection for the cooperative drive loop.

use crate::error::ConvertError;

/// Idle iterations tolerated on top of the buffer size.
pub const BASE_LOOPS_WITHOUT_PROGRESS: usize = 100_000;

/// Fails the conversion once the drive loop has gone `limit` consecutive
/// iterations without moving any data.
#[derive(Clone, Debug)]
pub struct ProgressGuard {
    limit: usize,
    idle: usize,
}

impl ProgressGuard {
    pub fn new(limit: usize) -> Self {
        Self { limit, idle: 0 }
    }

    /// Guard sized for a chain moving data in `buffer_size` chunks.
    pub fn for_buffer_size(buffer_size: usize) -> Self {
        Self::new(BASE_LOOPS_WITHOUT_PROGRESS.saturating_add(buffer_size))
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn idle(&self) -> usize {
        self.idle
    }

    /// Record the outcome of one iteration.
    pub fn check(&mut self, progress: bool) -> Result<(), ConvertError> {
        if progress {
            self.idle = 0;
            return Ok(());
        }
        self.idle += 1;
        if self.idle > self.limit {
            log::warn!(
                target: "html.chain",
                "no progress for {} iterations, giving up",
                self.idle
            );
            return Err(ConvertError::TooManyIterations { loops: self.idle });
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.idle = 0;
    }
}
