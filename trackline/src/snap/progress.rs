//! Committed progress high-water mark.

/// Highest progress committed for the current path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressState {
    last_committed: f64,
}

impl ProgressState {
    /// Starts at progress 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts at `progress`, clamped to [0, 1].
    pub fn at(progress: f64) -> Self {
        Self {
            last_committed: clamp_progress(progress),
        }
    }

    pub fn last_committed(&self) -> f64 {
        self.last_committed
    }

    /// Raises the high-water mark to `progress` if it is higher.
    ///
    /// Returns the mark after the commit.
    pub fn commit(&mut self, progress: f64) -> f64 {
        let progress = clamp_progress(progress);
        if progress > self.last_committed {
            self.last_committed = progress;
        }
        self.last_committed
    }
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
