//! Incrementally updated arithmetic means.

use serde::{Deserialize, Serialize};

/// Arithmetic mean accumulated one value at a time.
///
/// The mean of an empty accumulator is undefined, so [`RunningMean::value`] returns
/// `None` until the first value arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMean {
    count: usize,
    mean: f64,
}

impl RunningMean {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value to the mean.
    #[expect(clippy::cast_precision_loss)]
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
    }

    /// Number of values pushed so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }
}

impl Extend<f64> for RunningMean {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for value in iter {
            self.push(value);
        }
    }
}

impl FromIterator<f64> for RunningMean {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut mean = Self::new();
        mean.extend(iter);
        mean
    }
}
