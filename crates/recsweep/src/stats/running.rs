use parking_lot::Mutex;
use std::sync::Arc;

/// Online mean and standard deviation over a stream of samples.
///
/// Uses Welford's update, so each [`add_datum`](Self::add_datum) is O(1) and
/// the variance does not suffer catastrophic cancellation over long runs.
///
/// With no samples, [`average`](Self::average) and
/// [`standard_deviation`](Self::standard_deviation) both return `0.0`. With a
/// single sample the standard deviation is `0.0`; otherwise it is the sample
/// standard deviation (divided by `n - 1`).
///
/// This type is single-owner. Use [`SharedRunningStats`] to feed one
/// accumulator from several threads.
///
/// # Example
///
/// ```
/// use recsweep::RunningStats;
///
/// let mut stats = RunningStats::new();
/// assert_eq!(stats.average(), 0.0);
///
/// for ms in [1.0, 2.0, 3.0] {
///     stats.add_datum(ms);
/// }
/// assert_eq!(stats.count(), 3);
/// assert_eq!(stats.average(), 2.0);
/// assert_eq!(stats.standard_deviation(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Creates an empty accumulator.
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Adds one sample.
    pub fn add_datum(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of samples seen so far.
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Running mean, or `0.0` with no samples.
    pub const fn average(&self) -> f64 {
        self.mean
    }

    /// Sample variance, or `0.0` with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Sample standard deviation, or `0.0` with fewer than two samples.
    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// A [`RunningStats`] shared between threads.
///
/// Cloning is cheap and every clone feeds the same accumulator. Each method
/// holds the internal lock for exactly one read or update, so concurrent
/// [`add_datum`](Self::add_datum) calls are serialized and none is lost.
#[derive(Debug, Clone, Default)]
pub struct SharedRunningStats {
    inner: Arc<Mutex<RunningStats>>,
}

impl SharedRunningStats {
    /// Creates an empty shared accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one sample.
    pub fn add_datum(&self, value: f64) {
        self.inner.lock().add_datum(value);
    }

    /// Number of samples seen so far.
    pub fn count(&self) -> u64 {
        self.inner.lock().count()
    }

    /// Running mean, or `0.0` with no samples.
    pub fn average(&self) -> f64 {
        self.inner.lock().average()
    }

    /// Sample standard deviation, or `0.0` with fewer than two samples.
    pub fn standard_deviation(&self) -> f64 {
        self.inner.lock().standard_deviation()
    }

    /// A consistent copy of count, mean and deviation taken under one lock.
    pub fn snapshot(&self) -> RunningStats {
        *self.inner.lock()
    }
}
