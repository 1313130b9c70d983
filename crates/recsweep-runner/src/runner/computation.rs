use core::time::Duration;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};
use recsweep::{
    CancellationToken, Computation, ComputationResult, Error, Identifier, Result, ScoredItem,
};
use std::time::Instant;

/// Longest uninterrupted sleep while simulating latency.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// A stand-in recommender that scores random items from a fixed catalog.
///
/// Results are deterministic per `(seed, id)`: the same user always gets the
/// same items and scores, regardless of which worker asks or in what order.
/// Latency and failures are simulated so the pool can be exercised under load
/// without a real model.
#[derive(Debug, Clone)]
pub struct SyntheticRecommender {
    catalog_size: u64,
    latency: Duration,
    failure_rate: f64,
    seed: u64,
    token: CancellationToken,
}

impl SyntheticRecommender {
    /// `failure_rate` must be within `[0, 1]`. `token` interrupts simulated
    /// latency.
    pub fn new(
        catalog_size: u64,
        latency: Duration,
        failure_rate: f64,
        seed: u64,
        token: CancellationToken,
    ) -> Self {
        Self {
            catalog_size,
            latency,
            failure_rate,
            seed,
            token,
        }
    }

    /// Sleeps for the configured latency, waking early if the token fires.
    fn simulate_latency(&self) -> Result<()> {
        let deadline = Instant::now() + self.latency;
        loop {
            if self.token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Ok(());
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
    }
}

impl Computation for SyntheticRecommender {
    fn compute(&self, id: Identifier, result_size: usize) -> Result<ComputationResult> {
        if !self.latency.is_zero() {
            self.simulate_latency()?;
        }

        let mut rng = StdRng::seed_from_u64(self.seed ^ id.rotate_left(32));
        if rng.random_bool(self.failure_rate) {
            return Err(Error::compute(format!("no recommendations for user {id}")));
        }

        let amount = result_size.min(self.catalog_size as usize);
        let picked = index::sample(&mut rng, self.catalog_size as usize, amount);
        let mut items: ComputationResult = picked
            .into_iter()
            .map(|item| ScoredItem::new(item as u64, rng.random::<f32>()))
            .collect();
        items.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(items)
    }
}
