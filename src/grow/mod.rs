//! Growth operators.
//!
//! Every operator appends one to three computed nodes chosen to minimize
//! the squared error of the last appended node against a target vector,
//! and returns that error. `None` means nothing better than [`BIG`] was
//! found and the graph is unchanged.

mod exhaustive;
pub mod parallel;
mod random;
mod registry;
pub mod rng;
mod triplet;

pub use exhaustive::{exhaustive, Sweep};
pub use random::{random_from_inputs, random_pair, random_single, PairShape};
pub use registry::{Family, Strategy, StrategyInfo, StrategySpec, REGISTRY};
pub use triplet::triplet;

use crate::net::MAX_NEURONS;
use crate::ops::Op;
use rng::Lcg;

/// Error of a class that has no output yet; also the initial search bound.
pub const BIG: f32 = 1e18;
/// Default per-class squared-error tolerance.
pub const TOLERANCE: f32 = 0.01;

/// Runtime knobs for growth and training.
#[derive(Clone, Debug)]
pub struct SearchSettings {
    /// Worker count; 0 means hardware parallelism.
    pub threads: usize,
    /// Allow the parallel variants to fan out.
    pub parallel: bool,
    /// Use SIMD kernels.
    pub simd: bool,
    pub seed: u32,
    pub tolerance: f32,
    pub max_neurons: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            threads: 0,
            parallel: true,
            simd: true,
            seed: 0,
            tolerance: TOLERANCE,
            max_neurons: MAX_NEURONS,
        }
    }
}

impl SearchSettings {
    /// Resolved worker count, at least 1.
    pub fn workers(&self) -> usize {
        let n = if self.threads == 0 {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            self.threads
        };
        n.max(1)
    }

    /// True when a parallel variant may fan out.
    pub fn fan_out(&self) -> bool {
        self.parallel && self.workers() > 1
    }

    /// Seed derived from the wall clock, for runs without `--seed`.
    pub fn clock_seed() -> u32 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as u32 ^ d.subsec_nanos())
    }
}

/// Operands and operator of one candidate node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub left: usize,
    pub right: usize,
    pub op: Op,
}

impl Link {
    /// Uniform draw of `left, right` in `[0, n)` and an operator.
    pub(crate) fn sample(rng: &mut Lcg, n: usize) -> Self {
        let left = rng.below(n);
        let right = rng.below(n);
        let op = Op::ALL[rng.below(Op::COUNT)];
        Self { left, right, op }
    }
}

/// Settings plus the session RNG used by the serial operators.
#[derive(Clone, Debug)]
pub struct SearchContext {
    pub settings: SearchSettings,
    rng: Lcg,
}

impl SearchContext {
    pub fn new(settings: SearchSettings) -> Self {
        let rng = Lcg::new(settings.seed);
        Self { settings, rng }
    }

    pub fn rng(&mut self) -> &mut Lcg {
        &mut self.rng
    }

    /// Base seed for a parallel call at graph size `nodes`.
    pub fn call_seed(&self, nodes: usize) -> u32 {
        rng::call_seed(self.settings.seed, nodes)
    }
}

/// `Σ (target − values)²`, abandoned with `None` as soon as the running
/// sum is no longer `<= bound` (which includes NaN).
#[inline]
pub fn score_bounded(target: &[f32], values: &[f32], bound: f32) -> Option<f32> {
    let mut sum = 0.0f32;
    for (t, v) in target.iter().zip(values) {
        let d = t - v;
        sum += d * d;
        if !(sum <= bound) {
            return None;
        }
    }
    Some(sum)
}

/// Unbounded squared error.
pub fn score(target: &[f32], values: &[f32]) -> f32 {
    target
        .iter()
        .zip(values)
        .map(|(t, v)| (t - v) * (t - v))
        .fold(0.0, |acc, x| acc + x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_score_prunes() {
        let t = [1.0, 0.0, 0.0];
        let v = [0.0, 1.0, 1.0];
        assert_eq!(score_bounded(&t, &v, 10.0), Some(3.0));
        assert_eq!(score_bounded(&t, &v, 3.0), Some(3.0));
        assert_eq!(score_bounded(&t, &v, 2.5), None);
        assert_eq!(score(&t, &v), 3.0);
    }

    #[test]
    fn nan_never_scores() {
        assert_eq!(score_bounded(&[1.0], &[f32::NAN], BIG), None);
        assert_eq!(score_bounded(&[1.0], &[f32::INFINITY], BIG), None);
    }

    #[test]
    fn workers_are_at_least_one() {
        let mut s = SearchSettings::default();
        assert!(s.workers() >= 1);
        s.threads = 3;
        assert_eq!(s.workers(), 3);
        s.parallel = false;
        assert!(!s.fan_out());
        s.parallel = true;
        s.threads = 1;
        assert!(!s.fan_out());
    }

    #[test]
    fn context_rng_follows_seed() {
        let mut a = SearchContext::new(SearchSettings {
            seed: 5,
            ..SearchSettings::default()
        });
        let mut b = Lcg::new(5);
        assert_eq!(a.rng().draw(), b.draw());
    }
}
