//! Fork-join scaffold for the parallel operators.
//!
//! Workers read the warmed caches, keep a private best and lower a shared
//! atomic minimum that every worker uses as its pruning bound. The caller
//! joins all workers before it touches the graph.

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

/// Budgets and candidate counts below this run serially.
pub const MIN_PARALLEL_WORK: usize = 2000;

/// Best complete score seen by any worker, stored as `f32` bits.
pub struct SharedMin(AtomicU32);

impl SharedMin {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Lower the minimum to `value`; never raises it.
    pub fn lower(&self, value: f32) {
        let mut current = self.0.load(Ordering::Relaxed);
        while value < f32::from_bits(current) {
            match self.0.compare_exchange_weak(
                current,
                value.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(seen) => current = seen,
            }
        }
    }
}

/// A candidate together with its complete score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Found<P> {
    pub score: f32,
    pub params: P,
}

/// Running best of one search loop, optionally publishing to a shared minimum.
pub(crate) struct Best<'s, P> {
    pub found: Option<Found<P>>,
    limit: f32,
    shared: Option<&'s SharedMin>,
}

impl<'s, P: Copy> Best<'s, P> {
    pub fn new(limit: f32, shared: Option<&'s SharedMin>) -> Self {
        Self {
            found: None,
            limit,
            shared,
        }
    }

    /// Current pruning bound.
    pub fn bound(&self) -> f32 {
        let local = self.found.map_or(self.limit, |f| f.score);
        match self.shared {
            Some(shared) => local.min(shared.load()),
            None => local,
        }
    }

    /// Adopt `params` if `score` strictly improves the local best.
    pub fn offer(&mut self, score: f32, params: P) -> bool {
        let current = self.found.map_or(self.limit, |f| f.score);
        if score < current {
            self.found = Some(Found { score, params });
            if let Some(shared) = self.shared {
                shared.lower(score);
            }
            true
        } else {
            false
        }
    }
}

/// Run `work(w)` on `workers` scoped threads and collect results in worker order.
pub(crate) fn fan_out<T, F>(workers: usize, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let work = &work;
                s.spawn(move || work(w))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(v) => v,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Strict minimum over worker results; ties go to the lowest worker.
pub fn merge<P: Copy>(results: impl IntoIterator<Item = Option<Found<P>>>) -> Option<Found<P>> {
    let mut best: Option<Found<P>> = None;
    for found in results.into_iter().flatten() {
        if best.map_or(true, |b| found.score < b.score) {
            best = Some(found);
        }
    }
    best
}

/// Split `range` into at most `parts` contiguous ascending chunks.
pub fn chunks(range: Range<usize>, parts: usize) -> Vec<Range<usize>> {
    let len = range.end.saturating_sub(range.start);
    let parts = parts.clamp(1, len.max(1));
    let step = len.div_ceil(parts);
    (0..parts)
        .map(|p| {
            let lo = (range.start + p * step).min(range.end);
            let hi = (lo + step).min(range.end);
            lo..hi
        })
        .filter(|r| !r.is_empty())
        .collect()
}

/// Per-worker share of a randomized budget, floored at `floor`.
pub fn share(budget: usize, workers: usize, floor: usize) -> usize {
    budget.div_ceil(workers.max(1)).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_min_only_lowers() {
        let m = SharedMin::new(10.0);
        m.lower(12.0);
        assert_eq!(m.load(), 10.0);
        m.lower(3.5);
        assert_eq!(m.load(), 3.5);
        m.lower(f32::NAN);
        assert_eq!(m.load(), 3.5);
    }

    #[test]
    fn shared_min_under_contention() {
        let m = SharedMin::new(f32::MAX);
        fan_out(8, |w| {
            for k in 0..1000 {
                m.lower((w * 1000 + k) as f32 + 1.0);
            }
        });
        assert_eq!(m.load(), 1.0);
    }

    #[test]
    fn merge_prefers_lowest_worker_on_ties() {
        let results = vec![
            None,
            Some(Found { score: 2.0, params: 1 }),
            Some(Found { score: 2.0, params: 2 }),
            Some(Found { score: 3.0, params: 3 }),
        ];
        assert_eq!(merge(results).map(|f| f.params), Some(1));
        assert_eq!(merge(Vec::<Option<Found<u8>>>::new()), None);
    }

    #[test]
    fn best_is_strict() {
        let mut best = Best::new(5.0, None);
        assert!(!best.offer(5.0, 'a'));
        assert!(best.offer(4.0, 'b'));
        assert!(!best.offer(4.0, 'c'));
        assert_eq!(best.bound(), 4.0);
        assert_eq!(best.found.map(|f| f.params), Some('b'));
    }

    #[test]
    fn best_reads_shared_bound() {
        let shared = SharedMin::new(1.0);
        let best: Best<'_, ()> = Best::new(100.0, Some(&shared));
        assert_eq!(best.bound(), 1.0);
    }

    #[test]
    fn chunks_cover_range_in_order() {
        let parts = chunks(1..50, 4);
        assert_eq!(parts.first().map(|r| r.start), Some(1));
        assert_eq!(parts.last().map(|r| r.end), Some(50));
        for pair in parts.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(chunks(3..5, 8).len(), 2);
        assert!(chunks(4..4, 3).is_empty());
    }

    #[test]
    fn share_respects_floor() {
        assert_eq!(share(10_000, 4, 100), 2500);
        assert_eq!(share(10_001, 4, 100), 2501);
        assert_eq!(share(300, 8, 100), 100);
    }

    #[test]
    fn fan_out_keeps_worker_order() {
        assert_eq!(fan_out(5, |w| w * w), vec![0, 1, 4, 9, 16]);
    }
}
