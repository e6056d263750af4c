//! Randomized single-node and pair operators.

use tracing::debug;

use super::parallel::{fan_out, merge, share, Best, Found, SharedMin, MIN_PARALLEL_WORK};
use super::rng::Lcg;
use super::{score, score_bounded, Link, SearchContext, BIG};
use crate::error::Result;
use crate::net::{Columns, Network};
use crate::ops::{Kernel, Op};

/// Window of recent nodes the optimized pair search draws `A.left` from;
/// also its per-node iteration factor.
pub const RECENT: usize = 10;
/// Per-worker floor for the parallel pair searches.
const PAIR_WORKER_FLOOR: usize = 100;

/// Append one uniformly random node and return its error.
pub fn random_single(net: &mut Network, target: &[f32], ctx: &mut SearchContext) -> Result<Option<f32>> {
    let link = Link::sample(ctx.rng(), net.len());
    append_scored(net, target, link)
}

/// Append one random node combining an input with a receptor.
pub fn random_from_inputs(
    net: &mut Network,
    target: &[f32],
    ctx: &mut SearchContext,
) -> Result<Option<f32>> {
    let (inputs, receptors) = (net.inputs(), net.receptors());
    let rng = ctx.rng();
    let left = rng.below(inputs);
    let right = rng.below(receptors);
    let op = Op::ALL[rng.below(Op::COUNT)];
    append_scored(net, target, Link { left, right, op })
}

fn append_scored(net: &mut Network, target: &[f32], link: Link) -> Result<Option<f32>> {
    let id = net.push(link.left, link.right, link.op)?;
    let error = score(target, net.vector(id));
    debug!(
        "({id}) = ({}) {} ({}), error = {error}",
        link.left,
        link.op.symbol(),
        link.right
    );
    Ok(Some(error))
}

/// Candidate ranges of a pair search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairShape {
    /// `A` joins a recent node with an older one, `B` adds an input.
    Optimized,
    /// All three operand indices range over the whole graph.
    Extended,
}

impl PairShape {
    /// Iteration budget at graph size `nodes`.
    pub fn budget(self, nodes: usize, inputs: usize) -> usize {
        match self {
            PairShape::Optimized => inputs * nodes * RECENT,
            PairShape::Extended => 6 * nodes * nodes,
        }
    }

    fn sample(self, rng: &mut Lcg, nodes: usize, inputs: usize) -> Pair {
        match self {
            PairShape::Optimized => {
                let lo = nodes.saturating_sub(RECENT);
                let left = lo + rng.below(nodes - lo);
                let right = rng.below(nodes.saturating_sub(RECENT).max(1));
                let op = Op::ALL[rng.below(Op::COUNT)];
                let b_right = rng.below(inputs);
                let b_op = Op::ALL[rng.below(Op::COUNT)];
                Pair {
                    a: Link { left, right, op },
                    b_right,
                    b_op,
                }
            }
            PairShape::Extended => {
                let a = Link::sample(rng, nodes);
                let b_right = rng.below(nodes);
                let b_op = Op::ALL[rng.below(Op::COUNT)];
                Pair { a, b_right, b_op }
            }
        }
    }
}

/// `A = op(a.left, a.right)`, `B = b_op(A, b_right)`.
#[derive(Clone, Copy, Debug)]
struct Pair {
    a: Link,
    b_right: usize,
    b_op: Op,
}

/// Append the best random pair `A, B` found within the budget. `B` is the
/// scored node and combines `A` with one more existing node.
pub fn random_pair(
    net: &mut Network,
    target: &[f32],
    shape: PairShape,
    parallel: bool,
    ctx: &mut SearchContext,
) -> Result<Option<f32>> {
    let nodes = net.len();
    let inputs = net.inputs();
    let kernel = net.kernel();
    let budget = shape.budget(nodes, inputs);
    let workers = ctx.settings.workers();
    let fan = parallel && ctx.settings.fan_out() && budget >= MIN_PARALLEL_WORK;
    let base = ctx.call_seed(nodes);

    let found = {
        let cols = net.warm();
        let job = Job {
            cols: &cols,
            target,
            kernel,
            shape,
            inputs,
        };
        if fan {
            let shared = SharedMin::new(BIG);
            let per_worker = share(budget, workers, PAIR_WORKER_FLOOR);
            merge(fan_out(workers, |w| {
                job.scan(per_worker, &mut Lcg::for_worker(base, w), Some(&shared))
            }))
        } else {
            job.scan(budget, ctx.rng(), None)
        }
    };

    let Some(Found { score, params }) = found else {
        return Ok(None);
    };
    let a = net.push(params.a.left, params.a.right, params.a.op)?;
    let b = net.push(a, params.b_right, params.b_op)?;
    debug!(
        "min = {score}, ({a}) = ({}) {} ({}), ({b}) = ({a}) {} ({})",
        params.a.left,
        params.a.op.symbol(),
        params.a.right,
        params.b_op.symbol(),
        params.b_right
    );
    Ok(Some(score))
}

struct Job<'c, 'a> {
    cols: &'c Columns<'a>,
    target: &'c [f32],
    kernel: Kernel,
    shape: PairShape,
    inputs: usize,
}

impl Job<'_, '_> {
    fn scan(&self, iterations: usize, rng: &mut Lcg, shared: Option<&SharedMin>) -> Option<Found<Pair>> {
        let images = self.cols.images();
        let nodes = self.cols.len();
        let mut best = Best::new(BIG, shared);
        let mut a = vec![0.0f32; images];
        let mut b = vec![0.0f32; images];
        for _ in 0..iterations {
            let pair = self.shape.sample(rng, nodes, self.inputs);
            let link = pair.a;
            link.op.apply(self.kernel, &mut a, &self.cols[link.left], &self.cols[link.right]);
            pair.b_op.apply(self.kernel, &mut b, &a, &self.cols[pair.b_right]);
            if let Some(s) = score_bounded(self.target, &b, best.bound()) {
                best.offer(s, pair);
            }
        }
        best.found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ImageSet;
    use crate::grow::SearchSettings;
    use crate::net::Class;

    fn setup(receptors: usize) -> (Network, Vec<f32>) {
        let mut images = ImageSet::new(receptors);
        images.push_shifted(1, "ab");
        images.push(0, "");
        images.push(0, "zz");
        let classes = vec![Class::pending(0, ""), Class::pending(1, "ab")];
        let mut net = Network::new(receptors, classes);
        net.load_images(&images);
        (net, images.target(1))
    }

    fn ctx(seed: u32, threads: usize) -> SearchContext {
        SearchContext::new(SearchSettings {
            seed,
            threads,
            ..SearchSettings::default()
        })
    }

    #[test]
    fn single_always_appends() {
        let (mut net, target) = setup(4);
        let mut c = ctx(1, 1);
        let before = net.len();
        for _ in 0..20 {
            assert!(random_single(&mut net, &target, &mut c).unwrap().is_some());
        }
        assert_eq!(net.len(), before + 20);
        for (id, n) in net.computed() {
            assert!(n.left < id && n.right < id);
        }
    }

    #[test]
    fn from_inputs_stays_in_input_ranges() {
        let (mut net, target) = setup(4);
        let mut c = ctx(2, 1);
        for _ in 0..50 {
            random_from_inputs(&mut net, &target, &mut c).unwrap();
        }
        for (_, n) in net.computed() {
            assert!(n.left < net.inputs());
            assert!(n.right < net.receptors());
        }
    }

    #[test]
    fn optimized_pair_links_b_to_a() {
        let (mut net, target) = setup(4);
        let mut c = ctx(3, 1);
        let nodes = net.len();
        let e = random_pair(&mut net, &target, PairShape::Optimized, false, &mut c)
            .unwrap()
            .unwrap();
        assert_eq!(net.len(), nodes + 2);
        let a = net.neuron(nodes).clone();
        let b = net.neuron(nodes + 1).clone();
        assert!(a.left >= nodes - RECENT && a.left < nodes);
        assert!(a.right < nodes - RECENT);
        assert_eq!(b.left, nodes);
        assert!(b.right < net.inputs());
        assert_eq!(score(&target, net.vector(nodes + 1)), e);
    }

    #[test]
    fn extended_pair_parallel_scores_its_commit() {
        let (mut net, target) = setup(12);
        let mut c = ctx(4, 4);
        let nodes = net.len();
        let e = random_pair(&mut net, &target, PairShape::Extended, true, &mut c)
            .unwrap()
            .unwrap();
        assert_eq!(net.neuron(nodes + 1).left, nodes);
        assert_eq!(score(&target, net.vector(nodes + 1)), e);
    }

    #[test]
    fn seeded_runs_repeat() {
        let (base, target) = setup(6);
        let run = |threads| {
            let mut net = base.clone();
            let mut c = ctx(42, threads);
            random_pair(&mut net, &target, PairShape::Extended, true, &mut c).unwrap();
            let n = net.neuron(net.len() - 2).clone();
            (n.left, n.right, n.op)
        };
        assert_eq!(run(3), run(3));
        assert_eq!(run(1), run(1));
    }

    #[test]
    fn budgets() {
        assert_eq!(PairShape::Optimized.budget(50, 30), 15_000);
        assert_eq!(PairShape::Extended.budget(50, 30), 15_000);
    }

    #[test]
    fn small_budgets_run_serially() {
        // two basis constants keep both budgets under the parallel threshold
        let mut images = ImageSet::new(2);
        images.push_shifted(1, "a");
        images.push(0, "b");
        let classes = vec![Class::pending(0, "b"), Class::pending(1, "a")];
        let mut base = Network::with_basis(2, vec![1.0, -1.0], classes);
        base.load_images(&images);
        let target = images.target(1);

        for shape in [PairShape::Optimized, PairShape::Extended] {
            assert!(shape.budget(base.len(), base.inputs()) < MIN_PARALLEL_WORK);
            let run = |parallel| {
                let mut net = base.clone();
                let mut c = ctx(7, 4);
                let e = random_pair(&mut net, &target, shape, parallel, &mut c).unwrap();
                let nodes: Vec<_> = net.computed().map(|(_, n)| (n.left, n.right, n.op)).collect();
                (e, nodes)
            };
            assert_eq!(run(true), run(false), "{shape:?}");
        }
    }

    #[test]
    fn optimized_pair_parallel_orders_operands() {
        let (mut net, target) = setup(12);
        assert!(PairShape::Optimized.budget(net.len(), net.inputs()) >= MIN_PARALLEL_WORK);
        let mut c = ctx(5, 4);
        for _ in 0..3 {
            let nodes = net.len();
            let Some(e) = random_pair(&mut net, &target, PairShape::Optimized, true, &mut c).unwrap()
            else {
                continue;
            };
            let a = net.neuron(nodes).clone();
            let b = net.neuron(nodes + 1).clone();
            assert!(a.left >= nodes - RECENT && a.left < nodes);
            assert!(a.right < nodes - RECENT);
            assert_eq!(b.left, nodes);
            assert!(b.right < net.inputs());
            assert_eq!(score(&target, net.vector(nodes + 1)), e);
        }
        for (id, n) in net.computed() {
            assert!(n.left < id && n.right < id);
        }
    }
}
