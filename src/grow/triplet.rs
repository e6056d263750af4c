//! Triplet search: `A`, `B` and `C = op(A, B)`.
//!
//! Each iteration draws `B`'s operands and tries every `(B.op, C.op)`.
//! Whenever a candidate improves the best, `B` takes `A`'s place for the
//! rest of the run, so the search keeps chaining from productive subtrees.

use tracing::debug;

use super::parallel::{fan_out, merge, share, Best, Found, SharedMin, MIN_PARALLEL_WORK};
use super::rng::Lcg;
use super::{score_bounded, Link, SearchContext, BIG};
use crate::error::Result;
use crate::net::{Columns, Network};
use crate::ops::{Kernel, Op};

/// Per-worker floor for the parallel triplet search.
const TRIPLET_WORKER_FLOOR: usize = 1000;

#[derive(Clone, Copy, Debug)]
struct Triplet {
    a: Link,
    b: Link,
    c_op: Op,
}

/// Iteration budget at graph size `nodes`.
pub fn budget(nodes: usize, receptors: usize) -> usize {
    nodes * receptors * 4
}

/// Append the best `A, B, C` triple found within the budget.
pub fn triplet(
    net: &mut Network,
    target: &[f32],
    parallel: bool,
    ctx: &mut SearchContext,
) -> Result<Option<f32>> {
    let nodes = net.len();
    let kernel = net.kernel();
    let total = budget(nodes, net.receptors());
    let workers = ctx.settings.workers();
    let fan = parallel && ctx.settings.fan_out() && total >= MIN_PARALLEL_WORK;
    let base = ctx.call_seed(nodes);

    let found = {
        let cols = net.warm();
        if fan {
            let shared = SharedMin::new(BIG);
            let per_worker = share(total, workers, TRIPLET_WORKER_FLOOR);
            merge(fan_out(workers, |w| {
                let mut rng = Lcg::for_worker(base, w);
                scan(&cols, target, kernel, per_worker, &mut rng, Some(&shared))
            }))
        } else {
            scan(&cols, target, kernel, total, ctx.rng(), None)
        }
    };

    let Some(Found { score, params }) = found else {
        return Ok(None);
    };
    let Triplet { a, b, c_op } = params;
    let a_id = net.push(a.left, a.right, a.op)?;
    let b_id = net.push(b.left, b.right, b.op)?;
    let c_id = net.push(a_id, b_id, c_op)?;
    debug!(
        "min = {score}, ({a_id}) = ({}) {} ({}), ({b_id}) = ({}) {} ({}), ({c_id}) = ({a_id}) {} ({b_id})",
        a.left,
        a.op.symbol(),
        a.right,
        b.left,
        b.op.symbol(),
        b.right,
        c_op.symbol()
    );
    Ok(Some(score))
}

fn scan(
    cols: &Columns<'_>,
    target: &[f32],
    kernel: Kernel,
    iterations: usize,
    rng: &mut Lcg,
    shared: Option<&SharedMin>,
) -> Option<Found<Triplet>> {
    let nodes = cols.len();
    let images = cols.images();
    let mut best = Best::new(BIG, shared);

    let mut a = Link::sample(rng, nodes);
    let mut a_vec = a.op.combine(kernel, &cols[a.left], &cols[a.right]);
    let mut b_vec = vec![0.0f32; images];
    let mut c_vec = vec![0.0f32; images];

    for _ in 0..iterations {
        let left = rng.below(nodes);
        let right = rng.below(nodes);
        for b_op in Op::ALL {
            b_op.apply(kernel, &mut b_vec, &cols[left], &cols[right]);
            let b = Link {
                left,
                right,
                op: b_op,
            };
            for c_op in Op::ALL {
                c_op.apply(kernel, &mut c_vec, &a_vec, &b_vec);
                let Some(s) = score_bounded(target, &c_vec, best.bound()) else {
                    continue;
                };
                if best.offer(s, Triplet { a, b, c_op }) {
                    a = b;
                    a_vec.copy_from_slice(&b_vec);
                }
            }
        }
    }
    best.found
}
