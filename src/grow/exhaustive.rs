//! Exhaustive single-node search.

use std::ops::Range;

use tracing::debug;

use super::parallel::{chunks, fan_out, merge, Best, Found, SharedMin, MIN_PARALLEL_WORK};
use super::{score_bounded, Link, SearchSettings, BIG};
use crate::error::Result;
use crate::net::{Columns, Network};
use crate::ops::{Kernel, Op};

/// Which `(left, right)` pairs an exhaustive search visits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sweep {
    /// Every `j < i` over the whole graph.
    Full,
    /// The newest node against every older one.
    Last,
    /// Nodes older than `len - 3·classes` against the newer ones.
    OldNew,
}

#[derive(Clone, Copy, Debug)]
enum Span {
    Full,
    Last,
    Split(usize),
}

impl Span {
    fn resolve(sweep: Sweep, nodes: usize, classes: usize) -> Self {
        match sweep {
            Sweep::Full => Span::Full,
            Sweep::Last => Span::Last,
            Sweep::OldNew => match nodes.checked_sub(3 * classes) {
                Some(b) if b > 0 => Span::Split(b),
                _ => Span::Full,
            },
        }
    }

    fn rows(self, nodes: usize) -> Range<usize> {
        match self {
            Span::Full => 1..nodes,
            Span::Last => nodes.saturating_sub(1)..nodes,
            Span::Split(b) => 0..b,
        }
    }

    fn cols(self, i: usize, nodes: usize) -> Range<usize> {
        match self {
            Span::Full | Span::Last => 0..i,
            Span::Split(b) => b..nodes,
        }
    }

    fn candidates(self, nodes: usize) -> usize {
        let pairs = match self {
            Span::Full => nodes * nodes.saturating_sub(1) / 2,
            Span::Last => nodes.saturating_sub(1),
            Span::Split(b) => b * (nodes - b),
        };
        pairs * Op::COUNT
    }
}

/// Append the best single node over `sweep`, visiting `(left, right, op)`
/// in lexicographic order so the first minimum wins. The parallel form
/// partitions `left` into ascending chunks and returns the same node.
pub fn exhaustive(
    net: &mut Network,
    target: &[f32],
    sweep: Sweep,
    parallel: bool,
    settings: &SearchSettings,
) -> Result<Option<f32>> {
    let nodes = net.len();
    let span = Span::resolve(sweep, nodes, net.classes().len());
    let kernel = net.kernel();
    let fan = parallel && settings.fan_out() && span.candidates(nodes) >= MIN_PARALLEL_WORK;

    let found = {
        let cols = net.warm();
        if fan {
            let shared = SharedMin::new(BIG);
            let parts = chunks(span.rows(nodes), settings.workers());
            merge(fan_out(parts.len(), |w| {
                scan(&cols, target, kernel, span, parts[w].clone(), Some(&shared))
            }))
        } else {
            scan(&cols, target, kernel, span, span.rows(nodes), None)
        }
    };

    let Some(Found { score, params }) = found else {
        return Ok(None);
    };
    let id = net.push(params.left, params.right, params.op)?;
    debug!(
        "min = {score}, ({id}) = ({}) {} ({})",
        params.left,
        params.op.symbol(),
        params.right
    );
    Ok(Some(score))
}

fn scan(
    cols: &Columns<'_>,
    target: &[f32],
    kernel: Kernel,
    span: Span,
    rows: Range<usize>,
    shared: Option<&SharedMin>,
) -> Option<Found<Link>> {
    let mut best = Best::new(BIG, shared);
    let mut buf = vec![0.0f32; cols.images()];
    for left in rows {
        for right in span.cols(left, cols.len()) {
            for op in Op::ALL {
                op.apply(kernel, &mut buf, &cols[left], &cols[right]);
                if let Some(s) = score_bounded(target, &buf, best.bound()) {
                    best.offer(s, Link { left, right, op });
                }
            }
        }
    }
    best.found
}
