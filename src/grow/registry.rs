//! Named growth operators.
//!
//! Configurations and the CLI refer to operators by stable name (or by a
//! legacy alias such as `rndrod4_parallel`). Lookups resolve to a
//! [`StrategySpec`], which dispatches to the operator functions.

use std::fmt;
use std::str::FromStr;

use super::{exhaustive, random_from_inputs, random_pair, random_single, triplet};
use super::{PairShape, SearchContext, Sweep};
use crate::error::{Error, Result};
use crate::net::Network;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    ExhaustiveFull,
    ExhaustiveLast,
    CombineOldNew,
    RandomSingle,
    RandomFromInputs,
    RandomPairOpt,
    RandomPairExt,
    Triplet,
}

/// Listing groups for `--list-funcs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    Exhaustive,
    Random,
    Triplet,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Exhaustive, Family::Random, Family::Triplet];

    pub fn title(self) -> &'static str {
        match self {
            Family::Exhaustive => "exhaustive search",
            Family::Random => "random search",
            Family::Triplet => "triplet search",
        }
    }
}

impl Strategy {
    /// Nodes appended per successful call.
    pub fn appends(self) -> usize {
        match self {
            Strategy::RandomPairOpt | Strategy::RandomPairExt => 2,
            Strategy::Triplet => 3,
            _ => 1,
        }
    }

    pub fn family(self) -> Family {
        match self {
            Strategy::ExhaustiveFull | Strategy::ExhaustiveLast | Strategy::CombineOldNew => {
                Family::Exhaustive
            }
            Strategy::Triplet => Family::Triplet,
            _ => Family::Random,
        }
    }
}

/// An operator plus whether its parallel form is selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StrategySpec {
    pub strategy: Strategy,
    pub parallel: bool,
}

/// Registry row.
#[derive(Clone, Copy, Debug)]
pub struct StrategyInfo {
    pub name: &'static str,
    pub alias: &'static str,
    pub spec: StrategySpec,
    pub description: &'static str,
}

const fn row(
    name: &'static str,
    alias: &'static str,
    strategy: Strategy,
    parallel: bool,
    description: &'static str,
) -> StrategyInfo {
    StrategyInfo {
        name,
        alias,
        spec: StrategySpec { strategy, parallel },
        description,
    }
}

pub const REGISTRY: &[StrategyInfo] = &[
    row("exhaustive_full", "rod", Strategy::ExhaustiveFull, false,
        "best single node over every pair of existing nodes"),
    row("exhaustive_full_parallel", "rod_parallel", Strategy::ExhaustiveFull, true,
        "exhaustive_full split across workers by left operand"),
    row("exhaustive_last", "rod2", Strategy::ExhaustiveLast, false,
        "best single node combining the newest node with an older one"),
    row("exhaustive_last_parallel", "rod2_parallel", Strategy::ExhaustiveLast, true,
        "exhaustive_last split across workers"),
    row("combine_old_new", "rod3", Strategy::CombineOldNew, false,
        "best single node pairing older nodes with the last 3 per class"),
    row("combine_old_new_parallel", "rod3_parallel", Strategy::CombineOldNew, true,
        "combine_old_new split across workers by old operand"),
    row("random_single", "rndrod", Strategy::RandomSingle, false,
        "one uniformly random node, kept without search"),
    row("random_from_inputs", "rndrod0", Strategy::RandomFromInputs, false,
        "one random node combining an input with a receptor"),
    row("random_pair_opt", "rndrod2", Strategy::RandomPairOpt, false,
        "random pair search anchored on the 10 newest nodes"),
    row("random_pair_opt_parallel", "rndrod2_parallel", Strategy::RandomPairOpt, true,
        "random_pair_opt with the budget split across workers"),
    row("random_pair_ext", "rndrod3", Strategy::RandomPairExt, false,
        "random pair search over the whole graph, 6 N^2 candidates"),
    row("random_pair_ext_parallel", "rndrod3_parallel", Strategy::RandomPairExt, true,
        "random_pair_ext with the budget split across workers"),
    row("triplet", "rndrod4", Strategy::Triplet, false,
        "random A, B and C = op(A, B), chaining from each improvement"),
    row("triplet_parallel", "rndrod4_parallel", Strategy::Triplet, true,
        "triplet with the budget split across workers (default)"),
];

impl StrategySpec {
    pub const DEFAULT: StrategySpec = StrategySpec {
        strategy: Strategy::Triplet,
        parallel: true,
    };

    /// Resolve a stable name or legacy alias.
    pub fn lookup(name: &str) -> Result<StrategySpec> {
        REGISTRY
            .iter()
            .find(|r| r.name == name || r.alias == name)
            .map(|r| r.spec)
            .ok_or_else(|| Error::UnknownStrategy(name.to_string()))
    }

    fn info(self) -> &'static StrategyInfo {
        // Serial random_single / random_from_inputs stand in for their
        // nonexistent parallel forms.
        REGISTRY
            .iter()
            .find(|r| r.spec == self)
            .or_else(|| REGISTRY.iter().find(|r| r.spec.strategy == self.strategy))
            .unwrap_or(&REGISTRY[0])
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn appends(self) -> usize {
        self.strategy.appends()
    }

    /// Run the operator once. `None` means no improvement was found and
    /// the graph is unchanged.
    pub fn grow(self, net: &mut Network, target: &[f32], ctx: &mut SearchContext) -> Result<Option<f32>> {
        if !net.has_room(self.appends()) {
            return Err(Error::CapacityExhausted {
                limit: net.max_neurons(),
            });
        }
        let parallel = self.parallel;
        match self.strategy {
            Strategy::ExhaustiveFull => exhaustive(net, target, Sweep::Full, parallel, &ctx.settings),
            Strategy::ExhaustiveLast => exhaustive(net, target, Sweep::Last, parallel, &ctx.settings),
            Strategy::CombineOldNew => exhaustive(net, target, Sweep::OldNew, parallel, &ctx.settings),
            Strategy::RandomSingle => random_single(net, target, ctx),
            Strategy::RandomFromInputs => random_from_inputs(net, target, ctx),
            Strategy::RandomPairOpt => random_pair(net, target, PairShape::Optimized, parallel, ctx),
            Strategy::RandomPairExt => random_pair(net, target, PairShape::Extended, parallel, ctx),
            Strategy::Triplet => triplet(net, target, parallel, ctx),
        }
    }
}

impl Default for StrategySpec {
    fn default() -> Self {
        StrategySpec::DEFAULT
    }
}

impl FromStr for StrategySpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StrategySpec::lookup(s)
    }
}

impl fmt::Display for StrategySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
