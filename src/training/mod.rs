//! Round-robin training driver.
//!
//! Classes are visited in turn. A class whose error is above tolerance gets
//! its target vector rebuilt and the configured growth operators run until
//! the error drops to tolerance; every improvement moves the class output
//! to the newest node. Training ends when the summed error is below
//! `classes · tolerance`, on interrupt, or when capacity runs out.

pub mod interrupt;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::data::ImageSet;
use crate::error::{Error, Result};
use crate::grow::{SearchContext, SearchSettings, StrategySpec, BIG};
use crate::net::{Network, CAPACITY_MARGIN};
use crate::ops::Kernel;
pub use interrupt::InterruptFlag;

/// Why the training loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Converged,
    Interrupted,
    CapacityExhausted,
}

/// Summary of one training run.
#[derive(Clone, Debug)]
pub struct TrainReport {
    pub iterations: u64,
    pub elapsed: Duration,
    pub class_errors: Vec<f32>,
    pub nodes_before: usize,
    pub nodes_after: usize,
    pub stop: StopReason,
}

impl TrainReport {
    pub fn nodes_created(&self) -> usize {
        self.nodes_after - self.nodes_before
    }

    /// Classes at or below `tolerance`.
    pub fn trained(&self, tolerance: f32) -> usize {
        self.class_errors.iter().filter(|e| **e <= tolerance).count()
    }
}

/// Progress after one class step.
#[derive(Clone, Debug)]
pub struct StepReport<'a> {
    pub iteration: u64,
    pub class: usize,
    pub nodes: usize,
    pub class_errors: &'a [f32],
    pub tolerance: f32,
}

impl StepReport<'_> {
    pub fn trained(&self) -> usize {
        self.class_errors
            .iter()
            .filter(|e| **e <= self.tolerance)
            .count()
    }
}

type StepHook<'h> = Box<dyn FnMut(&StepReport<'_>) + 'h>;

pub struct Trainer<'h> {
    ctx: SearchContext,
    sequence: Vec<StrategySpec>,
    interrupt: InterruptFlag,
    on_step: Option<StepHook<'h>>,
}

impl<'h> Trainer<'h> {
    /// Trainer running `sequence` per class step; an empty sequence means
    /// the default operator.
    pub fn new(settings: SearchSettings, sequence: Vec<StrategySpec>) -> Self {
        let sequence = if sequence.is_empty() {
            vec![StrategySpec::DEFAULT]
        } else {
            sequence
        };
        Self {
            ctx: SearchContext::new(settings),
            sequence,
            interrupt: InterruptFlag::global().clone(),
            on_step: None,
        }
    }

    /// Poll `flag` instead of the process-wide one.
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = flag;
        self
    }

    /// Call `hook` after every class step.
    pub fn on_step(mut self, hook: impl FnMut(&StepReport<'_>) + 'h) -> Self {
        self.on_step = Some(Box::new(hook));
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.ctx.settings
    }

    pub fn sequence(&self) -> &[StrategySpec] {
        &self.sequence
    }

    /// Train every class from scratch.
    pub fn train(&mut self, net: &mut Network, images: &ImageSet) -> Result<TrainReport> {
        let all: Vec<usize> = (0..net.classes().len()).collect();
        self.train_classes(net, images, &all)
    }

    /// Grow only the classes in `schedule`; every other class counts as
    /// trained.
    pub fn train_classes(
        &mut self,
        net: &mut Network,
        images: &ImageSet,
        schedule: &[usize],
    ) -> Result<TrainReport> {
        let settings = self.ctx.settings.clone();
        let tolerance = settings.tolerance;
        net.set_kernel(Kernel::select(settings.simd));
        net.set_max_neurons(settings.max_neurons);
        net.load_images(images);

        let classes = net.classes().len();
        let mut errors = vec![0.0f32; classes];
        for &c in schedule {
            if c < classes {
                errors[c] = BIG;
            }
        }
        let mut index = schedule.iter().copied().find(|&c| c < classes).unwrap_or(0);

        info!(
            "training {} of {classes} classes on {} images, sequence [{}]",
            schedule.len(),
            images.len(),
            self.sequence
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let start = Instant::now();
        let nodes_before = net.len();
        let mut iterations = 0u64;
        let limit = net.max_neurons();

        let stop = if classes == 0 {
            StopReason::Converged
        } else {
            loop {
                if self.interrupt.is_raised() {
                    break StopReason::Interrupted;
                }
                if errors[index] > tolerance {
                    let target = images.target(index);
                    if !self.step(net, &target, index, &mut errors[index])? {
                        break StopReason::CapacityExhausted;
                    }
                }
                iterations += 1;
                if let Some(hook) = self.on_step.as_mut() {
                    hook(&StepReport {
                        iteration: iterations,
                        class: index,
                        nodes: net.len(),
                        class_errors: &errors,
                        tolerance,
                    });
                }
                index = (index + 1) % classes;
                if net.len() + CAPACITY_MARGIN >= limit {
                    break StopReason::CapacityExhausted;
                }
                let total: f32 = errors.iter().sum();
                if total < classes as f32 * tolerance {
                    break StopReason::Converged;
                }
            }
        };

        // A run cut short keeps only outputs within tolerance, so a resume
        // regrows exactly the unfinished classes. A converged run keeps all.
        if stop != StopReason::Converged {
            for &c in schedule {
                if c < classes && errors[c] > tolerance {
                    net.classes_mut()[c].output = None;
                }
            }
        }

        let report = TrainReport {
            iterations,
            elapsed: start.elapsed(),
            class_errors: errors,
            nodes_before,
            nodes_after: net.len(),
            stop,
        };
        match stop {
            StopReason::Converged => info!(
                "trained in {} iterations, {} nodes ({:.2}s)",
                report.iterations,
                report.nodes_after,
                report.elapsed.as_secs_f64()
            ),
            StopReason::Interrupted => warn!(
                "interrupted after {} iterations, {} of {classes} classes trained",
                report.iterations,
                report.trained(tolerance)
            ),
            StopReason::CapacityExhausted => warn!(
                "neuron capacity {limit} reached, {} of {classes} classes trained",
                report.trained(tolerance)
            ),
        }
        Ok(report)
    }

    /// One class step. Returns `false` when the next operator would not fit.
    fn step(
        &mut self,
        net: &mut Network,
        target: &[f32],
        class: usize,
        error: &mut f32,
    ) -> Result<bool> {
        let tolerance = self.ctx.settings.tolerance;
        for spec in &self.sequence {
            if !net.has_room(spec.appends()) {
                return Ok(false);
            }
            let result = match spec.grow(net, target, &mut self.ctx) {
                Ok(r) => r,
                Err(Error::CapacityExhausted { .. }) => return Ok(false),
                Err(e) => return Err(e),
            };
            match result {
                Some(e) if e < *error => {
                    *error = e;
                    net.set_output(class, net.len() - 1);
                }
                Some(_) => {}
                None => debug!("{spec}: no improvement for class {class}"),
            }
            if *error <= tolerance {
                break;
            }
        }
        debug!(
            "class {class} ({}): error {:.6}, {} nodes",
            net.classes()[class].name,
            *error,
            net.len()
        );
        Ok(true)
    }
}
