//! The neuron graph.
//!
//! A single append-only array of [`Neuron`] records. Ids `0..receptors`
//! are receptor slots, `receptors..inputs` are basis constants, and every
//! id from `inputs` on is a computed node whose operands both have smaller
//! ids. Each record carries its own vector cache (one value per training
//! image) and scalar cache (value for the current inference input).

mod eval;

pub use eval::Columns;

use crate::data::ImageSet;
use crate::error::{Error, Result};
use crate::ops::{Kernel, Op};

/// Constant pool appended after the receptors.
pub const BASIS: [f32; BASIS_LEN] = [
    0.125, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, -0.125, -0.25, -0.5, -1.0, -2.0, -4.0, -8.0,
];
pub const BASIS_LEN: usize = 14;
/// Default node capacity.
pub const MAX_NEURONS: usize = 64_000;
/// Nodes kept free at the top of the capacity; training stops once
/// fewer than this many slots remain.
pub const CAPACITY_MARGIN: usize = 10;

/// A graph node. For receptor and basis slots the operands are unused.
#[derive(Clone, Debug)]
pub struct Neuron {
    pub left: usize,
    pub right: usize,
    pub op: Op,
    vector: Option<Vec<f32>>,
    scalar: Option<f32>,
}

impl Neuron {
    fn leaf() -> Self {
        Self::new(0, 0, Op::Add)
    }

    fn new(left: usize, right: usize, op: Op) -> Self {
        Self {
            left,
            right,
            op,
            vector: None,
            scalar: None,
        }
    }
}

/// An entry of the class table. `output` is `None` while the class is pending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    pub id: usize,
    pub name: String,
    pub output: Option<usize>,
}

impl Class {
    pub fn pending(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            output: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.output.is_none()
    }
}

/// Neuron graph plus the state its evaluators read: the class table, the
/// training rows (`vx`) and the current inference input.
#[derive(Clone, Debug)]
pub struct Network {
    receptors: usize,
    basis: Vec<f32>,
    nodes: Vec<Neuron>,
    classes: Vec<Class>,
    samples: Vec<Vec<f32>>,
    input: Vec<f32>,
    kernel: Kernel,
    max_neurons: usize,
}

impl Network {
    /// Empty graph over `receptors` inputs and the default basis.
    pub fn new(receptors: usize, classes: Vec<Class>) -> Self {
        Self::with_basis(receptors, BASIS.to_vec(), classes)
    }

    pub fn with_basis(receptors: usize, basis: Vec<f32>, classes: Vec<Class>) -> Self {
        let inputs = receptors + basis.len();
        let mut input = vec![0.0; receptors];
        input.extend_from_slice(&basis);
        Self {
            receptors,
            basis,
            nodes: (0..inputs).map(|_| Neuron::leaf()).collect(),
            classes,
            samples: Vec::new(),
            input,
            kernel: Kernel::detect(),
            max_neurons: MAX_NEURONS,
        }
    }

    pub fn receptors(&self) -> usize {
        self.receptors
    }

    /// Receptors plus basis constants.
    pub fn inputs(&self) -> usize {
        self.receptors + self.basis.len()
    }

    pub fn basis(&self) -> &[f32] {
        &self.basis
    }

    /// Total node count, inputs included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no computed node has been grown yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == self.inputs()
    }

    pub fn neuron(&self, id: usize) -> &Neuron {
        &self.nodes[id]
    }

    /// Computed nodes as `(id, neuron)` in append order.
    pub fn computed(&self) -> impl Iterator<Item = (usize, &Neuron)> + '_ {
        self.nodes.iter().enumerate().skip(self.inputs())
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut Vec<Class> {
        &mut self.classes
    }

    pub fn set_output(&mut self, class: usize, node: usize) {
        self.classes[class].output = Some(node);
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Kernels the CPU lacks are replaced by the scalar one.
    pub fn set_kernel(&mut self, kernel: Kernel) {
        self.kernel = kernel.usable();
    }

    pub fn max_neurons(&self) -> usize {
        self.max_neurons
    }

    pub fn set_max_neurons(&mut self, max: usize) {
        self.max_neurons = max;
    }

    /// Number of training rows the vector caches are sized for.
    pub fn images(&self) -> usize {
        self.samples.len()
    }

    /// True if `extra` more nodes fit under the capacity.
    pub fn has_room(&self, extra: usize) -> bool {
        self.nodes.len() + extra <= self.max_neurons
    }

    /// Append a computed node. Operands must already exist.
    pub fn push(&mut self, left: usize, right: usize, op: Op) -> Result<usize> {
        let id = self.nodes.len();
        if id >= self.max_neurons {
            return Err(Error::CapacityExhausted {
                limit: self.max_neurons,
            });
        }
        if left >= id || right >= id {
            return Err(Error::ModelFormat(format!(
                "neuron {id} refers to ({left}, {right}), operands must precede it"
            )));
        }
        self.nodes.push(Neuron::new(left, right, op));
        Ok(id)
    }

    /// Install a training set; every vector cache becomes stale.
    pub fn load_images(&mut self, images: &ImageSet) {
        self.samples = images.rows().to_vec();
        self.invalidate_vectors();
    }

    /// Set the inference input from encoded receptor values. Missing
    /// receptors read as zero, extra values are ignored. Clears scalar caches.
    pub fn set_input(&mut self, receptors: &[f32]) {
        for (k, slot) in self.input[..self.receptors].iter_mut().enumerate() {
            *slot = receptors.get(k).copied().unwrap_or(0.0);
        }
        self.clear_scalar_caches();
    }

    pub fn invalidate_vectors(&mut self) {
        for node in &mut self.nodes {
            node.vector = None;
        }
    }

    pub fn clear_scalar_caches(&mut self) {
        for node in &mut self.nodes {
            node.scalar = None;
        }
    }
}
