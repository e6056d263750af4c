//! Memoized evaluators.
//!
//! Both walks use an explicit stack so chains tens of thousands of nodes
//! deep cannot overflow the call stack.

use std::ops::Index;

use super::Network;

/// Read-only view of every node's vector cache, shared with search workers.
pub struct Columns<'a> {
    cols: Vec<&'a [f32]>,
}

impl<'a> Columns<'a> {
    /// Number of nodes covered.
    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    /// Values per column (training images).
    pub fn images(&self) -> usize {
        self.cols.first().map_or(0, |c| c.len())
    }
}

impl<'a> Index<usize> for Columns<'a> {
    type Output = [f32];

    fn index(&self, id: usize) -> &[f32] {
        self.cols[id]
    }
}

impl Network {
    /// Value of node `id` for every training image.
    pub fn vector(&mut self, id: usize) -> &[f32] {
        self.materialize(id);
        self.nodes[id].vector.as_deref().unwrap_or(&[])
    }

    /// Materialize every node and hand out a shared view of the caches.
    pub fn warm(&mut self) -> Columns<'_> {
        for id in 0..self.nodes.len() {
            self.materialize(id);
        }
        Columns {
            cols: self
                .nodes
                .iter()
                .map(|n| n.vector.as_deref().unwrap_or(&[]))
                .collect(),
        }
    }

    fn materialize(&mut self, id: usize) {
        let inputs = self.inputs();
        let mut stack = vec![id];
        while let Some(&top) = stack.last() {
            if self.nodes[top].vector.is_some() {
                stack.pop();
                continue;
            }
            if top < inputs {
                let v = self.leaf_vector(top);
                self.nodes[top].vector = Some(v);
                stack.pop();
                continue;
            }
            let (left, right, op) = {
                let n = &self.nodes[top];
                (n.left, n.right, n.op)
            };
            let mut ready = true;
            for operand in [left, right] {
                if self.nodes[operand].vector.is_none() {
                    stack.push(operand);
                    ready = false;
                }
            }
            if !ready {
                continue;
            }
            let v = match (&self.nodes[left].vector, &self.nodes[right].vector) {
                (Some(a), Some(b)) => op.combine(self.kernel, a, b),
                _ => unreachable!("operands materialized above"),
            };
            self.nodes[top].vector = Some(v);
            stack.pop();
        }
    }

    fn leaf_vector(&self, id: usize) -> Vec<f32> {
        if id < self.receptors {
            self.samples.iter().map(|row| row[id]).collect()
        } else {
            vec![self.basis[id - self.receptors]; self.samples.len()]
        }
    }

    /// Value of node `id` for the current inference input.
    pub fn scalar(&mut self, id: usize) -> f32 {
        let inputs = self.inputs();
        if id < inputs {
            return self.input[id];
        }
        let mut stack = vec![id];
        while let Some(&top) = stack.last() {
            if self.nodes[top].scalar.is_some() {
                stack.pop();
                continue;
            }
            let (left, right, op) = {
                let n = &self.nodes[top];
                (n.left, n.right, n.op)
            };
            let mut ready = true;
            for operand in [left, right] {
                if operand >= inputs && self.nodes[operand].scalar.is_none() {
                    stack.push(operand);
                    ready = false;
                }
            }
            if !ready {
                continue;
            }
            let a = self.scalar_of(left, inputs);
            let b = self.scalar_of(right, inputs);
            let mut out = [0.0f32];
            op.apply(self.kernel, &mut out, &[a], &[b]);
            self.nodes[top].scalar = Some(out[0]);
            stack.pop();
        }
        self.scalar_of(id, inputs)
    }

    fn scalar_of(&self, id: usize, inputs: usize) -> f32 {
        if id < inputs {
            self.input[id]
        } else {
            self.nodes[id].scalar.unwrap_or(f32::NAN)
        }
    }
}
