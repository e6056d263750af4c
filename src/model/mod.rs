//! JSON model files.
//!
//! A model stores the receptor count, the basis constants, the class table
//! and the computed nodes in append order. Caches are never persisted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::net::{Class, Network, BASIS_LEN, MAX_NEURONS};
use crate::ops::Op;

pub const FORMAT_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub version: String,
    pub receptors: usize,
    pub base_size: usize,
    pub inputs: usize,
    pub neurons_count: usize,
    pub basis: Vec<f32>,
    pub classes: Vec<ClassRecord>,
    pub neurons: Vec<NeuronRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: usize,
    #[serde(default)]
    pub name: String,
    /// Absolute node id, or -1 while pending.
    #[serde(default = "pending")]
    pub output_neuron: i64,
}

fn pending() -> i64 {
    -1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronRecord {
    pub i: usize,
    pub j: usize,
    pub op: i64,
}

impl ModelFile {
    pub fn from_network(net: &Network, description: Option<&str>) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            receptors: net.receptors(),
            base_size: net.basis().len(),
            inputs: net.inputs(),
            neurons_count: net.len(),
            basis: net.basis().to_vec(),
            classes: net
                .classes()
                .iter()
                .map(|c| ClassRecord {
                    id: c.id,
                    name: c.name.clone(),
                    output_neuron: c.output.map_or(-1, |o| o as i64),
                })
                .collect(),
            neurons: net
                .computed()
                .map(|(_, n)| NeuronRecord {
                    i: n.left,
                    j: n.right,
                    op: n.op.index() as i64,
                })
                .collect(),
            description: description.map(str::to_string),
        }
    }

    /// Validate and rebuild the graph.
    pub fn into_network(self) -> Result<Network> {
        if self.version != FORMAT_VERSION {
            warn!("model version '{}', expected '{FORMAT_VERSION}'", self.version);
        }
        if self.basis.len() != self.base_size {
            return Err(Error::ModelFormat(format!(
                "basis has {} values, base_size says {}",
                self.basis.len(),
                self.base_size
            )));
        }
        if self.base_size != BASIS_LEN {
            warn!("base_size {} differs from {BASIS_LEN}, using the file's basis", self.base_size);
        }
        if self.inputs != self.receptors + self.base_size {
            return Err(Error::ModelFormat(format!(
                "inputs {} != receptors {} + base_size {}",
                self.inputs, self.receptors, self.base_size
            )));
        }
        let expected = self.neurons_count.checked_sub(self.inputs);
        if expected != Some(self.neurons.len()) {
            return Err(Error::ModelFormat(format!(
                "neurons_count {} with {} inputs disagrees with {} stored neurons",
                self.neurons_count,
                self.inputs,
                self.neurons.len()
            )));
        }

        let mut classes = Vec::with_capacity(self.classes.len());
        for (pos, record) in self.classes.into_iter().enumerate() {
            if record.id != pos {
                return Err(Error::ModelFormat(format!(
                    "class at position {pos} has id {}",
                    record.id
                )));
            }
            let output = match record.output_neuron {
                n if n < 0 => None,
                n if (n as usize) >= self.inputs && (n as usize) < self.neurons_count => {
                    Some(n as usize)
                }
                n => {
                    return Err(Error::ModelFormat(format!(
                        "class {pos} output_neuron {n} is not a computed node"
                    )))
                }
            };
            classes.push(Class {
                id: record.id,
                name: record.name,
                output,
            });
        }

        let mut net = Network::with_basis(self.receptors, self.basis, classes);
        net.set_max_neurons(MAX_NEURONS.max(self.neurons_count));
        for record in self.neurons {
            let op = usize::try_from(record.op)
                .ok()
                .and_then(Op::from_index)
                .unwrap_or_else(|| {
                    warn!("neuron {}: op {} out of range, using {}", net.len(), record.op, Op::Add);
                    Op::Add
                });
            net.push(record.i, record.j, op)?;
        }
        Ok(net)
    }
}

pub fn to_json(net: &Network, description: Option<&str>) -> Result<String> {
    serde_json::to_string_pretty(&ModelFile::from_network(net, description))
        .map_err(|e| Error::ModelFormat(e.to_string()))
}

pub fn from_json(text: &str) -> Result<Network> {
    let file: ModelFile =
        serde_json::from_str(text).map_err(|e| Error::ModelFormat(e.to_string()))?;
    file.into_network()
}

/// Write `net` to `path`, creating parent directories.
pub fn save(net: &Network, path: &Path, description: Option<&str>) -> Result<()> {
    let mut text = to_json(net, description)?;
    text.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| Error::io(path, e))?;
    info!(
        "saved model to {} ({} neurons, {})",
        path.display(),
        net.len(),
        fingerprint(net)
    );
    Ok(())
}

pub fn load(path: &Path) -> Result<Network> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let net = from_json(&text)?;
    info!(
        "loaded model {} ({} neurons, {} classes, {})",
        path.display(),
        net.len(),
        net.classes().len(),
        fingerprint(&net)
    );
    Ok(net)
}

/// Content hash of the structural fields (BLAKE3, 128-bit hex).
pub fn fingerprint(net: &Network) -> String {
    let mut h = blake3::Hasher::new();
    h.update(&(net.receptors() as u64).to_le_bytes());
    for b in net.basis() {
        h.update(&b.to_bits().to_le_bytes());
    }
    for c in net.classes() {
        let out = c.output.map_or(-1i64, |o| o as i64);
        h.update(&out.to_le_bytes());
    }
    for (_, n) in net.computed() {
        h.update(&(n.left as u64).to_le_bytes());
        h.update(&(n.right as u64).to_le_bytes());
        h.update(&[n.op.index() as u8]);
    }
    let hex = h.finalize().to_hex();
    hex[..32].to_string()
}
