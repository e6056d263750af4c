//! Extending a trained model with a new configuration.

use tracing::info;

use super::{Mode, TrainingConfig};
use crate::data::ImageSet;
use crate::error::{Error, Result};
use crate::net::{Class, Network};

/// Result of folding a configuration into a loaded model.
#[derive(Clone, Debug)]
pub struct Merge {
    /// The configuration's images; the model's original images are not kept.
    pub images: ImageSet,
    /// Pending classes to grow, ascending.
    pub schedule: Vec<usize>,
    /// Classes appended to the table.
    pub added: usize,
}

/// Fold `config` into `net`'s class table and plan the retraining.
///
/// New ids extend the table as pending classes, an existing class keeps
/// its name unless that name is empty. In classes mode the pending
/// classes the configuration lists are scheduled, in images mode every
/// pending class is.
pub fn merge(net: &mut Network, config: &TrainingConfig) -> Result<Merge> {
    if config.receptors != net.receptors() {
        return Err(Error::ConfigMismatch {
            model: net.receptors(),
            config: config.receptors,
        });
    }
    let data = config.build()?;
    let before = net.classes().len();

    let table = net.classes_mut();
    for fresh in data.classes {
        match table.get_mut(fresh.id) {
            Some(existing) => {
                if existing.name.is_empty() {
                    existing.name = fresh.name;
                }
            }
            None => {
                while table.len() < fresh.id {
                    let id = table.len();
                    table.push(Class::pending(id, ""));
                }
                table.push(Class::pending(fresh.id, fresh.name));
            }
        }
    }

    let listed: Vec<usize> = config.entries().iter().map(|e| e.id).collect();
    let schedule: Vec<usize> = net
        .classes()
        .iter()
        .filter(|c| c.is_pending())
        .filter(|c| config.mode() == Mode::Images || listed.contains(&c.id))
        .map(|c| c.id)
        .collect();

    net.invalidate_vectors();
    let added = net.classes().len() - before;
    info!(
        "merged config: {} images, {added} new classes, {} to train",
        data.images.len(),
        schedule.len()
    );
    Ok(Merge {
        images: data.images,
        schedule,
        added,
    })
}
