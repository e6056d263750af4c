//! Training configuration.
//!
//! JSON with either a `classes` list (one word per class, optionally slid
//! across the receptor field) or an `images` list (one verbatim word per
//! image). `images` wins when both are present.
//!
//! ```json
//! {
//!   "receptors": 20,
//!   "classes": [ { "id": 1, "word": "time" } ],
//!   "generate_shifts": true,
//!   "funcs": ["triplet_parallel"]
//! }
//! ```

pub mod merge;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::ImageSet;
use crate::error::{Error, Result};
use crate::grow::StrategySpec;
use crate::net::Class;

pub use merge::{merge, Merge};

pub const DEFAULT_RECEPTORS: usize = 20;

/// One `{ "id", "word" }` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: usize,
    #[serde(default)]
    pub word: String,
}

impl Entry {
    pub fn new(id: usize, word: &str) -> Self {
        Self {
            id,
            word: word.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_receptors")]
    pub receptors: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<Entry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Entry>>,
    #[serde(default = "default_true")]
    pub generate_shifts: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub funcs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_receptors() -> usize {
    DEFAULT_RECEPTORS
}

fn default_true() -> bool {
    true
}

/// How the image set is described.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Classes,
    Images,
}

/// Class table plus training images built from a configuration.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub classes: Vec<Class>,
    pub images: ImageSet,
}

impl Default for TrainingConfig {
    /// Blank, "time", "hour" and "main" over 20 receptors with shifts.
    fn default() -> Self {
        Self {
            receptors: DEFAULT_RECEPTORS,
            classes: Some(vec![
                Entry::new(0, ""),
                Entry::new(1, "time"),
                Entry::new(2, "hour"),
                Entry::new(3, "main"),
            ]),
            images: None,
            generate_shifts: true,
            funcs: Vec::new(),
            description: None,
        }
    }
}

impl TrainingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_json(&text)
            .map_err(|e| Error::ConfigParse(format!("{}: {e}", path.display())))?;
        info!("loaded config {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: TrainingConfig =
            serde_json::from_str(text).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        if let Some(description) = &config.description {
            info!("config: {description}");
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.receptors == 0 {
            return Err(Error::ConfigParse("receptors must be at least 1".into()));
        }
        if self.classes.is_none() && self.images.is_none() {
            return Err(Error::ConfigParse(
                "either 'classes' or 'images' is required".into(),
            ));
        }
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        if self.images.is_some() {
            Mode::Images
        } else {
            Mode::Classes
        }
    }

    /// Entries of the active mode.
    pub fn entries(&self) -> &[Entry] {
        match self.mode() {
            Mode::Images => self.images.as_deref().unwrap_or(&[]),
            Mode::Classes => self.classes.as_deref().unwrap_or(&[]),
        }
    }

    /// Build the class table and image set.
    pub fn build(&self) -> Result<Dataset> {
        self.validate()?;
        let entries = self.entries();
        let max_id = entries.iter().map(|e| e.id + 1).max().unwrap_or(0);
        let mut images = ImageSet::new(self.receptors);
        let classes = match self.mode() {
            Mode::Classes => {
                let size = max_id.max(entries.len());
                let mut classes: Vec<Class> = (0..size).map(|id| Class::pending(id, "")).collect();
                for entry in entries {
                    classes[entry.id].name = entry.word.clone();
                    if self.generate_shifts {
                        images.push_shifted(entry.id, &entry.word);
                    } else {
                        images.push(entry.id, &entry.word);
                    }
                }
                classes
            }
            Mode::Images => {
                let mut classes: Vec<Class> = (0..max_id).map(|id| Class::pending(id, "")).collect();
                let mut named = vec![false; max_id];
                for entry in entries {
                    if !named[entry.id] {
                        named[entry.id] = true;
                        classes[entry.id].name = entry.word.trim_end_matches(' ').to_string();
                    }
                    images.push(entry.id, &entry.word);
                }
                classes
            }
        };
        Ok(Dataset { classes, images })
    }

    /// Growth sequence named by `funcs`; unknown names are skipped with a
    /// warning and an empty result means the default operator.
    pub fn strategies(&self) -> Vec<StrategySpec> {
        self.funcs
            .iter()
            .filter_map(|name| match StrategySpec::lookup(name) {
                Ok(spec) => Some(spec),
                Err(e) => {
                    warn!("{e}, skipped");
                    None
                }
            })
            .collect()
    }
}
