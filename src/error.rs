//! Error kinds surfaced by configuration loading, persistence and growth.
//!
//! Numeric degeneracies (NaN, infinities) are not errors: they flow through
//! the operators and are neutralized by the inference clamp. Interruption and
//! "no progress" are training outcomes, not failures.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be read or written.
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed training configuration or missing required fields.
    #[error("config: {0}")]
    ConfigParse(String),

    /// The merge configuration disagrees with the loaded model.
    #[error("config receptors ({config}) don't match model ({model})")]
    ConfigMismatch { model: usize, config: usize },

    /// Structurally invalid model file.
    #[error("model: {0}")]
    ModelFormat(String),

    /// Appending would exceed the node capacity.
    #[error("neuron capacity exhausted (limit {limit})")]
    CapacityExhausted { limit: usize },

    /// The Ctrl-C listener could not be started.
    #[error("cannot install interrupt handler: {0}")]
    Signal(#[source] std::io::Error),

    /// Growth operator name not present in the registry.
    #[error("unknown training function '{0}'")]
    UnknownStrategy(String),
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = Error::io(
            Path::new("missing/model.json"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.contains("missing/model.json"), "{msg}");
        assert!(msg.contains("no such file"), "{msg}");
    }

    #[test]
    fn signal_errors_carry_no_path() {
        let err = Error::Signal(std::io::Error::other("no runtime"));
        assert_eq!(err.to_string(), "cannot install interrupt handler: no runtime");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn mismatch_reports_both_sides() {
        let err = Error::ConfigMismatch {
            model: 20,
            config: 16,
        };
        assert_eq!(err.to_string(), "config receptors (16) don't match model (20)");
    }
}
