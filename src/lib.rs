pub mod config;
pub mod data;
pub mod error;
pub mod grow;
pub mod infer;
pub mod model;
pub mod net;
pub mod ops;
pub mod training;

// Re-exports for the CLI and integration tests
pub use config::{Dataset, TrainingConfig};
pub use data::ImageSet;
pub use error::{Error, Result};
pub use grow::{SearchSettings, StrategySpec};
pub use net::{Class, Network};
pub use ops::{Kernel, Op};
pub use training::{InterruptFlag, StopReason, TrainReport, Trainer};
