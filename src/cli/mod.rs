pub mod classify;
pub mod funcs;
pub mod train;
pub mod verify;

use std::path::Path;
use std::process;

use clap::Args;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use nnets::grow::SearchSettings;
use nnets::{Kernel, Network, TrainingConfig};

/// Search and runtime flags shared by every mode.
#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// Worker threads for the parallel operators (0 = all cores)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,
    /// Run every operator serially
    #[arg(long)]
    pub single_thread: bool,
    /// Use the scalar kernels
    #[arg(long)]
    pub no_simd: bool,
    /// RNG seed (default: wall clock)
    #[arg(long, conflicts_with = "test")]
    pub seed: Option<u32>,
    /// Train with seed 42, then check every training image (exit 1 on a miss)
    #[arg(long)]
    pub test: bool,
}

impl SearchArgs {
    pub fn settings(&self) -> SearchSettings {
        let seed = if self.test {
            42
        } else {
            self.seed.unwrap_or_else(SearchSettings::clock_seed)
        };
        SearchSettings {
            threads: self.threads,
            parallel: !self.single_thread,
            simd: !self.no_simd,
            seed,
            ..SearchSettings::default()
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` overrides the level.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Print `error: …` and exit 1.
pub fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("error: {err}");
    process::exit(1);
}

pub fn load_model(path: &Path) -> Network {
    nnets::model::load(path).unwrap_or_else(|e| fail(e))
}

/// `--config` when given, the built-in four-class set otherwise.
pub fn load_config(path: Option<&Path>) -> TrainingConfig {
    match path {
        Some(p) => TrainingConfig::load(p).unwrap_or_else(|e| fail(e)),
        None => {
            eprintln!("no --config given, using the built-in classes (blank, time, hour, main)");
            TrainingConfig::default()
        }
    }
}

pub fn report_runtime(settings: &SearchSettings) {
    let kernel = Kernel::select(settings.simd);
    eprintln!("Random seed: {}", settings.seed);
    if settings.parallel {
        eprintln!("Multithreading: {} workers", settings.workers());
    } else {
        eprintln!("Multithreading: disabled");
    }
    eprintln!(
        "SIMD: {}{}",
        kernel.describe(),
        if settings.simd { "" } else { " (disabled via --no-simd)" }
    );
    tracing::info!("operator kernel: {kernel}");
}
