//! Cooperative cancellation.
//!
//! The first Ctrl-C raises the process-wide flag, which the trainer polls
//! between steps. A second Ctrl-C exits immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::warn;

use crate::error::{Error, Result};

#[derive(Clone, Debug, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flag the signal handler raises.
    pub fn global() -> &'static InterruptFlag {
        static FLAG: OnceLock<InterruptFlag> = OnceLock::new();
        FLAG.get_or_init(InterruptFlag::new)
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Watch for Ctrl-C on a background thread driving a current-thread runtime.
pub fn install_ctrl_c_handler() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Signal)?;
    std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            runtime.block_on(async {
                let flag = InterruptFlag::global();
                loop {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("cannot listen for Ctrl-C: {e}");
                        return;
                    }
                    if flag.is_raised() {
                        eprintln!("\nsecond interrupt, exiting");
                        std::process::exit(1);
                    }
                    flag.raise();
                    eprintln!("\ninterrupt: finishing the current step (Ctrl-C again to abort)");
                }
            })
        })
        .map_err(Error::Signal)?;
    Ok(())
}
