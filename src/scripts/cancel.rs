//! Ctrl-C cancellation for long-running scripts

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared flag flipped when the user interrupts ramp
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token wired to SIGINT/SIGTERM. The handler is installed once per
    /// process; later calls return the same token.
    pub fn from_ctrlc() -> Result<Self> {
        static TOKEN: OnceLock<CancelToken> = OnceLock::new();
        if let Some(token) = TOKEN.get() {
            return Ok(token.clone());
        }

        let token = CancelToken::new();
        let flag = Arc::clone(&token.cancelled);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .context("Failed to set Ctrl+C handler")?;

        Ok(TOKEN.get_or_init(|| token).clone())
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
