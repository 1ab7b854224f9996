// src/gps/source.rs
//! The continuous location stream contract
//!
//! A recording session subscribes to a long-lived stream of fixes rather than
//! issuing one-shot reads: fixes arrive repeatedly and unpredictably for the
//! life of the session, so sources hand out a [`Subscription`] that keeps
//! delivering until cancelled.

use crate::error::{RecorderError, Result};
use crate::geo::GeoSample;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Callback invoked for every raw fix the source produces.
pub type FixHandler = Box<dyn FnMut(GeoSample) + Send>;

/// Callback invoked when an individual fix attempt fails. Non-fatal: the
/// stream keeps running.
pub type FixErrorHandler = Box<dyn FnMut(RecorderError) + Send>;

/// Options for a continuous location watch.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Request the highest accuracy the source can provide.
    pub high_accuracy: bool,
    /// Per-fix read timeout.
    pub timeout: Duration,
    /// Every fix must be freshly acquired; cached readings are not acceptable.
    pub no_cache: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(crate::config::DEFAULT_FIX_TIMEOUT_MS),
            no_cache: true,
        }
    }
}

impl WatchOptions {
    pub fn from_config(config: &crate::config::RecorderConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.fix_timeout_ms),
            ..Self::default()
        }
    }
}

/// A provider of continuous location fixes.
pub trait LocationSource {
    /// Open a sustained watch. The source delivers every fix it produces to
    /// `on_fix` and recoverable per-fix failures to `on_error` until the
    /// returned subscription is cancelled.
    fn subscribe(
        &self,
        options: WatchOptions,
        on_fix: FixHandler,
        on_error: FixErrorHandler,
    ) -> Result<Subscription>;
}

/// Handle to an open location watch.
///
/// Cancellation is synchronous: once `cancel` returns, no further fix is
/// delivered through this subscription. Sources must check [`is_active`]
/// before invoking their handlers.
///
/// [`is_active`]: Subscription::is_active
pub struct Subscription {
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(active: Arc<AtomicBool>, task: Option<JoinHandle<()>>) -> Self {
        Self { active, task }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop fix delivery. Safe to call more than once.
    pub fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
