//! Single-flight guard for wallet prompts and re-authentication

use tokio::sync::{Mutex, MutexGuard};

/// Allows at most one in-flight operation of a kind
///
/// Entering never waits: a caller that finds the guard held is expected to
/// back off. The permit is released when dropped, including on error paths.
#[derive(Debug)]
pub struct SingleFlight {
    name: &'static str,
    lock: Mutex<()>,
}

impl SingleFlight {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lock: Mutex::new(()),
        }
    }

    pub fn try_start(&self) -> Option<MutexGuard<'_, ()>> {
        match self.lock.try_lock() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::debug!(operation = self.name, "Already in flight");
                None
            }
        }
    }

    pub fn in_flight(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}
