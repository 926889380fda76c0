use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::LoadError;
use crate::scope::SettingsScope;

/// Ordered queue of load failures shared by the stores of one manager.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    errors: Arc<Mutex<Vec<LoadError>>>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure. Repeated failures are kept, not deduplicated.
    pub fn record(&self, scope: SettingsScope, message: impl Into<String>) {
        self.lock().push(LoadError::new(scope, message));
    }

    /// Take every queued error, leaving the sink empty.
    pub fn drain(&self) -> Vec<LoadError> {
        std::mem::take(&mut *self.lock())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LoadError>> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
