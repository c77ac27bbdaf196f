//! Shared kernel bank cache
//!
//! Kernel construction is deterministic, so engines built from the same
//! parameters can share one bank. Entries are keyed by the postcard encoding
//! of the `KernelSpec`.

use crate::builder::{build_kernels, KernelBank, KernelSpec};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigurationError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Thread-safe cache of built kernel banks
#[derive(Debug, Default)]
pub struct KernelCache {
    entries: Mutex<HashMap<Vec<u8>, Arc<KernelBank>>>,
}

impl KernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached bank for `spec`, building it on a miss.
    ///
    /// Build diagnostics are only emitted on the call that builds the bank.
    pub fn get_or_build(
        &self,
        spec: &KernelSpec,
        diagnostics: &mut Diagnostics,
    ) -> Result<Arc<KernelBank>, ConfigurationError> {
        let key = match postcard::to_allocvec(spec) {
            Ok(key) => key,
            Err(e) => {
                debug!("Kernel spec not encodable ({}), building uncached", e);
                return build_kernels(spec, diagnostics).map(Arc::new);
            }
        };

        if let Some(bank) = self.lock().get(&key) {
            debug!("Kernel cache hit");
            return Ok(Arc::clone(bank));
        }

        // Built without holding the lock; a racing build of the same spec
        // yields to whichever bank was inserted first
        let built = Arc::new(build_kernels(spec, diagnostics)?);
        let mut entries = self.lock();
        let bank = Arc::clone(entries.entry(key).or_insert(built));
        debug!("Kernel cache miss, now {} entries", entries.len());
        Ok(bank)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Vec<u8>, Arc<KernelBank>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of cached banks
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
