//! The "current graph" that front ends re-query after a load.
//!
//! Loads are single-flight: a second `load` blocks until the first one has
//! finished. A load builds into state it owns and is published by replacing
//! the current `Arc` in one step, so readers see either the previous load or
//! the new one in full. A failed load publishes nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::LoadConfig;
use crate::engine::{run, LoadInput, LoadedGraph};
use crate::error::ReconError;

#[derive(Debug, Default)]
pub struct GraphStore {
    load_lock: Mutex<()>,
    current: RwLock<Option<Arc<LoadedGraph>>>,
    generation: AtomicU64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the pipeline on pre-loaded sheets and publish the result.
    pub fn load(&self, config: &LoadConfig, input: &LoadInput) -> Result<Arc<LoadedGraph>, ReconError> {
        self.load_with(|| run(config, input))
    }

    /// Run `loader` under the load lock and publish what it returns. Use this
    /// when reading the sheets is part of the load.
    pub fn load_with<F>(&self, loader: F) -> Result<Arc<LoadedGraph>, ReconError>
    where
        F: FnOnce() -> Result<LoadedGraph, ReconError>,
    {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut loaded = loader()?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        loaded.meta.generation = generation;
        let loaded = Arc::new(loaded);

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&loaded));
        log::info!("published load '{}' as generation {generation}", loaded.meta.name);
        Ok(loaded)
    }

    pub fn current(&self) -> Option<Arc<LoadedGraph>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Generation of the most recently published load (0 before any).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
