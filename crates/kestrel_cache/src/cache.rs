//! The engine cache.
//!
//! `EngineCache` maps a [`ConfigurationDescriptor`] to the [`CompiledEngine`]
//! built from it. At most one build runs per descriptor: the first caller
//! installs a building marker under the map lock and builds outside it, while
//! later callers for the same descriptor block on the marker's completion
//! signal. Lookups for other descriptors are never held up by a build.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use kestrel_common::panic_message;
use kestrel_config::{ConfigNode, ConfigurationDescriptor};
use kestrel_engine::CheckRegistry;

use crate::builder::{BuildEngine, EngineBuilder};
use crate::compiled::CompiledEngine;
use crate::context::BuildContext;
use crate::error::CacheError;

type BuildResult = Result<Arc<CompiledEngine>, CacheError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Completion signal for one in-flight build.
struct BuildSlot {
    result: Mutex<Option<BuildResult>>,
    done: Condvar,
}

impl BuildSlot {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> BuildResult {
        let mut guard = lock(&self.result);
        loop {
            if let Some(result) = guard.as_ref() {
                return result.clone();
            }
            guard = self.done.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn complete(&self, result: BuildResult) {
        *lock(&self.result) = Some(result);
        self.done.notify_all();
    }
}

enum CacheEntry {
    /// A build is in flight. `current` is cleared when the entry is
    /// invalidated mid-build; the result then still reaches the callers
    /// already waiting but is never stored or handed to new callers.
    Building {
        slot: Arc<BuildSlot>,
        current: bool,
    },
    Ready {
        engine: Arc<CompiledEngine>,
        valid: bool,
    },
}

#[derive(Default)]
struct State {
    entries: HashMap<ConfigurationDescriptor, CacheEntry>,
}

enum Lookup {
    Hit(Arc<CompiledEngine>),
    Wait(Arc<BuildSlot>),
    Superseded(Arc<BuildSlot>),
    Build,
}

/// Keyed, build-once cache of compiled engines.
///
/// Created once per session and passed to whatever owns the scan lifecycle.
/// Entries stay valid until invalidated; there is no time-based expiry.
pub struct EngineCache<B: BuildEngine = EngineBuilder> {
    builder: B,
    state: Mutex<State>,
}

impl<B: BuildEngine> EngineCache<B> {
    /// Creates an empty cache building through `builder`.
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            state: Mutex::new(State::default()),
        }
    }

    /// Returns the builder.
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Returns the engine for `descriptor`, building it if needed.
    ///
    /// A concurrent caller for a descriptor that is already building waits
    /// for that build and receives the same engine or the same error. A
    /// failed build leaves no entry behind, so a later call retries.
    ///
    /// A caller arriving after the in-flight build was invalidated does not
    /// take its result. It waits for that build to finish, then looks up
    /// again and starts a fresh build, so at most one build per descriptor
    /// runs at a time.
    pub fn get_engine(
        &self,
        descriptor: &ConfigurationDescriptor,
        context: &BuildContext,
        registry: Option<Arc<CheckRegistry>>,
    ) -> Result<Arc<CompiledEngine>, CacheError> {
        loop {
            let (slot, evicted) = {
                let mut state = lock(&self.state);
                let lookup = match state.entries.get(descriptor) {
                    Some(CacheEntry::Ready {
                        engine,
                        valid: true,
                    }) => Lookup::Hit(Arc::clone(engine)),
                    Some(CacheEntry::Building {
                        slot,
                        current: true,
                    }) => Lookup::Wait(Arc::clone(slot)),
                    Some(CacheEntry::Building {
                        slot,
                        current: false,
                    }) => Lookup::Superseded(Arc::clone(slot)),
                    Some(CacheEntry::Ready { valid: false, .. }) => {
                        tracing::debug!(configuration = %descriptor, "cache entry invalid, rebuilding");
                        Lookup::Build
                    }
                    None => {
                        tracing::debug!(configuration = %descriptor, "cache miss");
                        Lookup::Build
                    }
                };
                match lookup {
                    Lookup::Hit(engine) => {
                        tracing::trace!(configuration = %descriptor, "cache hit");
                        return Ok(engine);
                    }
                    Lookup::Wait(slot) => {
                        drop(state);
                        tracing::debug!(configuration = %descriptor, "waiting for in-flight build");
                        return slot.wait();
                    }
                    Lookup::Superseded(slot) => {
                        drop(state);
                        tracing::debug!(configuration = %descriptor, "waiting for superseded build");
                        let _ = slot.wait();
                        continue;
                    }
                    Lookup::Build => {}
                }
                let slot = Arc::new(BuildSlot::new());
                let evicted = state.entries.insert(
                    descriptor.clone(),
                    CacheEntry::Building {
                        slot: Arc::clone(&slot),
                        current: true,
                    },
                );
                (slot, evicted)
            };
            drop(evicted);

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                self.builder.build(descriptor, context, registry)
            }))
            .unwrap_or_else(|payload| {
                Err(CacheError::BuildPanicked(panic_message(payload.as_ref())))
            })
            .map(Arc::new);

            self.finish_build(descriptor, &slot, &result);
            slot.complete(result.clone());
            return result;
        }
    }

    /// Replaces our building marker with the result.
    ///
    /// A successful build is stored invalid if the marker was invalidated
    /// meanwhile. A failed build removes the marker.
    fn finish_build(
        &self,
        descriptor: &ConfigurationDescriptor,
        slot: &Arc<BuildSlot>,
        result: &BuildResult,
    ) {
        let replaced = {
            let mut state = lock(&self.state);
            let current = match state.entries.get(descriptor) {
                Some(CacheEntry::Building { slot: ours, current }) if Arc::ptr_eq(ours, slot) => {
                    *current
                }
                _ => return,
            };
            match result {
                Ok(engine) => {
                    if !current {
                        tracing::debug!(configuration = %descriptor, "storing engine built before invalidation as invalid");
                    }
                    state.entries.insert(
                        descriptor.clone(),
                        CacheEntry::Ready {
                            engine: Arc::clone(engine),
                            valid: current,
                        },
                    )
                }
                Err(err) => {
                    tracing::warn!(configuration = %descriptor, error = %err, "engine build failed");
                    state.entries.remove(descriptor)
                }
            }
        };
        drop(replaced);
    }

    /// Returns the parsed configuration of the ready engine for `descriptor`.
    pub fn get_compiled_config(
        &self,
        descriptor: &ConfigurationDescriptor,
    ) -> Result<Arc<ConfigNode>, CacheError> {
        match lock(&self.state).entries.get(descriptor) {
            Some(CacheEntry::Ready {
                engine,
                valid: true,
            }) => Ok(Arc::clone(engine.config())),
            _ => Err(CacheError::NotBuilt(descriptor.to_string())),
        }
    }

    /// Marks every entry invalid so the next lookup of each rebuilds.
    ///
    /// Engines in use by running scans stay alive until those scans release
    /// them. Builds in flight complete for the callers already waiting on
    /// them but are stored invalid, and later callers build afresh.
    pub fn invalidate_all(&self) {
        let mut state = lock(&self.state);
        for entry in state.entries.values_mut() {
            match entry {
                CacheEntry::Ready { valid, .. } => *valid = false,
                CacheEntry::Building { current, .. } => *current = false,
            }
        }
        tracing::debug!(count = state.entries.len(), "invalidated all cached engines");
    }

    /// Invalidates the entry for one descriptor. Returns `true` if there was
    /// one.
    ///
    /// A ready engine is dropped. A build in flight keeps its marker, so no
    /// second build starts beside it, but its result is not handed to later
    /// callers.
    pub fn invalidate(&self, descriptor: &ConfigurationDescriptor) -> bool {
        let removed = {
            let mut state = lock(&self.state);
            match state.entries.get_mut(descriptor) {
                None => return false,
                Some(CacheEntry::Building { current, .. }) => {
                    *current = false;
                    None
                }
                Some(CacheEntry::Ready { .. }) => state.entries.remove(descriptor),
            }
        };
        drop(removed);
        tracing::debug!(configuration = %descriptor, "invalidated cached engine");
        true
    }

    /// Drops every ready entry whose backing document changed or vanished.
    ///
    /// Documents are re-hashed outside the map lock. Returns the number of
    /// entries dropped.
    pub fn invalidate_stale(&self) -> usize {
        let ready: Vec<(ConfigurationDescriptor, Arc<CompiledEngine>)> = lock(&self.state)
            .entries
            .iter()
            .filter_map(|(descriptor, entry)| match entry {
                CacheEntry::Ready { engine, .. } => Some((descriptor.clone(), Arc::clone(engine))),
                CacheEntry::Building { .. } => None,
            })
            .collect();

        let stale: Vec<_> = ready
            .into_iter()
            .filter(|(_, engine)| engine.is_stale())
            .collect();

        let mut evicted = Vec::new();
        {
            let mut state = lock(&self.state);
            for (descriptor, engine) in &stale {
                let same = matches!(
                    state.entries.get(descriptor),
                    Some(CacheEntry::Ready { engine: current, .. }) if Arc::ptr_eq(current, engine)
                );
                if same {
                    tracing::info!(configuration = %descriptor, "configuration document changed");
                    evicted.extend(state.entries.remove(descriptor));
                }
            }
        }
        evicted.len()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let entries = std::mem::take(&mut lock(&self.state).entries);
        tracing::debug!(count = entries.len(), "cleared engine cache");
        drop(entries);
    }

    /// Returns the number of entries, building ones included.
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if a valid engine is ready for `descriptor`.
    pub fn is_ready(&self, descriptor: &ConfigurationDescriptor) -> bool {
        matches!(
            lock(&self.state).entries.get(descriptor),
            Some(CacheEntry::Ready { valid: true, .. })
        )
    }
}

impl<B: BuildEngine> Drop for EngineCache<B> {
    fn drop(&mut self) {
        self.clear();
    }
}
