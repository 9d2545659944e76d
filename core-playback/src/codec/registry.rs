//! Codec module registry.
//!
//! Tracks which modules are loaded and guarantees at most one in-flight load
//! per module. Concurrent callers asking for the same module share a single
//! load future.

use bridge_traits::CodecModuleLoader;
use core_runtime::events::{CodecEvent, CoreEvent, EventBus};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{fallback_chain, ModuleKey};
use crate::error::{PlaybackError, Result};
use crate::types::FormatKey;

type LoadFuture = Shared<BoxFuture<'static, bool>>;

/// Load state of a single module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    /// Last load failed; the next request loads again
    Failed,
}

/// Outcome of walking a format's fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Module that loaded, `None` for formats that need no module
    pub chosen: Option<ModuleKey>,
    pub used_fallback: bool,
    pub original: FormatKey,
}

#[derive(Default)]
struct RegistryState {
    states: HashMap<ModuleKey, LoadState>,
    in_flight: HashMap<ModuleKey, LoadFuture>,
}

/// Loads codec modules on demand and remembers the outcome.
pub struct CodecModuleRegistry {
    loader: Arc<dyn CodecModuleLoader>,
    base_url: String,
    events: EventBus,
    state: Arc<Mutex<RegistryState>>,
}

impl CodecModuleRegistry {
    pub fn new(
        loader: Arc<dyn CodecModuleLoader>,
        base_url: impl Into<String>,
        events: EventBus,
    ) -> Self {
        Self {
            loader,
            base_url: base_url.into(),
            events,
            state: Arc::new(Mutex::new(RegistryState::default())),
        }
    }

    pub fn load_state(&self, key: ModuleKey) -> LoadState {
        self.state
            .lock()
            .states
            .get(&key)
            .copied()
            .unwrap_or(LoadState::Unloaded)
    }

    pub fn is_loaded(&self, key: ModuleKey) -> bool {
        self.load_state(key) == LoadState::Loaded
    }

    /// Make sure `key` is loaded. Returns `false` if the load failed.
    ///
    /// Concurrent calls for the same key await the same underlying load.
    pub async fn ensure_loaded(&self, key: ModuleKey) -> bool {
        let load = {
            let mut state = self.state.lock();
            if state.states.get(&key) == Some(&LoadState::Loaded) {
                return true;
            }

            match state.in_flight.get(&key) {
                Some(load) => {
                    debug!(module = %key, "Joining in-flight module load");
                    load.clone()
                }
                None => {
                    let load = self.start_load(key);
                    state.states.insert(key, LoadState::Loading);
                    state.in_flight.insert(key, load.clone());
                    load
                }
            }
        };

        load.await
    }

    fn start_load(&self, key: ModuleKey) -> LoadFuture {
        let loader = Arc::clone(&self.loader);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let locator = key.locator(&self.base_url);

        async move {
            let outcome = loader.load(key.as_str(), &locator).await;
            let loaded = outcome.is_ok();

            {
                let mut state = state.lock();
                state.in_flight.remove(&key);
                let next = if loaded {
                    LoadState::Loaded
                } else {
                    LoadState::Failed
                };
                state.states.insert(key, next);
            }

            let event = match outcome {
                Ok(()) => {
                    info!(module = %key, "Codec module loaded");
                    CodecEvent::ModuleLoaded {
                        module: key.to_string(),
                    }
                }
                Err(e) => {
                    debug!(module = %key, error = %e, "Codec module failed to load");
                    CodecEvent::ModuleLoadFailed {
                        module: key.to_string(),
                        error: e.to_string(),
                    }
                }
            };
            events.emit(CoreEvent::Codec(event)).ok();

            loaded
        }
        .boxed()
        .shared()
    }

    /// Load a batch concurrently and report success per key.
    pub async fn load_many(&self, keys: &[ModuleKey]) -> HashMap<ModuleKey, bool> {
        let results = join_all(keys.iter().map(|key| self.ensure_loaded(*key))).await;
        keys.iter().copied().zip(results).collect()
    }

    /// Walk the fallback chain for `format` until a module loads.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::FallbackExhausted`] when every module in the
    /// chain failed. Callers degrade to direct playback in that case.
    #[instrument(skip(self))]
    pub async fn resolve_with_fallback(&self, format: FormatKey) -> Result<ResolvedModule> {
        let chain = fallback_chain(format);
        if chain.is_empty() {
            return Ok(ResolvedModule {
                chosen: None,
                used_fallback: false,
                original: format,
            });
        }

        for (index, key) in chain.iter().copied().enumerate() {
            if !self.ensure_loaded(key).await {
                continue;
            }

            let used_fallback = index > 0;
            if used_fallback {
                info!(format = %format, chosen = %key, "Using fallback codec module");
                self.events
                    .emit(CoreEvent::Codec(CodecEvent::FallbackUsed {
                        original: chain[0].to_string(),
                        chosen: key.to_string(),
                    }))
                    .ok();
            }

            return Ok(ResolvedModule {
                chosen: Some(key),
                used_fallback,
                original: format,
            });
        }

        warn!(format = %format, "Every codec module in the fallback chain failed");
        self.events
            .emit(CoreEvent::Codec(CodecEvent::ChainExhausted {
                format: format.to_string(),
                attempted: chain.iter().map(ToString::to_string).collect(),
            }))
            .ok();

        Err(PlaybackError::FallbackExhausted {
            format,
            attempted: chain.to_vec(),
        })
    }
}
