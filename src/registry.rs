// Copyright 2025 Cowboy AI, LLC.

//! Cache of built chains
//!
//! Building a chain walks the whole composition graph, so dispatch layers
//! build each (type, selector) pair once and reuse the result. The registry
//! keys chains by the top-level type's `TypeId` and the selector, and also
//! remembers Empty Chain outcomes so unsupported selectors stay cheap.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::builder::ChainBuilder;
use crate::chain::ChainFn;
use crate::config::ChainConfig;
use crate::errors::{ChainError, ChainResult};
use crate::layer::{Layer, LayerInfo};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChainKey {
    layer: TypeId,
    selector: String,
}

impl ChainKey {
    fn of<R: 'static>(selector: &str) -> Self {
        Self {
            layer: TypeId::of::<R>(),
            selector: selector.to_string(),
        }
    }
}

/// `Option<ChainFn<R>>`, with `None` recording an Empty Chain
type CachedChain = Arc<dyn Any + Send + Sync>;

/// Read-mostly cache of chains keyed by top-level type and selector
///
/// Lookups take a read lock; the first build of a key publishes its result
/// under the write lock after checking again that no other thread won.
#[derive(Debug)]
pub struct ChainRegistry {
    config: ChainConfig,
    chains: RwLock<HashMap<ChainKey, CachedChain>>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainRegistry {
    /// Registry building chains with the default configuration
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    /// Registry building chains with `config`
    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            config,
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// Configuration used for every build
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Cached chain for `selector` on `R`, built from `R::default` on first use
    pub fn get_or_build<R: Layer + Default>(&self, selector: &str) -> ChainResult<ChainFn<R>> {
        self.get_or_build_with(selector, R::default)
    }

    /// Cached chain for `selector` on `R`, built with `factory` on first use
    ///
    /// The factory only matters for the first successful build of a key.
    /// Empty Chain results are cached; other build errors are returned and
    /// retried on the next call.
    pub fn get_or_build_with<R, F>(&self, selector: &str, factory: F) -> ChainResult<ChainFn<R>>
    where
        R: Layer,
        F: Fn() -> R + Send + Sync + 'static,
    {
        let key = ChainKey::of::<R>(selector);

        {
            let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = chains.get(&key) {
                return restore::<R>(cached, selector);
            }
        }

        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = chains.get(&key) {
            return restore::<R>(cached, selector);
        }

        let entry = match ChainBuilder::from_factory(factory)
            .with_config(self.config.clone())
            .build(selector)
        {
            Ok(chain) => Some(chain),
            Err(err) if err.is_empty_chain() => None,
            Err(err) => return Err(err),
        };
        debug!(
            layer = LayerInfo::of::<R>().short_name(),
            selector,
            empty = entry.is_none(),
            "Registered method chain"
        );

        let result = match &entry {
            Some(chain) => Ok(chain.clone()),
            None => Err(empty_chain::<R>(selector)),
        };
        chains.insert(key, Arc::new(entry));
        result
    }

    /// Check whether a result for `selector` on `R` is cached
    pub fn contains<R: 'static>(&self, selector: &str) -> bool {
        self.chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&ChainKey::of::<R>(selector))
    }

    /// Number of cached results, Empty Chains included
    pub fn len(&self) -> usize {
        self.chains.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached result
    pub fn clear(&self) {
        self.chains.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

fn restore<R: 'static>(cached: &CachedChain, selector: &str) -> ChainResult<ChainFn<R>> {
    match (**cached).downcast_ref::<Option<ChainFn<R>>>() {
        Some(Some(chain)) => Ok(chain.clone()),
        _ => Err(empty_chain::<R>(selector)),
    }
}

fn empty_chain<R: 'static>(selector: &str) -> ChainError {
    ChainError::EmptyChain {
        layer: LayerInfo::of::<R>().short_name().to_string(),
        selector: selector.to_string(),
    }
}
