// Copyright 2025 Cowboy AI, LLC.

//! One chain per selector for a single top-level type

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::arguments::ArgumentSource;
use crate::builder::ChainBuilder;
use crate::chain::ChainFn;
use crate::errors::{ChainError, ChainResult};
use crate::layer::{Layer, LayerInfo};

/// Chains built for a list of selectors, e.g. one per request verb
///
/// Selectors the type does not support are left out rather than failing the
/// whole set.
pub struct ChainSet<R> {
    layer: LayerInfo,
    chains: IndexMap<String, ChainFn<R>>,
}

impl<R: Layer> ChainSet<R> {
    /// Build a chain for every selector `R` supports, keeping the given order
    ///
    /// Fails with [`ChainError::NoMatchingSelector`] when none is supported and
    /// with the first build error other than Empty Chain.
    pub fn build<I, S>(builder: &ChainBuilder<R>, selectors: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let layer = LayerInfo::of::<R>();
        let mut chains = IndexMap::new();
        let mut tried = Vec::new();

        for selector in selectors {
            let selector = selector.as_ref();
            tried.push(selector.to_string());
            match builder.build(selector) {
                Ok(chain) => {
                    chains.insert(selector.to_string(), chain);
                }
                Err(err) if err.is_empty_chain() => {
                    trace!(layer = layer.short_name(), selector, "Selector not supported");
                }
                Err(err) => return Err(err),
            }
        }

        if chains.is_empty() {
            return Err(ChainError::NoMatchingSelector {
                layer: layer.short_name().to_string(),
                selectors: tried,
            });
        }
        debug!(
            layer = layer.short_name(),
            chains = chains.len(),
            "Built chain set"
        );
        Ok(Self { layer, chains })
    }

    /// Chain for `selector`, if supported
    pub fn get(&self, selector: &str) -> Option<&ChainFn<R>> {
        self.chains.get(selector)
    }

    /// Whether `selector` is supported
    pub fn contains(&self, selector: &str) -> bool {
        self.chains.contains_key(selector)
    }

    /// Run the chain for `selector`; unsupported selectors yield Empty Chain
    pub fn call(&self, selector: &str, args: &mut dyn ArgumentSource) -> ChainResult<()> {
        match self.chains.get(selector) {
            Some(chain) => chain.call(args),
            None => Err(ChainError::EmptyChain {
                layer: self.layer.short_name().to_string(),
                selector: selector.to_string(),
            }),
        }
    }

    /// Supported selectors in build order
    pub fn selectors(&self) -> impl Iterator<Item = &str> + '_ {
        self.chains.keys().map(String::as_str)
    }

    /// Supported selectors with their chains
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChainFn<R>)> + '_ {
        self.chains.iter().map(|(selector, chain)| (selector.as_str(), chain))
    }

    /// Top-level type of every chain in the set
    pub fn layer(&self) -> &LayerInfo {
        &self.layer
    }

    /// Number of supported selectors
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Always false: a set holds at least one chain
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl<R> Clone for ChainSet<R> {
    fn clone(&self) -> Self {
        Self {
            layer: self.layer,
            chains: self.chains.clone(),
        }
    }
}

impl<R> std::fmt::Debug for ChainSet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSet")
            .field("layer", &self.layer)
            .field("selectors", &self.chains.keys().collect::<Vec<_>>())
            .finish()
    }
}
