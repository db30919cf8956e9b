// Copyright 2025 Cowboy AI, LLC.

//! Method matching strategies and name validation

use crate::config::{ChainConfig, FallbackScope};
use crate::errors::{ChainError, ChainResult};
use crate::layer::{LayerInfo, MethodEntry};

/// Names of the chain control methods; a selector may not take any of them
pub const RESERVED_METHOD_NAMES: [&str; 4] = ["Next", "Abort", "IsAborted", "Err"];

/// Check whether `name` starts with an uppercase letter and holds only letters, digits and `_`
pub fn is_exported_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Validate a selector or matched method name
pub fn check_method_name(name: &str) -> ChainResult<()> {
    if !is_exported_name(name) {
        return Err(ChainError::InvalidMethodName(name.to_string()));
    }
    if RESERVED_METHOD_NAMES.contains(&name) {
        return Err(ChainError::ReservedMethodName(name.to_string()));
    }
    Ok(())
}

/// Picks the method a layer contributes to a chain
///
/// Called once per layer while the builder walks the composition graph.
/// Returning an error stops the build.
pub trait MethodFinder {
    /// Selector the chain is built for
    fn selector(&self) -> &str;

    /// Choose at most one of the methods `layer` declared at `depth`
    fn find<'m>(
        &self,
        depth: usize,
        layer: &LayerInfo,
        methods: &'m [MethodEntry],
    ) -> ChainResult<Option<&'m MethodEntry>>;
}

fn first_named<'m>(methods: &'m [MethodEntry], name: &str) -> Option<&'m MethodEntry> {
    methods.iter().find(|method| method.name() == name)
}

/// Matches methods by exact name only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindName {
    name: String,
}

impl FindName {
    /// Match methods named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MethodFinder for FindName {
    fn selector(&self) -> &str {
        &self.name
    }

    fn find<'m>(
        &self,
        _depth: usize,
        _layer: &LayerInfo,
        methods: &'m [MethodEntry],
    ) -> ChainResult<Option<&'m MethodEntry>> {
        Ok(first_named(methods, &self.name))
    }
}

/// Matches the selector, falling back to a catch-all name where configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorFinder {
    selector: String,
    fallback: Option<String>,
    scope: FallbackScope,
}

impl SelectorFinder {
    /// Finder for `selector` using the fallback settings of `config`
    pub fn new(selector: impl Into<String>, config: &ChainConfig) -> Self {
        Self {
            selector: selector.into(),
            fallback: config.fallback_method.clone(),
            scope: config.fallback_scope,
        }
    }

    fn fallback<'m>(&self, methods: &'m [MethodEntry]) -> Option<&'m MethodEntry> {
        self.fallback
            .as_deref()
            .and_then(|name| first_named(methods, name))
    }
}

impl MethodFinder for SelectorFinder {
    fn selector(&self) -> &str {
        &self.selector
    }

    fn find<'m>(
        &self,
        depth: usize,
        layer: &LayerInfo,
        methods: &'m [MethodEntry],
    ) -> ChainResult<Option<&'m MethodEntry>> {
        let exact = first_named(methods, &self.selector);
        match (self.scope, depth) {
            (FallbackScope::TopLevel, 0) => Ok(exact.or_else(|| self.fallback(methods))),
            (FallbackScope::TopLevel, _) => Ok(exact),
            (FallbackScope::NestedLayers, 0) => match exact {
                Some(method) => Ok(Some(method)),
                None => Err(ChainError::EmptyChain {
                    layer: layer.short_name().to_string(),
                    selector: self.selector.clone(),
                }),
            },
            (FallbackScope::NestedLayers, _) => Ok(exact.or_else(|| self.fallback(methods))),
        }
    }
}
