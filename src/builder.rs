// Copyright 2025 Cowboy AI, LLC.

//! Chain construction
//!
//! The builder expands the composition graph of a top-level type, lets a
//! [`MethodFinder`] pick at most one method per layer and orders the matches so
//! that embedded layers wrap the layer that embeds them:
//!
//! ```mermaid
//! graph TD
//!     C[Controller.GET] --> L[logging: Logging.Any]
//!     C --> A[auth: Auth.Any]
//!     A --> S[session: Session.Any]
//! ```
//!
//! builds the chain `Logging.Any, Session.Any, Auth.Any, Controller.GET`:
//! siblings run in declaration order, a layer's embedded layers run before
//! it, and the top-level method is the terminal step.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::chain::{ChainFn, Control, ABORT_INDEX};
use crate::config::ChainConfig;
use crate::errors::{ChainError, ChainResult};
use crate::finder::{check_method_name, MethodFinder, SelectorFinder};
use crate::graph::{CompositionGraph, LayerNode};
use crate::layer::{Layer, LayerInfo, MethodEntry};
use crate::method::{ArgValue, ErasedMethod, InvokeFailure, ParamInfo};
use crate::receiver::{FieldStep, ReceiverDescriptor};

/// A matched method together with where to find its receiver
#[derive(Clone)]
pub struct BoundMethod {
    name: String,
    receiver: ReceiverDescriptor,
    params: Vec<ParamInfo>,
    method: Arc<dyn ErasedMethod>,
}

impl BoundMethod {
    fn bind(entry: &MethodEntry, receiver: ReceiverDescriptor) -> Self {
        Self {
            name: entry.name().to_string(),
            receiver,
            params: entry.params().to_vec(),
            method: Arc::clone(&entry.method),
        }
    }

    /// Name of the matched method
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receiver of the method
    pub fn receiver(&self) -> &ReceiverDescriptor {
        &self.receiver
    }

    /// Layer the method was declared on
    pub fn layer(&self) -> &LayerInfo {
        self.receiver.layer()
    }

    /// Non-receiver parameter types, in order
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    pub(crate) fn invoke<'a>(&'a self, control: &'a mut dyn Control, values: Vec<ArgValue>) -> ChainResult<()> {
        self.method
            .invoke(control, &self.receiver, values)
            .map_err(|failure| match failure {
                InvokeFailure::Receiver => ChainError::ReceiverUnavailable {
                    layer: self.layer().short_name().to_string(),
                    path: self.receiver.field_path(),
                },
                InvokeFailure::Argument(mismatch) => ChainError::ArgumentType {
                    layer: self.layer().short_name().to_string(),
                    method: self.name.clone(),
                    index: mismatch.index,
                    expected: mismatch.expected,
                },
            })
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("params", &self.params)
            .finish()
    }
}

/// Immutable plan of a chain: the bound methods in execution order
#[derive(Debug, Clone)]
pub struct ChainDescriptor {
    top: LayerInfo,
    selector: String,
    methods: Vec<BoundMethod>,
}

impl ChainDescriptor {
    /// Top-level type the chain was built for
    pub fn top(&self) -> &LayerInfo {
        &self.top
    }

    /// Selector the chain was built for
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Bound methods in execution order
    pub fn methods(&self) -> &[BoundMethod] {
        &self.methods
    }

    /// Receivers of the bound methods in execution order
    ///
    /// Embedded layers come before the layer that embeds them, so the
    /// top-level receiver is last.
    pub fn receivers(&self) -> impl Iterator<Item = &ReceiverDescriptor> + '_ {
        self.methods.iter().map(BoundMethod::receiver)
    }

    /// Receivers in the order the builder matched them while walking the graph
    ///
    /// This is the reverse of execution order: the top-level receiver comes
    /// first.
    pub fn receivers_in_matching_order(&self) -> impl Iterator<Item = &ReceiverDescriptor> + '_ {
        self.methods.iter().rev().map(BoundMethod::receiver)
    }

    /// Number of bound methods
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no method is bound
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Builds chains for the top-level type `R`
pub struct ChainBuilder<R> {
    factory: Arc<dyn Fn() -> R + Send + Sync>,
    config: ChainConfig,
}

impl<R: Layer + Default> ChainBuilder<R> {
    /// Builder whose chains start every execution from `R::default()`
    pub fn new() -> Self {
        Self::from_factory(R::default)
    }
}

impl<R: Layer + Default> Default for ChainBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Layer> ChainBuilder<R> {
    /// Builder whose chains start every execution from `factory()`
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            config: ChainConfig::default(),
        }
    }

    /// Replace the builder configuration
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Build the chain for `selector`
    pub fn build(&self, selector: &str) -> ChainResult<ChainFn<R>> {
        self.build_with(&SelectorFinder::new(selector, &self.config))
    }

    /// Build a chain with a custom method finder
    pub fn build_with(&self, finder: &dyn MethodFinder) -> ChainResult<ChainFn<R>> {
        let descriptor = self.descriptor_with(finder)?;
        Ok(ChainFn::new(descriptor, Arc::clone(&self.factory)))
    }

    /// Plan the chain for `selector` without making it callable
    pub fn descriptor(&self, selector: &str) -> ChainResult<ChainDescriptor> {
        self.descriptor_with(&SelectorFinder::new(selector, &self.config))
    }

    /// Plan a chain with a custom method finder
    pub fn descriptor_with(&self, finder: &dyn MethodFinder) -> ChainResult<ChainDescriptor> {
        let selector = finder.selector();
        check_method_name(selector)?;

        let top = LayerInfo::of::<R>();
        let graph = CompositionGraph::of::<R>(self.config.max_depth)?;

        let mut methods = Vec::new();
        self.collect(finder, graph.root(), Vec::new(), &mut methods)?;
        if methods.is_empty() {
            return Err(ChainError::EmptyChain {
                layer: top.short_name().to_string(),
                selector: selector.to_string(),
            });
        }
        if methods.len() >= ABORT_INDEX as usize {
            return Err(ChainError::ChainTooLong {
                selector: selector.to_string(),
                len: methods.len(),
            });
        }
        methods.reverse();

        debug!(
            layer = top.short_name(),
            selector,
            methods = methods.len(),
            "Built method chain"
        );
        Ok(ChainDescriptor {
            top,
            selector: selector.to_string(),
            methods,
        })
    }

    // Matches are pushed parent first, children in reverse; the caller
    // reverses the list so embedded layers end up ahead of their parent.
    fn collect(
        &self,
        finder: &dyn MethodFinder,
        node: &LayerNode,
        path: Vec<FieldStep>,
        out: &mut Vec<BoundMethod>,
    ) -> ChainResult<()> {
        if let Some(entry) = finder.find(node.depth(), node.info(), node.methods())? {
            self.validate(node.info(), entry)?;
            trace!(
                layer = node.info().short_name(),
                method = entry.name(),
                depth = node.depth(),
                mode = ?entry.mode(),
                "Bound chain method"
            );
            let receiver = ReceiverDescriptor::new(*node.info(), node.depth(), path.clone(), entry.mode());
            out.push(BoundMethod::bind(entry, receiver));
        }

        for child in node.children().iter().rev() {
            let mut child_path = path.clone();
            child_path.extend(child.step().cloned());
            self.collect(finder, child, child_path, out)?;
        }
        Ok(())
    }

    fn validate(&self, layer: &LayerInfo, entry: &MethodEntry) -> ChainResult<()> {
        check_method_name(entry.name()).map_err(|err| {
            let layer = layer.short_name().to_string();
            let method = entry.name().to_string();
            match err {
                ChainError::ReservedMethodName(_) => ChainError::ReservedLayerMethod { layer, method },
                _ => ChainError::InvalidLayerMethod { layer, method },
            }
        })?;
        if let Some(returns) = entry.returns() {
            return Err(ChainError::ReturnsValue {
                layer: layer.short_name().to_string(),
                method: entry.name().to_string(),
                returns: returns.to_string(),
            });
        }
        if entry.params().len() > self.config.max_params {
            return Err(ChainError::TooManyParams {
                layer: layer.short_name().to_string(),
                method: entry.name().to_string(),
                count: entry.params().len(),
                max: self.config.max_params,
            });
        }
        Ok(())
    }
}

impl<R> fmt::Debug for ChainBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainBuilder")
            .field("config", &self.config)
            .finish()
    }
}

/// Build the chain for `selector` on `R` with the default configuration
pub fn build<R: Layer + Default>(selector: &str) -> ChainResult<ChainFn<R>> {
    ChainBuilder::<R>::new().build(selector)
}

/// Build the chain for `selector` on instances produced by `factory`
pub fn build_with_factory<R, F>(factory: F, selector: &str) -> ChainResult<ChainFn<R>>
where
    R: Layer,
    F: Fn() -> R + Send + Sync + 'static,
{
    ChainBuilder::from_factory(factory).build(selector)
}
