// Copyright 2025 Cowboy AI, LLC.

//! # CIM Chain
//!
//! Method chains assembled from composed types.
//!
//! A top-level type embeds other layers, and every layer may contribute one
//! method under a selector name. Building a chain for a selector walks the
//! composition graph once, binds the matching methods and returns a
//! [`ChainFn`] that runs them like middleware: each method decides whether
//! the rest of the chain runs ([`Link::next`]) or stops ([`Link::abort`]).
//!
//! - **Layer**: a type implementing [`Layer`]; it declares its methods and
//!   embedded layers on a [`LayerSchema`]
//! - **Link**: the handle a chain method receives; gives access to its layer
//!   and to the chain controls
//! - **Argument Source**: supplies non-receiver arguments and initializes each
//!   fresh instance ([`ArgumentSource`], [`TypedArguments`])
//! - **Empty Chain**: no layer matched the selector; reported as
//!   [`ChainError::EmptyChain`] and meant to be handled, not treated as a fault
//!
//! ## Ordering
//!
//! Embedded layers wrap the layer that embeds them. Siblings run in
//! declaration order and the top-level method is the terminal step.
//!
//! ## Example
//!
//! ```
//! use cim_chain::{ArgValue, ArgumentSource, BoxError, ChainBuilder, Layer, LayerInfo, LayerSchema, Link, ParamInfo};
//!
//! #[derive(Default)]
//! struct Auth {
//!     user: Option<String>,
//! }
//!
//! impl Auth {
//!     fn get(link: &mut Link<'_, Self>, token: String) {
//!         if token.is_empty() {
//!             link.abort_with("missing token");
//!             return;
//!         }
//!         link.recv().user = Some(token);
//!         link.next();
//!     }
//! }
//!
//! impl Layer for Auth {
//!     fn compose(schema: &mut LayerSchema<Self>) {
//!         schema.method("Get", Self::get);
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Profile {
//!     auth: Auth,
//! }
//!
//! impl Profile {
//!     fn get(link: &mut Link<'_, Self>) {
//!         let user = link.recv().auth.user.clone();
//!         assert_eq!(user.as_deref(), Some("alice"));
//!     }
//! }
//!
//! impl Layer for Profile {
//!     fn compose(schema: &mut LayerSchema<Self>) {
//!         schema.embed("auth", |profile| &mut profile.auth);
//!         schema.method("Get", Self::get);
//!     }
//! }
//!
//! struct Token(&'static str);
//!
//! impl ArgumentSource for Token {
//!     fn resolve(&mut self, _layer: &LayerInfo, _index: usize, _param: &ParamInfo) -> Result<ArgValue, BoxError> {
//!         Ok(Box::new(self.0.to_string()))
//!     }
//! }
//!
//! let chain = ChainBuilder::<Profile>::new().build("Get")?;
//! chain.call(&mut Token("alice"))?;
//!
//! let err = chain.call(&mut Token("")).unwrap_err();
//! assert_eq!(err.to_string(), "missing token");
//! # Ok::<(), cim_chain::ChainError>(())
//! ```

#![warn(missing_docs)]

mod arguments;
mod builder;
mod chain;
mod chain_set;
mod config;
mod errors;
mod finder;
mod graph;
mod layer;
mod link;
mod method;
mod receiver;
mod registry;

pub use arguments::{ArgumentSource, NoArguments, NoProvider, TypedArguments};
pub use builder::{build, build_with_factory, BoundMethod, ChainBuilder, ChainDescriptor};
pub use chain::{ChainFn, ChainPhase, ABORT_INDEX};
pub use chain_set::ChainSet;
pub use config::{ChainConfig, FallbackScope};
pub use errors::{BoxError, ChainError, ChainResult};
pub use finder::{
    check_method_name, is_exported_name, FindName, MethodFinder, SelectorFinder,
    RESERVED_METHOD_NAMES,
};
pub use graph::{CompositionGraph, LayerNode};
pub use layer::{Layer, LayerInfo, LayerSchema, MethodEntry};
pub use link::Link;
pub use method::{ArgValue, ArgumentMismatch, Method, ParamInfo};
pub use receiver::{FieldStep, ReceiverDescriptor, ReceiverMode};
pub use registry::ChainRegistry;
