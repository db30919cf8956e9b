// Copyright 2025 Cowboy AI, LLC.

//! Argument sources: where chain methods get their non-receiver arguments
//!
//! An [`ArgumentSource`] is consulted once per execution to initialize the
//! fresh top-level instance and then once per parameter, right before the
//! method owning it is invoked. [`TypedArguments`] is a ready-made source that
//! hands out values by parameter type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::errors::BoxError;
use crate::layer::LayerInfo;
use crate::method::{ArgValue, ParamInfo};

/// Supplies per-execution initialization and argument values
pub trait ArgumentSource {
    /// Prepare the fresh top-level instance before any method runs
    fn init(&mut self, instance: &mut dyn Any) -> Result<(), BoxError> {
        let _ = instance;
        Ok(())
    }

    /// Produce the value for parameter `index` of the method declared on `layer`
    ///
    /// The returned value must have the type described by `param`.
    fn resolve(&mut self, layer: &LayerInfo, index: usize, param: &ParamInfo) -> Result<ArgValue, BoxError>;
}

/// No value or provider was registered for a parameter type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No argument provider for {type_name} (argument {index} of {layer})")]
pub struct NoProvider {
    /// Requested parameter type
    pub type_name: &'static str,
    /// Layer whose method asked for it
    pub layer: &'static str,
    /// Zero-based parameter position
    pub index: usize,
}

type Provider = Box<dyn FnMut(&LayerInfo, usize) -> Result<ArgValue, BoxError>>;
type InitHook = Box<dyn FnMut(&mut dyn Any) -> Result<(), BoxError>>;

/// Argument source that resolves parameters by their type
///
/// # Example
///
/// ```
/// use cim_chain::{ArgumentSource, LayerInfo, ParamInfo, TypedArguments};
///
/// struct Controller;
///
/// let mut args = TypedArguments::new()
///     .value(42u32)
///     .provide(|layer: &LayerInfo, index| Ok(format!("{layer}#{index}")));
///
/// let layer = LayerInfo::of::<Controller>();
/// let port = args.resolve(&layer, 0, &ParamInfo::of::<u32>()).unwrap();
/// assert_eq!(port.downcast_ref::<u32>(), Some(&42));
///
/// let name = args.resolve(&layer, 1, &ParamInfo::of::<String>()).unwrap();
/// assert_eq!(name.downcast_ref::<String>().map(String::as_str), Some("Controller#1"));
/// ```
#[derive(Default)]
pub struct TypedArguments {
    providers: HashMap<TypeId, Provider>,
    init: Vec<InitHook>,
}

impl TypedArguments {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a clone of `value` for every parameter of type `T`
    pub fn value<T: Clone + 'static>(mut self, value: T) -> Self {
        self.providers.insert(
            TypeId::of::<T>(),
            Box::new(move |_: &LayerInfo, _: usize| -> Result<ArgValue, BoxError> {
                Ok(Box::new(value.clone()))
            }),
        );
        self
    }

    /// Compute parameters of type `T` with `provider`
    pub fn provide<T, F>(mut self, provider: F) -> Self
    where
        T: 'static,
        F: FnMut(&LayerInfo, usize) -> Result<T, BoxError> + 'static,
    {
        let mut provider = provider;
        self.providers.insert(
            TypeId::of::<T>(),
            Box::new(move |layer: &LayerInfo, index: usize| -> Result<ArgValue, BoxError> {
                Ok(Box::new(provider(layer, index)?))
            }),
        );
        self
    }

    /// Run `hook` on every fresh top-level instance of type `R`
    ///
    /// Instances of other types are left alone.
    pub fn on_init<R, F>(mut self, hook: F) -> Self
    where
        R: 'static,
        F: FnMut(&mut R) -> Result<(), BoxError> + 'static,
    {
        let mut hook = hook;
        self.init.push(Box::new(move |instance: &mut dyn Any| -> Result<(), BoxError> {
            match instance.downcast_mut::<R>() {
                Some(instance) => hook(instance),
                None => Ok(()),
            }
        }));
        self
    }

    /// Check whether parameters of type `T` can be resolved
    pub fn contains<T: 'static>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<T>())
    }
}

impl ArgumentSource for TypedArguments {
    fn init(&mut self, instance: &mut dyn Any) -> Result<(), BoxError> {
        for hook in &mut self.init {
            hook(&mut *instance)?;
        }
        Ok(())
    }

    fn resolve(&mut self, layer: &LayerInfo, index: usize, param: &ParamInfo) -> Result<ArgValue, BoxError> {
        match self.providers.get_mut(&param.type_id()) {
            Some(provider) => provider(layer, index),
            None => Err(Box::new(NoProvider {
                type_name: param.type_name(),
                layer: layer.short_name(),
                index,
            })),
        }
    }
}

impl fmt::Debug for TypedArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedArguments")
            .field("providers", &self.providers.len())
            .field("init_hooks", &self.init.len())
            .finish()
    }
}

/// Resolves nothing; for chains whose methods take no arguments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoArguments;

impl ArgumentSource for NoArguments {
    fn resolve(&mut self, layer: &LayerInfo, index: usize, param: &ParamInfo) -> Result<ArgValue, BoxError> {
        Err(Box::new(NoProvider {
            type_name: param.type_name(),
            layer: layer.short_name(),
            index,
        }))
    }
}
