// Copyright 2025 Cowboy AI, LLC.

//! Layers and the schema they declare their methods and embedded layers on
//!
//! A layer is one node of a composed type. Instead of discovering methods by
//! reflection, every layer lists what it contributes in [`Layer::compose`]:
//!
//! - methods, each under a selector name, either working in place
//!   ([`LayerSchema::method`]) or on a fresh copy of the layer
//!   ([`LayerSchema::value_method`])
//! - embedded layers, each reached through a field accessor
//!   ([`LayerSchema::embed`])
//!
//! Only methods declared on a layer itself are visible at that layer, so a
//! method of an embedded layer is never counted twice.

use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::method::{ErasedMethod, Method, ParamInfo, PointerMethod, ValueMethod};
use crate::receiver::{FieldStep, ReceiverMode};

/// A type that takes part in a composition graph
///
/// # Example
///
/// ```
/// use cim_chain::{Layer, LayerSchema, Link};
///
/// #[derive(Default)]
/// struct Logging {
///     entries: Vec<String>,
/// }
///
/// impl Logging {
///     fn any(link: &mut Link<'_, Self>) {
///         link.recv().entries.push("before".to_string());
///         link.next();
///         link.recv().entries.push("after".to_string());
///     }
/// }
///
/// impl Layer for Logging {
///     fn compose(schema: &mut LayerSchema<Self>) {
///         schema.method("Any", Self::any);
///     }
/// }
/// ```
pub trait Layer: Sized + 'static {
    /// Declare the methods this layer contributes and the layers it embeds
    fn compose(schema: &mut LayerSchema<Self>) {
        let _ = schema;
    }
}

/// Identity of a layer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerInfo {
    type_id: TypeId,
    type_name: &'static str,
}

impl LayerInfo {
    /// Describe the layer type `L`
    pub fn of<L: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<L>(),
            type_name: type_name::<L>(),
        }
    }

    /// Type id of the layer
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name of the layer
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path or generic arguments
    pub fn short_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Check whether this describes the layer type `L`
    pub fn is<L: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<L>()
    }
}

impl fmt::Display for LayerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A method a layer declared under a name
#[derive(Clone)]
pub struct MethodEntry {
    name: String,
    mode: ReceiverMode,
    params: Vec<ParamInfo>,
    returns: Option<&'static str>,
    pub(crate) method: Arc<dyn ErasedMethod>,
}

impl MethodEntry {
    /// Name the method was declared under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the method receives its layer
    pub fn mode(&self) -> ReceiverMode {
        self.mode
    }

    /// Non-receiver parameter types, in order
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Declared return type, `None` for `()`
    pub fn returns(&self) -> Option<&'static str> {
        self.returns
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

/// Declarations collected from one [`Layer::compose`] call
pub struct LayerSchema<L> {
    methods: Vec<MethodEntry>,
    embedded: Vec<EmbeddedField>,
    _layer: PhantomData<fn(L)>,
}

impl<L: Layer> LayerSchema<L> {
    fn new() -> Self {
        Self {
            methods: Vec::new(),
            embedded: Vec::new(),
            _layer: PhantomData,
        }
    }

    /// Declare a method that works on the layer in place
    ///
    /// If the same name is declared twice, the first declaration wins.
    pub fn method<Args, M>(&mut self, name: &str, method: M) -> &mut Self
    where
        Args: 'static,
        M: Method<L, Args>,
    {
        self.methods.push(MethodEntry {
            name: name.to_string(),
            mode: ReceiverMode::Pointer,
            params: method.params(),
            returns: method.returns(),
            method: Arc::new(PointerMethod::new(method)),
        });
        self
    }

    /// Declare a method that works on a copy of the layer taken at call time
    pub fn value_method<Args, M>(&mut self, name: &str, method: M) -> &mut Self
    where
        L: Clone,
        Args: 'static,
        M: Method<L, Args>,
    {
        self.methods.push(MethodEntry {
            name: name.to_string(),
            mode: ReceiverMode::Value,
            params: method.params(),
            returns: method.returns(),
            method: Arc::new(ValueMethod::new(method)),
        });
        self
    }

    /// Declare an embedded layer reached through `access`
    ///
    /// Embedded layers wrap the layer that embeds them: their methods run first.
    pub fn embed<C: Layer>(&mut self, field: &'static str, access: fn(&mut L) -> &mut C) -> &mut Self {
        self.embedded.push(EmbeddedField {
            step: FieldStep::new(field, access),
            declare: declare::<C>,
        });
        self
    }
}

pub(crate) struct EmbeddedField {
    pub(crate) step: FieldStep,
    pub(crate) declare: fn() -> LayerDecl,
}

pub(crate) struct LayerDecl {
    pub(crate) info: LayerInfo,
    pub(crate) methods: Vec<MethodEntry>,
    pub(crate) embedded: Vec<EmbeddedField>,
}

pub(crate) fn declare<L: Layer>() -> LayerDecl {
    let mut schema = LayerSchema::<L>::new();
    L::compose(&mut schema);
    LayerDecl {
        info: LayerInfo::of::<L>(),
        methods: schema.methods,
        embedded: schema.embedded,
    }
}
