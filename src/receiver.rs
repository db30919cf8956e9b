// Copyright 2025 Cowboy AI, LLC.

//! Receiver descriptors: where a bound method finds its layer inside a fresh instance

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::layer::LayerInfo;

/// How a chain method receives its layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverMode {
    /// The method works on a copy of the layer taken when it is invoked
    Value,
    /// The method works on the layer in place
    Pointer,
}

impl ReceiverMode {
    /// Number of indirections applied to the projected layer
    pub fn indirection(&self) -> u8 {
        match self {
            ReceiverMode::Value => 0,
            ReceiverMode::Pointer => 1,
        }
    }
}

pub(crate) trait Project: Send + Sync {
    fn project<'i>(&self, parent: &'i mut dyn Any) -> Option<&'i mut dyn Any>;
}

struct FieldProjection<P, C> {
    access: fn(&mut P) -> &mut C,
}

impl<P: 'static, C: 'static> Project for FieldProjection<P, C> {
    fn project<'i>(&self, parent: &'i mut dyn Any) -> Option<&'i mut dyn Any> {
        let parent = parent.downcast_mut::<P>()?;
        Some((self.access)(parent))
    }
}

/// One field access on the way from the top-level instance to a layer
#[derive(Clone)]
pub struct FieldStep {
    field: &'static str,
    projection: Arc<dyn Project>,
}

impl FieldStep {
    pub(crate) fn new<P: 'static, C: 'static>(field: &'static str, access: fn(&mut P) -> &mut C) -> Self {
        Self {
            field,
            projection: Arc::new(FieldProjection { access }),
        }
    }

    /// Field name this step reads
    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl fmt::Debug for FieldStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field)
    }
}

/// Where a bound method's layer lives inside the top-level instance
///
/// Resolved once at build time and reused by every execution of the chain.
#[derive(Debug, Clone)]
pub struct ReceiverDescriptor {
    layer: LayerInfo,
    depth: usize,
    path: Vec<FieldStep>,
    mode: ReceiverMode,
}

impl ReceiverDescriptor {
    pub(crate) fn new(layer: LayerInfo, depth: usize, path: Vec<FieldStep>, mode: ReceiverMode) -> Self {
        Self {
            layer,
            depth,
            path,
            mode,
        }
    }

    /// Layer the method was declared on
    pub fn layer(&self) -> &LayerInfo {
        &self.layer
    }

    /// Nesting depth of the layer, 0 for the top-level type
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Field accesses from the top-level instance to the layer
    pub fn path(&self) -> &[FieldStep] {
        &self.path
    }

    /// How the method receives the layer
    pub fn mode(&self) -> ReceiverMode {
        self.mode
    }

    /// Dotted field path, `self` for the top-level layer
    pub fn field_path(&self) -> String {
        if self.path.is_empty() {
            return "self".to_string();
        }
        self.path
            .iter()
            .map(FieldStep::field)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Follow the field path from `root` to the layer
    pub(crate) fn project<'i, L: 'static>(&self, root: &'i mut dyn Any) -> Option<&'i mut L> {
        let mut current = root;
        for step in &self.path {
            current = step.projection.project(current)?;
        }
        current.downcast_mut::<L>()
    }
}
