// Copyright 2025 Cowboy AI, LLC.

//! Composition graph expanded from layer declarations

use crate::errors::{ChainError, ChainResult};
use crate::layer::{declare, Layer, LayerDecl, LayerInfo, MethodEntry};
use crate::receiver::FieldStep;

/// One layer of a composition graph
#[derive(Debug)]
pub struct LayerNode {
    info: LayerInfo,
    step: Option<FieldStep>,
    depth: usize,
    methods: Vec<MethodEntry>,
    children: Vec<LayerNode>,
}

impl LayerNode {
    /// Layer type of this node
    pub fn info(&self) -> &LayerInfo {
        &self.info
    }

    /// Field the layer is embedded under, `None` for the top-level type
    pub fn field(&self) -> Option<&'static str> {
        self.step.as_ref().map(FieldStep::field)
    }

    /// Nesting depth, 0 for the top-level type
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Methods declared on this layer itself
    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    /// Embedded layers in declaration order
    pub fn children(&self) -> &[LayerNode] {
        &self.children
    }

    pub(crate) fn step(&self) -> Option<&FieldStep> {
        self.step.as_ref()
    }
}

/// Tree of layers reachable from a top-level type
#[derive(Debug)]
pub struct CompositionGraph {
    root: LayerNode,
}

impl CompositionGraph {
    /// Expand the composition of `R`, failing past `max_depth` nested layers
    pub fn of<R: Layer>(max_depth: usize) -> ChainResult<Self> {
        let top = LayerInfo::of::<R>();
        let root = expand(declare::<R>(), None, 0, max_depth, &top)?;
        Ok(Self { root })
    }

    /// Node of the top-level type
    pub fn root(&self) -> &LayerNode {
        &self.root
    }

    /// All layers, parents before their children
    pub fn layers(&self) -> Vec<&LayerNode> {
        let mut layers = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            layers.push(node);
            stack.extend(node.children.iter().rev());
        }
        layers
    }

    /// Number of layers in the graph
    pub fn len(&self) -> usize {
        self.layers().len()
    }

    /// Always false: the top-level type is part of its own graph
    pub fn is_empty(&self) -> bool {
        false
    }
}

fn expand(
    decl: LayerDecl,
    step: Option<FieldStep>,
    depth: usize,
    max_depth: usize,
    top: &LayerInfo,
) -> ChainResult<LayerNode> {
    if depth > max_depth {
        return Err(ChainError::CompositionTooDeep {
            layer: top.short_name().to_string(),
            max: max_depth,
        });
    }

    let mut children = Vec::with_capacity(decl.embedded.len());
    for field in decl.embedded {
        let child = (field.declare)();
        children.push(expand(child, Some(field.step), depth + 1, max_depth, top)?);
    }

    Ok(LayerNode {
        info: decl.info,
        step,
        depth,
        methods: decl.methods,
        children,
    })
}
