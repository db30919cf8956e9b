// Copyright 2025 Cowboy AI, LLC.

//! Chain execution
//!
//! A [`ChainFn`] is the callable produced by the builder. Every call creates a
//! fresh top-level instance and an execution state holding the cursor, the
//! recorded error and the argument source. Methods drive the cursor through
//! their [`Link`](crate::Link):
//!
//! ```mermaid
//! stateDiagram-v2
//!     [*] --> Pending
//!     Pending --> Running: first next
//!     Running --> Running: next
//!     Running --> Aborted: abort
//!     Running --> Completed: cursor past last method
//!     Aborted --> [*]
//!     Completed --> [*]
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};
use uuid::Uuid;

use crate::arguments::ArgumentSource;
use crate::builder::{BoundMethod, ChainDescriptor};
use crate::errors::{ChainError, ChainResult};

/// Cursor value that marks an aborted execution
///
/// Chains are limited to fewer methods than this, so a cursor at or past it
/// never addresses a method.
pub const ABORT_INDEX: i32 = i32::MAX / 2;

/// Progress of one chain execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainPhase {
    /// No method has started yet
    Pending,
    /// A method is running
    Running,
    /// A method aborted the chain
    Aborted,
    /// The cursor moved past the last method
    Completed,
}

/// Chain controls available to the methods of one execution
pub(crate) trait Control {
    fn next(&mut self);
    fn abort(&mut self, err: Option<ChainError>);
    fn is_aborted(&self) -> bool;
    fn err(&self) -> Option<&ChainError>;
    fn phase(&self) -> ChainPhase;
    fn instance(&mut self) -> &mut dyn Any;
    fn execution_id(&self) -> Uuid;
}

/// State of a single execution, never shared between calls
struct ChainState<'d, 'a> {
    id: Uuid,
    descriptor: &'d ChainDescriptor,
    args: &'a mut dyn ArgumentSource,
    instance: Box<dyn Any>,
    cursor: i32,
    error: Option<ChainError>,
}

impl<'d, 'a> ChainState<'d, 'a> {
    fn new(
        id: Uuid,
        descriptor: &'d ChainDescriptor,
        args: &'a mut dyn ArgumentSource,
        instance: Box<dyn Any>,
    ) -> Self {
        Self {
            id,
            descriptor,
            args,
            instance,
            cursor: -1,
            error: None,
        }
    }

    fn execute(mut self) -> ChainResult<()> {
        self.cursor = -1;
        self.next();
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn invoke(&mut self, method: &BoundMethod) {
        let layer = method.layer();
        let mut values = Vec::with_capacity(method.params().len());
        for (index, param) in method.params().iter().enumerate() {
            match self.args.resolve(layer, index, param) {
                Ok(value) => values.push(value),
                Err(source) => {
                    debug!(
                        execution_id = %self.id,
                        layer = layer.short_name(),
                        method = method.name(),
                        index,
                        error = %source,
                        "Argument resolution failed"
                    );
                    self.abort(Some(ChainError::Argument {
                        layer: layer.short_name().to_string(),
                        method: method.name().to_string(),
                        index,
                        param: param.type_name(),
                        source,
                    }));
                    return;
                }
            }
        }

        trace!(
            execution_id = %self.id,
            step = self.cursor,
            layer = layer.short_name(),
            method = method.name(),
            "Entering chain method"
        );
        if let Err(err) = method.invoke(self, values) {
            debug!(execution_id = %self.id, error = %err, "Chain method could not be invoked");
            self.abort(Some(err));
        }
    }
}

impl Control for ChainState<'_, '_> {
    fn next(&mut self) {
        self.cursor += 1;
        let descriptor = self.descriptor;
        let len = descriptor.len() as i32;
        if self.cursor >= len {
            return;
        }

        let step = self.cursor;
        self.invoke(&descriptor.methods()[step as usize]);
        if self.cursor == step {
            // Returned without calling next: the rest of the chain is skipped
            trace!(execution_id = %self.id, step, "Chain stopped without next");
            self.cursor = len;
        }
    }

    fn abort(&mut self, err: Option<ChainError>) {
        if self.error.is_none() {
            self.error = err;
        }
        if self.cursor < ABORT_INDEX {
            debug!(
                execution_id = %self.id,
                step = self.cursor,
                selector = self.descriptor.selector(),
                "Chain aborted"
            );
        }
        self.cursor = ABORT_INDEX;
    }

    fn is_aborted(&self) -> bool {
        self.cursor >= ABORT_INDEX
    }

    fn err(&self) -> Option<&ChainError> {
        self.error.as_ref()
    }

    fn phase(&self) -> ChainPhase {
        if self.cursor >= ABORT_INDEX {
            ChainPhase::Aborted
        } else if self.cursor < 0 {
            ChainPhase::Pending
        } else if self.cursor as usize >= self.descriptor.len() {
            ChainPhase::Completed
        } else {
            ChainPhase::Running
        }
    }

    fn instance(&mut self) -> &mut dyn Any {
        &mut *self.instance
    }

    fn execution_id(&self) -> Uuid {
        self.id
    }
}

/// A built chain for one top-level type and selector
///
/// Cheap to clone and safe to call from many threads at once: each call gets
/// its own instance and execution state.
pub struct ChainFn<R> {
    descriptor: Arc<ChainDescriptor>,
    factory: Arc<dyn Fn() -> R + Send + Sync>,
}

impl<R: 'static> ChainFn<R> {
    pub(crate) fn new(descriptor: ChainDescriptor, factory: Arc<dyn Fn() -> R + Send + Sync>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            factory,
        }
    }

    /// Run the chain once against a fresh instance
    ///
    /// Returns the first error recorded during the execution: an init failure,
    /// an argument failure or the error passed to an abort.
    pub fn call(&self, args: &mut dyn ArgumentSource) -> ChainResult<()> {
        let execution_id = Uuid::new_v4();
        let mut instance: Box<dyn Any> = Box::new((self.factory)());
        if let Err(source) = args.init(&mut *instance) {
            debug!(
                %execution_id,
                selector = self.selector(),
                error = %source,
                "Argument source init failed"
            );
            return Err(ChainError::Init(source));
        }
        trace!(%execution_id, selector = self.selector(), methods = self.descriptor.len(), "Executing chain");
        ChainState::new(execution_id, &self.descriptor, args, instance).execute()
    }

    /// Bound methods and their receivers
    pub fn descriptor(&self) -> &ChainDescriptor {
        &self.descriptor
    }

    /// Selector the chain was built for
    pub fn selector(&self) -> &str {
        self.descriptor.selector()
    }

    /// Number of bound methods
    pub fn len(&self) -> usize {
        self.descriptor.len()
    }

    /// Always false: empty chains are never built
    pub fn is_empty(&self) -> bool {
        self.descriptor.is_empty()
    }
}

impl<R> Clone for ChainFn<R> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<R> fmt::Debug for ChainFn<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainFn")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
