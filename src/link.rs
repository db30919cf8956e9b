// Copyright 2025 Cowboy AI, LLC.

//! The handle a chain method receives: its layer plus the chain controls

use uuid::Uuid;

use crate::chain::{ChainPhase, Control};
use crate::errors::{BoxError, ChainError};
use crate::layer::LayerInfo;
use crate::receiver::{ReceiverDescriptor, ReceiverMode};

/// A running chain as seen from one of its methods
///
/// A method reaches its layer through [`recv`](Self::recv) and controls the
/// rest of the chain through [`next`](Self::next) and
/// [`abort`](Self::abort). Returning without calling `next` ends the chain
/// for this execution without an error.
pub struct Link<'a, L> {
    control: &'a mut dyn Control,
    receiver: &'a ReceiverDescriptor,
    copy: Option<L>,
}

impl<'a, L: 'static> Link<'a, L> {
    pub(crate) fn new(control: &'a mut dyn Control, receiver: &'a ReceiverDescriptor, copy: Option<L>) -> Self {
        Self {
            control,
            receiver,
            copy,
        }
    }

    /// The layer this method was declared on
    ///
    /// For value methods this is a copy taken when the method was invoked;
    /// changes to it are not seen by later methods.
    pub fn recv(&mut self) -> &mut L {
        if let Some(copy) = self.copy.as_mut() {
            return copy;
        }
        match self.receiver.project::<L>(self.control.instance()) {
            Some(layer) => layer,
            None => unreachable!(
                "receiver {} was checked before the method was invoked",
                self.receiver.layer()
            ),
        }
    }

    /// Run the rest of the chain before returning
    ///
    /// Code after `next` runs once the inner methods have returned, even if
    /// one of them aborted.
    pub fn next(&mut self) {
        self.control.next();
    }

    /// Stop the chain without reporting an error
    pub fn abort(&mut self) {
        self.control.abort(None);
    }

    /// Stop the chain and report `err` to the caller
    ///
    /// If an error was already recorded for this execution, it is kept.
    pub fn abort_with(&mut self, err: impl Into<BoxError>) {
        self.control.abort(Some(ChainError::aborted(err)));
    }

    /// Check whether the chain has been aborted
    pub fn is_aborted(&self) -> bool {
        self.control.is_aborted()
    }

    /// Error recorded so far, if any
    pub fn err(&self) -> Option<&ChainError> {
        self.control.err()
    }

    /// Current execution phase
    pub fn phase(&self) -> ChainPhase {
        self.control.phase()
    }

    /// Layer this method was declared on
    pub fn layer(&self) -> &LayerInfo {
        self.receiver.layer()
    }

    /// Where the layer lives inside the top-level instance
    pub fn receiver(&self) -> &ReceiverDescriptor {
        self.receiver
    }

    /// How this method receives its layer
    pub fn mode(&self) -> ReceiverMode {
        self.receiver.mode()
    }

    /// Identifier of the current execution
    pub fn execution_id(&self) -> Uuid {
        self.control.execution_id()
    }

    /// The top-level instance of this execution, if it has type `T`
    pub fn instance<T: 'static>(&mut self) -> Option<&mut T> {
        self.control.instance().downcast_mut::<T>()
    }
}
