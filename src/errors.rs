// Copyright 2025 Cowboy AI, LLC.

//! Error types for chain registration and execution

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error carried across the [`ArgumentSource`](crate::ArgumentSource) seam
/// and through [`Link::abort_with`](crate::Link::abort_with)
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur while building or executing a method chain
#[derive(Debug, Error)]
pub enum ChainError {
    /// No layer in the composition graph declares a matching method
    #[error("No method chain found: {layer} has no method for selector {selector:?}")]
    EmptyChain {
        /// Top-level layer the chain was requested for
        layer: String,
        /// Selector that matched nothing
        selector: String,
    },

    /// Selector or matched method name is not an exported-style name
    #[error("Invalid method name {0:?}: chain methods must start with an uppercase letter")]
    InvalidMethodName(String),

    /// Selector or matched method name collides with a chain control method
    #[error("Reserved method name {0:?}: collides with a chain control method")]
    ReservedMethodName(String),

    /// A layer's matched method has a name that is not exported-style
    #[error("{layer}::{method} cannot join a chain: chain methods must start with an uppercase letter")]
    InvalidLayerMethod {
        /// Layer declaring the method
        layer: String,
        /// Method name
        method: String,
    },

    /// A layer's matched method collides with a chain control method
    #[error("{layer}::{method} cannot join a chain: collides with a chain control method")]
    ReservedLayerMethod {
        /// Layer declaring the method
        layer: String,
        /// Method name
        method: String,
    },

    /// Matched method declares a return value
    #[error("{layer}::{method} returns {returns}; chain methods must not return a value")]
    ReturnsValue {
        /// Layer declaring the method
        layer: String,
        /// Method name
        method: String,
        /// Declared return type
        returns: String,
    },

    /// Matched method takes more arguments than configured
    #[error("{layer}::{method} takes {count} arguments, more than the configured maximum of {max}")]
    TooManyParams {
        /// Layer declaring the method
        layer: String,
        /// Method name
        method: String,
        /// Number of non-receiver parameters
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// Composition graph nests deeper than the configured limit
    #[error("Composition of {layer} is deeper than the configured maximum of {max} layers")]
    CompositionTooDeep {
        /// Top-level layer being expanded
        layer: String,
        /// Configured maximum depth
        max: usize,
    },

    /// More bound methods than the execution cursor can address
    #[error("Chain for selector {selector:?} has {len} methods, more than the engine can address")]
    ChainTooLong {
        /// Selector of the oversized chain
        selector: String,
        /// Number of bound methods
        len: usize,
    },

    /// None of the requested selectors matched any layer
    #[error("{layer} has no method matching any of {selectors:?}")]
    NoMatchingSelector {
        /// Top-level layer
        layer: String,
        /// Selectors that were tried
        selectors: Vec<String>,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// The argument source failed to initialize the fresh instance
    #[error("{0}")]
    Init(BoxError),

    /// The argument source failed to resolve an argument
    #[error("Argument {index} of {layer}::{method} ({param}) could not be resolved")]
    Argument {
        /// Layer declaring the method
        layer: String,
        /// Method name
        method: String,
        /// Zero-based position among the non-receiver parameters
        index: usize,
        /// Declared parameter type
        param: &'static str,
        /// Error returned by the argument source
        source: BoxError,
    },

    /// The argument source returned a value of the wrong type
    #[error("Argument {index} of {layer}::{method}: expected {expected}, got a value of another type")]
    ArgumentType {
        /// Layer declaring the method
        layer: String,
        /// Method name
        method: String,
        /// Zero-based position among the non-receiver parameters
        index: usize,
        /// Declared parameter type
        expected: &'static str,
    },

    /// The receiver could not be reached inside the fresh instance
    #[error("Receiver {layer} could not be reached through path {path:?}")]
    ReceiverUnavailable {
        /// Layer the method was declared on
        layer: String,
        /// Field path from the top-level instance
        path: String,
    },

    /// A chain method aborted with an error
    #[error("{0}")]
    Aborted(BoxError),
}

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

impl ChainError {
    /// Wrap an error passed to an explicit abort
    pub fn aborted(err: impl Into<BoxError>) -> Self {
        ChainError::Aborted(err.into())
    }

    /// Check if this is the empty-chain signal rather than a fault
    pub fn is_empty_chain(&self) -> bool {
        matches!(self, ChainError::EmptyChain { .. })
    }

    /// Check if this error was raised while building a chain
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            ChainError::InvalidMethodName(_)
                | ChainError::ReservedMethodName(_)
                | ChainError::InvalidLayerMethod { .. }
                | ChainError::ReservedLayerMethod { .. }
                | ChainError::ReturnsValue { .. }
                | ChainError::TooManyParams { .. }
                | ChainError::CompositionTooDeep { .. }
                | ChainError::ChainTooLong { .. }
                | ChainError::NoMatchingSelector { .. }
                | ChainError::Config(_)
        )
    }

    /// Check if this error ended a single execution
    pub fn is_runtime_error(&self) -> bool {
        matches!(
            self,
            ChainError::Init(_)
                | ChainError::Argument { .. }
                | ChainError::ArgumentType { .. }
                | ChainError::ReceiverUnavailable { .. }
                | ChainError::Aborted(_)
        )
    }

    /// Downcast the error carried from an argument source or an abort
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            ChainError::Init(inner)
            | ChainError::Aborted(inner)
            | ChainError::Argument { source: inner, .. } => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("code={code}, msg={msg}")]
    struct CodeMsg {
        code: u16,
        msg: String,
    }

    /// Test error display messages
    ///
    /// ```mermaid
    /// graph TD
    ///     A[ChainError] -->|Display| B[Error Message]
    ///     A -->|Aborted| C[Inner Message]
    /// ```
    #[test]
    fn test_error_display_messages() {
        let err = ChainError::EmptyChain {
            layer: "Controller".to_string(),
            selector: "GET".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No method chain found: Controller has no method for selector \"GET\""
        );

        let err = ChainError::ReturnsValue {
            layer: "Controller".to_string(),
            method: "GET".to_string(),
            returns: "u32".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Controller::GET returns u32; chain methods must not return a value"
        );

        let err = ChainError::TooManyParams {
            layer: "Auth".to_string(),
            method: "Any".to_string(),
            count: 3,
            max: 1,
        };
        assert_eq!(
            err.to_string(),
            "Auth::Any takes 3 arguments, more than the configured maximum of 1"
        );

        let err = ChainError::ReservedMethodName("Next".to_string());
        assert_eq!(
            err.to_string(),
            "Reserved method name \"Next\": collides with a chain control method"
        );

        // Aborts display as the error the method supplied
        let err = ChainError::aborted("stop");
        assert_eq!(err.to_string(), "stop");
    }

    #[test]
    fn test_is_empty_chain() {
        let empty = ChainError::EmptyChain {
            layer: "T".to_string(),
            selector: "M".to_string(),
        };
        assert!(empty.is_empty_chain());
        assert!(!empty.is_build_error());
        assert!(!empty.is_runtime_error());

        assert!(!ChainError::InvalidMethodName("m".to_string()).is_empty_chain());
    }

    #[test]
    fn test_error_classification() {
        assert!(ChainError::InvalidMethodName("m".to_string()).is_build_error());
        assert!(ChainError::Config("bad".to_string()).is_build_error());
        assert!(ChainError::aborted("stop").is_runtime_error());
        assert!(ChainError::Init("no session".into()).is_runtime_error());
        assert!(!ChainError::aborted("stop").is_build_error());
    }

    #[test]
    fn test_downcast_carried_error() {
        let err = ChainError::aborted(CodeMsg {
            code: 401,
            msg: "unauthorized".to_string(),
        });
        let code = err.downcast_ref::<CodeMsg>().map(|c| c.code);
        assert_eq!(code, Some(401));

        let err = ChainError::Argument {
            layer: "Controller".to_string(),
            method: "POST".to_string(),
            index: 0,
            param: "Body",
            source: Box::new(CodeMsg {
                code: 400,
                msg: "bad body".to_string(),
            }),
        };
        assert_eq!(err.downcast_ref::<CodeMsg>().map(|c| c.code), Some(400));

        assert!(ChainError::Config("x".to_string())
            .downcast_ref::<CodeMsg>()
            .is_none());
    }

    #[test]
    fn test_argument_error_reports_source_once() {
        let err = ChainError::Argument {
            layer: "Controller".to_string(),
            method: "POST".to_string(),
            index: 1,
            param: "Body",
            source: Box::new(CodeMsg {
                code: 400,
                msg: "bad body".to_string(),
            }),
        };

        assert_eq!(
            err.to_string(),
            "Argument 1 of Controller::POST (Body) could not be resolved"
        );
        let source = StdError::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("code=400, msg=bad body"));
    }

    #[test]
    fn test_layer_method_errors_name_the_layer() {
        let err = ChainError::ReservedLayerMethod {
            layer: "Users".to_string(),
            method: "Next".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Users::Next cannot join a chain: collides with a chain control method"
        );
        assert!(err.is_build_error());

        let err = ChainError::InvalidLayerMethod {
            layer: "Users".to_string(),
            method: "lower".to_string(),
        };
        assert!(err.to_string().starts_with("Users::lower"));
        assert!(err.is_build_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: ChainError = parse.unwrap_err().into();
        assert!(matches!(err, ChainError::Config(_)));
    }
}
