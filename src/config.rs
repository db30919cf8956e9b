// Copyright 2025 Cowboy AI, LLC.

//! Builder configuration

use serde::{Deserialize, Serialize};

use crate::errors::ChainResult;

/// Where the catch-all method name is consulted when a layer lacks the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackScope {
    /// Only the top-level layer may fall back to the catch-all method
    TopLevel,
    /// The top-level layer must declare the selector; embedded layers may fall back
    NestedLayers,
}

/// Configuration applied while building chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Maximum number of non-receiver parameters a chain method may take
    pub max_params: usize,
    /// Catch-all method name, `None` disables the fallback
    pub fallback_method: Option<String>,
    /// Layers at which the catch-all method is consulted
    pub fallback_scope: FallbackScope,
    /// Maximum nesting depth of the composition graph
    pub max_depth: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_params: 8,
            fallback_method: Some("Any".to_string()),
            fallback_scope: FallbackScope::TopLevel,
            max_depth: 32,
        }
    }
}

impl ChainConfig {
    /// Load a configuration from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> ChainResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the maximum number of method parameters
    pub fn with_max_params(mut self, max_params: usize) -> Self {
        self.max_params = max_params;
        self
    }

    /// Set or disable the catch-all method name
    pub fn with_fallback(mut self, name: Option<&str>, scope: FallbackScope) -> Self {
        self.fallback_method = name.map(str::to_string);
        self.fallback_scope = scope;
        self
    }

    /// Set the maximum composition depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChainError;

    #[test]
    fn test_default_config() {
        let config = ChainConfig::default();
        assert_eq!(config.max_params, 8);
        assert_eq!(config.fallback_method.as_deref(), Some("Any"));
        assert_eq!(config.fallback_scope, FallbackScope::TopLevel);
        assert_eq!(config.max_depth, 32);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ChainConfig::from_json(r#"{"max_params": 1, "fallback_scope": "nested_layers"}"#)
            .expect("valid config");
        assert_eq!(config.max_params, 1);
        assert_eq!(config.fallback_scope, FallbackScope::NestedLayers);
        assert_eq!(config.fallback_method.as_deref(), Some("Any"));
        assert_eq!(config.max_depth, 32);
    }

    #[test]
    fn test_disable_fallback_from_json() {
        let config = ChainConfig::from_json(r#"{"fallback_method": null}"#).expect("valid config");
        assert!(config.fallback_method.is_none());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ChainConfig::from_json("{\"max_params\": \"many\"}").unwrap_err();
        assert!(matches!(err, ChainError::Config(_)));
        assert!(err.is_build_error());
    }

    #[test]
    fn test_builder_style_setters() {
        let config = ChainConfig::default()
            .with_max_params(2)
            .with_fallback(None, FallbackScope::NestedLayers)
            .with_max_depth(4);
        assert_eq!(config.max_params, 2);
        assert!(config.fallback_method.is_none());
        assert_eq!(config.fallback_scope, FallbackScope::NestedLayers);
        assert_eq!(config.max_depth, 4);
    }
}
