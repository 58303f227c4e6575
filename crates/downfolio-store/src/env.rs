//! Environment variable lookup.
//!
//! Code that consults the environment takes an [`EnvProvider`] instead of
//! calling `std::env::var` directly, so tests can supply a fixed map.

use std::collections::HashMap;

/// Source of environment variables.
pub trait EnvProvider: Send + Sync {
    /// Return the value of `key`, or `None` if it is unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable (builder-style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvProvider for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}
