//! Environment variable lookup.
//!
//! Configuration resolution reads fallbacks through [`EnvLookup`] so it can be
//! exercised without touching the real process environment.

use std::collections::HashMap;

/// Source of environment variable values.
pub trait EnvLookup: Send + Sync {
    /// The value of `key`, or `None` if it is unset or not valid unicode.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}
