//! Configuration parameter store for the personalization module.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::ConfigError;

/// Parameter controlling whether the targeting session bags are attached.
pub const TARGETING_SESSION_ENABLED: &str = "pimcore_personalization.targeting.session.enabled";

/// Flat map of dotted parameter keys to JSON values.
#[derive(Debug, Default, Clone)]
pub struct Parameters {
    values: HashMap<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse parameters from a JSON object keyed by dotted parameter names.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let values = serde_json::from_str(json)?;
        Ok(Self { values })
    }

    /// Load parameters from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed boolean read. `None` when the key is absent or not a bool.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }
}

/// Shared handle so parameter changes are visible to live readers.
pub type SharedParameters = Arc<RwLock<Parameters>>;

pub fn shared(params: Parameters) -> SharedParameters {
    Arc::new(RwLock::new(params))
}
