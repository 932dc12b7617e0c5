use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::isa::Dialect;
use crate::memory::CapacityPolicy;

/// Per-run machine settings.
///
/// ```json
/// { "capacity": { "policy": "fixed", "cells": 4096 }, "dialect": "extended", "step_limit": 100000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    pub capacity: CapacityPolicy,
    pub dialect: Dialect,
    /// Upper bound on instructions executed by `Machine::run`.
    pub step_limit: Option<u64>,
}

impl MachineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capacity.validate()?;
        if self.step_limit == Some(0) {
            return Err(ConfigError::Invalid("step limit must be at least 1".into()));
        }
        Ok(())
    }
}
