//! Per-screen pipeline configuration.

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_APPLY_QUEUE_CAPACITY: usize = 1;

/// Settings for one screen pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// The view renders index 0 at the far end (bottom-up transcripts).
    pub reverse: bool,
    /// Animate the very first transition of the screen.
    pub animate_initial: bool,
    /// Slots between the worker and the view. One suffices because cycles are
    /// serialized; larger values only matter for views polling in batches.
    pub apply_queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reverse: false,
            animate_initial: false,
            apply_queue_capacity: DEFAULT_APPLY_QUEUE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Forward-growing list with default settings.
    pub fn forward() -> Self {
        Self::default()
    }

    /// List that grows from the bottom of the view.
    pub fn reversed() -> Self {
        Self {
            reverse: true,
            ..Self::default()
        }
    }

    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let reverse = parse_optional_bool("ROWSYNC_REVERSE", defaults.reverse, &mut lookup)?;
        let animate_initial = parse_optional_bool(
            "ROWSYNC_ANIMATE_INITIAL",
            defaults.animate_initial,
            &mut lookup,
        )?;
        let apply_queue_capacity = parse_optional_usize(
            "ROWSYNC_APPLY_QUEUE_CAPACITY",
            defaults.apply_queue_capacity,
            &mut lookup,
        )?;

        if apply_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ROWSYNC_APPLY_QUEUE_CAPACITY",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(Self {
            reverse,
            animate_initial,
            apply_queue_capacity,
        })
    }
}

/// Errors produced while parsing configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value could not be parsed.
    #[error("invalid {key}='{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Parse a boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`).
pub fn parse_optional_bool<F>(
    key: &'static str,
    default: bool,
    lookup: &mut F,
) -> Result<bool, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected a boolean".to_owned(),
        }),
    }
}

pub fn parse_optional_usize<F>(
    key: &'static str,
    default: usize,
    lookup: &mut F,
) -> Result<usize, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .trim()
        .parse::<usize>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value: value.clone(),
            reason: err.to_string(),
        })
}

pub fn parse_optional_u64<F>(
    key: &'static str,
    default: u64,
    lookup: &mut F,
) -> Result<u64, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value: value.clone(),
            reason: err.to_string(),
        })
}
