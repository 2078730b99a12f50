//! Environment-backed runtime configuration for `rowsync-demo`.

use std::env;

use rowsync_core::{
    ConfigError, PipelineConfig,
    config::{parse_optional_bool, parse_optional_u64, parse_optional_usize},
};

const DEFAULT_STEPS: usize = 12;
const DEFAULT_TICK_MS: u64 = 150;

/// Runtime configuration used by the demo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Number of transcript mutations the producer performs.
    pub steps: usize,
    /// Delay between producer mutations.
    pub tick_ms: u64,
    /// Switch the transcript appearance halfway through the run.
    pub theme_switch: bool,
    /// Settings forwarded to the screen pipeline.
    pub pipeline: PipelineConfig,
}

impl DemoConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let steps = parse_optional_usize("ROWSYNC_DEMO_STEPS", DEFAULT_STEPS, &mut lookup)?;
        let tick_ms = parse_optional_u64("ROWSYNC_DEMO_TICK_MS", DEFAULT_TICK_MS, &mut lookup)?;
        let theme_switch = parse_optional_bool("ROWSYNC_DEMO_THEME_SWITCH", true, &mut lookup)?;

        // Transcripts grow from the bottom unless told otherwise.
        let reverse = parse_optional_bool("ROWSYNC_REVERSE", true, &mut lookup)?;
        let pipeline = PipelineConfig::from_lookup(|key| match key {
            "ROWSYNC_REVERSE" => Some(reverse.to_string()),
            _ => lookup(key),
        })?;

        if steps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ROWSYNC_DEMO_STEPS",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(Self {
            steps,
            tick_ms,
            theme_switch,
            pipeline,
        })
    }
}
