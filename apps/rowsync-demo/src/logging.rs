//! Tracing bootstrap for `rowsync-demo`.
//!
//! The filter is picked from the first usable source: `RUST_LOG`, then
//! `ROWSYNC_DEMO_LOG`, then the workspace-wide `ROWSYNC_LOG`, then a built-in
//! directive that keeps pipeline cycles visible at debug level.

use std::env;

use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info,rowsync_demo=debug,rowsync_core=debug";
const FILTER_KEYS: [&str; 3] = ["RUST_LOG", "ROWSYNC_DEMO_LOG", "ROWSYNC_LOG"];

/// Where the active filter directive came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterSource {
    Env(&'static str),
    Default,
}

pub fn init() {
    let (source, filter) = select_filter(|key| env::var(key).ok());
    let installed = tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_names(true)
        .with_env_filter(filter)
        .try_init()
        .is_ok();
    if installed {
        debug!(?source, "tracing initialized");
    }
}

fn select_filter<F>(mut lookup: F) -> (FilterSource, EnvFilter)
where
    F: FnMut(&str) -> Option<String>,
{
    for key in FILTER_KEYS {
        let Some(directive) = lookup(key).filter(|value| !value.trim().is_empty()) else {
            continue;
        };
        // An unparsable directive falls through to the next source.
        if let Ok(filter) = EnvFilter::try_new(directive) {
            return (FilterSource::Env(key), filter);
        }
    }
    (FilterSource::Default, EnvFilter::new(DEFAULT_DIRECTIVE))
}
