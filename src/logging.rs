//! Tracing bootstrap for the command line.

use std::env;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,clipflow=info,clipflow_browser=info,clipflow_api=info";

/// Initialize the global tracing subscriber, writing to stderr.
///
/// Precedence:
/// 1) `RUST_LOG`
/// 2) `CLIPFLOW_LOG`
/// 3) `verbose` raises the internal default to `debug`
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .with_env_filter(filter_from_env(verbose))
        .try_init();
}

fn filter_from_env(verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    if let Some(value) = env::var("CLIPFLOW_LOG").ok().filter(|v| !v.trim().is_empty())
        && let Ok(filter) = EnvFilter::try_new(value)
    {
        return filter;
    }

    match verbose {
        true => EnvFilter::new("info,clipflow=debug,clipflow_browser=debug,clipflow_api=debug"),
        false => EnvFilter::new(DEFAULT_FILTER),
    }
}
