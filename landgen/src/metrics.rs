//! Generation counters, exported through the Prometheus recorder when metrics are enabled.
//!
//! Without an installed recorder the `metrics` macros are no-ops, so recording is unconditional.

use metrics::{counter, histogram};
use std::time::Duration;

use crate::config::GenerationMode;
use crate::errors::Error;

/// Coarse outcome label for a finished generation request
pub fn outcome_label(error: Option<&Error>) -> &'static str {
    match error {
        None => "success",
        Some(Error::BadRequest { .. } | Error::RequestBody { .. }) => "rejected",
        Some(Error::Configuration { .. }) => "misconfigured",
        Some(Error::Upstream { .. } | Error::UpstreamTransport(_) | Error::InvalidUpstreamBody { .. }) => "upstream_error",
        Some(Error::Other(_)) => "error",
    }
}

pub fn record_generation(mode: GenerationMode, error: Option<&Error>, elapsed: Duration) {
    let outcome = outcome_label(error);
    counter!("landgen_generations_total", "mode" => mode.as_str(), "outcome" => outcome).increment(1);
    histogram!("landgen_generation_duration_seconds", "mode" => mode.as_str()).record(elapsed.as_secs_f64());
}
