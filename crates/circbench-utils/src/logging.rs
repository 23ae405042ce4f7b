//! Logging infrastructure for circbench
//!
//! Structured logging through `tracing`. Every solver execution runs inside an
//! `execution` span carrying the ledger key, so interleaved supervisor,
//! parser and ledger events can be attributed to one request.

use std::io::IsTerminal;
use std::time::Duration;
use tracing::{Level, info, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::types::{ExecutionRequest, OutcomeKind};

/// Check if colored output should be used.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise circbench crates log at `info`
/// (`debug` when `verbose`) and everything else at `warn`. Logs go to
/// stderr so stdout stays clean for `status` output.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("circbench=debug,warn")
            } else {
                EnvFilter::try_new("circbench=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span wrapping one solver execution.
pub fn execution_span(request: &ExecutionRequest) -> tracing::Span {
    span!(
        Level::INFO,
        "execution",
        instance_id = %request.instance_id,
        variant = %request.variant,
        repetition = request.repetition,
    )
}

/// Progress line emitted after a request has been recorded.
pub fn log_request_recorded(
    position: usize,
    total: Option<usize>,
    outcome: OutcomeKind,
    elapsed: Duration,
    num_circles: Option<u32>,
) {
    let progress = match total {
        Some(total) => format!("{position}/{total}"),
        None => position.to_string(),
    };
    if outcome.is_solved() {
        info!(
            progress = %progress,
            outcome = %outcome,
            elapsed_secs = format_args!("{:.2}", elapsed.as_secs_f64()),
            num_circles = num_circles.unwrap_or_default(),
            "request recorded"
        );
    } else {
        warn!(
            progress = %progress,
            outcome = %outcome,
            elapsed_secs = format_args!("{:.2}", elapsed.as_secs_f64()),
            "request recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_span_builds_without_subscriber() {
        let request = ExecutionRequest::new("n8_k1", "Teste1", 1);
        let span = execution_span(&request);
        let _guard = span.enter();
        log_request_recorded(1, Some(4), OutcomeKind::Success, Duration::from_millis(120), Some(3));
        log_request_recorded(2, None, OutcomeKind::Timeout, Duration::from_secs(5), None);
    }
}
