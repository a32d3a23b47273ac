/*!
 * Syscall Tracing
 *
 * Subscriber setup and a per-dispatch span. Every system call gets a fresh
 * trace id so the log lines of one call can be grouped even when many
 * process threads interleave.
 */

use crate::core::limits::SLOW_SYSCALL_THRESHOLD;
use crate::core::types::Pid;
use std::time::Instant;
use tracing::{debug, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Install the global subscriber
///
/// `RUST_LOG` selects the filter (default `info`). With `json` set, events
/// are written as one JSON object per line. Returns false if a subscriber
/// was already installed.
pub fn init_tracing(json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        debug!(json, "Tracing initialized");
    }
    installed
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one system call from decode to register write-back
pub struct SyscallSpan {
    span: Span,
    start: Instant,
    syscall: &'static str,
    pid: Pid,
    trace_id: String,
}

impl SyscallSpan {
    pub fn new(syscall: &'static str, pid: Pid) -> Self {
        let trace_id = generate_trace_id();
        let span = span!(
            Level::DEBUG,
            "syscall",
            trace_id = %trace_id,
            syscall,
            pid,
            result = tracing::field::Empty,
            errno = tracing::field::Empty,
            return_value = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            syscall,
            pid,
            trace_id,
        }
    }

    #[inline]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Enter the span for the duration of the returned guard
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn record_return(&self, value: i64) {
        self.span.record("result", "success");
        self.span.record("return_value", value);
    }

    pub fn record_errno(&self, errno: i64) {
        self.span.record("result", "error");
        self.span.record("errno", errno);
    }
}

impl Drop for SyscallSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let _entered = self.span.enter();

        // Collect legitimately blocks, so a slow waitpid is expected
        if elapsed > SLOW_SYSCALL_THRESHOLD && self.syscall != "waitpid" {
            warn!(
                trace_id = %self.trace_id,
                syscall = self.syscall,
                pid = self.pid,
                duration_ms = elapsed.as_millis() as u64,
                "Slow syscall"
            );
        } else {
            debug!(
                syscall = self.syscall,
                pid = self.pid,
                duration_us = elapsed.as_micros() as u64,
                "Syscall completed"
            );
        }
    }
}
