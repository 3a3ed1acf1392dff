//! Built-in interceptors

use crate::command::Command;
use crate::context::InvocationContext;
use crate::pipeline::{Interceptor, Next};
use async_trait::async_trait;
use relay_errors::{RelayError, Result};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Logs entry to and exit from the rest of the chain at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept(
        &self,
        command: &mut Command,
        context: &dyn InvocationContext,
        next: Next<'_>,
    ) -> Result<()> {
        let stage = next.stage_name().to_string();
        tracing::debug!(
            command_type = command.command_type(),
            request_id = %command.token(),
            next_stage = %stage,
            "entering"
        );
        let result = next.run(command, context).await;
        tracing::debug!(
            command_type = command.command_type(),
            request_id = %command.token(),
            next_stage = %stage,
            ok = result.is_ok(),
            "leaving"
        );
        result
    }
}

/// Measures how long the downstream stages take
///
/// Only the most recent measurement is kept. A short-circuit upstream
/// leaves the previous value untouched.
#[derive(Debug, Default)]
pub struct TimingInterceptor {
    last: Mutex<Option<Duration>>,
}

impl TimingInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration of the most recent downstream run, if any
    pub fn last_duration(&self) -> Option<Duration> {
        self.last.lock().ok().and_then(|d| *d)
    }
}

#[async_trait]
impl Interceptor for TimingInterceptor {
    async fn intercept(
        &self,
        command: &mut Command,
        context: &dyn InvocationContext,
        next: Next<'_>,
    ) -> Result<()> {
        let started = Instant::now();
        let result = next.run(command, context).await;
        let elapsed = started.elapsed();
        if let Ok(mut last) = self.last.lock() {
            *last = Some(elapsed);
        }
        tracing::debug!(
            request_id = %command.token(),
            elapsed_us = elapsed.as_micros() as u64,
            "downstream timed"
        );
        result
    }
}

/// Stops a command the caller has already cancelled
#[derive(Debug, Default, Clone, Copy)]
pub struct CancellationInterceptor;

#[async_trait]
impl Interceptor for CancellationInterceptor {
    async fn intercept(
        &self,
        command: &mut Command,
        context: &dyn InvocationContext,
        next: Next<'_>,
    ) -> Result<()> {
        if context.is_cancelled() {
            return Err(RelayError::Cancelled {
                command_id: command.token().to_string(),
            });
        }
        next.run(command, context).await
    }
}

/// Refuses every command without running the rest of the chain
///
/// Useful for draining a node: commands still get a complete routing slip.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortCircuitInterceptor;

#[async_trait]
impl Interceptor for ShortCircuitInterceptor {
    async fn intercept(
        &self,
        command: &mut Command,
        _context: &dyn InvocationContext,
        next: Next<'_>,
    ) -> Result<()> {
        tracing::debug!(
            request_id = %command.token(),
            skipped = next.stage_name(),
            "short-circuited"
        );
        Ok(())
    }
}
