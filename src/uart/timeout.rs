// src/uart/timeout.rs

//! Bounded waiting on top of the non-blocking driver
//!
//! Nothing in the core blocks on receive, and `write()` only blocks with
//! [`UartOptions::TXWAIT`](super::UartOptions::TXWAIT). Callers that want to
//! wait for the line use a poll budget instead:
//! - [`poll_with_timeout`] / [`poll_with_timeout_value`] for any condition
//! - [`Uart::read_with_timeout`], [`Uart::write_with_timeout`] and
//!   [`Uart::drain_with_timeout`] for the common transfers
//!
//! Each driver-level poll feeds the watchdog and services pending
//! interrupts, so progress does not depend on the real handler preempting
//! the caller.

use core::fmt;

use super::backend::UartHardware;
use super::config::UartId;
use super::error::ErrorContext;
use super::registry::Uart;

/// Poll budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Polls before giving up
    pub max_iterations: u32,
    pub backoff: BackoffStrategy,
}

impl TimeoutConfig {
    /// Balanced budget for typical baud rates
    pub const fn default_timeout() -> Self {
        Self::new(1000, BackoffStrategy::Linear)
    }

    /// A few bytes at high baud rates
    pub const fn short_timeout() -> Self {
        Self::new(100, BackoffStrategy::None)
    }

    /// Slow links or long transfers
    pub const fn long_timeout() -> Self {
        Self::new(10_000, BackoffStrategy::Exponential { base: 2, max: 100 })
    }

    pub const fn new(max_iterations: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_iterations,
            backoff,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::default_timeout()
    }
}

/// Spin delay inserted between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Poll back to back
    None,
    /// `n` spins before poll `n`
    Linear,
    /// `base^n` spins before poll `n`, capped at `max`
    Exponential { base: u32, max: u32 },
}

impl BackoffStrategy {
    fn spins(self, iteration: u32) -> u32 {
        match self {
            BackoffStrategy::None => 0,
            BackoffStrategy::Linear => iteration,
            BackoffStrategy::Exponential { base, max } => base.saturating_pow(iteration).min(max),
        }
    }
}

/// Running poll budget
#[derive(Debug)]
pub struct TimeoutContext {
    config: TimeoutConfig,
    iteration: u32,
    total_waits: u64,
}

impl TimeoutContext {
    pub fn new(config: TimeoutConfig) -> Self {
        Self {
            config,
            iteration: 0,
            total_waits: 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.iteration >= self.config.max_iterations
    }

    /// Spend one poll, spinning for the backoff first.
    ///
    /// Returns `false` once the budget is used up.
    pub fn tick(&mut self) -> bool {
        if self.is_expired() {
            return false;
        }
        self.iteration += 1;

        let spins = self.config.backoff.spins(self.iteration);
        self.total_waits += u64::from(spins);
        for _ in 0..spins {
            core::hint::spin_loop();
        }
        true
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Spin cycles spent in backoff so far
    pub fn total_waits(&self) -> u64 {
        self.total_waits
    }

    pub fn remaining(&self) -> u32 {
        self.config.max_iterations.saturating_sub(self.iteration)
    }

    /// Error describing this budget running out after `transferred` bytes
    pub fn expired(&self, transferred: usize) -> TimeoutError {
        TimeoutError {
            iterations: self.iteration,
            total_waits: self.total_waits,
            transferred,
        }
    }
}

/// Poll budget ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutError {
    pub iterations: u32,
    pub total_waits: u64,
    /// Bytes moved before giving up (always 0 for plain conditions)
    pub transferred: usize,
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timeout after {} polls ({} wait cycles, {} bytes transferred)",
            self.iterations, self.total_waits, self.transferred
        )
    }
}

impl ErrorContext for TimeoutError {
    fn context(&self) -> &'static str {
        if self.transferred == 0 {
            "UART line made no progress within the poll budget"
        } else {
            "UART transfer stalled part way through"
        }
    }
}

/// Poll `condition` until it holds or the budget runs out
///
/// # Errors
///
/// `TimeoutError` once `config.max_iterations` polls have failed
pub fn poll_with_timeout<F>(config: TimeoutConfig, mut condition: F) -> Result<(), TimeoutError>
where
    F: FnMut() -> bool,
{
    poll_with_timeout_value(config, || condition().then_some(()))
}

/// Poll until `attempt` yields a value or the budget runs out
///
/// # Errors
///
/// `TimeoutError` once `config.max_iterations` polls returned `None`
pub fn poll_with_timeout_value<F, T>(
    config: TimeoutConfig,
    mut attempt: F,
) -> Result<T, TimeoutError>
where
    F: FnMut() -> Option<T>,
{
    let mut ctx = TimeoutContext::new(config);
    while ctx.tick() {
        if let Some(value) = attempt() {
            return Ok(value);
        }
    }
    Err(ctx.expired(0))
}

impl<H: UartHardware> Uart<H> {
    /// Wait for receive data, then read what is there.
    ///
    /// Returns as soon as at least one byte was read, possibly fewer than
    /// `buf.len()`.
    ///
    /// # Errors
    ///
    /// `TimeoutError` if nothing arrived within the budget
    pub fn read_with_timeout(
        &mut self,
        id: UartId,
        buf: &mut [u8],
        config: TimeoutConfig,
    ) -> Result<usize, TimeoutError> {
        poll_with_timeout(config, || {
            self.idle();
            self.rx_available(id) != 0
        })?;
        Ok(self.read(id, buf))
    }

    /// Write all of `data`, polling while the FIFO and buffer are full.
    ///
    /// The budget is spent only on polls that made no progress.
    ///
    /// # Errors
    ///
    /// `TimeoutError` with the accepted byte count if the transmitter
    /// stalled for the whole budget
    pub fn write_with_timeout(
        &mut self,
        id: UartId,
        data: &[u8],
        config: TimeoutConfig,
    ) -> Result<usize, TimeoutError> {
        let mut written = self.write(id, data);
        let mut ctx = TimeoutContext::new(config);
        while written < data.len() {
            if !ctx.tick() {
                return Err(ctx.expired(written));
            }
            self.idle();
            let accepted = self.write(id, &data[written..]);
            if accepted != 0 {
                written += accepted;
                ctx = TimeoutContext::new(config);
            }
        }
        Ok(written)
    }

    /// Like [`wait_tx_empty`](Self::wait_tx_empty), but gives up
    ///
    /// # Errors
    ///
    /// `TimeoutError` if the buffer and FIFO did not empty within the budget
    pub fn drain_with_timeout(
        &mut self,
        id: UartId,
        config: TimeoutConfig,
    ) -> Result<(), TimeoutError> {
        let idx = id.index();
        let physical = id.is_physical();
        poll_with_timeout(config, || {
            self.idle();
            let buffered = self
                .port(id)
                .and_then(|port| port.tx_buffer())
                .is_some_and(|buffer| !buffer.is_empty());
            !buffered && (!physical || self.hw.tx_fifo_count(idx) == 0)
        })
    }
}
