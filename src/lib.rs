// src/lib.rs
//! Tiny UART - interrupt-driven serial port driver
//!
//! Buffered, low-latency byte I/O over UART hardware that is shared between
//! mainline code and a single interrupt handler. The driver provides:
//! - Per-port receive/transmit ring buffers sitting in front of the hardware FIFOs
//! - A virtual port (`UartId::Uart2`) that owns its own buffers but delegates
//!   every hardware operation to physical port 0
//! - Sticky error status, data callbacks and lifecycle notifications
//! - Pin multiplexing with swap/restore semantics
//!
//! Hardware access goes through the [`uart::UartHardware`] trait, so the same
//! driver logic runs against real registers or the in-memory
//! [`uart::SimulatedUart`].
//!
//! # Concurrency
//!
//! There are no blocking locks. The interrupt handler mutates buffers and
//! status freely; mainline code that needs a consistent multi-field view
//! takes a [`uart::CriticalSection`], which masks the UART interrupt for as
//! long as the guard lives.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

extern crate alloc;

pub mod constants;
pub mod sync;
pub mod uart;

pub use uart::{
    backing_port, InterruptFlags, Mode, NotifyCode, Uart, UartConfig, UartError, UartHardware,
    UartId, UartOptions, UartResult,
};
