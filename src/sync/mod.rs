// src/sync/mod.rs

//! Synchronization primitives for sharing the driver with an interrupt handler
//!
//! The UART driver itself never blocks: consistency between mainline code and
//! the interrupt handler comes from masking the UART interrupt (see
//! [`crate::uart::CriticalSection`]). This module covers the outer layer,
//! where the driver value lives in a `static` that both the interrupt vector
//! and application code reach.
//!
//! # Example
//!
//! ```
//! use tiny_uart::sync::{IrqMutex, NoInterruptController};
//!
//! static COUNTER: IrqMutex<u32, NoInterruptController> = IrqMutex::new(0);
//!
//! COUNTER.with(|c| *c += 1);
//! assert_eq!(COUNTER.with(|c| *c), 1);
//! ```

pub mod interrupt;
pub mod irq_mutex;

// Re-export commonly used types
pub use interrupt::{InterruptController, NoInterruptController};
pub use irq_mutex::IrqMutex;
