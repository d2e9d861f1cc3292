// src/uart/mod.rs

//! Interrupt-driven buffered UART driver
//!
//! One [`Uart`] value owns the hardware and every open port. Each port has
//! optional receive and transmit ring buffers that the interrupt handler
//! fills and drains against the hardware FIFOs. Mainline calls that need a
//! consistent view of that state take a [`CriticalSection`].
//!
//! Port `Uart2` is virtual: it owns buffers of its own but every
//! hardware-level operation goes to [`backing_port`]`(Uart2)`, i.e. `Uart0`.
//!
//! # Example
//!
//! ```
//! use tiny_uart::uart::{SimulatedUart, Uart, UartConfig, UartId};
//!
//! let mut uart = Uart::new(SimulatedUart::new());
//! let port = uart.open(&UartConfig::new(UartId::Uart0)).unwrap();
//!
//! uart.write(port, b"AT\r\n");
//! uart.hardware_mut().transmit(0, 4);
//! assert_eq!(uart.hardware().wire(0), b"AT\r\n");
//!
//! uart.hardware_mut().receive(0, b"OK\r\n");
//! let mut reply = [0u8; 8];
//! assert_eq!(uart.read(port, &mut reply), 4);
//! ```

mod backend;
mod baud;
mod buffer;
mod config;
pub mod constants;
mod critical;
mod error;
mod isr;
mod pins;
mod port;
mod registry;
mod rx;
mod sim;
mod status;
pub mod timeout;
mod tx;

pub use backend::{ControlFlags, InterruptFlags, PinFunction, UartHardware};
pub use buffer::SerialBuffer;
pub use config::{backing_port, IntrConfig, Mode, PortCapabilities, UartConfig, UartId, UartOptions};
pub use critical::CriticalSection;
pub use error::{ErrorContext, UartError, UartResult};
pub use isr::{service_interrupt, service_port, SharedUart};
pub use pins::PinSet;
pub use port::{DataCallback, NotifyCallback, NotifyCode, UartPort};
pub use registry::Uart;
pub use sim::{PinEvent, SimulatedUart};
pub use status::DebugWriter;
pub use timeout::{poll_with_timeout, poll_with_timeout_value, TimeoutConfig, TimeoutError};
