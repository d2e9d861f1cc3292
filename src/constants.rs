// src/constants.rs

//! Hardware constants and driver tuning values
//!
//! This module centralizes the numbers that describe the UART peripheral
//! (FIFO depths, reference clock, register field widths) together with the
//! receive thresholds the driver programs by default.

/// Number of UART peripherals with real hardware behind them
pub const UART_PHYSICAL_COUNT: usize = 2;

/// Total number of port identifiers, including the virtual port
pub const UART_COUNT: usize = 3;

/// Depth of the hardware receive FIFO in bytes
pub const UART_RX_FIFO_SIZE: usize = 0x80;

/// Depth of the hardware transmit FIFO in bytes
pub const UART_TX_FIFO_SIZE: usize = 0x80;

/// Reference clock feeding the baud-rate divider (APB clock, Hz)
pub const UART_CLK_FREQ: u32 = 80_000_000;

/// Largest value any 7-bit CONF1 threshold field can hold
pub const UART_THRESHOLD_MAX: u8 = 0x7f;

/// FIFO-full interrupt fires once the receive FIFO holds more than this
pub const RX_FIFO_FULL_THRESHOLD: u8 = 120;

/// Bytes that may still arrive between FIFO-full and FIFO overflow
pub const RX_FIFO_HEADROOM: usize = UART_RX_FIFO_SIZE - RX_FIFO_FULL_THRESHOLD as usize;

/// Receive timeout, in symbol periods, after a partial reception
pub const RX_TIMEOUT_THRESHOLD: u8 = 0x02;

/// Default free space that must remain in the receive buffer before the
/// data callback is told the buffer is (almost) full
pub const DEFAULT_RX_HEADROOM: usize = 32 - RX_FIFO_HEADROOM;

/// Default baud rate used by [`crate::uart::UartConfig::default`]
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default 8N1 line format, pre-encoded for the control register
///
/// Bits 2..=3 select the data width (3 = 8 bits), bits 4..=5 the stop bits
/// (1 = one stop bit), bits 0..=1 the parity (0 = none).
pub const UART_8N1: u8 = 0b0001_1100;

/// Default receive buffer size for [`crate::uart::UartConfig::default`]
pub const DEFAULT_RX_BUFFER_SIZE: usize = 256;

/// Default transmit buffer size; 0 writes straight to the FIFO
pub const DEFAULT_TX_BUFFER_SIZE: usize = 0;
