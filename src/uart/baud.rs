// src/uart/baud.rs

//! Baud rate, line format and FIFO thresholds
//!
//! All three live in the physical port's registers, so a virtual port
//! resolves to its backing port here.

use log::trace;

use super::backend::UartHardware;
use super::config::{backing_port, IntrConfig, UartId};
use super::constants::{conf1, FORMAT_MASK};
use super::error::UartResult;
use super::registry::{program_baud, Uart};
use crate::constants::{RX_FIFO_FULL_THRESHOLD, UART_THRESHOLD_MAX};

impl<H: UartHardware> Uart<H> {
    /// Program the baud rate, returning the rate actually achieved.
    ///
    /// The divider is an integer, so the result can differ from the request.
    /// Returns 0, leaving the hardware untouched, if the backing port is not
    /// open or the rate cannot be reached.
    pub fn set_baudrate(&mut self, id: UartId, baud_rate: u32) -> u32 {
        let physical = backing_port(id);
        let idx = physical.index();
        if !self.is_open(physical) {
            return 0;
        }

        let actual = program_baud(&mut self.hw, idx, baud_rate);
        if let Some(port) = self.ports[idx].as_mut() {
            port.baud_rate = actual;
        }
        trace!("{}: baud {} requested, {} programmed", physical, baud_rate, actual);
        actual
    }

    /// Effective baud rate of the backing port, 0 if it is not open
    pub fn baudrate(&self, id: UartId) -> u32 {
        self.port(backing_port(id)).map_or(0, |port| port.baud_rate())
    }

    /// Replace the pre-encoded data/parity/stop bit field
    ///
    /// # Errors
    ///
    /// `NotOpen` if the backing port is not open
    pub fn set_format(&mut self, id: UartId, format: u8) -> UartResult<()> {
        let physical = backing_port(id);
        self.open_port(physical)?;
        let idx = physical.index();
        let control = self.hw.control(idx);
        self.hw
            .set_control(idx, (control & !FORMAT_MASK) | u32::from(format));
        Ok(())
    }

    /// Reprogram the FIFO interrupt thresholds.
    ///
    /// Values are clamped to the 7-bit register fields. A buffered receiver
    /// keeps the fixed FIFO-full threshold; an unbuffered one uses the
    /// caller's value, raised to at least 1 since a zero threshold never
    /// clears.
    ///
    /// # Errors
    ///
    /// `NotOpen` if the backing port is not open
    pub fn intr_config(&mut self, id: UartId, config: &IntrConfig) -> UartResult<()> {
        let physical = backing_port(id);
        let port = self.open_port(physical)?;

        let mut fifo_config = 0;
        if port.rx_enabled() {
            let full = if port.rx_buffer().is_some() {
                RX_FIFO_FULL_THRESHOLD
            } else {
                config.rxfifo_full_thresh.clamp(1, UART_THRESHOLD_MAX)
            };
            let timeout = config.rx_timeout_thresh.min(UART_THRESHOLD_MAX);
            fifo_config |= (u32::from(full) << conf1::RXFIFO_FULL_THRHD_S)
                | (u32::from(timeout) << conf1::RX_TOUT_THRHD_S)
                | conf1::RX_TOUT_EN;
        }
        if port.tx_enabled() {
            let empty = config.txfifo_empty_intr_thresh.min(UART_THRESHOLD_MAX);
            fifo_config |= u32::from(empty) << conf1::TXFIFO_EMPTY_THRHD_S;
        }

        self.hw.write_fifo_config(physical.index(), fifo_config);
        Ok(())
    }
}
