// src/uart/status.rs

//! Line status, break signalling and debug output routing

use core::fmt;

use log::debug;

use super::backend::{ControlFlags, InterruptFlags, UartHardware};
use super::config::{backing_port, UartId};
use super::registry::Uart;

impl<H: UartHardware> Uart<H> {
    /// Read and clear the port's line status.
    ///
    /// Merges the sticky break/overflow flags recorded by the interrupt
    /// handler with the backing port's current error flags, then clears
    /// both. A condition is therefore reported exactly once.
    pub fn get_status(&mut self, id: UartId) -> InterruptFlags {
        if !self.is_open(id) {
            return InterruptFlags::empty();
        }

        let physical = backing_port(id);
        let mut cs = self.critical();
        let Uart { hw, ports, .. } = &mut *cs;

        let mut status = InterruptFlags::empty();
        if let Some(port) = ports[id.index()].as_mut() {
            status = port.status & (InterruptFlags::BREAK_DETECT | InterruptFlags::RXFIFO_OVERFLOW);
            port.status = InterruptFlags::empty();
        }

        if ports[physical.index()].is_some() {
            let raw = hw.raw_interrupt_status(physical.index()) & InterruptFlags::ERRORS;
            status |= raw;
            hw.clear_interrupts(physical.index(), status);
        }
        status
    }

    /// Hold the transmit line in the break state, or release it
    pub fn set_break(&mut self, id: UartId, state: bool) {
        let physical = backing_port(id);
        if !self.is_open(physical) {
            return;
        }
        if state {
            self.hw.set_control_bits(physical.index(), ControlFlags::TXD_BREAK);
        } else {
            self.hw.clear_control_bits(physical.index(), ControlFlags::TXD_BREAK);
        }
    }

    /// Route low-level diagnostic output to `id`, or disable it with `None`.
    ///
    /// The port does not have to be open yet; output is dropped until it is.
    pub fn set_debug(&mut self, id: Option<UartId>) {
        self.debug_port = id;
        self.hw.set_os_print(id.is_some());
        debug!("debug output: {:?}", id);
    }

    /// Port currently receiving diagnostic output
    pub fn debug(&self) -> Option<UartId> {
        self.debug_port
    }

    /// Send one diagnostic byte to the debug port, if one is open
    pub fn debug_putc(&mut self, byte: u8) {
        if let Some(id) = self.debug_port {
            if self.is_open(id) {
                self.write_char(id, byte);
            }
        }
    }

    /// `core::fmt::Write` adapter over [`debug_putc`](Self::debug_putc)
    pub fn debug_writer(&mut self) -> DebugWriter<'_, H> {
        DebugWriter { uart: self }
    }
}

/// Formatter sink for the debug port; bytes that do not fit are dropped
pub struct DebugWriter<'a, H: UartHardware> {
    uart: &'a mut Uart<H>,
}

impl<H: UartHardware> fmt::Write for DebugWriter<'_, H> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.uart.debug_putc(byte);
        }
        Ok(())
    }
}

impl<H: UartHardware> fmt::Debug for DebugWriter<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugWriter")
            .field("port", &self.uart.debug_port)
            .finish()
    }
}
