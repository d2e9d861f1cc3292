// src/uart/tx.rs

//! Transmit path (mainline side)

use log::trace;

use super::backend::{InterruptFlags, UartHardware};
use super::config::{UartId, UartOptions};
use super::error::{UartError, UartResult};
use super::isr::{tx_fifo_free, tx_fifo_full};
use super::port::NotifyCode;
use super::registry::{reallocate, Uart};

impl<H: UartHardware> Uart<H> {
    /// Write `data`, returning how many bytes were accepted.
    ///
    /// Bytes go straight into the transmit FIFO while the transmit buffer is
    /// empty, the rest is queued in the buffer. A short count means both were
    /// full; with [`UartOptions::TXWAIT`] the call instead keeps servicing the
    /// port until everything is accepted.
    pub fn write(&mut self, id: UartId, data: &[u8]) -> usize {
        if !self.tx_enabled(id) || data.is_empty() {
            return 0;
        }

        let idx = id.index();
        let wait = self.options(id).contains(UartOptions::TXWAIT);
        let mut written = 0;

        loop {
            let Uart { hw, ports, .. } = &mut *self;
            let Some(port) = ports[idx].as_mut() else {
                break;
            };

            if id.is_physical() && port.tx_buffer.as_ref().is_none_or(|buffer| buffer.is_empty()) {
                while written < data.len() && !tx_fifo_full(hw, idx) {
                    hw.write_fifo(idx, data[written]);
                    written += 1;
                }
                hw.clear_interrupts(idx, InterruptFlags::TXFIFO_EMPTY);
                hw.enable_interrupts(idx, InterruptFlags::TXFIFO_EMPTY);
            }

            if let Some(buffer) = port.tx_buffer.as_mut() {
                written += buffer.write_slice(&data[written..]);
            }

            self.notify(id, NotifyCode::AfterWrite);

            if written == data.len() || !wait {
                break;
            }
            self.idle();
        }

        written
    }

    /// Write one byte; `false` if there was no room for it
    pub fn write_char(&mut self, id: UartId, byte: u8) -> bool {
        self.write(id, &[byte]) == 1
    }

    /// Bytes `write` could accept right now: FIFO room plus buffer room
    pub fn tx_free(&mut self, id: UartId) -> usize {
        if !self.tx_enabled(id) {
            return 0;
        }
        let idx = id.index();
        let cs = self.critical();
        let fifo = if id.is_physical() { tx_fifo_free(&cs.hw, idx) } else { 0 };
        let buffered = cs.ports[idx]
            .as_ref()
            .and_then(|port| port.tx_buffer.as_ref())
            .map_or(0, |buffer| buffer.free_space());
        fifo + buffered
    }

    /// Busy-wait until the transmit buffer and FIFO are both empty,
    /// feeding the watchdog meanwhile.
    pub fn wait_tx_empty(&mut self, id: UartId) {
        if !self.tx_enabled(id) {
            return;
        }

        self.notify(id, NotifyCode::WaitTx);

        let idx = id.index();
        while self.ports[idx]
            .as_ref()
            .and_then(|port| port.tx_buffer.as_ref())
            .is_some_and(|buffer| !buffer.is_empty())
        {
            self.idle();
        }

        if id.is_physical() {
            while self.hw.tx_fifo_count(idx) != 0 {
                self.idle();
            }
        }
    }

    /// Resize (or with 0, remove) the transmit buffer, keeping queued bytes.
    ///
    /// # Errors
    ///
    /// - `NotOpen` / `RoleDisabled` if the port cannot transmit
    /// - `OutOfMemory` if the new buffer cannot be allocated
    pub fn resize_tx_buffer(&mut self, id: UartId, size: usize) -> UartResult<usize> {
        if !self.open_port(id)?.tx_enabled() {
            return Err(UartError::RoleDisabled);
        }
        let mut cs = self.critical();
        let port = cs.open_port_mut(id)?;
        let size = reallocate(&mut port.tx_buffer, size)?;
        trace!("{}: tx buffer now {} bytes", id, size);
        Ok(size)
    }

    /// Capacity of the transmit buffer, 0 if unbuffered or closed
    pub fn tx_buffer_size(&self, id: UartId) -> usize {
        self.port(id)
            .and_then(|port| port.tx_buffer())
            .map_or(0, |buffer| buffer.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::{Mode, SimulatedUart, UartConfig};

    fn open_tx(tx_size: usize) -> Uart<SimulatedUart> {
        let mut uart = Uart::new(SimulatedUart::new());
        uart.open(&UartConfig::new(UartId::Uart0).with_buffers(0, tx_size))
            .unwrap();
        uart
    }

    #[test]
    fn test_write_goes_to_fifo_and_arms_empty() {
        let mut uart = open_tx(0);
        assert_eq!(uart.write(UartId::Uart0, b"hello"), 5);
        assert_eq!(uart.hardware().tx_fifo_len(0), 5);
        assert!(uart.hardware().interrupt_enable(0).contains(InterruptFlags::TXFIFO_EMPTY));
    }

    #[test]
    fn test_empty_write_is_noop() {
        let mut uart = open_tx(0);
        assert_eq!(uart.write(UartId::Uart0, b""), 0);
        assert!(!uart.hardware().interrupt_enable(0).contains(InterruptFlags::TXFIFO_EMPTY));
    }

    #[test]
    fn test_short_write_without_buffer() {
        let mut uart = open_tx(0);
        let data = [0x55u8; 200];
        assert_eq!(uart.write(UartId::Uart0, &data), 127);
        assert_eq!(uart.tx_free(UartId::Uart0), 0);
    }

    #[test]
    fn test_fifo_empty_refills_from_buffer() {
        let mut uart = open_tx(64);
        let data: Vec<u8> = (0..150u8).collect();
        assert_eq!(uart.write(UartId::Uart0, &data), 150);
        assert_eq!(uart.tx_buffer_size(UartId::Uart0), 64);

        uart.hardware_mut().transmit(0, 127);
        uart.handle_interrupt();
        assert_eq!(uart.hardware().tx_fifo_len(0), 23);

        uart.hardware_mut().transmit(0, usize::MAX);
        uart.handle_interrupt();
        assert_eq!(uart.hardware().wire(0), &data[..]);
        assert!(!uart.hardware().interrupt_enable(0).contains(InterruptFlags::TXFIFO_EMPTY));
    }

    #[test]
    fn test_txwait_blocks_until_queued() {
        let mut uart = Uart::new(SimulatedUart::new());
        uart.hardware_mut().set_drain_on_feed(true);
        uart.open(
            &UartConfig::new(UartId::Uart0)
                .with_buffers(0, 0)
                .with_options(UartOptions::TXWAIT),
        )
        .unwrap();

        let data = [b'z'; 300];
        assert_eq!(uart.write(UartId::Uart0, &data), 300);
        uart.wait_tx_empty(UartId::Uart0);
        assert_eq!(uart.hardware().wire(0).len(), 300);
        assert!(uart.hardware().watchdog_feeds() > 0);
    }

    #[test]
    fn test_write_without_tx_role() {
        let mut uart = Uart::new(SimulatedUart::new());
        uart.open(&UartConfig::new(UartId::Uart0).with_mode(Mode::RxOnly))
            .unwrap();
        assert_eq!(uart.write(UartId::Uart0, b"x"), 0);
        assert!(!uart.write_char(UartId::Uart0, b'x'));
        assert_eq!(uart.tx_free(UartId::Uart0), 0);
    }
}
