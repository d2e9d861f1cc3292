// src/uart/rx.rs

//! Receive path (mainline side)

use log::trace;

use super::backend::{InterruptFlags, UartHardware};
use super::config::UartId;
use super::error::{UartError, UartResult};
use super::port::NotifyCode;
use super::registry::{reallocate, Uart};

impl<H: UartHardware> Uart<H> {
    /// Read up to `buf.len()` bytes, returning how many were read.
    ///
    /// Buffered bytes come first, then whatever is still waiting in the
    /// hardware FIFO. Receive interrupts the handler masked (buffer full,
    /// overflow) are re-armed afterwards.
    pub fn read(&mut self, id: UartId, buf: &mut [u8]) -> usize {
        if !self.rx_enabled(id) || buf.is_empty() {
            return 0;
        }

        self.notify(id, NotifyCode::BeforeRead);

        let idx = id.index();
        let Uart { hw, ports, .. } = self;
        let Some(port) = ports[idx].as_mut() else {
            return 0;
        };

        let mut read = 0;
        if let Some(buffer) = port.rx_buffer.as_mut() {
            while read < buf.len() {
                match buffer.read() {
                    Some(byte) => buf[read] = byte,
                    None => break,
                }
                read += 1;
            }
        }

        if id.is_physical() {
            while read < buf.len() && hw.rx_fifo_count(idx) != 0 {
                buf[read] = hw.read_fifo(idx);
                read += 1;
            }
            hw.clear_interrupts(idx, InterruptFlags::RX_EVENTS);
            hw.enable_interrupts(idx, InterruptFlags::RX_EVENTS);
        }

        read
    }

    /// Read one byte, if any is available
    pub fn read_char(&mut self, id: UartId) -> Option<u8> {
        let mut byte = [0u8];
        (self.read(id, &mut byte) == 1).then_some(byte[0])
    }

    /// Next buffered byte, without consuming it.
    ///
    /// Always `None` for an unbuffered port.
    pub fn peek_char(&mut self, id: UartId) -> Option<u8> {
        if !self.rx_enabled(id) {
            return None;
        }
        let idx = id.index();
        let cs = self.critical();
        cs.ports[idx].as_ref().and_then(|port| port.rx_buffer.as_ref()?.peek())
    }

    /// Most recently received byte still in the buffer
    pub fn peek_last_char(&mut self, id: UartId) -> Option<u8> {
        if !self.rx_enabled(id) {
            return None;
        }
        let idx = id.index();
        let cs = self.critical();
        cs.ports[idx].as_ref().and_then(|port| port.rx_buffer.as_ref()?.peek_last())
    }

    /// Position of the first `byte` in the receive buffer, counted from the
    /// next byte to be read
    pub fn rx_find(&mut self, id: UartId, byte: u8) -> Option<usize> {
        if !self.rx_enabled(id) {
            return None;
        }
        let idx = id.index();
        let cs = self.critical();
        cs.ports[idx].as_ref().and_then(|port| port.rx_buffer.as_ref()?.find(byte))
    }

    /// Bytes ready to read: buffered plus waiting in the FIFO
    pub fn rx_available(&mut self, id: UartId) -> usize {
        if !self.rx_enabled(id) {
            return 0;
        }
        let idx = id.index();
        let cs = self.critical();
        let fifo = if id.is_physical() { cs.hw.rx_fifo_count(idx) } else { 0 };
        let buffered = cs.ports[idx]
            .as_ref()
            .and_then(|port| port.rx_buffer.as_ref())
            .map_or(0, |buffer| buffer.available());
        fifo + buffered
    }

    /// Resize (or with 0, remove) the receive buffer, keeping its content.
    ///
    /// Returns the resulting size; a shrink below the bytes held is refused
    /// and reports the unchanged size.
    ///
    /// # Errors
    ///
    /// - `NotOpen` / `RoleDisabled` if the port cannot receive
    /// - `OutOfMemory` if the new buffer cannot be allocated
    pub fn resize_rx_buffer(&mut self, id: UartId, size: usize) -> UartResult<usize> {
        if !self.open_port(id)?.rx_enabled() {
            return Err(UartError::RoleDisabled);
        }
        let mut cs = self.critical();
        let port = cs.open_port_mut(id)?;
        let size = reallocate(&mut port.rx_buffer, size)?;
        trace!("{}: rx buffer now {} bytes", id, size);
        Ok(size)
    }

    /// Capacity of the receive buffer, 0 if unbuffered or closed
    pub fn rx_buffer_size(&self, id: UartId) -> usize {
        self.port(id)
            .and_then(|port| port.rx_buffer())
            .map_or(0, |buffer| buffer.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::{Mode, SimulatedUart, UartConfig};

    fn open_rx(rx_size: usize) -> Uart<SimulatedUart> {
        let mut uart = Uart::new(SimulatedUart::new());
        uart.open(&UartConfig::new(UartId::Uart0).with_buffers(rx_size, 0))
            .unwrap();
        uart
    }

    #[test]
    fn test_read_drains_buffer_then_fifo() {
        let mut uart = open_rx(16);
        uart.hardware_mut().receive(0, b"abc");
        uart.hardware_mut().raise(0, InterruptFlags::RXFIFO_TIMEOUT);
        uart.handle_interrupt();
        uart.hardware_mut().receive(0, b"de");

        assert_eq!(uart.rx_available(UartId::Uart0), 5);
        let mut buf = [0u8; 8];
        assert_eq!(uart.read(UartId::Uart0, &mut buf), 5);
        assert_eq!(&buf[..5], b"abcde");
    }

    #[test]
    fn test_read_rearms_masked_sources() {
        let mut uart = open_rx(4);
        uart.hardware_mut().receive(0, b"1234");
        uart.hardware_mut().raise(0, InterruptFlags::RXFIFO_TIMEOUT);
        uart.handle_interrupt();
        // Buffer full: the next event drains nothing and masks itself
        uart.hardware_mut().receive(0, b"5");
        uart.hardware_mut().raise(0, InterruptFlags::RXFIFO_TIMEOUT);
        uart.handle_interrupt();
        assert!(!uart.hardware().interrupt_enable(0).contains(InterruptFlags::RXFIFO_TIMEOUT));

        assert_eq!(uart.read_char(UartId::Uart0), Some(b'1'));
        assert!(uart.hardware().interrupt_enable(0).contains(InterruptFlags::RX_EVENTS));
    }

    #[test]
    fn test_peek_and_find() {
        let mut uart = open_rx(8);
        uart.hardware_mut().receive(0, b"ok\r\n");
        uart.hardware_mut().raise(0, InterruptFlags::RXFIFO_TIMEOUT);
        uart.handle_interrupt();

        assert_eq!(uart.peek_char(UartId::Uart0), Some(b'o'));
        assert_eq!(uart.peek_last_char(UartId::Uart0), Some(b'\n'));
        assert_eq!(uart.rx_find(UartId::Uart0, b'\n'), Some(3));
        assert_eq!(uart.rx_available(UartId::Uart0), 4);
    }

    #[test]
    fn test_read_without_rx_role() {
        let mut uart = Uart::new(SimulatedUart::new());
        uart.open(&UartConfig::new(UartId::Uart0).with_mode(Mode::TxOnly))
            .unwrap();
        uart.hardware_mut().receive(0, b"x");
        let mut buf = [0u8; 4];
        assert_eq!(uart.read(UartId::Uart0, &mut buf), 0);
        assert_eq!(uart.rx_available(UartId::Uart0), 0);
        assert_eq!(uart.resize_rx_buffer(UartId::Uart0, 8), Err(UartError::RoleDisabled));
    }

    #[test]
    fn test_resize_rx_buffer() {
        let mut uart = open_rx(0);
        assert_eq!(uart.rx_buffer_size(UartId::Uart0), 0);
        assert_eq!(uart.resize_rx_buffer(UartId::Uart0, 32), Ok(32));
        assert_eq!(uart.rx_buffer_size(UartId::Uart0), 32);
        assert_eq!(uart.resize_rx_buffer(UartId::Uart0, 0), Ok(0));
        assert_eq!(uart.resize_rx_buffer(UartId::Uart1, 8), Err(UartError::NotOpen));
    }
}
