// src/uart/backend.rs

//! Hardware abstraction for the UART driver.
//!
//! The goal of this module is to hide register access details behind a
//! lightweight trait so that the buffering, interrupt and pin logic can run
//! unchanged against memory-mapped peripherals or against
//! [`SimulatedUart`](super::sim::SimulatedUart) on a host.
//!
//! Every method addresses a physical port by its index
//! (`0..UART_PHYSICAL_COUNT`); virtual ports are resolved before the call.

use bitflags::bitflags;

bitflags! {
    /// Interrupt sources, laid out as in the INT_RAW / INT_ST / INT_ENA / INT_CLR registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InterruptFlags: u16 {
        /// Receive FIFO holds more bytes than the full threshold
        const RXFIFO_FULL = 1 << 0;
        /// Transmit FIFO drained below the empty threshold
        const TXFIFO_EMPTY = 1 << 1;
        /// Parity error on a received byte
        const PARITY_ERR = 1 << 2;
        /// Framing error on a received byte
        const FRAMING_ERR = 1 << 3;
        /// Receive FIFO overflowed, data lost
        const RXFIFO_OVERFLOW = 1 << 4;
        /// DSR line changed
        const DSR_CHANGE = 1 << 5;
        /// CTS line changed
        const CTS_CHANGE = 1 << 6;
        /// Break condition detected on the receive line
        const BREAK_DETECT = 1 << 7;
        /// No new byte for the timeout period after a partial reception
        const RXFIFO_TIMEOUT = 1 << 8;

        /// Sources serviced by the receive path
        const RX_EVENTS = Self::RXFIFO_FULL.bits()
            | Self::RXFIFO_TIMEOUT.bits()
            | Self::RXFIFO_OVERFLOW.bits();
        /// Line conditions reported by a status read
        const ERRORS = Self::BREAK_DETECT.bits()
            | Self::RXFIFO_OVERFLOW.bits()
            | Self::FRAMING_ERR.bits()
            | Self::PARITY_ERR.bits();
    }
}

bitflags! {
    /// Control register (CONF0) bits above the pre-encoded line format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControlFlags: u32 {
        /// Hold the transmit line in the break (space) state
        const TXD_BREAK = 1 << 8;
        /// Reset the receive FIFO while set
        const RXFIFO_RESET = 1 << 17;
        /// Reset the transmit FIFO while set
        const TXFIFO_RESET = 1 << 18;
    }
}

/// Function a GPIO pad can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinFunction {
    /// Plain GPIO, i.e. not connected to any UART
    Gpio,
    Uart0Txd,
    /// UART0 TXD on its backup pad (GPIO2)
    Uart0TxdAlt,
    Uart0Rxd,
    /// UART0 CTS pad, carries RXD while swapped
    Uart0Cts,
    /// UART0 RTS pad, carries TXD while swapped
    Uart0Rts,
    Uart1Txd,
}

/// Minimal abstraction over UART register access.
///
/// Implementations must be callable from the interrupt handler: no method
/// may block or allocate.
pub trait UartHardware {
    /// Bytes waiting in the receive FIFO
    fn rx_fifo_count(&self, port: usize) -> usize;
    /// Bytes queued in the transmit FIFO
    fn tx_fifo_count(&self, port: usize) -> usize;
    /// Pop one byte from the receive FIFO
    fn read_fifo(&mut self, port: usize) -> u8;
    /// Push one byte into the transmit FIFO
    fn write_fifo(&mut self, port: usize, byte: u8);

    /// Raised sources that are also enabled (INT_ST)
    fn interrupt_status(&self, port: usize) -> InterruptFlags;
    /// Raised sources regardless of enable state (INT_RAW)
    fn raw_interrupt_status(&self, port: usize) -> InterruptFlags;
    /// Currently enabled sources (INT_ENA)
    fn interrupt_enable(&self, port: usize) -> InterruptFlags;
    /// Overwrite the enabled sources
    fn set_interrupt_enable(&mut self, port: usize, flags: InterruptFlags);
    /// Acknowledge raised sources (INT_CLR)
    fn clear_interrupts(&mut self, port: usize, flags: InterruptFlags);

    /// Enable additional sources, leaving the others untouched
    fn enable_interrupts(&mut self, port: usize, flags: InterruptFlags) {
        let current = self.interrupt_enable(port);
        self.set_interrupt_enable(port, current | flags);
    }

    /// Disable the given sources, leaving the others untouched
    fn disable_interrupts(&mut self, port: usize, flags: InterruptFlags) {
        let current = self.interrupt_enable(port);
        self.set_interrupt_enable(port, current - flags);
    }

    /// Raw value of the control register (CONF0)
    fn control(&self, port: usize) -> u32;
    /// Overwrite the control register (CONF0)
    fn set_control(&mut self, port: usize, value: u32);

    fn set_control_bits(&mut self, port: usize, bits: ControlFlags) {
        let value = self.control(port);
        self.set_control(port, value | bits.bits());
    }

    fn clear_control_bits(&mut self, port: usize, bits: ControlFlags) {
        let value = self.control(port);
        self.set_control(port, value & !bits.bits());
    }

    /// Write the FIFO threshold register (CONF1)
    fn write_fifo_config(&mut self, port: usize, value: u32);
    /// Program the baud clock divider
    fn write_clock_divider(&mut self, port: usize, divider: u32);
    /// Reference clock the divider is applied to, in Hz
    fn clock_frequency(&self) -> u32;

    /// Route a GPIO pad to `function`
    fn select_pin(&mut self, pin: u8, function: PinFunction);
    /// Set or clear the UART0 pin-swap control bit
    fn set_pin_swap(&mut self, swapped: bool);

    /// Mask the shared UART interrupt at the interrupt controller
    fn mask_uart_interrupt(&mut self);
    /// Unmask the shared UART interrupt at the interrupt controller
    fn unmask_uart_interrupt(&mut self);
    /// Install the driver's dispatch routine as the UART interrupt handler
    fn attach_handler(&mut self);

    /// Keep the watchdog alive during a busy wait
    fn feed_watchdog(&mut self);
    /// Enable or disable the system's low-level diagnostic output
    fn set_os_print(&mut self, enabled: bool);
}
