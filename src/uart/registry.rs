// src/uart/registry.rs

//! Port registry and lifecycle
//!
//! [`Uart`] owns the hardware handle and every live port. It is an explicit
//! value rather than a global: firmware keeps one in a
//! [`SharedUart`](super::SharedUart) static, tests build a fresh one each.

use core::fmt;

use log::{debug, warn};

use super::backend::{ControlFlags, InterruptFlags, UartHardware};
use super::buffer::SerialBuffer;
use super::config::{Mode, UartConfig, UartId, UartOptions};
use super::constants::{conf1, pin};
use super::error::{UartError, UartResult};
use super::port::{DataCallback, NotifyCallback, NotifyCode, UartPort};
use crate::constants::*;

/// Interrupt-driven driver for every UART port
pub struct Uart<H> {
    pub(super) hw: H,
    pub(super) ports: [Option<UartPort>; UART_COUNT],
    /// Bit `n` set while physical port `n` has interrupts armed
    pub(super) isr_mask: u8,
    pub(super) notify: [Option<NotifyCallback>; UART_COUNT],
    pub(super) debug_port: Option<UartId>,
    /// Nesting depth of live critical sections
    pub(super) cs_depth: u8,
}

impl<H> Uart<H> {
    /// Driver with no open ports
    pub const fn new(hw: H) -> Self {
        Self {
            hw,
            ports: [const { None }; UART_COUNT],
            isr_mask: 0,
            notify: [const { None }; UART_COUNT],
            debug_port: None,
            cs_depth: 0,
        }
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Direct register access; bypasses the driver's bookkeeping
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn port(&self, id: UartId) -> Option<&UartPort> {
        self.ports[id.index()].as_ref()
    }

    pub fn port_mut(&mut self, id: UartId) -> Option<&mut UartPort> {
        self.ports[id.index()].as_mut()
    }

    #[inline]
    pub fn is_open(&self, id: UartId) -> bool {
        self.ports[id.index()].is_some()
    }

    /// Whether interrupts are armed for physical port `id`
    #[inline]
    pub fn isr_enabled(&self, id: UartId) -> bool {
        self.isr_mask & (1 << id.index()) != 0
    }

    pub fn rx_enabled(&self, id: UartId) -> bool {
        self.port(id).is_some_and(UartPort::rx_enabled)
    }

    pub fn tx_enabled(&self, id: UartId) -> bool {
        self.port(id).is_some_and(UartPort::tx_enabled)
    }

    /// Options of an open port, empty otherwise
    pub fn options(&self, id: UartId) -> UartOptions {
        self.port(id).map_or(UartOptions::empty(), UartPort::options)
    }

    pub(super) fn open_port(&self, id: UartId) -> UartResult<&UartPort> {
        self.port(id).ok_or(UartError::NotOpen)
    }

    pub(super) fn open_port_mut(&mut self, id: UartId) -> UartResult<&mut UartPort> {
        self.port_mut(id).ok_or(UartError::NotOpen)
    }

    /// Register or remove the lifecycle hook for `id`.
    ///
    /// Hooks are keyed by identifier and survive close/open cycles.
    pub fn set_notify(&mut self, id: UartId, callback: Option<NotifyCallback>) {
        self.notify[id.index()] = callback;
    }

    pub(super) fn notify(&mut self, id: UartId, code: NotifyCode) {
        let idx = id.index();
        let (hook, port) = (&mut self.notify[idx], &mut self.ports[idx]);
        if let (Some(callback), Some(port)) = (hook.as_mut(), port.as_mut()) {
            callback(port, code);
        }
    }
}

impl<H: UartHardware> Uart<H> {
    /// Open a port.
    ///
    /// Every configuration check runs before any register is written, so a
    /// failed open leaves hardware and registry untouched.
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if `config.id` is already open
    /// - `UnsupportedMode` if the port cannot provide the requested roles
    /// - `InvalidPinCombination` if `config.tx_pin` is not routable
    /// - `UnreachableBaudRate` if a physical port cannot reach the baud rate
    /// - `OutOfMemory` if a buffer cannot be allocated
    pub fn open(&mut self, config: &UartConfig) -> UartResult<UartId> {
        let id = config.id;
        let idx = id.index();

        if self.is_open(id) {
            warn!("{}: already open", id);
            return Err(UartError::AlreadyInitialized);
        }
        if !id.capabilities().supports(config.mode) {
            warn!("{}: mode {:?} not supported", id, config.mode);
            return Err(UartError::UnsupportedMode);
        }
        let tx_pin = default_tx_pin(id, config.tx_pin)?;
        if id.is_physical() && clock_divider(self.hw.clock_frequency(), config.baud_rate) == 0 {
            warn!("{}: baud rate {} unreachable", id, config.baud_rate);
            return Err(UartError::UnreachableBaudRate);
        }

        // The virtual port has no FIFO behind it, so it gets one FIFO's worth
        // of extra buffer instead.
        let (rx_size, tx_size) = if id.is_physical() {
            (config.rx_size, config.tx_size)
        } else {
            let rx = config.rx_size.checked_add(UART_RX_FIFO_SIZE);
            let tx = config.tx_size.checked_add(UART_TX_FIFO_SIZE);
            (rx.ok_or(UartError::OutOfMemory)?, tx.ok_or(UartError::OutOfMemory)?)
        };

        let mut port = UartPort::new(id, config.mode, config.options, config.rx_headroom);
        if port.rx_enabled() {
            reallocate(&mut port.rx_buffer, rx_size)?;
        }
        if port.tx_enabled() {
            reallocate(&mut port.tx_buffer, tx_size)?;
        }

        if id.is_physical() {
            self.detach(id);
            if port.rx_enabled() {
                port.rx_pin = Some(pin::UART0_RX);
            }
            if port.tx_enabled() {
                port.tx_pin = tx_pin;
            }
            self.select_pins(id, port.tx_pin, port.rx_pin);
            if id.capabilities().swappable {
                self.hw.set_pin_swap(false);
            }
            self.hw.set_control(idx, u32::from(config.format));
            port.baud_rate = program_baud(&mut self.hw, idx, config.baud_rate);
        }

        self.ports[idx] = Some(port);
        self.flush(id, Mode::Full);
        self.start_isr(id);
        self.notify(id, NotifyCode::AfterOpen);

        debug!(
            "{}: opened {:?}, rx {} / tx {} byte buffers, {} baud",
            id,
            config.mode,
            self.rx_buffer_size(id),
            self.tx_buffer_size(id),
            self.baudrate(id)
        );
        Ok(id)
    }

    /// Close a port, releasing its buffers and restoring its pins.
    ///
    /// Closing a port that is not open does nothing.
    pub fn close(&mut self, id: UartId) {
        if !self.is_open(id) {
            return;
        }

        self.notify(id, NotifyCode::BeforeClose);
        self.detach(id);
        if self.debug_port == Some(id) {
            self.set_debug(None);
        }
        if let Some(port) = self.ports[id.index()].take() {
            self.restore_pins(id, port.tx_pin, port.rx_pin);
        }
        debug!("{}: closed", id);
    }

    /// Install or remove the data callback for an open port
    pub fn set_callback(&mut self, id: UartId, callback: Option<DataCallback>) -> UartResult<()> {
        let mut cs = self.critical();
        cs.open_port_mut(id)?.callback = callback;
        Ok(())
    }

    pub fn set_options(&mut self, id: UartId, options: UartOptions) -> UartResult<()> {
        self.open_port_mut(id)?.options = options;
        Ok(())
    }

    /// Free receive-buffer space below which FIFO-full events are reported
    pub fn set_rx_headroom(&mut self, id: UartId, headroom: usize) -> UartResult<()> {
        let mut cs = self.critical();
        cs.open_port_mut(id)?.rx_headroom = headroom;
        Ok(())
    }

    /// Discard buffered and in-FIFO data for the directions in `mode`.
    ///
    /// Flushing receive re-arms any receive interrupt sources the handler
    /// masked after an overflow; flushing transmit disarms FIFO-empty until
    /// the next write.
    pub fn flush(&mut self, id: UartId, mode: Mode) {
        let Some(port) = self.port(id) else {
            return;
        };
        let flush_rx = mode.has_rx() && port.rx_enabled();
        let flush_tx = mode.has_tx() && port.tx_enabled();
        let idx = id.index();

        let mut cs = self.critical();
        let Uart { hw, ports, .. } = &mut *cs;
        if let Some(port) = ports[idx].as_mut() {
            if flush_rx {
                if let Some(buffer) = port.rx_buffer.as_mut() {
                    buffer.clear();
                }
            }
            if flush_tx {
                if let Some(buffer) = port.tx_buffer.as_mut() {
                    buffer.clear();
                }
            }
        }

        if id.is_physical() {
            let mut reset = ControlFlags::empty();
            reset.set(ControlFlags::RXFIFO_RESET, flush_rx);
            reset.set(ControlFlags::TXFIFO_RESET, flush_tx);
            hw.set_control_bits(idx, reset);
            hw.clear_control_bits(idx, reset);

            if flush_tx {
                hw.disable_interrupts(idx, InterruptFlags::TXFIFO_EMPTY);
            }
            if flush_rx {
                hw.clear_interrupts(idx, InterruptFlags::all() - InterruptFlags::TXFIFO_EMPTY);
                hw.enable_interrupts(idx, InterruptFlags::RX_EVENTS);
            }
        }
    }

    /// Program thresholds and enable sources for an open physical port, then
    /// arm it in the shared handler.
    fn start_isr(&mut self, id: UartId) {
        if !id.is_physical() {
            return;
        }
        let Some(port) = self.port(id) else {
            return;
        };

        let (fifo_config, enable) = if port.rx_enabled() {
            (
                (u32::from(RX_FIFO_FULL_THRESHOLD) << conf1::RXFIFO_FULL_THRHD_S)
                    | (u32::from(RX_TIMEOUT_THRESHOLD) << conf1::RX_TOUT_THRHD_S)
                    | conf1::RX_TOUT_EN,
                InterruptFlags::RXFIFO_FULL
                    | InterruptFlags::RXFIFO_TIMEOUT
                    | InterruptFlags::BREAK_DETECT
                    | InterruptFlags::RXFIFO_OVERFLOW,
            )
        } else {
            // FIFO-empty is only enabled by write()
            (0, InterruptFlags::empty())
        };

        let idx = id.index();
        self.hw.write_fifo_config(idx, fifo_config);
        self.hw.clear_interrupts(idx, InterruptFlags::all());
        self.hw.set_interrupt_enable(idx, enable);

        let was_idle = self.isr_mask == 0;
        self.isr_mask |= 1 << idx;
        if was_idle {
            self.hw.mask_uart_interrupt();
            self.hw.attach_handler();
            self.hw.unmask_uart_interrupt();
        }
    }

    /// Disarm a physical port and clear its interrupt configuration.
    ///
    /// An open port stays open but receives no further interrupt service
    /// until it is closed and reopened.
    pub fn detach(&mut self, id: UartId) {
        if !id.is_physical() {
            return;
        }
        let idx = id.index();
        let mut cs = self.critical();
        cs.isr_mask &= !(1 << idx);
        cs.hw.write_fifo_config(idx, 0);
        cs.hw.clear_interrupts(idx, InterruptFlags::all());
        cs.hw.set_interrupt_enable(idx, InterruptFlags::empty());
    }

    /// Disarm every physical port, e.g. at startup to silence sources the
    /// boot ROM left enabled. The UART interrupt stays masked afterwards.
    pub fn detach_all(&mut self) {
        let mut cs = self.critical();
        for id in UartId::PHYSICAL {
            let idx = id.index();
            cs.hw.write_fifo_config(idx, 0);
            cs.hw.clear_interrupts(idx, InterruptFlags::all());
            cs.hw.set_interrupt_enable(idx, InterruptFlags::empty());
        }
        cs.isr_mask = 0;
    }
}

impl<H: fmt::Debug> fmt::Debug for Uart<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uart")
            .field("hw", &self.hw)
            .field("ports", &self.ports)
            .field("isr_mask", &self.isr_mask)
            .field("debug_port", &self.debug_port)
            .finish_non_exhaustive()
    }
}

/// Replace `slot` with a buffer of `size` bytes, keeping content where
/// possible. Size 0 removes the buffer.
///
/// Returns the resulting capacity.
pub(super) fn reallocate(slot: &mut Option<SerialBuffer>, size: usize) -> UartResult<usize> {
    match (slot.as_mut(), size) {
        (_, 0) => {
            *slot = None;
            Ok(0)
        }
        (Some(buffer), size) => buffer.resize(size),
        (None, size) => {
            let buffer = slot.insert(SerialBuffer::new(size)?);
            Ok(buffer.capacity())
        }
    }
}

/// Transmit pin a freshly opened port starts on
fn default_tx_pin(id: UartId, requested: Option<u8>) -> UartResult<Option<u8>> {
    match (id, requested) {
        (UartId::Uart0, None | Some(pin::UART0_TX)) => Ok(Some(pin::UART0_TX)),
        (UartId::Uart0, Some(pin::UART0_TX_ALT)) => Ok(Some(pin::UART0_TX_ALT)),
        (UartId::Uart1, None | Some(pin::UART1_TX)) => Ok(Some(pin::UART1_TX)),
        (UartId::Uart2, None) => Ok(None),
        _ => Err(UartError::InvalidPinCombination),
    }
}

/// Integer divider for `baud_rate`; 0 when the rate is zero or above the clock
#[inline]
pub(super) const fn clock_divider(clock: u32, baud_rate: u32) -> u32 {
    if baud_rate == 0 { 0 } else { clock / baud_rate }
}

/// Write the divider for `baud_rate` and return the rate it actually yields.
///
/// A zero divider leaves the register untouched and yields 0.
pub(super) fn program_baud<H: UartHardware>(hw: &mut H, idx: usize, baud_rate: u32) -> u32 {
    let clock = hw.clock_frequency();
    let divider = clock_divider(clock, baud_rate);
    if divider == 0 {
        return 0;
    }
    hw.write_clock_divider(idx, divider);
    clock / divider
}
