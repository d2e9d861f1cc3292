// src/uart/port.rs

//! Per-port instance state

use alloc::boxed::Box;
use core::fmt;

use super::backend::{InterruptFlags, UartHardware};
use super::buffer::SerialBuffer;
use super::config::{Mode, UartId, UartOptions};

/// Data callback invoked from the interrupt handler.
///
/// Receives the port, the hardware (so raw-mode callbacks can drain the
/// FIFOs themselves) and the status bits that were not masked for this
/// event. It runs in interrupt context: it must not block.
pub type DataCallback =
    Box<dyn FnMut(&mut UartPort, &mut dyn UartHardware, InterruptFlags) + Send>;

/// Lifecycle hook registered per port identifier with
/// [`Uart::set_notify`](super::Uart::set_notify)
///
/// The port is passed mutably so a hook can service the virtual port's
/// buffers; nothing else moves data on [`UartId::Uart2`].
pub type NotifyCallback = Box<dyn FnMut(&mut UartPort, NotifyCode) + Send>;

/// Lifecycle events delivered to a [`NotifyCallback`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyCode {
    /// About to read from the receive buffer
    BeforeRead,
    /// Data was written (or queued)
    AfterWrite,
    /// Port is about to close
    BeforeClose,
    /// Port finished opening
    AfterOpen,
    /// Caller is about to wait for the transmitter to drain
    WaitTx,
}

/// A live, open port
pub struct UartPort {
    pub(super) id: UartId,
    pub(super) mode: Mode,
    pub(super) options: UartOptions,
    pub(super) baud_rate: u32,
    pub(super) tx_pin: Option<u8>,
    pub(super) rx_pin: Option<u8>,
    pub(super) rx_headroom: usize,
    pub(super) status: InterruptFlags,
    pub(super) rx_buffer: Option<SerialBuffer>,
    pub(super) tx_buffer: Option<SerialBuffer>,
    pub(super) callback: Option<DataCallback>,
}

impl UartPort {
    pub(super) fn new(id: UartId, mode: Mode, options: UartOptions, rx_headroom: usize) -> Self {
        Self {
            id,
            mode,
            options,
            baud_rate: 0,
            tx_pin: None,
            rx_pin: None,
            rx_headroom,
            status: InterruptFlags::empty(),
            rx_buffer: None,
            tx_buffer: None,
            callback: None,
        }
    }

    #[inline]
    pub fn id(&self) -> UartId {
        self.id
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn options(&self) -> UartOptions {
        self.options
    }

    #[inline]
    pub fn rx_enabled(&self) -> bool {
        self.mode.has_rx()
    }

    #[inline]
    pub fn tx_enabled(&self) -> bool {
        self.mode.has_tx()
    }

    /// Effective baud rate stored at the last programming; 0 for virtual ports
    #[inline]
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Current transmit pin, `None` without a transmit role or physical pins
    #[inline]
    pub fn tx_pin(&self) -> Option<u8> {
        self.tx_pin
    }

    #[inline]
    pub fn rx_pin(&self) -> Option<u8> {
        self.rx_pin
    }

    #[inline]
    pub fn rx_headroom(&self) -> usize {
        self.rx_headroom
    }

    /// Sticky flags accumulated since the last status read, without clearing them
    #[inline]
    pub fn pending_status(&self) -> InterruptFlags {
        self.status
    }

    pub fn rx_buffer(&self) -> Option<&SerialBuffer> {
        self.rx_buffer.as_ref()
    }

    /// Receive buffer, for raw-mode callbacks that drain the FIFO themselves
    pub fn rx_buffer_mut(&mut self) -> Option<&mut SerialBuffer> {
        self.rx_buffer.as_mut()
    }

    pub fn tx_buffer(&self) -> Option<&SerialBuffer> {
        self.tx_buffer.as_ref()
    }

    pub fn tx_buffer_mut(&mut self) -> Option<&mut SerialBuffer> {
        self.tx_buffer.as_mut()
    }

    /// Run the data callback, if any, with `status`.
    ///
    /// The callback is moved out for the duration of the call so it can
    /// borrow the port mutably.
    pub(super) fn invoke_callback(&mut self, hw: &mut dyn UartHardware, status: InterruptFlags) {
        if let Some(mut callback) = self.callback.take() {
            callback(self, hw, status);
            self.callback = Some(callback);
        }
    }
}

impl fmt::Debug for UartPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UartPort")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("options", &self.options)
            .field("baud_rate", &self.baud_rate)
            .field("tx_pin", &self.tx_pin)
            .field("rx_pin", &self.rx_pin)
            .field("rx_headroom", &self.rx_headroom)
            .field("status", &self.status)
            .field("rx_buffer", &self.rx_buffer)
            .field("tx_buffer", &self.tx_buffer)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
