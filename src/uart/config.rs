// src/uart/config.rs

//! Port identifiers, capabilities and open-time configuration

use core::fmt;

use bitflags::bitflags;

use super::error::UartError;
use crate::constants::*;

/// Logical UART port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum UartId {
    /// Full-duplex port with swappable pins
    Uart0 = 0,
    /// Transmit-only port, typically used for debug output
    Uart1 = 1,
    /// Virtual port: own buffers, hardware shared with `Uart0`
    Uart2 = 2,
}

impl UartId {
    /// Every port identifier, in index order
    pub const ALL: [UartId; UART_COUNT] = [UartId::Uart0, UartId::Uart1, UartId::Uart2];

    /// Ports with hardware behind them, in the order the interrupt handler services them
    pub const PHYSICAL: [UartId; UART_PHYSICAL_COUNT] = [UartId::Uart0, UartId::Uart1];

    /// Index into per-port tables
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn is_physical(self) -> bool {
        self.index() < UART_PHYSICAL_COUNT
    }

    /// What this port's hardware can do
    pub const fn capabilities(self) -> PortCapabilities {
        match self {
            UartId::Uart0 => PortCapabilities {
                rx: true,
                tx: true,
                swappable: true,
            },
            // The interrupt handler has no receive path for UART1: its RX pad
            // is wired to the flash chip on every module.
            UartId::Uart1 => PortCapabilities {
                rx: false,
                tx: true,
                swappable: false,
            },
            UartId::Uart2 => PortCapabilities {
                rx: true,
                tx: true,
                swappable: false,
            },
        }
    }
}

impl fmt::Display for UartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UART{}", self.index())
    }
}

impl TryFrom<u8> for UartId {
    type Error = UartError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UartId::Uart0),
            1 => Ok(UartId::Uart1),
            2 => Ok(UartId::Uart2),
            _ => Err(UartError::InvalidPort),
        }
    }
}

/// Physical port whose hardware serves `id`.
///
/// The virtual port maps to `Uart0`; a physical port maps to itself.
#[inline]
pub const fn backing_port(id: UartId) -> UartId {
    match id {
        UartId::Uart2 => UartId::Uart0,
        other => other,
    }
}

/// Per-port hardware capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortCapabilities {
    /// Receive role supported
    pub rx: bool,
    /// Transmit role supported
    pub tx: bool,
    /// Pins can be reassigned (swap / alternate TX)
    pub swappable: bool,
}

impl PortCapabilities {
    /// Whether every role `mode` asks for is available
    pub const fn supports(&self, mode: Mode) -> bool {
        (!mode.has_rx() || self.rx) && (!mode.has_tx() || self.tx)
    }
}

/// Roles a port is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    RxOnly,
    TxOnly,
    #[default]
    Full,
}

impl Mode {
    #[inline]
    pub const fn has_rx(self) -> bool {
        !matches!(self, Mode::TxOnly)
    }

    #[inline]
    pub const fn has_tx(self) -> bool {
        !matches!(self, Mode::RxOnly)
    }
}

bitflags! {
    /// Driver behaviour options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UartOptions: u8 {
        /// Skip FIFO servicing in the interrupt handler and hand the raw
        /// interrupt status to the data callback
        const CALLBACK_RAW = 1 << 0;
        /// `write()` waits until every byte is queued instead of short-writing
        const TXWAIT = 1 << 1;
    }
}

/// Configuration passed to [`Uart::open`](super::Uart::open)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    pub id: UartId,
    pub mode: Mode,
    pub options: UartOptions,
    /// Receive buffer size; 0 reads straight from the FIFO
    pub rx_size: usize,
    /// Transmit buffer size; 0 writes straight to the FIFO
    pub tx_size: usize,
    /// Pre-encoded data/parity/stop bits for the control register
    pub format: u8,
    pub baud_rate: u32,
    /// Preferred transmit pin; only `Uart0` honours it (GPIO1 or GPIO2)
    pub tx_pin: Option<u8>,
    pub rx_headroom: usize,
}

impl UartConfig {
    /// Defaults for `id`
    pub const fn new(id: UartId) -> Self {
        Self {
            id,
            mode: Mode::Full,
            options: UartOptions::empty(),
            rx_size: DEFAULT_RX_BUFFER_SIZE,
            tx_size: DEFAULT_TX_BUFFER_SIZE,
            format: UART_8N1,
            baud_rate: DEFAULT_BAUD_RATE,
            tx_pin: None,
            rx_headroom: DEFAULT_RX_HEADROOM,
        }
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn with_options(mut self, options: UartOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn with_buffers(mut self, rx_size: usize, tx_size: usize) -> Self {
        self.rx_size = rx_size;
        self.tx_size = tx_size;
        self
    }

    #[must_use]
    pub const fn with_format(mut self, format: u8) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub const fn with_tx_pin(mut self, pin: u8) -> Self {
        self.tx_pin = Some(pin);
        self
    }

    #[must_use]
    pub const fn with_rx_headroom(mut self, headroom: usize) -> Self {
        self.rx_headroom = headroom;
        self
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::new(UartId::Uart0)
    }
}

/// FIFO interrupt thresholds, see [`Uart::intr_config`](super::Uart::intr_config)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrConfig {
    /// Receive FIFO level that raises FIFO-full (unbuffered receivers only)
    pub rxfifo_full_thresh: u8,
    /// Symbol periods of silence before the receive timeout fires
    pub rx_timeout_thresh: u8,
    /// Transmit FIFO level at or below which FIFO-empty fires
    pub txfifo_empty_intr_thresh: u8,
}

impl Default for IntrConfig {
    fn default() -> Self {
        Self {
            rxfifo_full_thresh: RX_FIFO_FULL_THRESHOLD,
            rx_timeout_thresh: RX_TIMEOUT_THRESHOLD,
            txfifo_empty_intr_thresh: 0,
        }
    }
}
