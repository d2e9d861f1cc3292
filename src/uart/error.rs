// src/uart/error.rs

//! Error types for UART operations
//!
//! Only configuration problems and resource exhaustion are errors. Hardware
//! line conditions (overflow, framing, parity, break) are reported through
//! the sticky status flags, and short writes through the returned count.

use core::fmt;

/// Result alias used throughout the driver
pub type UartResult<T> = Result<T, UartError>;

/// UART driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    /// Port identifier already has a live instance
    AlreadyInitialized,
    /// Raw port number does not name a port
    InvalidPort,
    /// Requested mode needs a role this port cannot provide
    UnsupportedMode,
    /// Buffer requested with zero capacity
    ZeroCapacity,
    /// Buffer allocation failed
    OutOfMemory,
    /// Baud rate is zero or below what the clock divider can reach
    UnreachableBaudRate,
    /// Pin combination is not routable for this port
    InvalidPinCombination,
    /// Port is not open
    NotOpen,
    /// Operation needs a role (receive or transmit) the port was opened without
    RoleDisabled,
}

impl UartError {
    /// Short lowercase description
    pub const fn as_str(&self) -> &'static str {
        match self {
            UartError::AlreadyInitialized => "already initialized",
            UartError::InvalidPort => "invalid port",
            UartError::UnsupportedMode => "unsupported mode",
            UartError::ZeroCapacity => "zero capacity buffer",
            UartError::OutOfMemory => "out of memory",
            UartError::UnreachableBaudRate => "unreachable baud rate",
            UartError::InvalidPinCombination => "invalid pin combination",
            UartError::NotOpen => "port not open",
            UartError::RoleDisabled => "role disabled",
        }
    }

    /// True for errors caused by the caller's configuration
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        !matches!(self, UartError::OutOfMemory)
    }
}

impl fmt::Display for UartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Helper trait for error context
pub trait ErrorContext {
    /// Get a detailed description of the error
    fn context(&self) -> &'static str;
}

impl ErrorContext for UartError {
    fn context(&self) -> &'static str {
        match self {
            UartError::AlreadyInitialized => {
                "UART port cannot be opened twice without closing it"
            }
            UartError::InvalidPort => "Port number is outside the range of known UARTs",
            UartError::UnsupportedMode => {
                "This UART cannot provide the requested receive/transmit role"
            }
            UartError::ZeroCapacity => "Serial buffers must hold at least one byte",
            UartError::OutOfMemory => "Could not allocate UART buffer memory",
            UartError::UnreachableBaudRate => {
                "Baud rate cannot be derived from the reference clock"
            }
            UartError::InvalidPinCombination => {
                "Requested TX/RX pins cannot be routed to this UART"
            }
            UartError::NotOpen => "UART port must be opened before use",
            UartError::RoleDisabled => "UART port was opened without the role this call needs",
        }
    }
}
