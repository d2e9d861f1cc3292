// src/uart/constants.rs

//! Register field layouts and GPIO numbers used by the UART driver

/// CONF1 (FIFO configuration) field layout
pub mod conf1 {
    pub const RXFIFO_FULL_THRHD_S: u32 = 0;
    pub const TXFIFO_EMPTY_THRHD_S: u32 = 8;
    pub const RX_TOUT_THRHD_S: u32 = 24;
    pub const RX_TOUT_EN: u32 = 1 << 31;
}

/// Mask covering the pre-encoded line format in CONF0
pub const FORMAT_MASK: u32 = 0xff;

/// GPIO numbers routable to the UARTs
pub mod pin {
    /// UART0 default transmit pin
    pub const UART0_TX: u8 = 1;
    /// UART0 alternate transmit pin, also UART1's only transmit pin
    pub const UART0_TX_ALT: u8 = 2;
    /// UART0 default receive pin
    pub const UART0_RX: u8 = 3;
    /// UART0 swapped receive pin (CTS pad)
    pub const UART0_SWAP_RX: u8 = 13;
    /// UART0 swapped transmit pin (RTS pad)
    pub const UART0_SWAP_TX: u8 = 15;
    /// UART1 transmit pin
    pub const UART1_TX: u8 = 2;
}
