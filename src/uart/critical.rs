// src/uart/critical.rs

//! Scoped masking of the shared UART interrupt
//!
//! Mainline code that needs a consistent view of state the interrupt handler
//! also mutates (buffer counts, sticky status, enable bits) holds a
//! [`CriticalSection`] for the duration. The interrupt is masked when the
//! outermost guard is created and unmasked when it drops, on every exit path.

use core::fmt;
use core::ops::{Deref, DerefMut};

use super::backend::UartHardware;
use super::registry::Uart;

/// RAII guard with the UART interrupt masked.
///
/// Dereferences to the driver, so any driver call can be made while it is
/// held. Guards nest; only the outermost one touches the interrupt mask.
/// On release the interrupt is unmasked only if some port is still armed.
pub struct CriticalSection<'a, H: UartHardware> {
    uart: &'a mut Uart<H>,
}

impl<'a, H: UartHardware> CriticalSection<'a, H> {
    fn enter(uart: &'a mut Uart<H>) -> Self {
        if uart.cs_depth == 0 {
            uart.hw.mask_uart_interrupt();
        }
        uart.cs_depth += 1;
        Self { uart }
    }

    /// Armed-port bitmask at the time of the call
    pub fn isr_mask(&self) -> u8 {
        self.uart.isr_mask
    }
}

impl<H: UartHardware> Deref for CriticalSection<'_, H> {
    type Target = Uart<H>;

    fn deref(&self) -> &Uart<H> {
        self.uart
    }
}

impl<H: UartHardware> DerefMut for CriticalSection<'_, H> {
    fn deref_mut(&mut self) -> &mut Uart<H> {
        self.uart
    }
}

impl<H: UartHardware> Drop for CriticalSection<'_, H> {
    fn drop(&mut self) {
        self.uart.cs_depth -= 1;
        if self.uart.cs_depth == 0 && self.uart.isr_mask != 0 {
            self.uart.hw.unmask_uart_interrupt();
        }
    }
}

impl<H: UartHardware> fmt::Debug for CriticalSection<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriticalSection")
            .field("depth", &self.uart.cs_depth)
            .field("isr_mask", &self.uart.isr_mask)
            .finish()
    }
}

impl<H: UartHardware> Uart<H> {
    /// Mask the UART interrupt until the returned guard drops
    pub fn critical(&mut self) -> CriticalSection<'_, H> {
        CriticalSection::enter(self)
    }
}
