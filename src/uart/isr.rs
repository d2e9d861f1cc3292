// src/uart/isr.rs

//! Interrupt service
//!
//! Both physical UARTs share one interrupt vector. [`Uart::handle_interrupt`]
//! services each of them in turn through [`service_port`], which touches only
//! the registers of its own port and the fields of its own instance. Nothing
//! here blocks, allocates or logs.

use super::backend::{InterruptFlags, UartHardware};
use super::config::{UartId, UartOptions};
use super::port::UartPort;
use super::registry::Uart;
use crate::constants::UART_TX_FIFO_SIZE;
use crate::sync::{InterruptController, IrqMutex};

/// Driver shared between mainline code and the interrupt vector
pub type SharedUart<H, C> = IrqMutex<Uart<H>, C>;

impl<H: UartHardware> Uart<H> {
    /// Service every physical port. Call from the UART interrupt vector.
    pub fn handle_interrupt(&mut self) {
        for id in UartId::PHYSICAL {
            let idx = id.index();
            let armed = self.isr_enabled(id);
            service_port(&mut self.hw, idx, self.ports[idx].as_mut(), armed);
        }
    }

    /// Feed the watchdog and run pending interrupt service.
    ///
    /// Used by the waiting paths: a caller holding the driver cannot be
    /// preempted by the real handler, so it services the hardware itself.
    pub(super) fn idle(&mut self) {
        self.hw.feed_watchdog();
        self.handle_interrupt();
    }
}

/// Interrupt entry point for a driver kept in a [`SharedUart`].
///
/// Returns `false` if the driver was busy and the event was left pending.
pub fn service_interrupt<H, C>(shared: &SharedUart<H, C>) -> bool
where
    H: UartHardware,
    C: InterruptController,
{
    shared.try_with(|uart| uart.handle_interrupt()).is_some()
}

/// Service one physical port.
///
/// `port` is the open instance for `nr`, if any; `armed` says whether the
/// driver enabled interrupts for it. Ports the driver does not own get all
/// their sources disabled.
pub fn service_port<H: UartHardware>(
    hw: &mut H,
    nr: usize,
    port: Option<&mut UartPort>,
    armed: bool,
) {
    let pending = hw.interrupt_status(nr);
    if pending.is_empty() {
        return;
    }

    let port = match port {
        Some(port) if armed => port,
        _ => {
            hw.set_interrupt_enable(nr, InterruptFlags::empty());
            return;
        }
    };

    let mut status = pending;
    if !port.options.contains(UartOptions::CALLBACK_RAW) {
        if pending.intersects(InterruptFlags::RX_EVENTS) {
            status = service_rx(hw, nr, port, pending, status);
        }
        if pending.contains(InterruptFlags::TXFIFO_EMPTY) {
            status = service_tx(hw, nr, port, status);
        }
    }

    port.status |= status;
    if !status.is_empty() {
        port.invoke_callback(hw, status);
    }

    hw.clear_interrupts(nr, pending);
}

/// Drain the receive FIFO into the buffer, returning the status to report
fn service_rx<H: UartHardware>(
    hw: &mut H,
    nr: usize,
    port: &mut UartPort,
    pending: InterruptFlags,
    mut status: InterruptFlags,
) -> InterruptFlags {
    let mut read = 0;
    if let Some(buffer) = port.rx_buffer.as_mut() {
        read = hw.rx_fifo_count(nr).min(buffer.free_space());
        for _ in 0..read {
            buffer.write(hw.read_fifo(nr));
        }
        // Coalesce: report FIFO-full only once the buffer is nearly full
        if buffer.free_space() >= port.rx_headroom {
            status.remove(InterruptFlags::RXFIFO_FULL);
        }
    }

    // Re-armed by read() or flush()
    if pending.contains(InterruptFlags::RXFIFO_OVERFLOW) {
        hw.disable_interrupts(nr, InterruptFlags::RXFIFO_OVERFLOW);
    } else if read == 0 {
        hw.disable_interrupts(nr, InterruptFlags::RXFIFO_FULL | InterruptFlags::RXFIFO_TIMEOUT);
    }
    status
}

/// Refill the transmit FIFO from the buffer, returning the status to report
fn service_tx<H: UartHardware>(
    hw: &mut H,
    nr: usize,
    port: &mut UartPort,
    mut status: InterruptFlags,
) -> InterruptFlags {
    if let Some(buffer) = port.tx_buffer.as_mut() {
        let count = tx_fifo_free(hw, nr).min(buffer.available());
        for _ in 0..count {
            match buffer.read() {
                Some(byte) => hw.write_fifo(nr, byte),
                None => break,
            }
        }
    }

    if hw.tx_fifo_count(nr) == 0 {
        // Re-armed by write()
        hw.disable_interrupts(nr, InterruptFlags::TXFIFO_EMPTY);
    } else {
        status.remove(InterruptFlags::TXFIFO_EMPTY);
    }
    status
}

/// Slots that can be written to the transmit FIFO without filling it
#[inline]
pub(super) fn tx_fifo_free<H: UartHardware + ?Sized>(hw: &H, nr: usize) -> usize {
    UART_TX_FIFO_SIZE.saturating_sub(hw.tx_fifo_count(nr) + 1)
}

#[inline]
pub(super) fn tx_fifo_full<H: UartHardware + ?Sized>(hw: &H, nr: usize) -> bool {
    hw.tx_fifo_count(nr) >= UART_TX_FIFO_SIZE - 1
}
