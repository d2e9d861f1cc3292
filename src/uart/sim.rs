// src/uart/sim.rs

//! In-memory UART hardware for host-side testing
//!
//! [`SimulatedUart`] models the registers the driver touches: FIFOs,
//! raw/enabled interrupt bits, control and FIFO configuration registers,
//! clock divider, pad functions and the UART0 swap bit. Tests play the
//! remote end with [`receive`](SimulatedUart::receive),
//! [`transmit`](SimulatedUart::transmit) and
//! [`raise`](SimulatedUart::raise), then call
//! [`Uart::handle_interrupt`](super::Uart::handle_interrupt) where the real
//! interrupt would fire.
//!
//! FIFO-full and FIFO-empty are level conditions: they are re-evaluated
//! whenever FIFO contents or thresholds change and after every clear.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

use super::backend::{ControlFlags, InterruptFlags, PinFunction, UartHardware};
use super::constants::conf1;
use crate::constants::*;

#[derive(Debug, Clone, Default)]
struct SimPort {
    rx_fifo: VecDeque<u8>,
    tx_fifo: VecDeque<u8>,
    raw: InterruptFlags,
    enable: InterruptFlags,
    control: u32,
    fifo_config: u32,
    divider: u32,
    wire: Vec<u8>,
    loopback: bool,
}

impl SimPort {
    fn rx_threshold(&self) -> usize {
        ((self.fifo_config >> conf1::RXFIFO_FULL_THRHD_S) & u32::from(UART_THRESHOLD_MAX)) as usize
    }

    fn tx_threshold(&self) -> usize {
        ((self.fifo_config >> conf1::TXFIFO_EMPTY_THRHD_S) & u32::from(UART_THRESHOLD_MAX)) as usize
    }

    fn update_levels(&mut self) {
        if self.rx_fifo.len() > self.rx_threshold() {
            self.raw |= InterruptFlags::RXFIFO_FULL;
        }
        if self.tx_fifo.len() <= self.tx_threshold() {
            self.raw |= InterruptFlags::TXFIFO_EMPTY;
        }
    }

    fn push_rx(&mut self, byte: u8) -> bool {
        if self.rx_fifo.len() >= UART_RX_FIFO_SIZE {
            self.raw |= InterruptFlags::RXFIFO_OVERFLOW;
            return false;
        }
        self.rx_fifo.push_back(byte);
        true
    }
}

/// Pad-level write, in the order the driver issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Select(u8, PinFunction),
    Swap(bool),
}

/// Simulated register file for both physical UARTs
#[derive(Debug, Clone, Default)]
pub struct SimulatedUart {
    ports: [SimPort; UART_PHYSICAL_COUNT],
    pins: BTreeMap<u8, PinFunction>,
    pin_events: Vec<PinEvent>,
    swapped: bool,
    masked: bool,
    handler_attached: usize,
    watchdog_feeds: usize,
    os_print: bool,
    drain_on_feed: bool,
}

impl SimulatedUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes arriving on the wire; those beyond the FIFO depth are lost and
    /// raise overflow. Returns how many landed in the FIFO.
    pub fn receive(&mut self, port: usize, data: &[u8]) -> usize {
        let sim = &mut self.ports[port];
        let accepted = data.iter().filter(|&&byte| sim.push_rx(byte)).count();
        sim.update_levels();
        accepted
    }

    /// Latch interrupt conditions the model does not generate itself
    /// (timeout, break, framing/parity errors)
    pub fn raise(&mut self, port: usize, flags: InterruptFlags) {
        self.ports[port].raw |= flags;
    }

    /// Shift up to `count` bytes out of the transmit FIFO onto the wire.
    ///
    /// With loopback enabled they are received back on the same port.
    pub fn transmit(&mut self, port: usize, count: usize) -> usize {
        let sim = &mut self.ports[port];
        let count = count.min(sim.tx_fifo.len());
        for _ in 0..count {
            if let Some(byte) = sim.tx_fifo.pop_front() {
                sim.wire.push(byte);
                if sim.loopback {
                    sim.push_rx(byte);
                }
            }
        }
        sim.update_levels();
        count
    }

    /// Everything transmitted so far
    pub fn wire(&self, port: usize) -> &[u8] {
        &self.ports[port].wire
    }

    pub fn take_wire(&mut self, port: usize) -> Vec<u8> {
        core::mem::take(&mut self.ports[port].wire)
    }

    /// Connect TX back to RX on `port`
    pub fn set_loopback(&mut self, port: usize, enabled: bool) {
        self.ports[port].loopback = enabled;
    }

    /// Empty every transmit FIFO on each watchdog feed, standing in for the
    /// wire while the driver busy-waits
    pub fn set_drain_on_feed(&mut self, enabled: bool) {
        self.drain_on_feed = enabled;
    }

    /// Put `count` filler bytes in the transmit FIFO, as if a previous
    /// write had not gone out yet
    pub fn fill_tx_fifo(&mut self, port: usize, count: usize) {
        let sim = &mut self.ports[port];
        sim.tx_fifo.extend(core::iter::repeat_n(0xff, count));
        sim.tx_fifo.truncate(UART_TX_FIFO_SIZE);
    }

    pub fn tx_fifo(&self, port: usize) -> Vec<u8> {
        self.ports[port].tx_fifo.iter().copied().collect()
    }

    pub fn tx_fifo_len(&self, port: usize) -> usize {
        self.ports[port].tx_fifo.len()
    }

    pub fn rx_fifo_len(&self, port: usize) -> usize {
        self.ports[port].rx_fifo.len()
    }

    /// Raw interrupt bits, regardless of enable state
    pub fn raw(&self, port: usize) -> InterruptFlags {
        self.ports[port].raw
    }

    pub fn fifo_config(&self, port: usize) -> u32 {
        self.ports[port].fifo_config
    }

    pub fn clock_divider(&self, port: usize) -> u32 {
        self.ports[port].divider
    }

    pub fn pin_function(&self, pin: u8) -> Option<PinFunction> {
        self.pins.get(&pin).copied()
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    /// Pad selections and swap-bit writes since the last
    /// [`take_pin_events`](Self::take_pin_events)
    pub fn take_pin_events(&mut self) -> Vec<PinEvent> {
        core::mem::take(&mut self.pin_events)
    }

    /// Whether the shared UART interrupt is masked at the controller
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// How many times a handler was attached
    pub fn handler_attached(&self) -> usize {
        self.handler_attached
    }

    pub fn watchdog_feeds(&self) -> usize {
        self.watchdog_feeds
    }

    pub fn os_print(&self) -> bool {
        self.os_print
    }
}

impl UartHardware for SimulatedUart {
    fn rx_fifo_count(&self, port: usize) -> usize {
        self.ports[port].rx_fifo.len()
    }

    fn tx_fifo_count(&self, port: usize) -> usize {
        self.ports[port].tx_fifo.len()
    }

    fn read_fifo(&mut self, port: usize) -> u8 {
        self.ports[port].rx_fifo.pop_front().unwrap_or(0)
    }

    fn write_fifo(&mut self, port: usize, byte: u8) {
        let sim = &mut self.ports[port];
        if sim.tx_fifo.len() < UART_TX_FIFO_SIZE {
            sim.tx_fifo.push_back(byte);
        }
    }

    fn interrupt_status(&self, port: usize) -> InterruptFlags {
        self.ports[port].raw & self.ports[port].enable
    }

    fn raw_interrupt_status(&self, port: usize) -> InterruptFlags {
        self.ports[port].raw
    }

    fn interrupt_enable(&self, port: usize) -> InterruptFlags {
        self.ports[port].enable
    }

    fn set_interrupt_enable(&mut self, port: usize, flags: InterruptFlags) {
        self.ports[port].enable = flags;
    }

    fn clear_interrupts(&mut self, port: usize, flags: InterruptFlags) {
        let sim = &mut self.ports[port];
        sim.raw.remove(flags);
        sim.update_levels();
    }

    fn control(&self, port: usize) -> u32 {
        self.ports[port].control
    }

    fn set_control(&mut self, port: usize, value: u32) {
        let sim = &mut self.ports[port];
        sim.control = value;
        let control = ControlFlags::from_bits_truncate(value);
        if control.contains(ControlFlags::RXFIFO_RESET) {
            sim.rx_fifo.clear();
        }
        if control.contains(ControlFlags::TXFIFO_RESET) {
            sim.tx_fifo.clear();
        }
    }

    fn write_fifo_config(&mut self, port: usize, value: u32) {
        let sim = &mut self.ports[port];
        sim.fifo_config = value;
        sim.update_levels();
    }

    fn write_clock_divider(&mut self, port: usize, divider: u32) {
        self.ports[port].divider = divider;
    }

    fn clock_frequency(&self) -> u32 {
        UART_CLK_FREQ
    }

    fn select_pin(&mut self, pin: u8, function: PinFunction) {
        self.pins.insert(pin, function);
        self.pin_events.push(PinEvent::Select(pin, function));
    }

    fn set_pin_swap(&mut self, swapped: bool) {
        self.swapped = swapped;
        self.pin_events.push(PinEvent::Swap(swapped));
    }

    fn mask_uart_interrupt(&mut self) {
        self.masked = true;
    }

    fn unmask_uart_interrupt(&mut self) {
        self.masked = false;
    }

    fn attach_handler(&mut self) {
        self.handler_attached += 1;
    }

    fn feed_watchdog(&mut self) {
        self.watchdog_feeds += 1;
        if self.drain_on_feed {
            for port in 0..UART_PHYSICAL_COUNT {
                self.transmit(port, usize::MAX);
            }
        }
    }

    fn set_os_print(&mut self, enabled: bool) {
        self.os_print = enabled;
    }
}
