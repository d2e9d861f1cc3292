// src/uart/pins.rs

//! Pin multiplexer and the UART0 swap state machine
//!
//! UART0 has two pin sets: the default one (TX on GPIO1, or GPIO2 as an
//! alternate, RX on GPIO3) and the swapped one (TX on GPIO15, RX on GPIO13)
//! selected by a control bit. UART1 transmits on GPIO2 only. The virtual port
//! has no pins.

use log::trace;

use super::backend::{PinFunction, UartHardware};
use super::config::UartId;
use super::constants::pin;
use super::error::{UartError, UartResult};
use super::registry::Uart;

/// Pin set a port is currently routed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinSet {
    Default,
    Swapped,
}

impl PinSet {
    /// Pin set implied by a port's current assignment
    fn of(tx_pin: Option<u8>, rx_pin: Option<u8>) -> Self {
        if tx_pin == Some(pin::UART0_SWAP_TX) || rx_pin == Some(pin::UART0_SWAP_RX) {
            PinSet::Swapped
        } else {
            PinSet::Default
        }
    }
}

/// UART function for `gpio` on port `id`, if the pad can carry one
fn uart_function(id: UartId, gpio: u8) -> Option<PinFunction> {
    match (id, gpio) {
        (UartId::Uart0, pin::UART0_TX) => Some(PinFunction::Uart0Txd),
        (UartId::Uart0, pin::UART0_TX_ALT) => Some(PinFunction::Uart0TxdAlt),
        (UartId::Uart0, pin::UART0_RX) => Some(PinFunction::Uart0Rxd),
        (UartId::Uart0, pin::UART0_SWAP_RX) => Some(PinFunction::Uart0Cts),
        (UartId::Uart0, pin::UART0_SWAP_TX) => Some(PinFunction::Uart0Rts),
        (UartId::Uart1, pin::UART1_TX) => Some(PinFunction::Uart1Txd),
        _ => None,
    }
}

/// Default-set transmit pin for a requested one
const fn default_tx(requested: u8) -> u8 {
    if requested == pin::UART0_TX_ALT {
        pin::UART0_TX_ALT
    } else {
        pin::UART0_TX
    }
}

impl<H: UartHardware> Uart<H> {
    pub(super) fn select_pins(&mut self, id: UartId, tx_pin: Option<u8>, rx_pin: Option<u8>) {
        for gpio in [tx_pin, rx_pin].into_iter().flatten() {
            if let Some(function) = uart_function(id, gpio) {
                self.hw.select_pin(gpio, function);
            }
        }
    }

    /// Return pads to plain GPIO
    pub(super) fn restore_pins(&mut self, id: UartId, tx_pin: Option<u8>, rx_pin: Option<u8>) {
        for gpio in [rx_pin, tx_pin].into_iter().flatten() {
            if uart_function(id, gpio).is_some() {
                self.hw.select_pin(gpio, PinFunction::Gpio);
            }
        }
    }

    /// Toggle UART0 between its default and swapped pin sets.
    ///
    /// From the default set, both roles move to the swapped pins. From the
    /// swapped set, they move back; `tx_pin` picks GPIO2 or GPIO1 for
    /// transmit.
    ///
    /// # Errors
    ///
    /// - `NotOpen` if the port is not open
    /// - `InvalidPinCombination` if the port's pins cannot be swapped
    pub fn swap(&mut self, id: UartId, tx_pin: u8) -> UartResult<()> {
        let port = self.open_port(id)?;
        if !id.capabilities().swappable {
            return Err(UartError::InvalidPinCombination);
        }

        let (old_tx, old_rx) = (port.tx_pin, port.rx_pin);
        let (tx_role, rx_role) = (port.tx_enabled(), port.rx_enabled());
        self.restore_pins(id, old_tx, old_rx);

        let target = match PinSet::of(old_tx, old_rx) {
            PinSet::Default => PinSet::Swapped,
            PinSet::Swapped => PinSet::Default,
        };
        let (new_tx, new_rx) = match target {
            PinSet::Swapped => (pin::UART0_SWAP_TX, pin::UART0_SWAP_RX),
            PinSet::Default => (default_tx(tx_pin), pin::UART0_RX),
        };
        let new_tx = if tx_role { Some(new_tx) } else { old_tx };
        let new_rx = if rx_role { Some(new_rx) } else { old_rx };

        self.select_pins(id, new_tx, new_rx);
        self.hw.set_pin_swap(target == PinSet::Swapped);
        let port = self.open_port_mut(id)?;
        port.tx_pin = new_tx;
        port.rx_pin = new_rx;

        trace!("{}: pins {:?} (tx {:?}, rx {:?})", id, target, new_tx, new_rx);
        Ok(())
    }

    /// Move UART0's transmit pin between GPIO1 and GPIO2 without swapping.
    ///
    /// # Errors
    ///
    /// - `NotOpen` if the port is not open
    /// - `RoleDisabled` if the port does not transmit
    /// - `InvalidPinCombination` for any other port, pin, or while swapped
    pub fn set_tx(&mut self, id: UartId, tx_pin: u8) -> UartResult<()> {
        let port = self.open_port(id)?;
        if !port.tx_enabled() {
            return Err(UartError::RoleDisabled);
        }
        if !id.capabilities().swappable
            || !matches!(tx_pin, pin::UART0_TX | pin::UART0_TX_ALT)
            || PinSet::of(port.tx_pin, port.rx_pin) == PinSet::Swapped
        {
            return Err(UartError::InvalidPinCombination);
        }

        let old_tx = port.tx_pin;
        self.restore_pins(id, old_tx, None);
        self.select_pins(id, Some(tx_pin), None);
        self.open_port_mut(id)?.tx_pin = Some(tx_pin);
        Ok(())
    }

    /// Route UART0 to an explicit pin pair.
    ///
    /// Valid pairs are (1 or 2, 3) for the default set and (15, 13) for the
    /// swapped set. The whole request is validated first; a rejected one
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// - `NotOpen` if the port is not open
    /// - `InvalidPinCombination` if the pair is not routable on this port
    pub fn set_pins(&mut self, id: UartId, tx_pin: u8, rx_pin: u8) -> UartResult<()> {
        let port = self.open_port(id)?;
        if !id.capabilities().swappable {
            return Err(UartError::InvalidPinCombination);
        }
        let target = match (tx_pin, rx_pin) {
            (pin::UART0_SWAP_TX, pin::UART0_SWAP_RX) => PinSet::Swapped,
            (pin::UART0_TX | pin::UART0_TX_ALT, pin::UART0_RX) => PinSet::Default,
            _ => return Err(UartError::InvalidPinCombination),
        };

        let current = PinSet::of(port.tx_pin, port.rx_pin);
        let tx_role = port.tx_enabled();
        let current_tx = port.tx_pin;

        if current != target {
            self.swap(id, tx_pin)
        } else if target == PinSet::Default && tx_role && current_tx != Some(tx_pin) {
            self.set_tx(id, tx_pin)
        } else {
            Ok(())
        }
    }

    /// Current transmit pin of an open port
    pub fn tx_pin(&self, id: UartId) -> Option<u8> {
        self.port(id)?.tx_pin()
    }

    /// Current receive pin of an open port
    pub fn rx_pin(&self, id: UartId) -> Option<u8> {
        self.port(id)?.rx_pin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::{Mode, PinEvent, SimulatedUart, UartConfig};

    fn open(mode: Mode) -> Uart<SimulatedUart> {
        let mut uart = Uart::new(SimulatedUart::new());
        uart.open(&UartConfig::new(UartId::Uart0).with_mode(mode)).unwrap();
        uart
    }

    #[test]
    fn test_swap_moves_both_roles() {
        let mut uart = open(Mode::Full);
        uart.swap(UartId::Uart0, 15).unwrap();
        assert_eq!(uart.tx_pin(UartId::Uart0), Some(15));
        assert_eq!(uart.rx_pin(UartId::Uart0), Some(13));
        assert!(uart.hardware().is_swapped());
        assert_eq!(uart.hardware().pin_function(1), Some(PinFunction::Gpio));
        assert_eq!(uart.hardware().pin_function(15), Some(PinFunction::Uart0Rts));
    }

    #[test]
    fn test_swap_bit_follows_pad_selection() {
        let mut uart = open(Mode::Full);
        uart.hardware_mut().take_pin_events();

        uart.swap(UartId::Uart0, 15).unwrap();
        assert_eq!(
            uart.hardware_mut().take_pin_events(),
            [
                PinEvent::Select(3, PinFunction::Gpio),
                PinEvent::Select(1, PinFunction::Gpio),
                PinEvent::Select(15, PinFunction::Uart0Rts),
                PinEvent::Select(13, PinFunction::Uart0Cts),
                PinEvent::Swap(true),
            ]
        );

        uart.swap(UartId::Uart0, 1).unwrap();
        let events = uart.hardware_mut().take_pin_events();
        assert_eq!(events.last(), Some(&PinEvent::Swap(false)));
        assert_eq!(events.iter().filter(|event| matches!(event, PinEvent::Swap(_))).count(), 1);
    }

    #[test]
    fn test_swap_back_to_alternate_tx() {
        let mut uart = open(Mode::Full);
        uart.swap(UartId::Uart0, 15).unwrap();
        uart.swap(UartId::Uart0, 2).unwrap();
        assert_eq!(uart.tx_pin(UartId::Uart0), Some(2));
        assert_eq!(uart.rx_pin(UartId::Uart0), Some(3));
        assert!(!uart.hardware().is_swapped());
    }

    #[test]
    fn test_swap_tx_only_leaves_rx_unset() {
        let mut uart = open(Mode::TxOnly);
        uart.swap(UartId::Uart0, 15).unwrap();
        assert_eq!(uart.tx_pin(UartId::Uart0), Some(15));
        assert_eq!(uart.rx_pin(UartId::Uart0), None);
    }

    #[test]
    fn test_set_tx_alternate() {
        let mut uart = open(Mode::Full);
        uart.set_tx(UartId::Uart0, 2).unwrap();
        assert_eq!(uart.tx_pin(UartId::Uart0), Some(2));
        assert_eq!(uart.hardware().pin_function(1), Some(PinFunction::Gpio));
        assert_eq!(uart.hardware().pin_function(2), Some(PinFunction::Uart0TxdAlt));
        assert_eq!(uart.set_tx(UartId::Uart0, 7), Err(UartError::InvalidPinCombination));
    }

    #[test]
    fn test_set_pins_rejects_mixed_sets() {
        let mut uart = open(Mode::Full);
        assert_eq!(uart.set_pins(UartId::Uart0, 15, 3), Err(UartError::InvalidPinCombination));
        assert_eq!(uart.tx_pin(UartId::Uart0), Some(1));
        assert_eq!(uart.rx_pin(UartId::Uart0), Some(3));
        assert!(!uart.hardware().is_swapped());
    }

    #[test]
    fn test_set_pins_applies_swap_and_alternate() {
        let mut uart = open(Mode::Full);
        uart.set_pins(UartId::Uart0, 15, 13).unwrap();
        assert_eq!(uart.tx_pin(UartId::Uart0), Some(15));
        uart.set_pins(UartId::Uart0, 2, 3).unwrap();
        assert_eq!(uart.tx_pin(UartId::Uart0), Some(2));
        assert_eq!(uart.rx_pin(UartId::Uart0), Some(3));
        uart.set_pins(UartId::Uart0, 1, 3).unwrap();
        assert_eq!(uart.tx_pin(UartId::Uart0), Some(1));
    }

    #[test]
    fn test_uart1_pins_are_fixed() {
        let mut uart = Uart::new(SimulatedUart::new());
        uart.open(&UartConfig::new(UartId::Uart1).with_mode(Mode::TxOnly))
            .unwrap();
        assert_eq!(uart.tx_pin(UartId::Uart1), Some(2));
        assert_eq!(uart.swap(UartId::Uart1, 15), Err(UartError::InvalidPinCombination));
        assert_eq!(uart.set_pins(UartId::Uart1, 2, 3), Err(UartError::InvalidPinCombination));
    }
}
