//! Driver shared with an interrupt vector, masking and debug routing

use core::fmt::Write;

use tiny_uart::sync::NoInterruptController;
use tiny_uart::uart::timeout::TimeoutConfig;
use tiny_uart::uart::{
    service_interrupt, InterruptFlags, Mode, PinFunction, SharedUart, SimulatedUart, Uart,
    UartConfig, UartId,
};

type Shared = SharedUart<SimulatedUart, NoInterruptController>;

fn shared() -> Shared {
    let shared = Shared::new(Uart::new(SimulatedUart::new()));
    shared.with(|uart| uart.open(&UartConfig::new(UartId::Uart0).with_buffers(64, 0)))
        .unwrap();
    shared
}

#[test]
fn interrupt_entry_services_shared_driver() {
    let shared = shared();
    shared.with(|uart| {
        uart.hardware_mut().receive(0, b"irq");
        uart.hardware_mut().raise(0, InterruptFlags::RXFIFO_TIMEOUT);
    });

    assert!(service_interrupt(&shared));

    shared.with(|uart| {
        assert_eq!(uart.hardware().rx_fifo_len(0), 0);
        assert_eq!(uart.peek_char(UartId::Uart0), Some(b'i'));
        let mut buf = [0u8; 3];
        assert_eq!(uart.read(UartId::Uart0, &mut buf), 3);
        assert_eq!(&buf, b"irq");
    });
}

#[test]
fn interrupt_entry_backs_off_while_mainline_holds_driver() {
    let shared = shared();
    let serviced = shared.with(|uart| {
        uart.hardware_mut().receive(0, b"later");
        uart.hardware_mut().raise(0, InterruptFlags::RXFIFO_TIMEOUT);
        service_interrupt(&shared)
    });
    assert!(!serviced);

    // The event stays pending for the next entry
    assert!(service_interrupt(&shared));
    assert_eq!(shared.with(|uart| uart.rx_available(UartId::Uart0)), 5);
}

#[test]
fn read_with_timeout_services_pending_interrupts() {
    let shared = shared();
    let result = shared.with(|uart| {
        uart.hardware_mut().receive(0, b"ok");
        uart.hardware_mut().raise(0, InterruptFlags::RXFIFO_TIMEOUT);
        let mut buf = [0u8; 8];
        uart.read_with_timeout(UartId::Uart0, &mut buf, TimeoutConfig::short_timeout())
    });
    assert_eq!(result, Ok(2));
}

#[test]
fn critical_section_masks_for_its_lifetime() {
    let mut uart = Uart::new(SimulatedUart::new());
    uart.open(&UartConfig::new(UartId::Uart0)).unwrap();
    assert!(!uart.hardware().is_masked());

    {
        let mut cs = uart.critical();
        assert!(cs.hardware().is_masked());
        assert_eq!(cs.isr_mask(), 0b01);
        // Driver calls nest their own sections inside this one
        cs.write(UartId::Uart0, b"x");
        assert!(cs.hardware().is_masked());
    }
    assert!(!uart.hardware().is_masked());
}

#[test]
fn swap_twice_restores_default_pins() {
    let mut uart = Uart::new(SimulatedUart::new());
    uart.open(&UartConfig::new(UartId::Uart0)).unwrap();

    uart.swap(UartId::Uart0, 1).unwrap();
    assert_eq!(uart.tx_pin(UartId::Uart0), Some(15));
    assert_eq!(uart.rx_pin(UartId::Uart0), Some(13));
    assert_eq!(uart.hardware().pin_function(3), Some(PinFunction::Gpio));

    uart.swap(UartId::Uart0, 1).unwrap();
    assert_eq!(uart.tx_pin(UartId::Uart0), Some(1));
    assert_eq!(uart.rx_pin(UartId::Uart0), Some(3));
    assert!(!uart.hardware().is_swapped());
    assert_eq!(uart.hardware().pin_function(1), Some(PinFunction::Uart0Txd));
    assert_eq!(uart.hardware().pin_function(3), Some(PinFunction::Uart0Rxd));
    assert_eq!(uart.hardware().pin_function(15), Some(PinFunction::Gpio));
    assert_eq!(uart.hardware().pin_function(13), Some(PinFunction::Gpio));

    // Data still flows after the round trip
    uart.write(UartId::Uart0, b"ok");
    assert_eq!(uart.hardware().tx_fifo(0), b"ok");
}

#[test]
fn debug_output_follows_selected_port() {
    let mut uart = Uart::new(SimulatedUart::new());
    uart.set_debug(Some(UartId::Uart1));
    assert!(uart.hardware().os_print());

    // Not open yet: output is dropped
    uart.debug_putc(b'?');
    assert!(uart.hardware().tx_fifo(1).is_empty());

    uart.open(&UartConfig::new(UartId::Uart1).with_mode(Mode::TxOnly))
        .unwrap();
    uart.open(&UartConfig::new(UartId::Uart0)).unwrap();
    writeln!(uart.debug_writer(), "up {}", 1).unwrap();
    assert_eq!(uart.hardware().tx_fifo(1), b"up 1\n");
    assert!(uart.hardware().tx_fifo(0).is_empty());

    uart.set_debug(None);
    uart.debug_putc(b'!');
    assert_eq!(uart.hardware().tx_fifo(1), b"up 1\n");
    assert!(!uart.hardware().os_print());
}
