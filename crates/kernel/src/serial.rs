//! UART backend for the early console.

use core::fmt::{self, Write};

use crate::console::Console;

/// I/O port of the primary UART (COM1).
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const COM1: u16 = 0x3F8;

pub struct SerialWriter {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    port: uart_16550::SerialPort,
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    port: uart_16550::MmioSerialPort,
}

impl Write for SerialWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.port.write_str(s)
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn init(console: &Console) {
    // SAFETY: COM1 is the standard primary UART port; nothing else drives it
    // this early in boot.
    let mut port = unsafe { uart_16550::SerialPort::new(COM1) };
    port.init();
    console.attach_serial(SerialWriter { port });
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub fn init(console: &Console, address: usize) {
    // SAFETY: The caller supplies the platform's UART MMIO base.
    let mut port = unsafe { uart_16550::MmioSerialPort::new(address) };
    port.init();
    console.attach_serial(SerialWriter { port });
}
