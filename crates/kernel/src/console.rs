//! The early kernel console: routes `log` records to attached writers.
//!
//! The console exists before any output device does. The boot sequence
//! installs it as the `log` backend first and attaches a serial writer (and,
//! later, a display writer) as each device comes up, so no early record is
//! lost to a missing device.

use core::sync::atomic::{AtomicBool, Ordering};

use log::LevelFilter;
use spin::{Mutex, Once};

use crate::serial::SerialWriter;

pub struct Console {
    has_output: AtomicBool,
    serial: Mutex<Option<SerialWriter>>,
}

static DEFAULT: Once<Console> = Once::new();

impl Console {
    /// Creates the console and installs it as the `log` backend.
    pub fn init() -> &'static Self {
        let console = Self::default();
        console.install();
        console
    }

    pub fn default() -> &'static Self {
        DEFAULT.call_once(|| Console {
            has_output: AtomicBool::new(false),
            serial: Mutex::new(None),
        })
    }

    pub fn install(&'static self) {
        log::set_logger(self).expect("logger installed twice");

        #[cfg(debug_assertions)]
        log::set_max_level(LevelFilter::Trace);

        #[cfg(not(debug_assertions))]
        log::set_max_level(LevelFilter::Info);
    }

    pub fn has_output(&self) -> bool {
        self.has_output.load(Ordering::SeqCst)
    }

    pub fn attach_serial(&self, serial: SerialWriter) {
        let mut guard = self.serial.lock();
        *guard = Some(serial);
        self.has_output.store(true, Ordering::SeqCst);
    }
}

impl log::Log for Console {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Some(serial) = &mut *self.serial.lock() {
            let _ = write_record(serial, record);
        }
    }

    fn flush(&self) {}
}

fn write_record(writer: &mut impl core::fmt::Write, record: &log::Record) -> core::fmt::Result {
    #[cfg(any(debug_assertions, feature = "detailed-logging"))]
    return writeln!(
        writer,
        "[{} {}:{} {}] {}",
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.target(),
        record.args()
    );
    #[cfg(not(any(debug_assertions, feature = "detailed-logging")))]
    return writeln!(writer, "[{:5}] {}", record.level(), record.args());
}
