// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART debug console and the `log` sink built on it.
//!
//! USART3 (PD8/PD9) is wired to the ST-LINK virtual COM port. Once [`init_logger`] has run, every
//! `log` record is written as `[LEVEL] target: message` with a CRLF terminator.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* 115200
//! ```
//!
//! To close the debug terminal, press `Ctrl+A` then `Ctrl+\` then `y`.

use core::cell::RefCell;
use core::fmt::{self, Write as _};

use cortex_m::interrupt::{self, Mutex};
use log::{LevelFilter, Log, Metadata, Record};
use nb::block;
use stm32f7xx_hal::{
    pac,
    prelude::*,
    serial::{Instance, Pins, Serial, Tx},
};

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}

pub type Console = Usart<pac::USART3>;

struct SerialLogger {
    console: Mutex<RefCell<Option<Console>>>,
}

static LOGGER: SerialLogger = SerialLogger {
    console: Mutex::new(RefCell::new(None)),
};

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        interrupt::free(|cs| {
            if let Some(console) = self.console.borrow(cs).borrow_mut().as_mut() {
                let _ = write!(console, "[{}] {}: {}\r\n", record.level(), record.target(), record.args());
            }
        });
    }

    fn flush(&self) {
        interrupt::free(|cs| {
            if let Some(console) = self.console.borrow(cs).borrow_mut().as_mut() {
                console.flush();
            }
        });
    }
}

/// Route `log` output to `console`. Only the first call installs the logger.
pub fn init_logger(console: Console, level: LevelFilter) {
    interrupt::free(|cs| LOGGER.console.borrow(cs).replace(Some(console)));
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
