// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! HD44780 16x2 character LCD behind a PCF8574 I2C backpack, driven in 4-bit mode.
//!
//! Expander bit layout: P0 = RS, P1 = RW, P2 = EN, P3 = backlight, P4..P7 = D4..D7.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::i2c::Write;

use crate::error::LcdError;
use crate::io::Display;

/// Default backpack address with A0..A2 pulled high.
pub const DEFAULT_ADDRESS: u8 = 0x27;

pub const COLUMNS: usize = 16;

pub mod bits {
    pub const RS: u8 = 0x01;
    pub const RW: u8 = 0x02;
    pub const EN: u8 = 0x04;
    pub const BACKLIGHT: u8 = 0x08;
}

// HD44780 instructions
pub mod inst {
    pub const CLEAR: u8 = 0x01;
    pub const ENTRY_MODE_INC: u8 = 0x06;
    pub const DISPLAY_ON: u8 = 0x0C;
    pub const FUNCTION_4BIT_2LINE: u8 = 0x28;
    pub const SET_DDRAM: u8 = 0x80;
    pub const LINE2_OFFSET: u8 = 0x40;
}

/// Expander bytes that clock one byte out as two nibbles, high nibble first.
pub fn encode_byte(value: u8, rs: bool, backlight: bool) -> [u8; 4] {
    let mut ctrl = if backlight { bits::BACKLIGHT } else { 0 };
    if rs {
        ctrl |= bits::RS;
    }
    let hi = (value & 0xF0) | ctrl;
    let lo = ((value << 4) & 0xF0) | ctrl;
    [hi | bits::EN, hi, lo | bits::EN, lo]
}

pub struct Lcd1602<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    backlight: bool,
    bus_ok: bool,
}

impl<I2C, D> Lcd1602<I2C, D>
where
    I2C: Write,
    D: DelayUs<u32>,
{
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            backlight: true,
            bus_ok: true,
        }
    }

    pub fn free(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Power-on sequence into 4-bit, two-line mode with the cursor hidden.
    pub fn init(&mut self) -> Result<(), LcdError> {
        self.delay.delay_us(50_000);
        self.expander(0)?;
        for _ in 0..3 {
            self.nibble(0x30, false)?;
            self.delay.delay_us(4_500);
        }
        self.nibble(0x20, false)?;
        self.command(inst::FUNCTION_4BIT_2LINE)?;
        self.command(inst::DISPLAY_ON)?;
        self.clear()?;
        self.command(inst::ENTRY_MODE_INC)?;
        self.bus_ok = true;
        Ok(())
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), LcdError> {
        self.backlight = on;
        self.expander(0)
    }

    pub fn clear(&mut self) -> Result<(), LcdError> {
        self.command(inst::CLEAR)?;
        self.delay.delay_us(2_000);
        Ok(())
    }

    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), LcdError> {
        let offset = if row == 0 { 0 } else { inst::LINE2_OFFSET };
        self.command(inst::SET_DDRAM | (offset + col))
    }

    /// Write `text` from the cursor, padded with spaces to the full row. Non-ASCII shows as `?`.
    pub fn write_row(&mut self, text: &str) -> Result<(), LcdError> {
        let mut written = 0;
        for ch in text.chars().take(COLUMNS) {
            let byte = if ch.is_ascii() && !ch.is_ascii_control() { ch as u8 } else { b'?' };
            self.data(byte)?;
            written += 1;
        }
        for _ in written..COLUMNS {
            self.data(b' ')?;
        }
        Ok(())
    }

    fn command(&mut self, value: u8) -> Result<(), LcdError> {
        self.send(value, false)
    }

    fn data(&mut self, value: u8) -> Result<(), LcdError> {
        self.send(value, true)
    }

    fn send(&mut self, value: u8, rs: bool) -> Result<(), LcdError> {
        let frame = encode_byte(value, rs, self.backlight);
        self.i2c.write(self.address, &frame).map_err(|_| LcdError::Bus)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn nibble(&mut self, high_nibble: u8, rs: bool) -> Result<(), LcdError> {
        let frame = encode_byte(high_nibble, rs, self.backlight);
        self.i2c.write(self.address, &frame[..2]).map_err(|_| LcdError::Bus)
    }

    fn expander(&mut self, value: u8) -> Result<(), LcdError> {
        let bl = if self.backlight { bits::BACKLIGHT } else { 0 };
        self.i2c.write(self.address, &[value | bl]).map_err(|_| LcdError::Bus)
    }
}

impl<I2C, D> Display for Lcd1602<I2C, D>
where
    I2C: Write,
    D: DelayUs<u32>,
{
    fn show_lines(&mut self, line1: &str, line2: &str) {
        let res = self
            .set_cursor(0, 0)
            .and_then(|_| self.write_row(line1))
            .and_then(|_| self.set_cursor(0, 1))
            .and_then(|_| self.write_row(line2));
        match res {
            Ok(()) => self.bus_ok = true,
            Err(e) if self.bus_ok => {
                log::error!("{}", e);
                self.bus_ok = false;
            }
            Err(_) => {}
        }
    }
}
