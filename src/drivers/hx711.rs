// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! HX711 24-bit bridge ADC, bit-banged over a clock and data pin.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::io::WeightSensor;

/// Input channel and gain selected for the conversion after the current one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Gain {
    A128,
    B32,
    A64,
}

impl Gain {
    /// Extra clock pulses after the 24 data bits.
    #[inline]
    pub fn extra_pulses(self) -> u8 {
        match self {
            Gain::A128 => 1,
            Gain::B32 => 2,
            Gain::A64 => 3,
        }
    }
}

/// Sign-extend a 24-bit two's complement value.
#[inline]
pub fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}

pub struct Hx711<SCK, DOUT, D> {
    sck: SCK,
    dout: DOUT,
    delay: D,
    gain: Gain,
}

impl<SCK, DOUT, D> Hx711<SCK, DOUT, D>
where
    SCK: OutputPin,
    DOUT: InputPin,
    D: DelayUs<u32>,
{
    pub fn new(mut sck: SCK, dout: DOUT, delay: D) -> Self {
        // Holding SCK high for >60 us powers the chip down.
        let _ = sck.set_low();
        Self {
            sck,
            dout,
            delay,
            gain: Gain::A128,
        }
    }

    pub fn free(self) -> (SCK, DOUT, D) {
        (self.sck, self.dout, self.delay)
    }

    pub fn set_gain(&mut self, gain: Gain) {
        self.gain = gain;
    }

    /// DOUT goes low once a conversion is ready.
    pub fn is_ready(&self) -> bool {
        self.dout.is_low().unwrap_or(false)
    }

    /// Clock out one conversion, or `None` if none is ready.
    pub fn read(&mut self) -> Option<i32> {
        if !self.is_ready() {
            return None;
        }
        let mut raw: u32 = 0;
        for _ in 0..24 {
            self.pulse();
            raw = (raw << 1) | self.dout.is_high().unwrap_or(false) as u32;
        }
        for _ in 0..self.gain.extra_pulses() {
            self.pulse();
        }
        Some(sign_extend_24(raw))
    }

    fn pulse(&mut self) {
        let _ = self.sck.set_high();
        self.delay.delay_us(1);
        let _ = self.sck.set_low();
        self.delay.delay_us(1);
    }
}

impl<SCK, DOUT, D> WeightSensor for Hx711<SCK, DOUT, D>
where
    SCK: OutputPin,
    DOUT: InputPin,
    D: DelayUs<u32>,
{
    fn read_raw(&mut self) -> Option<i32> {
        self.read()
    }
}
