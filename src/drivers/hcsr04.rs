// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! HC-SR04 ultrasonic ranger.
//!
//! The echo pulse is timed by busy-polling the echo pin against a free-running microsecond
//! clock, so a ping blocks for at most two [`ECHO_TIMEOUT_US`] windows.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::io::RangeFinder;

/// Longest wait for the echo to start and for it to end. Beyond ~5 m the module gives up anyway.
pub const ECHO_TIMEOUT_US: u32 = 30_000;

pub struct HcSr04<TRIG, ECHO, D, CLK> {
    trig: TRIG,
    echo: ECHO,
    delay: D,
    micros: CLK,
}

impl<TRIG, ECHO, D, CLK> HcSr04<TRIG, ECHO, D, CLK>
where
    TRIG: OutputPin,
    ECHO: InputPin,
    D: DelayUs<u32>,
    CLK: FnMut() -> u32,
{
    pub fn new(mut trig: TRIG, echo: ECHO, delay: D, micros: CLK) -> Self {
        let _ = trig.set_low();
        Self {
            trig,
            echo,
            delay,
            micros,
        }
    }

    pub fn free(self) -> (TRIG, ECHO, D) {
        (self.trig, self.echo, self.delay)
    }

    fn echo_high(&self) -> bool {
        self.echo.is_high().unwrap_or(false)
    }

    /// Spin until the echo line reads `level`. Returns the time it did, `None` on timeout.
    fn wait_for(&mut self, level: bool, since: u32) -> Option<u32> {
        loop {
            let now = (self.micros)();
            if self.echo_high() == level {
                return Some(now);
            }
            if now.wrapping_sub(since) >= ECHO_TIMEOUT_US {
                return None;
            }
        }
    }

    /// Fire one 10 us trigger and time the echo.
    pub fn ping(&mut self) -> Option<u32> {
        let _ = self.trig.set_low();
        self.delay.delay_us(2);
        let _ = self.trig.set_high();
        self.delay.delay_us(10);
        let _ = self.trig.set_low();

        let sent = (self.micros)();
        let rise = self.wait_for(true, sent)?;
        let fall = self.wait_for(false, rise)?;
        Some(fall.wrapping_sub(rise))
    }
}

impl<TRIG, ECHO, D, CLK> RangeFinder for HcSr04<TRIG, ECHO, D, CLK>
where
    TRIG: OutputPin,
    ECHO: InputPin,
    D: DelayUs<u32>,
    CLK: FnMut() -> u32,
{
    fn ping_us(&mut self) -> Option<u32> {
        self.ping()
    }
}
