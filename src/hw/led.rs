// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! LEDs and the tri-color status light built from them.

use embedded_hal::digital::v2::OutputPin;

use crate::config::IndicatorConfig;
use crate::io::{Status, StatusIndicator};

/// Whether the LED is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

/// LED abstraction that remembers its active level and last known state.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Create an LED wrapper, initializing it to OFF.
    pub fn new(pin: PIN, active: ActiveLevel) -> Self {
        let mut led = Self {
            pin,
            active,
            is_on: true,
        };
        led.off();
        led
    }

    /// Drive the LED logically ON (true) or OFF (false).
    pub fn set(&mut self, on: bool) {
        let drive_high = on == (self.active == ActiveLevel::High);
        let _ = if drive_high { self.pin.set_high() } else { self.pin.set_low() };
        self.is_on = on;
    }

    #[inline]
    pub fn on(&mut self) {
        self.set(true);
    }

    #[inline]
    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_on);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn free(self) -> PIN {
        self.pin
    }

    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::High)
    }

    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }
}

/// Status indicator on three LEDs: OK is green solid, PROCESSING blinks blue, ERROR blinks red.
pub struct StatusLight<G: OutputPin, B: OutputPin, R: OutputPin> {
    green: Led<G>,
    blue: Led<B>,
    red: Led<R>,
    status: Status,
    half_period_ms: u32,
    /// Time of the last blink toggle; `None` right after a status change.
    toggled_at: Option<u32>,
}

impl<G: OutputPin, B: OutputPin, R: OutputPin> StatusLight<G, B, R> {
    pub fn new(green: Led<G>, blue: Led<B>, red: Led<R>, cfg: IndicatorConfig) -> Self {
        let mut light = Self {
            green,
            blue,
            red,
            status: Status::Ok,
            half_period_ms: cfg.blink_half_period_ms.max(1),
            toggled_at: None,
        };
        light.apply();
        light
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// `(green, blue, red)` as currently driven.
    pub fn lit(&self) -> (bool, bool, bool) {
        (self.green.is_on(), self.blue.is_on(), self.red.is_on())
    }

    fn apply(&mut self) {
        self.green.set(self.status == Status::Ok);
        self.blue.set(self.status == Status::Processing);
        self.red.set(self.status == Status::Error);
        self.toggled_at = None;
    }
}

impl<G: OutputPin, B: OutputPin, R: OutputPin> StatusIndicator for StatusLight<G, B, R> {
    fn set_status(&mut self, status: Status) {
        if status != self.status {
            self.status = status;
            self.apply();
        }
    }

    fn refresh(&mut self, now_ms: u32) {
        let half = self.half_period_ms;
        match self.toggled_at {
            None => self.toggled_at = Some(now_ms),
            Some(at) if now_ms.wrapping_sub(at) >= half => {
                match self.status {
                    Status::Ok => {}
                    Status::Processing => self.blue.toggle(),
                    Status::Error => self.red.toggle(),
                }
                self.toggled_at = Some(now_ms);
            }
            Some(_) => {}
        }
    }
}
