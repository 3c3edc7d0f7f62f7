// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Hobby servo on a 50 Hz PWM channel.

use embedded_hal::PwmPin;

use crate::actuators::ServoOutput;

/// Frame period at 50 Hz.
pub const PERIOD_US: u32 = 20_000;
/// Pulse width at 0 degrees.
pub const MIN_PULSE_US: u32 = 500;
/// Pulse width at 180 degrees.
pub const MAX_PULSE_US: u32 = 2_500;

/// Pulse width for `degrees`, saturating at 180.
#[inline]
pub fn pulse_us(degrees: u8) -> u32 {
    let deg = degrees.min(180) as u32;
    MIN_PULSE_US + deg * (MAX_PULSE_US - MIN_PULSE_US) / 180
}

pub struct Servo<P> {
    pwm: P,
}

impl<P> Servo<P>
where
    P: PwmPin<Duty = u16>,
{
    /// The PWM timer must already run with a [`PERIOD_US`] period.
    pub fn new(mut pwm: P) -> Self {
        pwm.set_duty(0);
        pwm.enable();
        Self { pwm }
    }

    pub fn free(self) -> P {
        self.pwm
    }

    /// Compare value for a pulse of `us` microseconds.
    pub fn duty_for(&self, us: u32) -> u16 {
        let max = self.pwm.get_max_duty() as u32;
        (us.min(PERIOD_US) * max / PERIOD_US) as u16
    }
}

impl<P> ServoOutput for Servo<P>
where
    P: PwmPin<Duty = u16>,
{
    fn set_angle(&mut self, degrees: u8) {
        let duty = self.duty_for(pulse_us(degrees));
        self.pwm.set_duty(duty);
    }
}
