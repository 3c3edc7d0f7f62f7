// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Light transmission check: opaque or foreign objects block the inlet lamp.

use embedded_hal::blocking::delay::DelayMs;

use crate::config::ClarityConfig;
use crate::io::LightSensor;

pub struct ClarityProbe<S, D> {
    sensor: S,
    delay: D,
    cfg: ClarityConfig,
}

impl<S, D> ClarityProbe<S, D>
where
    S: LightSensor,
    D: DelayMs<u32>,
{
    pub fn new(sensor: S, delay: D, cfg: ClarityConfig) -> Self {
        Self { sensor, delay, cfg }
    }

    /// Averaged light level with the lamp on. The lamp is always switched off afterwards.
    pub fn light_level(&mut self) -> u16 {
        self.sensor.set_illumination(true);
        self.delay.delay_ms(self.cfg.warmup_ms);

        let n = self.cfg.samples.max(1) as u32;
        let sum: u32 = (0..n).map(|_| self.sensor.read_raw() as u32).sum();

        self.sensor.set_illumination(false);
        (sum / n) as u16
    }

    pub fn read_clarity(&mut self) -> bool {
        let level = self.light_level();
        let clear = level >= self.cfg.threshold;
        log::debug!("light level {} -> {}", level, if clear { "clear" } else { "opaque" });
        clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLight, NoDelay};

    #[test]
    fn bright_transmission_is_clear() {
        let mut p = ClarityProbe::new(FakeLight::new(3000), NoDelay, ClarityConfig::default());
        assert!(p.read_clarity());
    }

    #[test]
    fn dark_transmission_is_opaque_and_lamp_is_switched_off() {
        let mut p = ClarityProbe::new(FakeLight::new(200), NoDelay, ClarityConfig::default());
        assert!(!p.read_clarity());
        assert!(!p.sensor.lamp_on);
        assert_eq!(p.sensor.lamp_cycles, 1);
    }
}
