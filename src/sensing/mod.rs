// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Sensor Fusion
//!
//! Turns raw capacitive, inductive, load cell and photoresistor readings into the booleans the
//! deposit state machine works with.
//!
//! ## Modules
//!
//! - [`presence`] - Averaged, hysteretic, rate-limited chamber presence.
//! - [`weight`] - Tared and calibrated load cell weighing against a weight band.
//! - [`clarity`] - Lamp-on light transmission threshold.
//! - [`probes`] - Pin and ADC adapters implementing the sensor traits.
//!
//! None of these calls touch [`ObjectPresenceState`]; the state machine interprets the results.

pub mod clarity;
pub mod presence;
pub mod probes;
pub mod weight;

pub use clarity::ClarityProbe;
pub use presence::{ObjectPresenceState, PresenceFilter, PresenceReading};
pub use probes::{AnalogProbe, DigitalProbe, LampProbe};
pub use weight::{WeightFilter, WeightSample};

use embedded_hal::blocking::delay::DelayMs;

use crate::config::MachineConfig;
use crate::io::{LightSensor, MetalSensor, PresenceSensor, WeightSensor};

/// The four sensing calls the deposit state machine polls.
pub trait ObjectSensing {
    fn read_presence(&mut self, now_ms: u32) -> PresenceReading;
    /// `true` when the object is metallic. A plastic bottle must read `false`.
    fn read_metal(&mut self) -> bool;
    fn read_weight(&mut self) -> bool;
    fn read_clarity(&mut self) -> bool;
    /// Drop any cached presence sample.
    fn reset_presence(&mut self) {}
}

/// All chamber sensors of the machine.
pub struct SensorFusion<P, M, W, L, D> {
    presence: PresenceFilter<P>,
    metal: M,
    weight: WeightFilter<W, D>,
    clarity: ClarityProbe<L, D>,
}

impl<P, M, W, L, D> SensorFusion<P, M, W, L, D>
where
    P: PresenceSensor,
    M: MetalSensor,
    W: WeightSensor,
    L: LightSensor,
    D: DelayMs<u32> + Clone,
{
    pub fn new(presence: P, metal: M, weight: W, light: L, delay: D, cfg: &MachineConfig) -> Self {
        Self {
            presence: PresenceFilter::new(presence, cfg.presence),
            metal,
            weight: WeightFilter::new(weight, delay.clone(), cfg.weight),
            clarity: ClarityProbe::new(light, delay, cfg.clarity),
        }
    }

    /// Tare the load cell. Call with an empty chamber.
    pub fn calibrate(&mut self) -> bool {
        self.weight.tare()
    }
}

impl<P, M, W, L, D> ObjectSensing for SensorFusion<P, M, W, L, D>
where
    P: PresenceSensor,
    M: MetalSensor,
    W: WeightSensor,
    L: LightSensor,
    D: DelayMs<u32> + Clone,
{
    fn read_presence(&mut self, now_ms: u32) -> PresenceReading {
        self.presence.read(now_ms)
    }

    fn read_metal(&mut self) -> bool {
        self.metal.is_metal()
    }

    fn read_weight(&mut self) -> bool {
        self.weight.read_weight()
    }

    fn read_clarity(&mut self) -> bool {
        self.clarity.read_clarity()
    }

    fn reset_presence(&mut self) {
        self.presence.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLight, FakeMetal, NoDelay, ScriptedAnalog, ScriptedWeight};

    #[test]
    fn fusion_routes_each_call_to_its_sensor() {
        let cfg = MachineConfig::default();
        let mut s = SensorFusion::new(
            ScriptedAnalog::new(&[4000]),
            FakeMetal(false),
            ScriptedWeight::constant(Some(420 * 30)),
            FakeLight::new(3000),
            NoDelay,
            &cfg,
        );
        assert!(s.read_presence(0).present);
        assert!(!s.read_metal());
        assert!(s.read_weight());
        assert!(s.read_clarity());
    }
}
