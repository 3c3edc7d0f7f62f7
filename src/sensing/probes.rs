// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Adapters from raw pins and ADC readers to the sensor traits.
//!
//! ADC channels are passed in as closures returning a 12-bit reading, e.g. one built with
//! `Adc::make_reader`.

use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::io::{LightSensor, MetalSensor, PresenceSensor};

/// Full-scale value of a 12-bit conversion.
pub const ADC_FULL_SCALE: u16 = 4095;

/// Analog presence sensor read through a closure.
pub struct AnalogProbe<F> {
    read: F,
}

impl<F: FnMut() -> u16> AnalogProbe<F> {
    pub fn new(read: F) -> Self {
        Self { read }
    }
}

impl<F: FnMut() -> u16> PresenceSensor for AnalogProbe<F> {
    fn read_raw(&mut self) -> u16 {
        (self.read)()
    }
}

/// Digital switch-type sensor.
pub struct DigitalProbe<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> DigitalProbe<P> {
    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    /// Read errors count as inactive.
    pub fn is_active(&self) -> bool {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        level.unwrap_or(false)
    }
}

impl<P: InputPin> MetalSensor for DigitalProbe<P> {
    fn is_metal(&mut self) -> bool {
        self.is_active()
    }
}

/// A digital capacitive switch maps to the ends of the analog range.
impl<P: InputPin> PresenceSensor for DigitalProbe<P> {
    fn read_raw(&mut self) -> u16 {
        if self.is_active() {
            ADC_FULL_SCALE
        } else {
            0
        }
    }
}

/// Photoresistor on an ADC channel plus the inlet lamp on a GPIO.
pub struct LampProbe<F, L> {
    read: F,
    lamp: L,
}

impl<F, L> LampProbe<F, L>
where
    F: FnMut() -> u16,
    L: OutputPin,
{
    pub fn new(read: F, mut lamp: L) -> Self {
        let _ = lamp.set_low();
        Self { read, lamp }
    }
}

impl<F, L> LightSensor for LampProbe<F, L>
where
    F: FnMut() -> u16,
    L: OutputPin,
{
    fn set_illumination(&mut self, on: bool) {
        let _ = if on {
            self.lamp.set_high()
        } else {
            self.lamp.set_low()
        };
    }

    fn read_raw(&mut self) -> u16 {
        (self.read)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeInput, FakeOutput};

    #[test]
    fn active_low_switch_reports_metal_on_low_level() {
        let mut probe = DigitalProbe::active_low(FakeInput::new(false));
        assert!(probe.is_metal());
        let mut probe = DigitalProbe::active_low(FakeInput::new(true));
        assert!(!probe.is_metal());
    }

    #[test]
    fn digital_presence_maps_to_full_scale() {
        let mut probe = DigitalProbe::active_high(FakeInput::new(true));
        assert_eq!(PresenceSensor::read_raw(&mut probe), ADC_FULL_SCALE);
    }

    #[test]
    fn lamp_probe_drives_lamp_pin() {
        let mut probe = LampProbe::new(|| 1234, FakeOutput::default());
        probe.set_illumination(true);
        assert!(probe.lamp.high);
        assert_eq!(probe.read_raw(), 1234);
        probe.set_illumination(false);
        assert!(!probe.lamp.high);
    }
}
