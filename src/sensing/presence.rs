// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Capacitive presence detection with averaging, hysteresis and a debounce window.
//!
//! A single threshold lets noise near the trip point flip the state every poll. Two thresholds
//! are used instead: the chamber becomes occupied when the averaged value reaches
//! `detect_threshold` and only becomes empty again once it falls below `clear_threshold`.

use crate::config::PresenceConfig;
use crate::io::PresenceSensor;

/// Presence bookkeeping for one deposit cycle.
///
/// `is_object_inside` is set by the deposit machine once presence is confirmed and cleared on a
/// successful drop or a confirmed removal. It is reset before every new cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectPresenceState {
    pub is_object_inside: bool,
    pub last_stable_capacitive_value: u16,
    pub last_read_ms: u32,
}

impl ObjectPresenceState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Copy the sample bookkeeping out of a reading.
    pub fn record(&mut self, reading: &PresenceReading) {
        self.last_stable_capacitive_value = reading.value;
        self.last_read_ms = reading.sampled_at_ms;
    }
}

/// Result of a presence poll.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PresenceReading {
    pub present: bool,
    /// Averaged raw value of the sample this state came from.
    pub value: u16,
    /// When that sample was taken.
    pub sampled_at_ms: u32,
    /// `false` when served from the debounce cache.
    pub fresh: bool,
}

/// Hysteresis filter around a [`PresenceSensor`].
pub struct PresenceFilter<S> {
    sensor: S,
    cfg: PresenceConfig,
    stable: bool,
    last_value: u16,
    last_sample_ms: Option<u32>,
}

impl<S: PresenceSensor> PresenceFilter<S> {
    pub fn new(sensor: S, cfg: PresenceConfig) -> Self {
        Self {
            sensor,
            cfg,
            stable: false,
            last_value: 0,
            last_sample_ms: None,
        }
    }

    /// Return whether the chamber is occupied.
    ///
    /// Calls within `debounce_ms` of the last sample return that sample's state unchanged.
    pub fn read(&mut self, now_ms: u32) -> PresenceReading {
        if let Some(at) = self.last_sample_ms {
            if now_ms.wrapping_sub(at) < self.cfg.debounce_ms {
                return PresenceReading {
                    present: self.stable,
                    value: self.last_value,
                    sampled_at_ms: at,
                    fresh: false,
                };
            }
        }

        let value = self.average();
        if self.stable {
            if value < self.cfg.clear_threshold {
                self.stable = false;
            }
        } else if value >= self.cfg.detect_threshold {
            self.stable = true;
        }

        self.last_value = value;
        self.last_sample_ms = Some(now_ms);

        PresenceReading {
            present: self.stable,
            value,
            sampled_at_ms: now_ms,
            fresh: true,
        }
    }

    /// Forget the debounce cache so the next read samples the sensor.
    pub fn invalidate(&mut self) {
        self.last_sample_ms = None;
    }

    pub fn free(self) -> S {
        self.sensor
    }

    fn average(&mut self) -> u16 {
        let n = self.cfg.sample_count.max(1) as u32;
        let sum: u32 = (0..n).map(|_| self.sensor.read_raw() as u32).sum();
        (sum / n) as u16
    }
}
