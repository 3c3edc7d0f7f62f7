// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Storage bin fill level.
//!
//! An ultrasonic ranger looks down into the bin. When the pile reaches the full threshold the
//! machine enters maintenance mode, and an SMS goes out once per full event. While in
//! maintenance the bin is re-polled on a slower cadence until it reads not-full again.

use embedded_hal::blocking::delay::DelayMs;
use heapless::Vec;

use crate::config::{AlertConfig, FillConfig};
use crate::io::{AlertChannel, RangeFinder};
use crate::machine::SystemState;

/// Most pings taken for one median.
const MAX_PINGS: usize = 15;

/// Speed of sound in cm/µs at room temperature.
const SOUND_CM_PER_US: f32 = 0.0343;

/// One-way distance for an echo round-trip time.
#[inline]
pub fn echo_to_cm(round_trip_us: u32) -> f32 {
    round_trip_us as f32 * SOUND_CM_PER_US / 2.0
}

/// Median of the values, `None` when empty.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Maintenance transitions reported to the machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FillEvent {
    BinFull,
    BinCleared,
}

/// Something that decides whether the machine must stop for maintenance.
pub trait BinMonitor {
    /// Run a check if one is due. `sys.maintenance` is updated in place.
    fn poll(&mut self, now_ms: u32, sys: &mut SystemState) -> Option<FillEvent>;
}

pub struct FillMonitor<R, A, D> {
    ranger: R,
    alert: A,
    delay: D,
    cfg: FillConfig,
    alert_cfg: AlertConfig,
    last_check: Option<u32>,
    alert_sent: bool,
    last_distance_cm: Option<f32>,
}

impl<R, A, D> FillMonitor<R, A, D>
where
    R: RangeFinder,
    A: AlertChannel,
    D: DelayMs<u32>,
{
    pub fn new(ranger: R, alert: A, delay: D, cfg: FillConfig, alert_cfg: AlertConfig) -> Self {
        Self {
            ranger,
            alert,
            delay,
            cfg,
            alert_cfg,
            last_check: None,
            alert_sent: false,
            last_distance_cm: None,
        }
    }

    #[inline]
    pub fn last_distance_cm(&self) -> Option<f32> {
        self.last_distance_cm
    }

    pub fn ranger_mut(&mut self) -> &mut R {
        &mut self.ranger
    }

    pub fn alert_mut(&mut self) -> &mut A {
        &mut self.alert
    }

    /// Median distance over the configured pings. Pings without an echo are skipped.
    pub fn measure_cm(&mut self) -> Option<f32> {
        let n = (self.cfg.pings.max(1) as usize).min(MAX_PINGS);
        let mut distances: Vec<f32, MAX_PINGS> = Vec::new();
        for i in 0..n {
            if let Some(us) = self.ranger.ping_us() {
                let _ = distances.push(echo_to_cm(us));
            }
            if i + 1 < n {
                self.delay.delay_ms(self.cfg.ping_gap_ms);
            }
        }
        let distance = median(&mut distances);
        if distance.is_some() {
            self.last_distance_cm = distance;
        }
        distance
    }

    /// `None` when no ping came back.
    pub fn is_bin_full(&mut self) -> Option<bool> {
        self.measure_cm().map(|cm| cm <= self.cfg.full_threshold_cm)
    }

    fn due(&self, now_ms: u32, maintenance: bool) -> bool {
        let interval = if maintenance {
            self.cfg.maintenance_poll_ms
        } else {
            self.cfg.check_interval_ms
        };
        match self.last_check {
            None => true,
            Some(at) => now_ms.wrapping_sub(at) >= interval,
        }
    }
}

impl<R, A, D> BinMonitor for FillMonitor<R, A, D>
where
    R: RangeFinder,
    A: AlertChannel,
    D: DelayMs<u32>,
{
    fn poll(&mut self, now_ms: u32, sys: &mut SystemState) -> Option<FillEvent> {
        if !self.due(now_ms, sys.maintenance) {
            return None;
        }
        self.last_check = Some(now_ms);

        let full = match self.is_bin_full() {
            Some(full) => full,
            None => {
                log::warn!("fill sensor: no echo, keeping previous state");
                return None;
            }
        };

        match (sys.maintenance, full) {
            (false, true) => {
                sys.maintenance = true;
                log::warn!(
                    "bin full ({} cm), entering maintenance",
                    self.last_distance_cm.unwrap_or(0.0)
                );
                if !self.alert_sent {
                    match self.alert.send_alert(self.alert_cfg.bin_full_message) {
                        Ok(()) => log::info!("bin full alert sent"),
                        Err(e) => log::error!("bin full alert failed: {}", e),
                    }
                    self.alert_sent = true;
                }
                Some(FillEvent::BinFull)
            }
            (true, false) => {
                sys.maintenance = false;
                self.alert_sent = false;
                log::info!("bin emptied, leaving maintenance");
                Some(FillEvent::BinCleared)
            }
            _ => None,
        }
    }
}
