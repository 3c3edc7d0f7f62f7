// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Load cell weighing for the verification chamber.
//!
//! Raw strain-gauge counts are converted to grams with a fixed calibration factor after removing
//! the empty-chamber tare.

use embedded_hal::blocking::delay::DelayMs;
use heapless::Vec;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::WeightConfig;
use crate::io::WeightSensor;

const MAX_SAMPLES: usize = 32;

/// Averaged weight measurement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WeightSample {
    pub grams: f32,
    /// Standard deviation of the samples.
    pub spread_g: f32,
}

/// Whether `grams` falls inside the configured band widened by the tolerance.
pub fn in_band(cfg: &WeightConfig, grams: f32) -> bool {
    grams >= cfg.min_weight_g - cfg.tolerance_g && grams <= cfg.max_weight_g + cfg.tolerance_g
}

pub struct WeightFilter<S, D> {
    sensor: S,
    delay: D,
    cfg: WeightConfig,
    tare: i32,
}

impl<S, D> WeightFilter<S, D>
where
    S: WeightSensor,
    D: DelayMs<u32>,
{
    pub fn new(sensor: S, delay: D, cfg: WeightConfig) -> Self {
        Self {
            sensor,
            delay,
            cfg,
            tare: 0,
        }
    }

    /// Capture the empty-chamber offset. Returns `false` if the sensor produced no data.
    pub fn tare(&mut self) -> bool {
        let n = self.cfg.tare_samples.max(1) as usize;
        let mut sum: i64 = 0;
        let mut count: i64 = 0;
        for _ in 0..n.min(MAX_SAMPLES) {
            if let Some(raw) = self.sensor.read_raw() {
                sum += raw as i64;
                count += 1;
            }
            self.delay.delay_ms(self.cfg.sample_interval_ms);
        }
        if count == 0 {
            log::warn!("load cell produced no data during tare");
            return false;
        }
        self.tare = (sum / count) as i32;
        log::info!("load cell tare = {}", self.tare);
        true
    }

    #[inline]
    pub fn tare_offset(&self) -> i32 {
        self.tare
    }

    /// Take the configured number of samples and average them.
    pub fn measure(&mut self) -> Option<WeightSample> {
        let n = (self.cfg.samples.max(1) as usize).min(MAX_SAMPLES);
        let mut grams: Vec<f32, MAX_SAMPLES> = Vec::new();
        for i in 0..n {
            if let Some(raw) = self.sensor.read_raw() {
                let _ = grams.push((raw - self.tare) as f32 / self.cfg.counts_per_gram);
            }
            if i + 1 < n {
                self.delay.delay_ms(self.cfg.sample_interval_ms);
            }
        }
        if grams.is_empty() {
            return None;
        }

        let len = grams.len() as f32;
        let mean = grams.iter().sum::<f32>() / len;
        let variance = grams.iter().map(|g| (g - mean) * (g - mean)).sum::<f32>() / len;

        Some(WeightSample {
            grams: mean,
            spread_g: variance.sqrt(),
        })
    }

    /// Accept when the mean is inside the band and the samples agree.
    pub fn read_weight(&mut self) -> bool {
        match self.measure() {
            Some(sample) => {
                let ok = in_band(&self.cfg, sample.grams) && sample.spread_g <= self.cfg.max_spread_g;
                log::debug!(
                    "weight {} g (spread {} g) -> {}",
                    sample.grams,
                    sample.spread_g,
                    if ok { "ok" } else { "out of band" }
                );
                ok
            }
            None => {
                log::warn!("load cell not ready");
                false
            }
        }
    }
}
