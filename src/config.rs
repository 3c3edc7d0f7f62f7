// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Tunable parameters for the PISO-BOTE machine.
//!
//! Every component takes its own section by value at construction. All durations are in
//! milliseconds; raw analog values are 12-bit ADC counts (0..4095).

/// Capacitive presence sensor filtering.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PresenceConfig {
    /// Raw reads averaged per sample.
    pub sample_count: u8,
    /// Averaged value at or above which the chamber is occupied.
    pub detect_threshold: u16,
    /// Averaged value below which the chamber is empty. Must be below `detect_threshold`.
    pub clear_threshold: u16,
    /// Calls inside this window return the cached state without sampling.
    pub debounce_ms: u32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            sample_count: 8,
            detect_threshold: 2400,
            clear_threshold: 1600,
            debounce_ms: 30,
        }
    }
}

/// Load cell calibration and the acceptable bottle weight band.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WeightConfig {
    /// Samples averaged per weight check.
    pub samples: u8,
    /// Pause between samples.
    pub sample_interval_ms: u32,
    /// Raw HX711 counts per gram.
    pub counts_per_gram: f32,
    pub min_weight_g: f32,
    pub max_weight_g: f32,
    /// Slack applied on both ends of the band.
    pub tolerance_g: f32,
    /// Readings whose standard deviation exceeds this are rejected as unsettled.
    pub max_spread_g: f32,
    /// Samples averaged when capturing the empty-chamber tare.
    pub tare_samples: u8,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            samples: 5,
            sample_interval_ms: 10,
            counts_per_gram: 420.0,
            min_weight_g: 10.0,
            max_weight_g: 60.0,
            tolerance_g: 5.0,
            max_spread_g: 4.0,
            tare_samples: 10,
        }
    }
}

impl WeightConfig {
    pub fn with_band(mut self, min_g: f32, max_g: f32, tolerance_g: f32) -> Self {
        self.min_weight_g = min_g;
        self.max_weight_g = max_g;
        self.tolerance_g = tolerance_g;
        self
    }
}

/// Photoresistor clarity check.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClarityConfig {
    pub samples: u8,
    /// Time the inlet lamp is on before sampling.
    pub warmup_ms: u32,
    /// Averaged light level at or above which the object counts as clear.
    pub threshold: u16,
}

impl Default for ClarityConfig {
    fn default() -> Self {
        Self {
            samples: 4,
            warmup_ms: 20,
            threshold: 1800,
        }
    }
}

/// Servo angles for both lids.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LidConfig {
    pub intake_open_deg: u8,
    pub drop_open_deg: u8,
    pub closed_deg: u8,
    /// Mechanical range every command is clamped into.
    pub min_deg: u8,
    pub max_deg: u8,
    /// Time a commanded move needs to finish.
    pub settle_ms: u32,
}

impl Default for LidConfig {
    fn default() -> Self {
        Self {
            intake_open_deg: 180,
            drop_open_deg: 180,
            closed_deg: 0,
            min_deg: 0,
            max_deg: 180,
            settle_ms: 500,
        }
    }
}

/// Deposit cycle timing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DepositConfig {
    /// Wait for a bottle after the intake opened.
    pub presence_timeout_ms: u32,
    /// Window for a confirmed verdict after the intake closed.
    pub verify_timeout_ms: u32,
    /// Stabilization pause before the first verification poll.
    pub verify_settle_ms: u32,
    /// Consecutive agreeing polls needed to confirm a verdict.
    pub verify_confirm_reads: u8,
    /// "Remove hand" warning shown before the intake closes.
    pub hand_clear_ms: u32,
    /// Time the drop lid stays open.
    pub drop_hold_ms: u32,
    /// Give up waiting for a rejected object to be taken out.
    pub removal_timeout_ms: u32,
    /// Consecutive empty reads needed to confirm removal.
    pub removal_confirm_reads: u8,
    /// How long result messages stay on screen.
    pub notice_ms: u32,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            presence_timeout_ms: 3000,
            verify_timeout_ms: 3000,
            verify_settle_ms: 300,
            verify_confirm_reads: 2,
            hand_clear_ms: 2000,
            drop_hold_ms: 3000,
            removal_timeout_ms: 15_000,
            removal_confirm_reads: 2,
            notice_ms: 2000,
        }
    }
}

impl DepositConfig {
    pub fn with_timeouts(mut self, presence_ms: u32, verify_ms: u32) -> Self {
        self.presence_timeout_ms = presence_ms;
        self.verify_timeout_ms = verify_ms;
        self
    }
}

/// Redemption limits and card layout.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RedeemConfig {
    /// Most points a single redemption may take.
    pub redeem_cap: u32,
    /// How long to wait for a card to be presented.
    pub card_wait_ms: u32,
    /// Data block holding the points value.
    pub points_block: u8,
}

impl Default for RedeemConfig {
    fn default() -> Self {
        Self {
            redeem_cap: 50,
            card_wait_ms: 10_000,
            points_block: 4,
        }
    }
}

/// Coin hopper payout.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DispenseConfig {
    pub timeout_ms: u32,
    /// Minimum spacing between two counted hopper pulses.
    pub pulse_debounce_ms: u32,
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            pulse_debounce_ms: 30,
        }
    }
}

/// Bin fill-level monitoring.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FillConfig {
    /// Pings per check; the median is used.
    pub pings: u8,
    /// Pause between pings so echoes do not overlap.
    pub ping_gap_ms: u32,
    /// Distances at or below this mean the bin is full.
    pub full_threshold_cm: f32,
    /// Check cadence while the machine is idle.
    pub check_interval_ms: u32,
    /// Re-poll cadence while in maintenance.
    pub maintenance_poll_ms: u32,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            pings: 5,
            ping_gap_ms: 60,
            full_threshold_cm: 5.0,
            check_interval_ms: 1000,
            maintenance_poll_ms: 5000,
        }
    }
}

/// Button timing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InputConfig {
    /// A level must hold this long before it is accepted.
    pub debounce_ms: u32,
    /// Auto-repeat period of a held up/down button.
    pub repeat_ms: u32,
    /// Select held this long cancels amount entry.
    pub long_press_ms: u32,
    /// Every full period of holding adds one to the adjustment step.
    pub accel_period_ms: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 30,
            repeat_ms: 200,
            long_press_ms: 2000,
            accel_period_ms: 1000,
        }
    }
}

/// Status LED animation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IndicatorConfig {
    pub blink_half_period_ms: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            blink_half_period_ms: 250,
        }
    }
}

/// SMS alert settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AlertConfig {
    pub phone_number: &'static str,
    pub bin_full_message: &'static str,
    /// Bounded wait for each modem reply.
    pub reply_timeout_ms: u32,
    /// Bounded wait for the network to accept the message.
    pub send_timeout_ms: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            phone_number: "+639171234567",
            bin_full_message: "PISO-BOTE: storage bin is full. Please empty it.",
            reply_timeout_ms: 2000,
            send_timeout_ms: 15_000,
        }
    }
}

/// Full machine configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MachineConfig {
    pub presence: PresenceConfig,
    pub weight: WeightConfig,
    pub clarity: ClarityConfig,
    pub lids: LidConfig,
    pub deposit: DepositConfig,
    pub redeem: RedeemConfig,
    pub dispense: DispenseConfig,
    pub fill: FillConfig,
    pub input: InputConfig,
    pub indicator: IndicatorConfig,
    pub alert: AlertConfig,
}
