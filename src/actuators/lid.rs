// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Intake and drop-chute lids.
//!
//! Each lid is a hobby servo moved between a fixed open angle and the closed angle. Commands are
//! fire-and-forget: the servo has no position feedback, so a jammed lid cannot be observed. The
//! caller waits `LidConfig::settle_ms` after each command before relying on the new position.

use crate::config::LidConfig;

/// Which lid to move.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LidId {
    /// Customer-facing lid over the verification chamber.
    Intake,
    /// Trapdoor from the chamber into storage.
    Drop,
}

pub trait LidActuator {
    fn set_lid(&mut self, lid: LidId, open: bool);
}

/// Anything that can be driven to an angle in degrees.
pub trait ServoOutput {
    fn set_angle(&mut self, degrees: u8);
}

/// Clamp a commanded angle into the safe mechanical range.
#[inline]
pub fn clamp_angle(cfg: &LidConfig, degrees: u8) -> u8 {
    degrees.clamp(cfg.min_deg, cfg.max_deg.max(cfg.min_deg))
}

/// Two servos, one per lid.
pub struct ServoLids<I, D> {
    intake: I,
    drop: D,
    cfg: LidConfig,
}

impl<I: ServoOutput, D: ServoOutput> ServoLids<I, D> {
    /// Create the lid pair and drive both lids closed.
    pub fn new(intake: I, drop: D, cfg: LidConfig) -> Self {
        let mut lids = Self { intake, drop, cfg };
        lids.set_lid(LidId::Intake, false);
        lids.set_lid(LidId::Drop, false);
        lids
    }

    /// Angle a lid is driven to for the given state.
    pub fn target_angle(&self, lid: LidId, open: bool) -> u8 {
        let raw = match (lid, open) {
            (LidId::Intake, true) => self.cfg.intake_open_deg,
            (LidId::Drop, true) => self.cfg.drop_open_deg,
            (_, false) => self.cfg.closed_deg,
        };
        clamp_angle(&self.cfg, raw)
    }

    pub fn free(self) -> (I, D) {
        (self.intake, self.drop)
    }
}

impl<I: ServoOutput, D: ServoOutput> LidActuator for ServoLids<I, D> {
    fn set_lid(&mut self, lid: LidId, open: bool) {
        let angle = self.target_angle(lid, open);
        log::debug!("{:?} lid -> {} deg", lid, angle);
        match lid {
            LidId::Intake => self.intake.set_angle(angle),
            LidId::Drop => self.drop.set_angle(angle),
        }
    }
}
