// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Capability traits consumed by the machine logic.
//!
//! The deposit state machine, ledger and monitors never touch peripherals directly. Board code in
//! [`crate::hw`] and the generic drivers in [`crate::drivers`] implement these traits; tests
//! implement them with fakes.

use crate::error::{AlertError, CardError};

/// Size of one MIFARE Classic data block.
pub const BLOCK_LEN: usize = 16;

/// 4-byte card UID.
pub type CardId = [u8; 4];

/// Two-line text display with overwrite semantics.
pub trait Display {
    fn show_lines(&mut self, line1: &str, line2: &str);
}

/// Code shown on the tri-color status indicator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// Solid: ready.
    Ok,
    /// Pulsing: busy.
    Processing,
    /// Pulsing: something needs attention.
    Error,
}

pub trait StatusIndicator {
    fn set_status(&mut self, status: Status);

    /// Advance the animation. Called once per loop iteration.
    fn refresh(&mut self, now_ms: u32);
}

/// Raw capacitive proximity reading (higher = closer).
pub trait PresenceSensor {
    fn read_raw(&mut self) -> u16;
}

/// Inductive proximity switch.
pub trait MetalSensor {
    fn is_metal(&mut self) -> bool;
}

/// Strain-gauge amplifier. `None` when no conversion is ready.
pub trait WeightSensor {
    fn read_raw(&mut self) -> Option<i32>;
}

/// Photoresistor behind the chamber with a lamp on the opposite side.
pub trait LightSensor {
    fn set_illumination(&mut self, on: bool);
    fn read_raw(&mut self) -> u16;
}

/// RFID tag block storage. A session is `select`, `authenticate`, block I/O, `release`.
pub trait CardStore {
    /// Wake and select a card in the field. Returns its UID.
    fn select(&mut self) -> Result<CardId, CardError>;
    /// Authenticate the sector holding `block` with the default key.
    fn authenticate(&mut self, block: u8) -> Result<(), CardError>;
    fn read_block(&mut self, block: u8) -> Result<[u8; BLOCK_LEN], CardError>;
    fn write_block(&mut self, block: u8, data: &[u8; BLOCK_LEN]) -> Result<(), CardError>;
    /// Halt the card and drop the authenticated session.
    fn release(&mut self);
}

/// Outbound short message channel.
pub trait AlertChannel {
    fn send_alert(&mut self, text: &str) -> Result<(), AlertError>;
}

/// Ultrasonic ranger. Returns the echo round-trip time, `None` on no echo.
pub trait RangeFinder {
    fn ping_us(&mut self) -> Option<u32>;
}

/// Coin hopper with a payout relay and a pulse sensor.
pub trait CoinHopper {
    fn set_relay(&mut self, energized: bool);
    /// Pulses counted since the previous call.
    fn take_pulses(&mut self) -> u32;
}

/// Logical button levels (`true` = pressed).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ButtonLevels {
    pub up: bool,
    pub down: bool,
    pub select: bool,
}

pub trait ButtonPanel {
    fn levels(&mut self) -> ButtonLevels;
}
