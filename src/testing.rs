// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-side fakes for the capability traits.

use core::convert::Infallible;
use std::collections::BTreeMap;
use std::string::String;
use std::vec::Vec;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::actuators::{LidActuator, LidId, ServoOutput};
use crate::control::{BinMonitor, FillEvent};
use crate::error::{AlertError, CardError};
use crate::io::{
    AlertChannel, ButtonLevels, ButtonPanel, CardId, CardStore, CoinHopper, Display, LightSensor,
    MetalSensor, PresenceSensor, RangeFinder, Status, StatusIndicator, WeightSensor, BLOCK_LEN,
};
use crate::machine::SystemState;
use crate::protocol::points_block;
use crate::sensing::{ObjectSensing, PresenceReading};

/// Plays back a list of values, then repeats the last one.
pub struct Script<T: Copy> {
    values: Vec<T>,
    next: usize,
}

impl<T: Copy> Script<T> {
    pub fn new(values: &[T]) -> Self {
        assert!(!values.is_empty());
        Self {
            values: values.to_vec(),
            next: 0,
        }
    }

    pub fn next(&mut self) -> T {
        let i = self.next.min(self.values.len() - 1);
        self.next += 1;
        self.values[i]
    }
}

pub struct ScriptedAnalog(Script<u16>);

impl ScriptedAnalog {
    pub fn new(values: &[u16]) -> Self {
        Self(Script::new(values))
    }
}

impl PresenceSensor for ScriptedAnalog {
    fn read_raw(&mut self) -> u16 {
        self.0.next()
    }
}

pub struct ScriptedWeight(Script<Option<i32>>);

impl ScriptedWeight {
    pub fn new(values: &[Option<i32>]) -> Self {
        Self(Script::new(values))
    }

    pub fn constant(value: Option<i32>) -> Self {
        Self::new(&[value])
    }
}

impl WeightSensor for ScriptedWeight {
    fn read_raw(&mut self) -> Option<i32> {
        self.0.next()
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoDelay;

impl DelayMs<u32> for NoDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

impl DelayUs<u32> for NoDelay {
    fn delay_us(&mut self, _us: u32) {}
}

/// Photoresistor that reads `level` while the lamp is on and 0 otherwise.
pub struct FakeLight {
    pub level: u16,
    pub lamp_on: bool,
    /// Completed on/off cycles.
    pub lamp_cycles: u32,
}

impl FakeLight {
    pub fn new(level: u16) -> Self {
        Self {
            level,
            lamp_on: false,
            lamp_cycles: 0,
        }
    }
}

impl LightSensor for FakeLight {
    fn set_illumination(&mut self, on: bool) {
        if self.lamp_on && !on {
            self.lamp_cycles += 1;
        }
        self.lamp_on = on;
    }

    fn read_raw(&mut self) -> u16 {
        if self.lamp_on {
            self.level
        } else {
            0
        }
    }
}

pub struct FakeMetal(pub bool);

impl MetalSensor for FakeMetal {
    fn is_metal(&mut self) -> bool {
        self.0
    }
}

pub struct FakeInput {
    pub high: bool,
}

impl FakeInput {
    pub fn new(high: bool) -> Self {
        Self { high }
    }
}

impl InputPin for FakeInput {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

#[derive(Default)]
pub struct FakeOutput {
    pub high: bool,
}

impl OutputPin for FakeOutput {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeServo {
    pub angles: Vec<u8>,
}

impl ServoOutput for FakeServo {
    fn set_angle(&mut self, degrees: u8) {
        self.angles.push(degrees);
    }
}

#[derive(Default)]
pub struct FakeLids {
    pub log: Vec<(LidId, bool)>,
}

impl FakeLids {
    pub fn is_open(&self, lid: LidId) -> bool {
        self.log
            .iter()
            .rev()
            .find(|(l, _)| *l == lid)
            .map_or(false, |(_, open)| *open)
    }
}

impl LidActuator for FakeLids {
    fn set_lid(&mut self, lid: LidId, open: bool) {
        self.log.push((lid, open));
    }
}

/// Sensing results set directly by the test.
pub struct FakeSensing {
    /// Present from this time on. `None` = empty chamber.
    pub present_from: Option<u32>,
    pub metal: bool,
    pub weight_ok: bool,
    pub clear: bool,
    /// Alternate the weight result on every read.
    pub flap_weight: bool,
    /// Presence reads inside this window are served from cache.
    pub debounce_ms: u32,
    cached: Option<PresenceReading>,
}

impl FakeSensing {
    /// A valid bottle sitting in the chamber.
    pub fn bottle() -> Self {
        Self {
            present_from: Some(0),
            metal: false,
            weight_ok: true,
            clear: true,
            flap_weight: false,
            debounce_ms: 0,
            cached: None,
        }
    }
}

impl ObjectSensing for FakeSensing {
    fn read_presence(&mut self, now_ms: u32) -> PresenceReading {
        if let Some(c) = self.cached {
            if now_ms.wrapping_sub(c.sampled_at_ms) < self.debounce_ms {
                return PresenceReading { fresh: false, ..c };
            }
        }
        let present = self.present_from.map_or(false, |t| now_ms >= t);
        let reading = PresenceReading {
            present,
            value: if present { 3000 } else { 500 },
            sampled_at_ms: now_ms,
            fresh: true,
        };
        self.cached = Some(reading);
        reading
    }

    fn read_metal(&mut self) -> bool {
        self.metal
    }

    fn read_weight(&mut self) -> bool {
        let ok = self.weight_ok;
        if self.flap_weight {
            self.weight_ok = !self.weight_ok;
        }
        ok
    }

    fn read_clarity(&mut self) -> bool {
        self.clear
    }

    fn reset_presence(&mut self) {
        self.cached = None;
    }
}

#[derive(Default)]
pub struct FakeDisplay {
    pub lines: Vec<(String, String)>,
}

impl FakeDisplay {
    pub fn last(&self) -> (&str, &str) {
        self.lines
            .last()
            .map_or(("", ""), |(a, b)| (a.as_str(), b.as_str()))
    }
}

impl Display for FakeDisplay {
    fn show_lines(&mut self, line1: &str, line2: &str) {
        self.lines.push((line1.into(), line2.into()));
    }
}

#[derive(Default)]
pub struct FakeStatus {
    pub current: Option<Status>,
    pub history: Vec<Status>,
    pub last_refresh: Option<u32>,
}

impl StatusIndicator for FakeStatus {
    fn set_status(&mut self, status: Status) {
        self.current = Some(status);
        self.history.push(status);
    }

    fn refresh(&mut self, now_ms: u32) {
        self.last_refresh = Some(now_ms);
    }
}

/// MIFARE tag with a block map. `present` = a card is in the field.
pub struct FakeCard {
    pub present: bool,
    pub uid: CardId,
    pub blocks: BTreeMap<u8, [u8; BLOCK_LEN]>,
    pub fail_write: Option<CardError>,
    pub fail_auth: bool,
    pub sessions_released: u32,
    authenticated: Option<u8>,
}

impl FakeCard {
    pub fn absent() -> Self {
        Self {
            present: false,
            uid: [0x04, 0x3A, 0x91, 0x7C],
            blocks: BTreeMap::new(),
            fail_write: None,
            fail_auth: false,
            sessions_released: 0,
            authenticated: None,
        }
    }

    pub fn with_balance(block: u8, points: u16) -> Self {
        let mut card = Self::absent();
        card.present_with(block, points);
        card
    }

    pub fn present_with(&mut self, block: u8, points: u16) {
        self.present = true;
        self.blocks.insert(block, points_block::encode(points));
    }

    pub fn balance(&self, block: u8) -> u16 {
        self.blocks.get(&block).map_or(0, points_block::decode)
    }

    fn check_auth(&self, block: u8) -> Result<(), CardError> {
        if self.authenticated == Some(block) {
            Ok(())
        } else {
            Err(CardError::Auth)
        }
    }
}

impl CardStore for FakeCard {
    fn select(&mut self) -> Result<CardId, CardError> {
        if self.present {
            Ok(self.uid)
        } else {
            Err(CardError::NoCard)
        }
    }

    fn authenticate(&mut self, block: u8) -> Result<(), CardError> {
        if self.fail_auth {
            return Err(CardError::Auth);
        }
        self.authenticated = Some(block);
        Ok(())
    }

    fn read_block(&mut self, block: u8) -> Result<[u8; BLOCK_LEN], CardError> {
        self.check_auth(block)?;
        Ok(self.blocks.get(&block).copied().unwrap_or([0; BLOCK_LEN]))
    }

    fn write_block(&mut self, block: u8, data: &[u8; BLOCK_LEN]) -> Result<(), CardError> {
        self.check_auth(block)?;
        if let Some(e) = self.fail_write {
            return Err(e);
        }
        self.blocks.insert(block, *data);
        Ok(())
    }

    fn release(&mut self) {
        self.authenticated = None;
        self.sessions_released += 1;
    }
}

/// Hopper holding `stock` coins. Each drain while the relay is on ejects one.
pub struct FakeHopper {
    pub relay: bool,
    pub relay_history: Vec<bool>,
    pub stock: u32,
    /// Pulses counted but not yet taken.
    pub pending: u32,
}

impl FakeHopper {
    pub fn with_stock(stock: u32) -> Self {
        Self {
            relay: false,
            relay_history: Vec::new(),
            stock,
            pending: 0,
        }
    }
}

impl CoinHopper for FakeHopper {
    fn set_relay(&mut self, energized: bool) {
        self.relay = energized;
        self.relay_history.push(energized);
    }

    fn take_pulses(&mut self) -> u32 {
        if self.relay && self.stock > 0 {
            self.stock -= 1;
            self.pending += 1;
        }
        core::mem::take(&mut self.pending)
    }
}

pub struct FakeRanger {
    script: Script<Option<u32>>,
    pub pings: u32,
}

impl FakeRanger {
    pub fn new(echoes: &[Option<u32>]) -> Self {
        Self {
            script: Script::new(echoes),
            pings: 0,
        }
    }

    pub fn set(&mut self, echoes: &[Option<u32>]) {
        self.script = Script::new(echoes);
    }
}

impl RangeFinder for FakeRanger {
    fn ping_us(&mut self) -> Option<u32> {
        self.pings += 1;
        self.script.next()
    }
}

#[derive(Default)]
pub struct FakeAlert {
    pub sent: Vec<String>,
    pub attempts: u32,
    pub fail: Option<AlertError>,
}

impl AlertChannel for FakeAlert {
    fn send_alert(&mut self, text: &str) -> Result<(), AlertError> {
        self.attempts += 1;
        match self.fail {
            Some(e) => Err(e),
            None => {
                self.sent.push(text.into());
                Ok(())
            }
        }
    }
}

/// Bin monitor reporting `full` on every tick.
#[derive(Default)]
pub struct FakeBins {
    pub full: bool,
}

impl BinMonitor for FakeBins {
    fn poll(&mut self, _now_ms: u32, sys: &mut SystemState) -> Option<FillEvent> {
        match (sys.maintenance, self.full) {
            (false, true) => {
                sys.maintenance = true;
                Some(FillEvent::BinFull)
            }
            (true, false) => {
                sys.maintenance = false;
                Some(FillEvent::BinCleared)
            }
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct FakePanel {
    pub levels: ButtonLevels,
}

impl ButtonPanel for FakePanel {
    fn levels(&mut self) -> ButtonLevels {
        self.levels
    }
}

/// Deterministic pseudo-random numbers.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }
}
