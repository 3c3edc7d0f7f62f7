// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Redemption amount entry on the up/down/select buttons.
//!
//! Up and down move the amount by one per press. Holding either auto-repeats with a step that
//! grows by one for every full `accel_period_ms` held. A short select confirms, holding select
//! for `long_press_ms` cancels.

use crate::config::InputConfig;
use crate::io::Display;
use crate::ledger::PointsLedger;
use crate::ui::{ButtonEvent, ButtonId, Line};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EntryStatus {
    Unchanged,
    /// The amount moved; redraw.
    Changed(u32),
    Confirmed(u32),
    Cancelled,
}

pub struct AmountEntry {
    accel_period_ms: u32,
    /// Set once select has been pressed inside this entry.
    select_armed: bool,
}

impl AmountEntry {
    pub fn new(cfg: &InputConfig) -> Self {
        Self {
            accel_period_ms: cfg.accel_period_ms,
            select_armed: false,
        }
    }

    /// Begin choosing. Returns the most that can be redeemed.
    pub fn start(&mut self, ledger: &mut PointsLedger, cap: u32) -> u32 {
        self.select_armed = false;
        ledger.begin_redemption(cap)
    }

    pub fn handle(&mut self, event: ButtonEvent, ledger: &mut PointsLedger) -> EntryStatus {
        let period = self.accel_period_ms;
        let adjusted = match event {
            ButtonEvent::Pressed(ButtonId::Up) => Some(ledger.adjust_held(true, 0, period)),
            ButtonEvent::Pressed(ButtonId::Down) => Some(ledger.adjust_held(false, 0, period)),
            ButtonEvent::Repeat {
                id: ButtonId::Up,
                held_ms,
            } => Some(ledger.adjust_held(true, held_ms, period)),
            ButtonEvent::Repeat {
                id: ButtonId::Down,
                held_ms,
            } => Some(ledger.adjust_held(false, held_ms, period)),
            ButtonEvent::Pressed(ButtonId::Select) => {
                self.select_armed = true;
                None
            }
            ButtonEvent::LongPress(ButtonId::Select) if self.select_armed => {
                self.select_armed = false;
                ledger.cancel_redemption();
                log::info!("redemption cancelled");
                return EntryStatus::Cancelled;
            }
            ButtonEvent::Released {
                id: ButtonId::Select,
                long: false,
                ..
            } if self.select_armed => {
                self.select_armed = false;
                return EntryStatus::Confirmed(ledger.points_to_redeem());
            }
            _ => None,
        };
        match adjusted {
            Some(amount) => EntryStatus::Changed(amount),
            None => EntryStatus::Unchanged,
        }
    }

    pub fn render(&self, ledger: &PointsLedger, display: &mut dyn Display) {
        let line1 = Line::format(format_args!(
            "Redeem: {}/{}",
            ledger.points_to_redeem(),
            ledger.max_redeemable()
        ));
        display.show_lines(line1.as_str(), "SEL=OK hold=end");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDisplay;

    fn entry(total: u32) -> (AmountEntry, PointsLedger) {
        let mut e = AmountEntry::new(&InputConfig::default());
        let mut l = PointsLedger::with_points(total);
        e.start(&mut l, 50);
        (e, l)
    }

    #[test]
    fn presses_step_by_one_and_holds_accelerate() {
        let (mut e, mut l) = entry(40);
        assert_eq!(e.handle(ButtonEvent::Pressed(ButtonId::Up), &mut l), EntryStatus::Changed(1));
        let held = |held_ms| ButtonEvent::Repeat {
            id: ButtonId::Up,
            held_ms,
        };
        assert_eq!(e.handle(held(200), &mut l), EntryStatus::Changed(2));
        assert_eq!(e.handle(held(1000), &mut l), EntryStatus::Changed(4));
        assert_eq!(e.handle(held(2200), &mut l), EntryStatus::Changed(7));
        assert_eq!(e.handle(ButtonEvent::Pressed(ButtonId::Down), &mut l), EntryStatus::Changed(6));
    }

    #[test]
    fn short_select_confirms() {
        let (mut e, mut l) = entry(10);
        e.handle(ButtonEvent::Pressed(ButtonId::Up), &mut l);
        e.handle(ButtonEvent::Pressed(ButtonId::Select), &mut l);
        let release = ButtonEvent::Released {
            id: ButtonId::Select,
            held_ms: 120,
            long: false,
        };
        assert_eq!(e.handle(release, &mut l), EntryStatus::Confirmed(1));
    }

    #[test]
    fn release_of_a_press_from_before_entry_is_ignored() {
        let (mut e, mut l) = entry(10);
        let release = ButtonEvent::Released {
            id: ButtonId::Select,
            held_ms: 120,
            long: false,
        };
        assert_eq!(e.handle(release, &mut l), EntryStatus::Unchanged);
    }

    #[test]
    fn long_select_cancels_without_touching_total() {
        let (mut e, mut l) = entry(10);
        e.handle(ButtonEvent::Pressed(ButtonId::Up), &mut l);
        e.handle(ButtonEvent::Pressed(ButtonId::Select), &mut l);
        assert_eq!(
            e.handle(ButtonEvent::LongPress(ButtonId::Select), &mut l),
            EntryStatus::Cancelled
        );
        assert_eq!(l.points_to_redeem(), 0);
        assert_eq!(l.total(), 10);
        let release = ButtonEvent::Released {
            id: ButtonId::Select,
            held_ms: 2100,
            long: true,
        };
        assert_eq!(e.handle(release, &mut l), EntryStatus::Unchanged);
    }

    #[test]
    fn render_shows_amount_and_limit() {
        let (e, l) = entry(8);
        let mut d = FakeDisplay::default();
        e.render(&l, &mut d);
        assert_eq!(d.last().0, "Redeem: 0/8");
    }
}
