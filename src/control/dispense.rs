// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Redemption payout.
//!
//! Coins come out of a hopper driven by a relay. The hopper's coin sensor pulses once per coin;
//! pulses are counted in the interrupt handler (see [`PulseGate`]) and drained here each loop
//! iteration. The relay is released on completion and on timeout, whichever comes first.
//!
//! A redemption funded from a card balance debits the card before any coin moves.

use crate::config::DispenseConfig;
use crate::error::LedgerError;
use crate::io::{CardStore, CoinHopper};
use crate::ledger::PointsLedger;
use crate::ui::Line;

/// Result of one coin payout.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DispenseReport {
    pub requested: u32,
    pub dispensed: u32,
}

impl DispenseReport {
    pub fn is_complete(&self) -> bool {
        self.dispensed >= self.requested
    }

    /// Coins owed to the customer. Not re-credited to the ledger.
    pub fn shortfall(&self) -> u32 {
        self.requested.saturating_sub(self.dispensed)
    }

    /// `dispensed/requested`, e.g. `7/10`.
    pub fn summary(&self) -> Line {
        Line::format(format_args!("{}/{}", self.dispensed, self.requested))
    }
}

/// Minimum spacing between two counted hopper pulses. Pure so it can run inside the ISR.
#[derive(Copy, Clone, Debug)]
pub struct PulseGate {
    last_ms: Option<u32>,
    debounce_ms: u32,
}

impl PulseGate {
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            last_ms: None,
            debounce_ms,
        }
    }

    /// `true` when an edge at `now_ms` counts as a new coin.
    pub fn accept(&mut self, now_ms: u32) -> bool {
        match self.last_ms {
            Some(last) if now_ms.wrapping_sub(last) < self.debounce_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Run {
    requested: u32,
    dispensed: u32,
    started: u32,
}

pub struct CoinDispenser<H> {
    hopper: H,
    cfg: DispenseConfig,
    run: Option<Run>,
}

impl<H: CoinHopper> CoinDispenser<H> {
    /// Take the hopper with its relay released.
    pub fn new(mut hopper: H, cfg: DispenseConfig) -> Self {
        hopper.set_relay(false);
        Self {
            hopper,
            cfg,
            run: None,
        }
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.run.is_some()
    }

    pub fn hopper_mut(&mut self) -> &mut H {
        &mut self.hopper
    }

    /// Arm the relay for `amount` coins. A zero amount finishes immediately.
    pub fn start(&mut self, amount: u32, now_ms: u32) -> Option<DispenseReport> {
        // Pulses from before the run are not coins of this payout.
        let stale = self.hopper.take_pulses();
        if stale > 0 {
            log::warn!("discarding {} stray hopper pulses", stale);
        }
        if amount == 0 {
            return Some(DispenseReport {
                requested: 0,
                dispensed: 0,
            });
        }
        log::info!("dispensing {} coins", amount);
        self.hopper.set_relay(true);
        self.run = Some(Run {
            requested: amount,
            dispensed: 0,
            started: now_ms,
        });
        None
    }

    /// Count pulses. Returns the report once the payout has finished.
    pub fn poll(&mut self, now_ms: u32) -> Option<DispenseReport> {
        let mut run = self.run?;
        run.dispensed = run.dispensed.saturating_add(self.hopper.take_pulses());

        let done = run.dispensed >= run.requested;
        let timed_out = now_ms.wrapping_sub(run.started) >= self.cfg.timeout_ms;
        if !done && !timed_out {
            self.run = Some(run);
            return None;
        }

        self.hopper.set_relay(false);
        self.run = None;
        let report = DispenseReport {
            requested: run.requested,
            dispensed: run.dispensed,
        };
        if report.is_complete() {
            log::info!("dispensed {} coins", report.dispensed);
        } else {
            log::warn!(
                "dispense timed out: {}/{} coins, {} owed",
                report.dispensed,
                report.requested,
                report.shortfall()
            );
        }
        Some(report)
    }

    /// Card-funded payout. The chosen amount comes off the loaded card first; the relay is
    /// armed only once the card holds the reduced balance. Returns the amount and, for a zero
    /// amount, the finished report.
    pub fn start_from_card<C>(
        &mut self,
        ledger: &mut PointsLedger,
        card: &mut C,
        block: u8,
        now_ms: u32,
    ) -> Result<(u32, Option<DispenseReport>), LedgerError>
    where
        C: CardStore + ?Sized,
    {
        let (amount, _) = ledger.debit_card(card, block)?;
        Ok((amount, self.start(amount, now_ms)))
    }
}

/// Card payout: move the session points onto the card balance.
pub fn pay_to_card<C>(ledger: &mut PointsLedger, card: &mut C, block: u8) -> Result<u16, LedgerError>
where
    C: CardStore + ?Sized,
{
    ledger.bank_to_card(card, block)
}
