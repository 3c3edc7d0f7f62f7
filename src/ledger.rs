// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Running points total and redemption bookkeeping.
//!
//! The total lives in RAM for as long as the firmware runs. The only persistent copy is the
//! points block on the customer's RFID tag, written through a [`CardStore`]. A failed card
//! operation never changes the in-memory total.

use crate::error::{CardError, LedgerError};
use crate::io::{CardId, CardStore};
use crate::protocol::points_block;

/// Adjustment step for a button held `held_ms`: one more point per full `accel_period_ms`.
#[inline]
pub fn hold_step(held_ms: u32, accel_period_ms: u32) -> u32 {
    1 + held_ms / accel_period_ms.max(1)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointsLedger {
    total_points: u32,
    points_to_redeem: u32,
    max_redeemable: u32,
    /// Card the total was loaded from. Writes go only to this card while it is set.
    loaded_card: Option<CardId>,
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(total_points: u32) -> Self {
        Self {
            total_points,
            ..Self::default()
        }
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.total_points
    }

    #[inline]
    pub fn points_to_redeem(&self) -> u32 {
        self.points_to_redeem
    }

    #[inline]
    pub fn max_redeemable(&self) -> u32 {
        self.max_redeemable
    }

    #[inline]
    pub fn loaded_card(&self) -> Option<CardId> {
        self.loaded_card
    }

    /// Add points. Saturates at the top of the range.
    pub fn credit(&mut self, amount: u32) -> u32 {
        self.total_points = self.total_points.saturating_add(amount);
        self.total_points
    }

    /// Start choosing a redemption amount. Returns the most that can be redeemed.
    pub fn begin_redemption(&mut self, cap: u32) -> u32 {
        self.points_to_redeem = 0;
        self.max_redeemable = self.total_points.min(cap);
        self.max_redeemable
    }

    /// Move the amount by `delta`, clamped to `[0, max_redeemable]`.
    pub fn adjust_redeem_amount(&mut self, delta: i32) -> u32 {
        let next = self.points_to_redeem as i64 + delta as i64;
        self.points_to_redeem = next.clamp(0, self.max_redeemable as i64) as u32;
        self.points_to_redeem
    }

    /// Adjust by the accelerated step of a button held for `held_ms`.
    pub fn adjust_held(&mut self, increase: bool, held_ms: u32, accel_period_ms: u32) -> u32 {
        let step = hold_step(held_ms, accel_period_ms).min(i32::MAX as u32) as i32;
        self.adjust_redeem_amount(if increase { step } else { -step })
    }

    /// Debit the chosen amount. Returns `(amount, new_total)`.
    pub fn commit_redemption(&mut self) -> Result<(u32, u32), LedgerError> {
        let amount = self.checked_amount()?;
        self.total_points -= amount;
        self.points_to_redeem = 0;
        self.max_redeemable = 0;
        Ok((amount, self.total_points))
    }

    pub fn cancel_redemption(&mut self) {
        self.points_to_redeem = 0;
        self.max_redeemable = 0;
    }

    /// Forget a balance loaded from a card. The card itself is not touched.
    pub fn release_card(&mut self) {
        if self.loaded_card.take().is_some() {
            self.total_points = 0;
        }
        self.cancel_redemption();
    }

    /// Replace the total with the balance stored on the card and remember which card it was.
    pub fn load_from_card<C>(&mut self, card: &mut C, block: u8) -> Result<u16, LedgerError>
    where
        C: CardStore + ?Sized,
    {
        let (id, points) = card_session(card, block, |c, id| {
            c.read_block(block).map(|b| (id, points_block::decode(&b)))
        })?;
        self.total_points = points as u32;
        self.loaded_card = Some(id);
        log::info!("loaded {} points from card {:02x?}", points, id);
        Ok(points)
    }

    /// Write the total onto the card, replacing its balance, then zero the total. While a card
    /// balance is loaded only that card is written.
    pub fn store_to_card<C>(&mut self, card: &mut C, block: u8) -> Result<u16, LedgerError>
    where
        C: CardStore + ?Sized,
    {
        let points = to_block_value(self.total_points)?;
        let expected = self.loaded_card;
        card_session(card, block, |c, id| {
            if expected.map_or(false, |e| e != id) {
                return Err(CardError::WrongCard);
            }
            c.write_block(block, &points_block::encode(points))
        })?;
        self.total_points = 0;
        self.loaded_card = None;
        log::info!("stored {} points to card", points);
        Ok(points)
    }

    /// Take the chosen amount off the loaded card by storing what is left of its balance.
    /// Returns `(amount, card_balance)`. On any failure the ledger and the card are unchanged.
    pub fn debit_card<C>(&mut self, card: &mut C, block: u8) -> Result<(u32, u16), LedgerError>
    where
        C: CardStore + ?Sized,
    {
        if self.loaded_card.is_none() {
            return Err(LedgerError::NoCardLoaded);
        }
        let amount = self.checked_amount()?;
        let loaded = self.total_points;
        self.total_points = loaded - amount;
        match self.store_to_card(card, block) {
            Ok(balance) => {
                self.cancel_redemption();
                log::info!("debited {} points, card balance {}", amount, balance);
                Ok((amount, balance))
            }
            Err(e) => {
                self.total_points = loaded;
                Err(e)
            }
        }
    }

    /// Add the total onto the card's existing balance, then zero the total.
    /// Returns the new card balance.
    pub fn bank_to_card<C>(&mut self, card: &mut C, block: u8) -> Result<u16, LedgerError>
    where
        C: CardStore + ?Sized,
    {
        let total = self.total_points;
        let mut overflow = None;
        let balance = card_session(card, block, |c, _| {
            let existing = points_block::decode(&c.read_block(block)?) as u32;
            let sum = existing.saturating_add(total);
            match u16::try_from(sum) {
                Ok(value) => {
                    c.write_block(block, &points_block::encode(value))?;
                    Ok(value)
                }
                Err(_) => {
                    overflow = Some(sum);
                    Ok(0)
                }
            }
        })?;
        if let Some(points) = overflow {
            return Err(LedgerError::Overflow { points });
        }
        self.total_points = 0;
        log::info!("banked {} points, card balance {}", total, balance);
        Ok(balance)
    }

    fn checked_amount(&self) -> Result<u32, LedgerError> {
        if self.points_to_redeem > self.total_points {
            return Err(LedgerError::InsufficientPoints {
                requested: self.points_to_redeem,
                available: self.total_points,
            });
        }
        Ok(self.points_to_redeem)
    }
}

fn to_block_value(points: u32) -> Result<u16, LedgerError> {
    u16::try_from(points).map_err(|_| LedgerError::Overflow { points })
}

/// Run `f` inside a select/authenticate/release session, passing the selected card's UID.
/// Authentication is redone for every session; nothing is cached across card presentations.
fn card_session<C, T, F>(card: &mut C, block: u8, f: F) -> Result<T, CardError>
where
    C: CardStore + ?Sized,
    F: FnOnce(&mut C, CardId) -> Result<T, CardError>,
{
    let result = card.select().and_then(|id| {
        card.authenticate(block)?;
        f(card, id)
    });
    card.release();
    match &result {
        Err(CardError::NoCard) | Ok(_) => {}
        Err(e) => log::warn!("card session on block {} failed: {}", block, e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCard, Lcg};

    #[test]
    fn redemption_is_clamped_to_total() {
        let mut l = PointsLedger::with_points(5);
        assert_eq!(l.begin_redemption(20), 5);
        assert_eq!(l.adjust_redeem_amount(100), 5);
        assert_eq!(l.adjust_redeem_amount(-100), 0);
    }

    #[test]
    fn redemption_is_clamped_to_cap() {
        let mut l = PointsLedger::with_points(80);
        assert_eq!(l.begin_redemption(50), 50);
        assert_eq!(l.adjust_redeem_amount(i32::MAX), 50);
    }

    #[test]
    fn begin_and_cancel_reset_amount() {
        let mut l = PointsLedger::with_points(10);
        l.begin_redemption(50);
        l.adjust_redeem_amount(4);
        l.cancel_redemption();
        assert_eq!(l.points_to_redeem(), 0);
        assert_eq!(l.total(), 10);
        l.begin_redemption(50);
        assert_eq!(l.points_to_redeem(), 0);
    }

    #[test]
    fn commit_debits_and_reports() {
        let mut l = PointsLedger::with_points(10);
        l.begin_redemption(50);
        l.adjust_redeem_amount(7);
        assert_eq!(l.commit_redemption(), Ok((7, 3)));
        assert_eq!(l.points_to_redeem(), 0);
    }

    #[test]
    fn commit_without_adjust_is_zero() {
        let mut l = PointsLedger::with_points(10);
        l.begin_redemption(50);
        assert_eq!(l.commit_redemption(), Ok((0, 10)));
    }

    #[test]
    fn hold_acceleration_grows_each_second() {
        assert_eq!(hold_step(0, 1000), 1);
        assert_eq!(hold_step(999, 1000), 1);
        assert_eq!(hold_step(1000, 1000), 2);
        assert_eq!(hold_step(3400, 1000), 4);

        let mut l = PointsLedger::with_points(40);
        l.begin_redemption(50);
        assert_eq!(l.adjust_held(true, 0, 1000), 1);
        assert_eq!(l.adjust_held(true, 2000, 1000), 4);
        assert_eq!(l.adjust_held(false, 5000, 1000), 0);
    }

    #[test]
    fn random_sequences_never_go_negative_or_out_of_range() {
        let mut rng = Lcg::new(7);
        let mut l = PointsLedger::new();
        for _ in 0..5000 {
            match rng.next() % 4 {
                0 => {
                    l.credit(rng.next() % 5);
                }
                1 => {
                    let cap = rng.next() % 60;
                    l.begin_redemption(cap);
                    assert_eq!(l.max_redeemable(), l.total().min(cap));
                }
                2 => {
                    let delta = (rng.next() % 400) as i32 - 200;
                    let amount = l.adjust_redeem_amount(delta);
                    assert!(amount <= l.max_redeemable());
                    assert!(l.max_redeemable() <= l.total());
                }
                _ => {
                    let before = l.total();
                    let (amount, after) = l.commit_redemption().unwrap();
                    assert_eq!(before - amount, after);
                }
            }
        }
    }

    #[test]
    fn store_then_load_round_trips() {
        let mut card = FakeCard::with_balance(4, 0);
        let mut l = PointsLedger::with_points(321);
        assert_eq!(l.store_to_card(&mut card, 4), Ok(321));
        assert_eq!(l.total(), 0);
        assert_eq!(l.load_from_card(&mut card, 4), Ok(321));
        assert_eq!(l.total(), 321);
        assert_eq!(card.sessions_released, 2);
    }

    #[test]
    fn bank_adds_onto_existing_balance() {
        let mut card = FakeCard::with_balance(4, 100);
        let mut l = PointsLedger::with_points(7);
        assert_eq!(l.bank_to_card(&mut card, 4), Ok(107));
        assert_eq!(l.total(), 0);
        assert_eq!(card.balance(4), 107);
    }

    #[test]
    fn failed_write_leaves_total_unchanged() {
        let mut card = FakeCard::with_balance(4, 0);
        card.fail_write = Some(CardError::Timeout);
        let mut l = PointsLedger::with_points(12);
        assert_eq!(
            l.store_to_card(&mut card, 4),
            Err(LedgerError::Card(CardError::Timeout))
        );
        assert_eq!(l.total(), 12);
        assert_eq!(card.sessions_released, 1);
    }

    #[test]
    fn failed_auth_leaves_total_unchanged() {
        let mut card = FakeCard::with_balance(4, 55);
        card.fail_auth = true;
        let mut l = PointsLedger::with_points(3);
        assert_eq!(
            l.load_from_card(&mut card, 4),
            Err(LedgerError::Card(CardError::Auth))
        );
        assert_eq!(l.bank_to_card(&mut card, 4), Err(LedgerError::Card(CardError::Auth)));
        assert_eq!(l.total(), 3);
    }

    #[test]
    fn debit_writes_remaining_balance_before_clearing_ram() {
        let mut card = FakeCard::with_balance(4, 20);
        let mut l = PointsLedger::new();
        l.load_from_card(&mut card, 4).unwrap();
        l.begin_redemption(50);
        l.adjust_redeem_amount(5);
        assert_eq!(l.debit_card(&mut card, 4), Ok((5, 15)));
        assert_eq!(card.balance(4), 15);
        assert_eq!(l.total(), 0);
        assert_eq!(l.points_to_redeem(), 0);
        assert_eq!(l.loaded_card(), None);
    }

    #[test]
    fn failed_debit_changes_neither_card_nor_ledger() {
        let mut card = FakeCard::with_balance(4, 20);
        let mut l = PointsLedger::new();
        l.load_from_card(&mut card, 4).unwrap();
        l.begin_redemption(50);
        l.adjust_redeem_amount(5);
        card.fail_write = Some(CardError::Timeout);
        assert_eq!(l.debit_card(&mut card, 4), Err(LedgerError::Card(CardError::Timeout)));
        assert_eq!(card.balance(4), 20);
        assert_eq!(l.total(), 20);
        assert_eq!(l.points_to_redeem(), 5);

        // Giving up drops the loaded balance, so nothing is left over to bank later.
        l.release_card();
        assert_eq!(l.total(), 0);
        let mut other = FakeCard::with_balance(4, 0);
        assert_eq!(l.bank_to_card(&mut other, 4), Ok(0));
        assert_eq!(l.load_from_card(&mut card, 4), Ok(20));
    }

    #[test]
    fn debit_refuses_a_different_card() {
        let mut card = FakeCard::with_balance(4, 20);
        let mut l = PointsLedger::new();
        l.load_from_card(&mut card, 4).unwrap();
        l.begin_redemption(50);
        l.adjust_redeem_amount(5);

        card.uid = [0x11, 0x22, 0x33, 0x44];
        card.present_with(4, 3);
        assert_eq!(
            l.debit_card(&mut card, 4),
            Err(LedgerError::Card(CardError::WrongCard))
        );
        assert_eq!(card.balance(4), 3);
        assert_eq!(l.total(), 20);
    }

    #[test]
    fn debit_needs_a_loaded_card() {
        let mut card = FakeCard::with_balance(4, 20);
        let mut l = PointsLedger::with_points(8);
        l.begin_redemption(50);
        l.adjust_redeem_amount(2);
        assert_eq!(l.debit_card(&mut card, 4), Err(LedgerError::NoCardLoaded));
        assert_eq!(card.balance(4), 20);
        assert_eq!(l.total(), 8);
    }

    #[test]
    fn release_keeps_session_points() {
        let mut l = PointsLedger::with_points(4);
        l.begin_redemption(50);
        l.adjust_redeem_amount(2);
        l.release_card();
        assert_eq!(l.total(), 4);
        assert_eq!(l.points_to_redeem(), 0);
    }

    #[test]
    fn oversized_values_are_refused() {
        let mut card = FakeCard::with_balance(4, 65_000);
        let mut l = PointsLedger::with_points(1000);
        assert_eq!(
            l.bank_to_card(&mut card, 4),
            Err(LedgerError::Overflow { points: 66_000 })
        );
        assert_eq!(l.total(), 1000);
        assert_eq!(card.balance(4), 65_000);

        let mut l = PointsLedger::with_points(70_000);
        assert_eq!(
            l.store_to_card(&mut card, 4),
            Err(LedgerError::Overflow { points: 70_000 })
        );
    }
}
