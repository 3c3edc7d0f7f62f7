// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Flows
//!
//! The step-driven flows the machine runs. None of them sleeps; each is advanced once per loop
//! iteration with the current millisecond time.
//!
//! ## Modules
//!
//! - [`deposit`] - Deposit and verification cycle for one bottle.
//! - [`amount`] - Redemption amount entry with hold-to-accelerate.
//! - [`dispense`] - Coin hopper payout and card payout.
//! - [`monitor`] - Bin fill-level check and maintenance mode.

pub mod amount;
pub mod deposit;
pub mod dispense;
pub mod monitor;

pub use amount::{AmountEntry, EntryStatus};
pub use deposit::{DepositCycle, DepositOutcome, DepositPorts, DepositState, RejectReason};
pub use dispense::{CoinDispenser, DispenseReport, PulseGate};
pub use monitor::{BinMonitor, FillEvent, FillMonitor};
