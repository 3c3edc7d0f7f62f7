// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # PISO-BOTE Firmware
//!
//! This crate contains the firmware of the PISO-BOTE reverse vending machine, written in Rust,
//! targeting an STM32F767ZI MCU. Customers deposit plastic bottles, earn points, and redeem them
//! for coins or save them onto an RFID card.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | MCU-level wrappers around ADC, timers, EXTI, USART, LEDs |
//! | [`drivers`] | Device-level drivers (MFRC522, HD44780/PCF8574, HX711, HC-SR04, SIM800L, servos) |
//! | [`protocol`] | Modem replies and the on-card points block |
//! | [`sensing`] | Presence, metal, weight and clarity checks on the chamber |
//! | [`actuators`] | Intake and drop lids |
//! | [`control`] | Deposit cycle, redemption amount entry, coin payout, bin fill monitor |
//! | [`ledger`] | Points total and card transfers |
//! | [`ui`] | Menus, buttons and display/status feedback |
//! | [`machine`] | Top-level state and the per-tick scheduler |
//! | [`config`] | Tunable constants |
//!
//! ## Getting Started
//!
//! Build docs:
//!
//! ```bash
//! cargo doc --no-deps --open
//! ```
//!
//! Run the logic tests on the host:
//!
//! ```bash
//! cargo test --lib
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod actuators;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod hw;
pub mod io;
pub mod ledger;
pub mod machine;
pub mod protocol;
pub mod sensing;
pub mod ui;

#[cfg(test)]
mod testing;
