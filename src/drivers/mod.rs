// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! Drivers for the parts on the machine, written against `embedded-hal` traits so they run on
//! the board and against fakes in tests. Each implements the matching capability trait from
//! [`crate::io`].
//!
//! - [`mfrc522`] – NXP MFRC522 13.56 MHz RFID reader (SPI), MIFARE Classic block access
//! - [`lcd1602`] – HD44780 16x2 LCD behind a PCF8574 I2C backpack
//! - [`hx711`] – Avia HX711 load-cell ADC
//! - [`hcsr04`] – HC-SR04 ultrasonic ranger
//! - [`sim800l`] – SIMCom SIM800L GSM modem for SMS alerts
//! - [`servo`] – 50 Hz hobby servo on a PWM channel

pub mod hcsr04;
pub mod hx711;
pub mod lcd1602;
pub mod mfrc522;
pub mod servo;
pub mod sim800l;

pub use hcsr04::HcSr04;
pub use hx711::Hx711;
pub use lcd1602::Lcd1602;
pub use mfrc522::Mfrc522;
pub use servo::Servo;
pub use sim800l::Sim800l;
