// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Actuator Abstractions
//!
//! Mechanism-level wrappers that sit above the device drivers in `drivers`.
//!
//! ## Modules
//!
//! - [`lid`] - Intake and drop lids driven by two servos.

pub mod lid;

pub use lid::{LidActuator, LidId, ServoLids, ServoOutput};
