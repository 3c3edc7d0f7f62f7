// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-level formats: modem AT replies and the points block stored on RFID tags.

pub mod messages;
pub mod parser;
pub mod points_block;

pub use messages::Reply;
pub use parser::Parser;
