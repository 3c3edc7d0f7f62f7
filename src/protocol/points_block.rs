// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Layout of the points block on the RFID tag.
//!
//! Bytes 0..2 hold the balance as a big-endian `u16`; bytes 2..16 are reserved and written as
//! zero.

use crate::io::BLOCK_LEN;

pub fn encode(points: u16) -> [u8; BLOCK_LEN] {
    let mut block = [0u8; BLOCK_LEN];
    block[..2].copy_from_slice(&points.to_be_bytes());
    block
}

/// Reserved bytes are ignored on read.
pub fn decode(block: &[u8; BLOCK_LEN]) -> u16 {
    u16::from_be_bytes([block[0], block[1]])
}
