// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Error types shared across the firmware.
//!
//! Every failure is handled where it is detected and turned into a user-visible message, so
//! these enums stay small and carry just enough context for logging.

use core::fmt;

/// Failures talking to an RFID tag.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CardError {
    /// No card answered the request.
    NoCard,
    /// Two or more cards answered at once.
    Collision,
    /// Sector authentication with the default key failed.
    Auth,
    /// The reader did not finish a command in time.
    Timeout,
    /// CRC or BCC mismatch in a card response.
    Integrity,
    /// The card NAKed a command or returned an unexpected frame.
    Protocol,
    /// SPI transfer to the reader failed.
    Bus,
    /// A different card answered than the one the balance was read from.
    WrongCard,
}

impl fmt::Display for CardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            CardError::NoCard => "no card",
            CardError::Collision => "card collision",
            CardError::Auth => "authentication failed",
            CardError::Timeout => "reader timeout",
            CardError::Integrity => "checksum mismatch",
            CardError::Protocol => "unexpected card response",
            CardError::Bus => "reader bus error",
            CardError::WrongCard => "not the card that was read",
        };
        f.write_str(msg)
    }
}

/// Failures of points ledger operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LedgerError {
    /// A commit asked for more points than the ledger holds.
    InsufficientPoints { requested: u32, available: u32 },
    /// The value does not fit the 16-bit points block.
    Overflow { points: u32 },
    /// A card debit was asked for with no card balance loaded.
    NoCardLoaded,
    /// The card read or write did not happen.
    Card(CardError),
}

impl From<CardError> for LedgerError {
    fn from(e: CardError) -> Self {
        LedgerError::Card(e)
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InsufficientPoints {
                requested,
                available,
            } => write!(f, "insufficient points: {} > {}", requested, available),
            LedgerError::Overflow { points } => write!(f, "{} points do not fit on card", points),
            LedgerError::NoCardLoaded => f.write_str("no card balance loaded"),
            LedgerError::Card(e) => write!(f, "card: {}", e),
        }
    }
}

/// Failures of the outbound alert channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AlertError {
    /// The modem did not answer within the reply window.
    Timeout,
    /// The modem answered `ERROR`.
    Rejected,
    /// Serial read error (framing, overrun, noise).
    Serial,
}

impl fmt::Display for AlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AlertError::Timeout => "modem timeout",
            AlertError::Rejected => "modem rejected command",
            AlertError::Serial => "modem serial error",
        };
        f.write_str(msg)
    }
}

/// Reasons a deposit cycle could not start.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DepositError {
    /// The bin is full and the machine is in maintenance mode.
    Maintenance,
    /// A cycle is already running.
    Busy,
}

impl fmt::Display for DepositError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepositError::Maintenance => f.write_str("machine under maintenance"),
            DepositError::Busy => f.write_str("deposit already in progress"),
        }
    }
}

/// Failures of the character display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LcdError {
    /// The I2C backpack did not acknowledge.
    Bus,
}

impl fmt::Display for LcdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LcdError::Bus => f.write_str("display not responding on I2C"),
        }
    }
}
