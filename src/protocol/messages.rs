// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! AT command vocabulary used to talk to the SIM800L GSM modem.

/// Plain attention check.
pub const CMD_ATTENTION: &str = "AT";
/// Switch SMS handling to text mode.
pub const CMD_TEXT_MODE: &str = "AT+CMGF=1";
/// Prefix of the send-message command; followed by the quoted number.
pub const CMD_SEND_PREFIX: &str = "AT+CMGS=\"";

/// Terminates the message body in text mode.
pub const CTRL_Z: u8 = 0x1A;
/// Cancels a pending message body.
pub const ESC: u8 = 0x1B;

/// Modem replies the firmware acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Error,
    /// `>` prompt asking for the message body.
    Prompt,
    /// `+CMGS: <mr>` message reference after a successful send.
    MessageRef(u16),
}
