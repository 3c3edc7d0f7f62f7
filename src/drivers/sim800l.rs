// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! SIMCom SIM800L GSM modem, used only to send text-mode SMS alerts.
//!
//! Every exchange is bounded: a reply that does not arrive within the configured window fails
//! the send instead of hanging the main loop.

use embedded_hal::serial::{Read, Write};

use crate::config::AlertConfig;
use crate::error::AlertError;
use crate::io::AlertChannel;
use crate::protocol::messages::{CMD_ATTENTION, CMD_SEND_PREFIX, CMD_TEXT_MODE, CTRL_Z, ESC};
use crate::protocol::{Parser, Reply};

pub struct Sim800l<SERIAL, CLK> {
    serial: SERIAL,
    millis: CLK,
    parser: Parser,
    phone_number: &'static str,
    reply_timeout_ms: u32,
    send_timeout_ms: u32,
}

impl<SERIAL, CLK> Sim800l<SERIAL, CLK>
where
    SERIAL: Read<u8> + Write<u8>,
    CLK: FnMut() -> u32,
{
    pub fn new(serial: SERIAL, millis: CLK, cfg: &AlertConfig) -> Self {
        Self {
            serial,
            millis,
            parser: Parser::new(),
            phone_number: cfg.phone_number,
            reply_timeout_ms: cfg.reply_timeout_ms,
            send_timeout_ms: cfg.send_timeout_ms,
        }
    }

    pub fn free(self) -> SERIAL {
        self.serial
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), AlertError> {
        for &b in bytes {
            nb::block!(self.serial.write(b)).map_err(|_| AlertError::Serial)?;
        }
        nb::block!(self.serial.flush()).map_err(|_| AlertError::Serial)
    }

    fn command(&mut self, parts: &[&str]) -> Result<(), AlertError> {
        for part in parts {
            self.write_bytes(part.as_bytes())?;
        }
        self.write_bytes(b"\r\n")
    }

    /// Wait for one of the replies `accept` returns true for. `ERROR` fails immediately.
    fn await_reply(&mut self, timeout_ms: u32, accept: fn(Reply) -> bool) -> Result<Reply, AlertError> {
        let start = (self.millis)();
        loop {
            match self.serial.read() {
                Ok(byte) => match self.parser.push(byte) {
                    Some(Reply::Error) => return Err(AlertError::Rejected),
                    Some(reply) if accept(reply) => return Ok(reply),
                    Some(reply) => log::trace!("modem: ignoring {:?}", reply),
                    None => {}
                },
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => return Err(AlertError::Serial),
            }
            if (self.millis)().wrapping_sub(start) >= timeout_ms {
                return Err(AlertError::Timeout);
            }
        }
    }

    fn expect_ok(&mut self) -> Result<(), AlertError> {
        self.await_reply(self.reply_timeout_ms, |r| r == Reply::Ok).map(|_| ())
    }

    /// Send `text` to `number`.
    pub fn send_sms(&mut self, number: &str, text: &str) -> Result<(), AlertError> {
        self.parser.reset();

        self.command(&[CMD_ATTENTION])?;
        self.expect_ok()?;
        self.command(&[CMD_TEXT_MODE])?;
        self.expect_ok()?;

        self.command(&[CMD_SEND_PREFIX, number, "\""])?;
        if let Err(e) = self.await_reply(self.reply_timeout_ms, |r| r == Reply::Prompt) {
            let _ = self.write_bytes(&[ESC]);
            return Err(e);
        }

        self.write_bytes(text.as_bytes())?;
        self.write_bytes(&[CTRL_Z])?;

        let mut reference = None;
        loop {
            match self.await_reply(self.send_timeout_ms, |r| matches!(r, Reply::Ok | Reply::MessageRef(_)))? {
                Reply::MessageRef(mr) => reference = Some(mr),
                _ => break,
            }
        }
        log::info!("SMS sent to {} (ref {:?})", number, reference);
        Ok(())
    }
}

impl<SERIAL, CLK> AlertChannel for Sim800l<SERIAL, CLK>
where
    SERIAL: Read<u8> + Write<u8>,
    CLK: FnMut() -> u32,
{
    fn send_alert(&mut self, text: &str) -> Result<(), AlertError> {
        let number = self.phone_number;
        self.send_sms(number, text)
    }
}
