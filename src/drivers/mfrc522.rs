// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! NXP MFRC522 RFID reader over SPI, talking to MIFARE Classic 1K tags.
//!
//! This module handles register access and the ISO 14443A / MIFARE framing needed to select a
//! card, authenticate a sector with key A and read or write one 16-byte block. Frame CRCs are
//! computed in software.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

use crate::error::CardError;
use crate::io::{CardId, CardStore, BLOCK_LEN};

// Register addresses
pub mod reg {
    pub const COMMAND: u8 = 0x01;
    pub const COM_IRQ: u8 = 0x04;
    pub const DIV_IRQ: u8 = 0x05;
    pub const ERROR: u8 = 0x06;
    pub const STATUS2: u8 = 0x08;
    pub const FIFO_DATA: u8 = 0x09;
    pub const FIFO_LEVEL: u8 = 0x0A;
    pub const CONTROL: u8 = 0x0C;
    pub const BIT_FRAMING: u8 = 0x0D;
    pub const COLL: u8 = 0x0E;
    pub const MODE: u8 = 0x11;
    pub const TX_CONTROL: u8 = 0x14;
    pub const TX_ASK: u8 = 0x15;
    pub const T_MODE: u8 = 0x2A;
    pub const T_PRESCALER: u8 = 0x2B;
    pub const T_RELOAD_H: u8 = 0x2C;
    pub const T_RELOAD_L: u8 = 0x2D;
    pub const VERSION: u8 = 0x37;
}

// Reader commands
pub mod cmd {
    pub const IDLE: u8 = 0x00;
    pub const TRANSCEIVE: u8 = 0x0C;
    pub const MF_AUTHENT: u8 = 0x0E;
    pub const SOFT_RESET: u8 = 0x0F;
}

// Card (PICC) commands
pub mod picc {
    pub const REQA: u8 = 0x26;
    pub const SEL_CL1: u8 = 0x93;
    pub const AUTH_KEY_A: u8 = 0x60;
    pub const READ: u8 = 0x30;
    pub const WRITE: u8 = 0xA0;
    pub const HALT: u8 = 0x50;
    /// 4-bit acknowledge.
    pub const ACK: u8 = 0x0A;
}

/// Factory transport key.
pub const DEFAULT_KEY: [u8; 6] = [0xFF; 6];

const IRQ_TIMER: u8 = 0x01;
const IRQ_IDLE: u8 = 0x10;
const IRQ_RX: u8 = 0x20;
const ERR_COLL: u8 = 0x08;
/// BufferOvfl | ParityErr | ProtocolErr
const ERR_FRAME: u8 = 0x13;
const STATUS2_CRYPTO1_ON: u8 = 0x08;
const BIT_FRAMING_START_SEND: u8 = 0x80;
const FIFO_FLUSH: u8 = 0x80;

/// Upper bound on IRQ register polls. The chip's own timer fires well before this.
const MAX_IRQ_POLLS: u16 = 2000;

/// ISO 14443A CRC (`CRC_A`), low byte first.
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0x6363;
    for &byte in data {
        let mut b = byte ^ (crc as u8);
        b ^= b << 4;
        crc = (crc >> 8) ^ ((b as u16) << 8) ^ ((b as u16) << 3) ^ ((b as u16) >> 4);
    }
    [crc as u8, (crc >> 8) as u8]
}

/// Register address byte: bit 7 = read, bits 6..1 = address.
#[inline]
fn address_byte(is_read: bool, addr: u8) -> u8 {
    let a = (addr << 1) & 0x7E;
    if is_read {
        a | 0x80
    } else {
        a
    }
}

/// MFRC522 bound to an SPI bus and an active-low chip-select pin.
pub struct Mfrc522<SPI, CS> {
    spi: SPI,
    cs: CS,
    uid: Option<CardId>,
}

impl<SPI, CS> Mfrc522<SPI, CS>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    pub fn new(spi: SPI, mut cs: CS) -> Self {
        let _ = cs.set_high();
        Self { spi, cs, uid: None }
    }

    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    /// UID of the currently selected card.
    pub fn uid(&self) -> Option<CardId> {
        self.uid
    }

    /// Reset the chip, program the 25 ms receive timeout and switch the antenna on.
    /// Returns the silicon version byte.
    pub fn init<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<u8, CardError> {
        self.write_reg(reg::COMMAND, cmd::SOFT_RESET)?;
        delay.delay_ms(50);

        // TAuto, prescaler 0x0D3E -> 40 kHz timer, reload 1000 -> 25 ms
        self.write_reg(reg::T_MODE, 0x8D)?;
        self.write_reg(reg::T_PRESCALER, 0x3E)?;
        self.write_reg(reg::T_RELOAD_H, 0x03)?;
        self.write_reg(reg::T_RELOAD_L, 0xE8)?;
        // 100 % ASK, CRC preset 0x6363
        self.write_reg(reg::TX_ASK, 0x40)?;
        self.write_reg(reg::MODE, 0x3D)?;
        self.set_bits(reg::TX_CONTROL, 0x03)?;

        let version = self.read_reg(reg::VERSION)?;
        log::info!("MFRC522 version {:#04x}", version);
        Ok(version)
    }

    pub fn read_reg(&mut self, addr: u8) -> Result<u8, CardError> {
        let mut buf = [address_byte(true, addr), 0x00];
        self.transfer(&mut buf)?;
        Ok(buf[1])
    }

    pub fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), CardError> {
        let mut buf = [address_byte(false, addr), value];
        self.transfer(&mut buf)
    }

    pub fn set_bits(&mut self, addr: u8, mask: u8) -> Result<(), CardError> {
        let v = self.read_reg(addr)?;
        self.write_reg(addr, v | mask)
    }

    pub fn clear_bits(&mut self, addr: u8, mask: u8) -> Result<(), CardError> {
        let v = self.read_reg(addr)?;
        self.write_reg(addr, v & !mask)
    }

    fn transfer(&mut self, buf: &mut [u8]) -> Result<(), CardError> {
        let _ = self.cs.set_low();
        let res = self.spi.transfer(buf).map(|_| ()).map_err(|_| CardError::Bus);
        let _ = self.cs.set_high();
        res
    }

    /// Run `command` with `send` in the FIFO. Returns the number of bytes placed in `recv` and
    /// the valid bits of the last one (0 = all eight).
    fn communicate(
        &mut self,
        command: u8,
        send: &[u8],
        recv: &mut [u8],
        tx_last_bits: u8,
    ) -> Result<(usize, u8), CardError> {
        let wait_irq = if command == cmd::TRANSCEIVE {
            IRQ_RX | IRQ_IDLE
        } else {
            IRQ_IDLE
        };

        self.write_reg(reg::COMMAND, cmd::IDLE)?;
        self.write_reg(reg::COM_IRQ, 0x7F)?;
        self.write_reg(reg::FIFO_LEVEL, FIFO_FLUSH)?;
        for &b in send {
            self.write_reg(reg::FIFO_DATA, b)?;
        }
        self.write_reg(reg::BIT_FRAMING, tx_last_bits & 0x07)?;
        self.write_reg(reg::COMMAND, command)?;
        if command == cmd::TRANSCEIVE {
            self.set_bits(reg::BIT_FRAMING, BIT_FRAMING_START_SEND)?;
        }

        let mut polls = 0;
        let irq = loop {
            let irq = self.read_reg(reg::COM_IRQ)?;
            if irq & wait_irq != 0 {
                break irq;
            }
            if irq & IRQ_TIMER != 0 {
                return Err(CardError::Timeout);
            }
            polls += 1;
            if polls >= MAX_IRQ_POLLS {
                return Err(CardError::Timeout);
            }
        };
        self.clear_bits(reg::BIT_FRAMING, BIT_FRAMING_START_SEND)?;

        let err = self.read_reg(reg::ERROR)?;
        if err & ERR_FRAME != 0 {
            return Err(CardError::Protocol);
        }
        if err & ERR_COLL != 0 {
            return Err(CardError::Collision);
        }
        if command != cmd::TRANSCEIVE || irq & IRQ_RX == 0 {
            return Ok((0, 0));
        }

        let level = self.read_reg(reg::FIFO_LEVEL)? as usize;
        if level > recv.len() {
            return Err(CardError::Protocol);
        }
        for slot in recv.iter_mut().take(level) {
            *slot = self.read_reg(reg::FIFO_DATA)?;
        }
        let last_bits = self.read_reg(reg::CONTROL)? & 0x07;
        Ok((level, last_bits))
    }

    fn transceive(&mut self, send: &[u8], recv: &mut [u8], tx_last_bits: u8) -> Result<(usize, u8), CardError> {
        self.communicate(cmd::TRANSCEIVE, send, recv, tx_last_bits)
    }

    /// Frame with CRC_A appended. `N` is the payload length plus two.
    fn with_crc<const N: usize>(payload: &[u8]) -> [u8; N] {
        let mut frame = [0u8; N];
        frame[..N - 2].copy_from_slice(payload);
        let crc = crc_a(payload);
        frame[N - 2] = crc[0];
        frame[N - 1] = crc[1];
        frame
    }

    fn check_crc(frame: &[u8]) -> Result<(), CardError> {
        let (data, crc) = frame.split_at(frame.len() - 2);
        if crc_a(data) == crc {
            Ok(())
        } else {
            Err(CardError::Integrity)
        }
    }

    /// Wake an idle card. `Ok` means something answered with an ATQA.
    pub fn request_a(&mut self) -> Result<(), CardError> {
        self.write_reg(reg::COLL, 0x80)?;
        let mut atqa = [0u8; 2];
        match self.transceive(&[picc::REQA], &mut atqa, 7) {
            Ok((2, 0)) => Ok(()),
            Ok(_) => Err(CardError::Protocol),
            Err(CardError::Timeout) => Err(CardError::NoCard),
            Err(e) => Err(e),
        }
    }

    /// Cascade level 1 anticollision. Returns a 4-byte UID.
    pub fn anticollision(&mut self) -> Result<CardId, CardError> {
        let mut resp = [0u8; 5];
        let (n, _) = self.transceive(&[picc::SEL_CL1, 0x20], &mut resp, 0)?;
        if n != 5 {
            return Err(CardError::Protocol);
        }
        let bcc = resp[..4].iter().fold(0, |acc, b| acc ^ b);
        if bcc != resp[4] {
            return Err(CardError::Integrity);
        }
        Ok([resp[0], resp[1], resp[2], resp[3]])
    }

    /// Select the card with `uid`. Returns the SAK byte.
    pub fn select_uid(&mut self, uid: CardId) -> Result<u8, CardError> {
        let bcc = uid.iter().fold(0, |acc, b| acc ^ b);
        let frame: [u8; 9] = Self::with_crc(&[picc::SEL_CL1, 0x70, uid[0], uid[1], uid[2], uid[3], bcc]);
        let mut resp = [0u8; 3];
        let (n, _) = self.transceive(&frame, &mut resp, 0)?;
        if n != 3 {
            return Err(CardError::Protocol);
        }
        Self::check_crc(&resp)?;
        Ok(resp[0])
    }

    /// Authenticate the sector of `block` with key A.
    pub fn authenticate_key_a(&mut self, block: u8, key: &[u8; 6], uid: CardId) -> Result<(), CardError> {
        let mut send = [0u8; 12];
        send[0] = picc::AUTH_KEY_A;
        send[1] = block;
        send[2..8].copy_from_slice(key);
        send[8..].copy_from_slice(&uid);
        match self.communicate(cmd::MF_AUTHENT, &send, &mut [], 0) {
            Ok(_) => {}
            Err(CardError::Timeout) => return Err(CardError::Auth),
            Err(e) => return Err(e),
        }
        if self.read_reg(reg::STATUS2)? & STATUS2_CRYPTO1_ON == 0 {
            return Err(CardError::Auth);
        }
        Ok(())
    }

    pub fn read(&mut self, block: u8) -> Result<[u8; BLOCK_LEN], CardError> {
        let frame: [u8; 4] = Self::with_crc(&[picc::READ, block]);
        let mut resp = [0u8; BLOCK_LEN + 2];
        let (n, _) = self.transceive(&frame, &mut resp, 0)?;
        if n != resp.len() {
            return Err(CardError::Protocol);
        }
        Self::check_crc(&resp)?;
        let mut data = [0u8; BLOCK_LEN];
        data.copy_from_slice(&resp[..BLOCK_LEN]);
        Ok(data)
    }

    pub fn write(&mut self, block: u8, data: &[u8; BLOCK_LEN]) -> Result<(), CardError> {
        let frame: [u8; 4] = Self::with_crc(&[picc::WRITE, block]);
        self.expect_ack(&frame)?;
        let frame: [u8; BLOCK_LEN + 2] = Self::with_crc(data);
        self.expect_ack(&frame)
    }

    fn expect_ack(&mut self, frame: &[u8]) -> Result<(), CardError> {
        let mut resp = [0u8; 1];
        match self.transceive(frame, &mut resp, 0)? {
            (1, 4) if resp[0] & 0x0F == picc::ACK => Ok(()),
            _ => Err(CardError::Protocol),
        }
    }

    /// Put the card to sleep and leave the encrypted session.
    pub fn halt(&mut self) -> Result<(), CardError> {
        let frame: [u8; 4] = Self::with_crc(&[picc::HALT, 0x00]);
        // A halted card does not answer; silence is success.
        match self.transceive(&frame, &mut [], 0) {
            Ok(_) | Err(CardError::Timeout) => {}
            Err(e) => return Err(e),
        }
        self.clear_bits(reg::STATUS2, STATUS2_CRYPTO1_ON)
    }
}

impl<SPI, CS> CardStore for Mfrc522<SPI, CS>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    fn select(&mut self) -> Result<CardId, CardError> {
        self.uid = None;
        self.request_a()?;
        let uid = self.anticollision()?;
        let sak = self.select_uid(uid)?;
        log::debug!("card {:02x?} selected, SAK {:#04x}", uid, sak);
        self.uid = Some(uid);
        Ok(uid)
    }

    fn authenticate(&mut self, block: u8) -> Result<(), CardError> {
        let uid = self.uid.ok_or(CardError::NoCard)?;
        self.authenticate_key_a(block, &DEFAULT_KEY, uid)
    }

    fn read_block(&mut self, block: u8) -> Result<[u8; BLOCK_LEN], CardError> {
        self.read(block)
    }

    fn write_block(&mut self, block: u8, data: &[u8; BLOCK_LEN]) -> Result<(), CardError> {
        self.write(block, data)
    }

    fn release(&mut self) {
        if let Err(e) = self.halt() {
            log::debug!("halt failed: {}", e);
        }
        self.uid = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeOutput;
    use core::convert::Infallible;

    /// Register file behind the SPI framing. A pinned register ignores writes.
    struct FakeSpi {
        regs: [u8; 64],
        pinned: Option<u8>,
        frames: std::vec::Vec<[u8; 2]>,
    }

    impl Default for FakeSpi {
        fn default() -> Self {
            Self {
                regs: [0; 64],
                pinned: None,
                frames: std::vec::Vec::new(),
            }
        }
    }

    impl Transfer<u8> for FakeSpi {
        type Error = Infallible;

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Infallible> {
            let addr = ((words[0] >> 1) & 0x3F) as usize;
            if words[0] & 0x80 != 0 {
                words[1] = self.regs[addr];
            } else if self.pinned != Some(addr as u8) {
                self.regs[addr] = words[1];
            }
            self.frames.push([words[0], words[1]]);
            Ok(words)
        }
    }

    #[test]
    fn crc_matches_known_frames() {
        // READ block 0 and HALT as sent by every MIFARE reader.
        assert_eq!(crc_a(&[0x30, 0x00]), [0x02, 0xA8]);
        assert_eq!(crc_a(&[0x50, 0x00]), [0x57, 0xCD]);
    }

    #[test]
    fn register_address_framing() {
        assert_eq!(address_byte(true, reg::VERSION), 0xEE);
        assert_eq!(address_byte(false, reg::COMMAND), 0x02);
        assert_eq!(address_byte(false, reg::TX_CONTROL), 0x28);
    }

    #[test]
    fn init_turns_antenna_on_and_reports_version() {
        let mut spi = FakeSpi::default();
        spi.regs[reg::VERSION as usize] = 0x92;
        spi.regs[reg::TX_CONTROL as usize] = 0x80;
        let mut rfid = Mfrc522::new(spi, FakeOutput::default());
        assert_eq!(rfid.init(&mut crate::testing::NoDelay), Ok(0x92));
        let (spi, cs) = rfid.free();
        assert_eq!(spi.regs[reg::TX_CONTROL as usize], 0x83);
        assert_eq!(spi.regs[reg::T_MODE as usize], 0x8D);
        assert_eq!(spi.frames[0], [0x02, cmd::SOFT_RESET]);
        assert!(cs.high);
    }

    #[test]
    fn timer_irq_without_answer_is_no_card() {
        let mut spi = FakeSpi::default();
        spi.regs[reg::COM_IRQ as usize] = IRQ_TIMER;
        spi.pinned = Some(reg::COM_IRQ);
        let mut rfid = Mfrc522::new(spi, FakeOutput::default());
        assert_eq!(rfid.request_a(), Err(CardError::NoCard));
        assert_eq!(CardStore::select(&mut rfid), Err(CardError::NoCard));
        assert_eq!(rfid.uid(), None);
    }

    #[test]
    fn authenticate_needs_a_selected_card() {
        let mut rfid = Mfrc522::new(FakeSpi::default(), FakeOutput::default());
        assert_eq!(CardStore::authenticate(&mut rfid, 4), Err(CardError::NoCard));
    }
}
