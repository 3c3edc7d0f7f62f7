// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Reply parser for the modem's AT command channel.
//!
//! Bytes are pushed one at a time as they arrive on the serial port. Lines end in CRLF; the body
//! prompt `>` arrives without a line terminator. Echoed commands and unsolicited result codes are
//! swallowed.

use heapless::Vec;

use crate::protocol::messages::Reply;

const LINE_CAP: usize = 64;

enum State {
    LineStart,
    InLine,
    /// Line outgrew the buffer; discard until the next terminator.
    Overflow,
}

pub struct Parser {
    state: State,
    line: Vec<u8, LINE_CAP>,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::LineStart,
            line: Vec::new(),
        }
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.state = State::LineStart;
        self.line.clear();
    }

    /// Process a single incoming byte. Returns `Some(Reply)` when a complete reply is recognized.
    pub fn push(&mut self, byte: u8) -> Option<Reply> {
        match self.state {
            State::LineStart => match byte {
                b'\r' | b'\n' => None,
                b'>' => Some(Reply::Prompt),
                _ => {
                    self.line.clear();
                    let _ = self.line.push(byte);
                    self.state = State::InLine;
                    None
                }
            },
            State::InLine => match byte {
                b'\r' => None,
                b'\n' => {
                    self.state = State::LineStart;
                    classify(&self.line)
                }
                _ => {
                    if self.line.push(byte).is_err() {
                        self.state = State::Overflow;
                    }
                    None
                }
            },
            State::Overflow => {
                if byte == b'\n' {
                    self.reset();
                }
                None
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(line: &[u8]) -> Option<Reply> {
    if line == b"OK" {
        return Some(Reply::Ok);
    }
    if line == b"ERROR" || line.starts_with(b"+CMS ERROR") || line.starts_with(b"+CME ERROR") {
        return Some(Reply::Error);
    }
    if let Some(rest) = line.strip_prefix(b"+CMGS:") {
        return Some(Reply::MessageRef(parse_decimal(rest)));
    }
    None
}

fn parse_decimal(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .skip_while(|b| **b == b' ')
        .take_while(|b| b.is_ascii_digit())
        .fold(0u16, |acc, b| acc.wrapping_mul(10).wrapping_add((b - b'0') as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut Parser, bytes: &[u8]) -> std::vec::Vec<Reply> {
        bytes.iter().filter_map(|b| parser.push(*b)).collect()
    }

    #[test]
    fn echo_is_ignored_and_ok_is_reported() {
        let mut p = Parser::new();
        assert_eq!(feed(&mut p, b"AT+CMGF=1\r\r\nOK\r\n"), [Reply::Ok]);
    }

    #[test]
    fn prompt_is_reported_without_line_end() {
        let mut p = Parser::new();
        assert_eq!(feed(&mut p, b"AT+CMGS=\"+6391\"\r\r\n> "), [Reply::Prompt]);
    }

    #[test]
    fn send_confirmation_carries_reference() {
        let mut p = Parser::new();
        let replies = feed(&mut p, b"\r\n+CMGS: 42\r\n\r\nOK\r\n");
        assert_eq!(replies, [Reply::MessageRef(42), Reply::Ok]);
    }

    #[test]
    fn cms_error_is_an_error() {
        let mut p = Parser::new();
        assert_eq!(feed(&mut p, b"\r\n+CMS ERROR: 500\r\n"), [Reply::Error]);
    }

    #[test]
    fn overlong_line_is_discarded() {
        let mut p = Parser::new();
        let mut junk = std::vec![b'x'; 100];
        junk.extend_from_slice(b"\r\nOK\r\n");
        assert_eq!(feed(&mut p, &junk), [Reply::Ok]);
    }
}
