use thiserror::Error;

use crate::record::NAME_LEN;
use crate::wire::SERIAL_NO_DATA_BYTE;

/// String terminator; also pads the unused tail of a name field.
pub const TERMINATOR: u8 = 0x50;
/// Longest name that still leaves room for the terminator.
pub const MAX_NAME_CHARS: usize = NAME_LEN - 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("character {0:?} has no Gen I encoding")]
    Unencodable(char),
    #[error("name is {0} characters long, at most {MAX_NAME_CHARS} fit")]
    TooLong(usize),
    /// Name fields are sent unpatched, so the serial no-data byte cannot
    /// appear in them.
    #[error("character {0:?} encodes to the serial no-data byte")]
    NoDataByte(char),
}

fn encode_char(c: char) -> Option<u8> {
    let byte = match c {
        'A'..='Z' => 0x80 + (c as u8 - b'A'),
        'a'..='z' => 0xA0 + (c as u8 - b'a'),
        '0'..='9' => 0xF6 + (c as u8 - b'0'),
        ' ' => 0x7F,
        '(' => 0x9A,
        ')' => 0x9B,
        ':' => 0x9C,
        ';' => 0x9D,
        '[' => 0x9E,
        ']' => 0x9F,
        '\'' => 0xE0,
        '-' => 0xE3,
        '?' => 0xE6,
        '!' => 0xE7,
        '.' => 0xE8,
        '♂' => 0xEF,
        '/' => 0xF3,
        ',' => 0xF4,
        '♀' => 0xF5,
        _ => return None,
    };
    Some(byte)
}

fn decode_byte(byte: u8) -> char {
    match byte {
        0x80..=0x99 => char::from(b'A' + (byte - 0x80)),
        0xA0..=0xB9 => char::from(b'a' + (byte - 0xA0)),
        0xF6..=0xFF => char::from(b'0' + (byte - 0xF6)),
        0x7F => ' ',
        0x9A => '(',
        0x9B => ')',
        0x9C => ':',
        0x9D => ';',
        0x9E => '[',
        0x9F => ']',
        0xE0 => '\'',
        0xE3 => '-',
        0xE6 => '?',
        0xE7 => '!',
        0xE8 => '.',
        0xEF => '♂',
        0xF3 => '/',
        0xF4 => ',',
        0xF5 => '♀',
        _ => '?',
    }
}

/// Encodes `name` into a terminated, padded name field.
pub fn encode_name(name: &str) -> Result<[u8; NAME_LEN], TextError> {
    let len = name.chars().count();
    if len > MAX_NAME_CHARS {
        return Err(TextError::TooLong(len));
    }

    let mut out = [TERMINATOR; NAME_LEN];
    for (dst, c) in out.iter_mut().zip(name.chars()) {
        let byte = encode_char(c).ok_or(TextError::Unencodable(c))?;
        if byte == SERIAL_NO_DATA_BYTE {
            return Err(TextError::NoDataByte(c));
        }
        *dst = byte;
    }
    Ok(out)
}

/// Decodes a name field up to its terminator. Unknown glyphs become `?`.
pub fn decode_name(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != TERMINATOR)
        .map(|&b| decode_byte(b))
        .collect()
}
