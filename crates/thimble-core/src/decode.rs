//! Best-effort decoding of message bytes.
//!
//! Message files come from whatever editor or form produced them. UTF-8 is
//! tried first; UTF-16 is honoured when a byte order mark says so; anything
//! else is read as Windows-1252, which maps every byte to some character.

use std::borrow::Cow;

use thiserror::Error;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Windows-1252 code points for bytes 0x80..=0x9F. Unassigned bytes keep
/// their C1 control value.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("UTF-16 data has odd length ({0} bytes)")]
    OddUtf16Length(usize),

    #[error("Invalid UTF-16 data: {0}")]
    InvalidUtf16(#[from] std::string::FromUtf16Error),
}

/// Encoding a message was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf-8"),
            Encoding::Utf16Le => write!(f, "utf-16le"),
            Encoding::Utf16Be => write!(f, "utf-16be"),
            Encoding::Windows1252 => write!(f, "windows-1252"),
        }
    }
}

/// Decoded message text
#[derive(Debug, Clone)]
pub struct Decoded<'a> {
    pub text: Cow<'a, str>,
    pub encoding: Encoding,
}

/// Decode raw message bytes.
pub fn decode(raw: &[u8]) -> Result<Decoded<'_>, DecodeError> {
    if let Some(rest) = raw.strip_prefix(UTF16_LE_BOM) {
        let text = decode_utf16(rest, u16::from_le_bytes)?;
        return Ok(Decoded {
            text: Cow::Owned(text),
            encoding: Encoding::Utf16Le,
        });
    }
    if let Some(rest) = raw.strip_prefix(UTF16_BE_BOM) {
        let text = decode_utf16(rest, u16::from_be_bytes)?;
        return Ok(Decoded {
            text: Cow::Owned(text),
            encoding: Encoding::Utf16Be,
        });
    }

    let body = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    match std::str::from_utf8(body) {
        Ok(text) => Ok(Decoded {
            text: Cow::Borrowed(text),
            encoding: Encoding::Utf8,
        }),
        Err(_) => Ok(Decoded {
            text: Cow::Owned(decode_windows_1252(body)),
            encoding: Encoding::Windows1252,
        }),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddUtf16Length(bytes.len()));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16(&units)?)
}

fn decode_windows_1252(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => char::from(b),
        })
        .collect()
}
