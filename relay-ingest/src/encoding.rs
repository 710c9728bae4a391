//! Byte → text decoding for export attachments

use relay_core::{RelayError, Result};
use serde::{Deserialize, Serialize};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Declared text encoding of an export, or `Auto` to sniff it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    #[default]
    Auto,
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1; every byte maps to the code point of the same value
    Latin1,
}

/// Decode `bytes` into text, dropping any byte-order mark.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
    let text = match encoding {
        TextEncoding::Auto => {
            if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
                decode_utf8(rest)?
            } else if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
                decode_utf16(rest, u16::from_le_bytes)?
            } else if let Some(rest) = bytes.strip_prefix(UTF16BE_BOM) {
                decode_utf16(rest, u16::from_be_bytes)?
            } else {
                match std::str::from_utf8(bytes) {
                    Ok(s) => s.to_string(),
                    Err(_) => decode_latin1(bytes),
                }
            }
        }
        TextEncoding::Utf8 => decode_utf8(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes))?,
        TextEncoding::Utf16Le => decode_utf16(
            bytes.strip_prefix(UTF16LE_BOM).unwrap_or(bytes),
            u16::from_le_bytes,
        )?,
        TextEncoding::Utf16Be => decode_utf16(
            bytes.strip_prefix(UTF16BE_BOM).unwrap_or(bytes),
            u16::from_be_bytes,
        )?,
        TextEncoding::Latin1 => decode_latin1(bytes),
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| RelayError::MalformedInput(format!("export is not valid UTF-8: {e}")))
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(RelayError::MalformedInput(
            "UTF-16 export has an odd number of bytes".to_string(),
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .map_err(|e| RelayError::MalformedInput(format!("export is not valid UTF-16: {e}")))
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
