//! xxd-style hex dump codec.
//!
//! Devices emit counter files in the default `xxd` layout:
//!
//! ```text
//! 00000000: 6164 6367 5a34 3042 0000 0000 0000 0000  adcgZ40B........
//! ```
//!
//! [`decode_xxd`] is the in-process equivalent of `xxd -r`. Lines without an
//! offset column are accepted as plain hex (`xxd -p`) and appended at the
//! current position.

use crate::result::{CovlogError, CovlogResult};
use std::fmt::Write;

/// Bytes per dump line
pub const BYTES_PER_LINE: usize = 16;

/// Largest decoded file accepted; counter files are far smaller
pub const MAX_DECODED_SIZE: usize = 16 * 1024 * 1024;

/// Width of the hex column including group separators
const HEX_COLUMN_WIDTH: usize = BYTES_PER_LINE * 2 + BYTES_PER_LINE / 2;

/// Render bytes in the default xxd layout
#[must_use]
pub fn encode_xxd(bytes: &[u8]) -> String {
    let mut out = String::new();

    for (index, chunk) in bytes.chunks(BYTES_PER_LINE).enumerate() {
        let _ = write!(out, "{:08x}:", index * BYTES_PER_LINE);

        let mut hex = String::with_capacity(HEX_COLUMN_WIDTH);
        for (i, byte) in chunk.iter().enumerate() {
            if i % 2 == 0 {
                hex.push(' ');
            }
            let _ = write!(hex, "{byte:02x}");
        }
        let _ = write!(out, "{hex:<HEX_COLUMN_WIDTH$}  ");

        for &byte in chunk {
            out.push(if (0x20..=0x7E).contains(&byte) {
                char::from(byte)
            } else {
                '.'
            });
        }
        out.push('\n');
    }

    out
}

/// Reverse an xxd dump back into bytes
///
/// `name` is only used for error context.
pub fn decode_xxd(name: &str, dump: &str) -> CovlogResult<Vec<u8>> {
    let mut out: Vec<u8> = Vec::new();
    let mut cursor = 0usize;

    for (index, raw_line) in dump.lines().enumerate() {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let fail = |message: String| CovlogError::HexDecode {
            name: name.to_string(),
            line: index + 1,
            message,
        };

        let (offset, hex_area) = match split_offset(line) {
            Some((offset, rest)) => (offset, hex_column(rest)),
            None => (cursor, line.trim()),
        };

        let bytes = parse_hex_pairs(hex_area).map_err(fail)?;
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= MAX_DECODED_SIZE)
            .ok_or_else(|| fail(format!("offset {offset:#x} is out of range")))?;
        if out.len() < end {
            out.resize(end, 0);
        }
        out[offset..end].copy_from_slice(&bytes);
        cursor = end;
    }

    Ok(out)
}

/// Split `0000abcd: rest` into the numeric offset and the remainder
fn split_offset(line: &str) -> Option<(usize, &str)> {
    let (prefix, rest) = line.split_once(':')?;
    let prefix = prefix.trim();
    if prefix.is_empty() || prefix.len() > 16 || !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    usize::from_str_radix(prefix, 16).ok().map(|offset| (offset, rest))
}

/// The hex column ends at the double space before the ASCII column
fn hex_column(rest: &str) -> &str {
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    rest.find("  ").map_or(rest, |end| &rest[..end])
}

fn parse_hex_pairs(area: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = area
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if let Some(bad) = digits.iter().find(|b| !b.is_ascii_hexdigit()) {
        return Err(format!("unexpected character '{}'", char::from(*bad)));
    }
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }

    Ok(digits
        .chunks(2)
        .map(|pair| (nibble(pair[0]) << 4) | nibble(pair[1]))
        .collect())
}

const fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}
