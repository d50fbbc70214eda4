//! ASCII85 encoding for binary values stored inline as text.
//!
//! Uses the Adobe alphabet (`!` through `u`) with the `z` shorthand for an
//! all-zero group and no `<~ ~>` delimiters. A trailing partial group of `n`
//! bytes encodes to `n + 1` characters.

use thiserror::Error;

/// Errors raised while decoding ASCII85 text.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Ascii85Error {
    /// A character outside the ASCII85 alphabet was found.
    #[error("Invalid ASCII85 character {character:?} at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },

    /// `z` appeared inside a group.
    #[error("Misplaced 'z' at offset {offset}")]
    MisplacedZero { offset: usize },

    /// A group decodes to a value above `u32::MAX`, or the input ends with a
    /// single dangling character.
    #[error("Invalid ASCII85 group ending at offset {offset}")]
    InvalidGroup { offset: usize },
}

const OFFSET: u8 = b'!';

/// Encodes bytes as ASCII85 text.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(4) * 5);
    for chunk in bytes.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let mut word = u32::from_be_bytes(group);
        if chunk.len() == 4 && word == 0 {
            out.push('z');
            continue;
        }
        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (word % 85) as u8 + OFFSET;
            word /= 85;
        }
        for digit in &digits[..chunk.len() + 1] {
            out.push(*digit as char);
        }
    }
    out
}

/// Decodes ASCII85 text. Whitespace is ignored.
pub fn decode(text: &str) -> Result<Vec<u8>, Ascii85Error> {
    let mut out = Vec::with_capacity(text.len() / 5 * 4 + 4);
    let mut group = [0u8; 5];
    let mut filled = 0;
    let mut last_offset = 0;
    for (offset, character) in text.char_indices() {
        last_offset = offset;
        if character.is_ascii_whitespace() {
            continue;
        }
        if character == 'z' {
            if filled != 0 {
                return Err(Ascii85Error::MisplacedZero { offset });
            }
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !('!'..='u').contains(&character) {
            return Err(Ascii85Error::InvalidCharacter { character, offset });
        }
        group[filled] = character as u8 - OFFSET;
        filled += 1;
        if filled == 5 {
            out.extend_from_slice(&decode_group(&group, offset)?);
            filled = 0;
        }
    }
    match filled {
        0 => {}
        1 => return Err(Ascii85Error::InvalidGroup { offset: last_offset }),
        n => {
            for digit in group.iter_mut().skip(n) {
                *digit = b'u' - OFFSET;
            }
            let bytes = decode_group(&group, last_offset)?;
            out.extend_from_slice(&bytes[..n - 1]);
        }
    }
    Ok(out)
}

fn decode_group(group: &[u8; 5], offset: usize) -> Result<[u8; 4], Ascii85Error> {
    let mut word: u64 = 0;
    for digit in group {
        word = word * 85 + u64::from(*digit);
    }
    let word = u32::try_from(word).map_err(|_| Ascii85Error::InvalidGroup { offset })?;
    Ok(word.to_be_bytes())
}
