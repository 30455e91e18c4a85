// Licensed under the Apache-2.0 license

//! The bootloader's byte-oriented LZ compression scheme.
//!
//! A compressed stream is a sequence of groups: one command byte, then one
//! item per command bit, LSB first. A `0` bit carries a single literal
//! byte. A `1` bit carries a back-reference pair `(offset - 1, count - 1)`
//! copying `count` bytes from `offset` bytes back in the output; the window
//! is the last 256 output bytes, and `offset < count` legally repeats
//! recent output. The stream ends where a command byte or a literal would
//! be read; ending inside a back-reference is an error.

use thiserror::Error;

const WINDOW_SIZE: usize = 256;
const WINDOW_MASK: usize = WINDOW_SIZE - 1;
const MAX_MATCH: usize = 256;
/// A literal costs 9 bits, a back-reference 17; two bytes is break-even.
const MIN_MATCH: usize = 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of compressed stream")]
    UnexpectedEof,
}

/// Expand a compressed stream.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut window = [0u8; WINDOW_SIZE];
    let mut out_i: usize = 0;
    let mut bytes = input.iter().copied();
    while let Some(cmd) = bytes.next() {
        for bit in 0..8 {
            if cmd & (1u8 << bit) != 0 {
                let offset = match bytes.next() {
                    Some(b) => b as usize + 1,
                    None => return Err(CodecError::UnexpectedEof),
                };
                let count = match bytes.next() {
                    Some(b) => b as usize + 1,
                    None => return Err(CodecError::UnexpectedEof),
                };
                let mut pos = out_i.wrapping_sub(offset);
                for _ in 0..count {
                    let byte = window[pos & WINDOW_MASK];
                    window[out_i & WINDOW_MASK] = byte;
                    out.push(byte);
                    out_i += 1;
                    pos += 1;
                }
            } else {
                // Running out of input at a literal is the normal end.
                let Some(byte) = bytes.next() else {
                    return Ok(out);
                };
                window[out_i & WINDOW_MASK] = byte;
                out.push(byte);
                out_i += 1;
            }
        }
    }
    Ok(out)
}

/// Compress `input` with a greedy longest-match search.
///
/// The output is format-compatible with the bootloader's decoder; it is
/// not guaranteed to be byte-identical to other encoders of the same
/// scheme.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() / 2 + 16);
    let mut group_bits: u8 = 0;
    let mut group_len: u32 = 0;
    let mut body: Vec<u8> = Vec::with_capacity(16);
    let mut pos = 0;
    while pos < input.len() {
        let (offset, len) = find_match(input, pos);
        if len >= MIN_MATCH {
            group_bits |= 1u8 << group_len;
            body.push((offset - 1) as u8);
            body.push((len - 1) as u8);
            pos += len;
        } else {
            body.push(input[pos]);
            pos += 1;
        }
        group_len += 1;
        if group_len == 8 {
            out.push(group_bits);
            out.append(&mut body);
            group_bits = 0;
            group_len = 0;
        }
    }
    // A short final group: unused high bits stay zero, which the decoder
    // reads as literals and then hits end of input.
    if group_len > 0 {
        out.push(group_bits);
        out.append(&mut body);
    }
    out
}

/// Longest match for `data[pos..]` within the trailing window.
///
/// Matches may overlap their own destination; copying is sequential, so
/// comparing directly against the input is equivalent.
fn find_match(data: &[u8], pos: usize) -> (usize, usize) {
    let cap = (data.len() - pos).min(MAX_MATCH);
    let mut best = (0, 0);
    for offset in 1..=pos.min(WINDOW_SIZE) {
        let mut len = 0;
        while len < cap && data[pos + len] == data[pos - offset + len] {
            len += 1;
        }
        if len > best.1 {
            best = (offset, len);
            if len == cap {
                break;
            }
        }
    }
    best
}
