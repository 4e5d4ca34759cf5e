//! Base64url decoding for the `HTTP2-Settings` header.
//!
//! The header carries the client's SETTINGS payload encoded with the URL and
//! filename safe alphabet, usually without padding. The decoder also accepts
//! the standard alphabet and trailing padding.

const PAD: u8 = b'=';

/// Decodes a base64url string. Returns `None` if the input contains a byte
/// outside of the alphabet or has an impossible length.
pub(crate) fn decode_url_safe(input: &[u8]) -> Option<Vec<u8>> {
    let input = input.trim_ascii();
    let padding = input.iter().rev().take_while(|&&b| b == PAD).count();
    if padding > 2 {
        return None;
    }
    let symbols = &input[..input.len() - padding];
    if padding > 0 && input.len() % 4 != 0 {
        return None;
    }
    if symbols.len() % 4 == 1 {
        return None;
    }

    let mut output = Vec::with_capacity(symbols.len() * 3 / 4);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &byte in symbols {
        acc = (acc << 6) | u32::from(decode_symbol(byte)?);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            output.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }
    Some(output)
}

fn decode_symbol(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'-' | b'+' => Some(62),
        b'_' | b'/' => Some(63),
        _ => None,
    }
}
