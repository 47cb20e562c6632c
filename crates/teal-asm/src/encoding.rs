use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha512_256};

const ADDRESS_LEN: usize = 58;
const PUBLIC_KEY_LEN: usize = 32;

pub fn put_varuint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }

    (0..text.len())
        .step_by(2)
        .map(|i| text.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

pub fn decode_base64(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text).ok()
}

/// RFC 4648 base32 without padding requirements.
pub fn decode_base32(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for c in text.trim_end_matches('=').chars() {
        let value = match c {
            'A'..='Z' => c as u32 - 'A' as u32,
            '2'..='7' => c as u32 - '2' as u32 + 26,
            _ => return None,
        };
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    Some(out)
}

/// Decodes an Algorand address into its public key, verifying the checksum.
pub fn decode_address(text: &str) -> Option<Vec<u8>> {
    if text.len() != ADDRESS_LEN {
        return None;
    }

    let decoded = decode_base32(text)?;
    let (public_key, checksum) = decoded.split_at_checked(PUBLIC_KEY_LEN)?;
    let digest = Sha512_256::digest(public_key);
    let expected = digest.get(digest.len() - 4..)?;

    (checksum == expected).then(|| public_key.to_vec())
}

/// ARC-4 method selector: the first four bytes of the signature's hash.
pub fn method_selector(signature: &[u8]) -> Vec<u8> {
    Sha512_256::digest(signature).iter().take(4).copied().collect()
}
