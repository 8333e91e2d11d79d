//! Random share tokens and access codes.

use std::fmt::Write;

use rand::RngCore;
use rand::rngs::OsRng;

/// Prefix of every access code.
pub const ACCESS_CODE_PREFIX: &str = "TMB-";

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

fn hex(bytes: &[u8], upper: bool) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = if upper {
            write!(out, "{b:02X}")
        } else {
            write!(out, "{b:02x}")
        };
    }
    out
}

/// A 128-bit share token, hex encoded (32 lowercase characters).
pub fn generate_share_token() -> String {
    hex(&random_bytes::<16>(), false)
}

/// An invitation code: `TMB-` followed by 8 uppercase hex characters.
pub fn generate_access_code() -> String {
    format!("{ACCESS_CODE_PREFIX}{}", hex(&random_bytes::<4>(), true))
}
