//! Growatt password digest.

use md5::{Digest, Md5};

/// MD5 hex digest of the UTF-8 password where every `'0'` at an even index
/// (the high nibble of a byte) is replaced by `'c'`.
pub fn hash_password(password: &str) -> String {
    let hex = hex::encode(Md5::digest(password.as_bytes()));
    hex.chars()
        .enumerate()
        .map(|(i, c)| if i % 2 == 0 && c == '0' { 'c' } else { c })
        .collect()
}
