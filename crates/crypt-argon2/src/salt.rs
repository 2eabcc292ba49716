//! Fresh salts for the generation path.

use data_encoding::BASE64_NOPAD;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptError;
use crate::params::{MAX_SALT_LEN, MIN_SALT_LEN};

/// Salt length used by [`crate::Hasher::hash_with_random_salt`].
pub const DEFAULT_SALT_LEN: usize = 16;

/// Generate a random text salt of exactly `len` characters.
///
/// Characters are drawn from the Base64 alphabet, so the result never starts
/// with the `$` marker and is always taken down the generation path by
/// [`crate::crypt_argon2i`]. Each character carries 6 bits of entropy from
/// the OS generator.
///
/// # Errors
///
/// Returns `CryptError::InvalidConfig` if `len` is outside 8–48 and
/// `CryptError::Entropy` if the OS generator fails.
pub fn gensalt(len: usize) -> Result<String, CryptError> {
    if !(MIN_SALT_LEN..=MAX_SALT_LEN).contains(&len) {
        return Err(CryptError::InvalidConfig(format!(
            "salt length must be between {MIN_SALT_LEN} and {MAX_SALT_LEN}, got {len}"
        )));
    }

    // 48 bytes encode to 64 characters, more than any allowed length.
    let mut bytes = [0u8; MAX_SALT_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptError::Entropy(format!("CSPRNG fill failed: {e}")))?;
    let mut salt = BASE64_NOPAD.encode(&bytes);
    salt.truncate(len);
    Ok(salt)
}
