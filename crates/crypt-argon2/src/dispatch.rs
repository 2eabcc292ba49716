//! `crypt(3)`-style entry points.
//!
//! The second argument of [`crypt_argon2i`] is either a raw salt or an
//! encoded hash from an earlier call. Anything starting with `$` is treated
//! as an encoded hash and verified; anything else is a salt and goes down
//! the generation path.
//!
//! Verification failures are deliberately opaque here: a wrong secret, a
//! corrupt string and an internal error all come back as
//! [`CryptError::Rejected`]. Use [`crate::Hasher::verify`] when the
//! difference matters.

use crate::codec::{Hasher, Verdict};
use crate::encoding::{EncodedHash, MARKER};
use crate::error::CryptError;
use crate::params::{CostParams, HasherConfig};
use crate::primitive::{Argon2i, DerivationPrimitive};

/// Which path a second argument selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The argument is an existing encoded hash.
    Verify,
    /// The argument is a raw salt.
    Generate,
}

impl Mode {
    /// Classify the second argument by its first character.
    #[must_use]
    pub fn of(salt_or_hash: &str) -> Self {
        if salt_or_hash.starts_with(MARKER) {
            Self::Verify
        } else {
            Self::Generate
        }
    }
}

/// Routes `crypt`-style calls to generation or verification.
#[derive(Clone, Debug)]
pub struct Dispatcher<P = Argon2i> {
    hasher: Hasher<P>,
}

impl Default for Dispatcher<Argon2i> {
    fn default() -> Self {
        Self::new(Hasher::default())
    }
}

impl<P: DerivationPrimitive> Dispatcher<P> {
    #[must_use]
    pub const fn new(hasher: Hasher<P>) -> Self {
        Self { hasher }
    }

    #[must_use]
    pub const fn hasher(&self) -> &Hasher<P> {
        &self.hasher
    }

    /// Generate or verify depending on `salt_or_hash`.
    ///
    /// On the verification path a match returns a copy of the supplied
    /// string, unchanged.
    ///
    /// # Errors
    ///
    /// - `CryptError::MissingSecret` / `CryptError::MissingSalt` for absent inputs
    /// - `CryptError::Rejected` for any verification failure
    /// - any error of [`Hasher::generate`] on the generation path
    pub fn crypt(
        &self,
        secret: Option<&[u8]>,
        salt_or_hash: Option<&str>,
    ) -> Result<EncodedHash, CryptError> {
        let Some(secret) = secret else {
            tracing::warn!("crypt_argon2i: password missing");
            return Err(CryptError::MissingSecret);
        };
        let Some(salt_or_hash) = salt_or_hash else {
            tracing::warn!("crypt_argon2i: salt missing");
            return Err(CryptError::MissingSalt);
        };

        match Mode::of(salt_or_hash) {
            Mode::Verify => {
                tracing::debug!("crypt_argon2i: verifying against encoded hash");
                match self.hasher.verify(salt_or_hash, Some(secret)) {
                    Ok(Verdict::Match) => {
                        Ok(EncodedHash::from_trusted(salt_or_hash.to_owned()))
                    }
                    Ok(Verdict::NoMatch) | Err(_) => Err(CryptError::Rejected),
                }
            }
            Mode::Generate => {
                tracing::debug!("crypt_argon2i: generating from raw salt");
                self.hasher
                    .generate(Some(secret), Some(salt_or_hash.as_bytes()))
            }
        }
    }
}

/// Generate or verify with the default cost parameters.
///
/// `salt_or_hash` starting with `$` is verified against `secret` and
/// returned unchanged on a match; otherwise its bytes are used as the salt
/// for a fresh hash.
///
/// # Errors
///
/// See [`Dispatcher::crypt`].
pub fn crypt_argon2i(
    secret: Option<&[u8]>,
    salt_or_hash: Option<&str>,
) -> Result<EncodedHash, CryptError> {
    Dispatcher::<Argon2i>::default().crypt(secret, salt_or_hash)
}

/// Generate with caller-controlled cost parameters.
///
/// `lanes` is recorded in the hash; `threads` only bounds the concurrency of
/// the derivation.
///
/// # Errors
///
/// See [`Hasher::generate_with`].
pub fn crypt_argon2i_generate(
    secret: Option<&[u8]>,
    salt: Option<&[u8]>,
    output_len: usize,
    t_cost: u32,
    m_cost: u32,
    lanes: u32,
    threads: u32,
) -> Result<EncodedHash, CryptError> {
    let params = CostParams {
        t_cost,
        m_cost,
        lanes,
        threads,
        output_len,
    };
    Hasher::<Argon2i>::default().generate_with(secret, salt, &params)
}

impl Dispatcher<Argon2i> {
    /// Build a dispatcher backed by [`Argon2i`] with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `CryptError::InvalidConfig` if the configuration is out of bounds.
    pub fn with_config(config: HasherConfig) -> Result<Self, CryptError> {
        Ok(Self::new(Hasher::new(config)?))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
