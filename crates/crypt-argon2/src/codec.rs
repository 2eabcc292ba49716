//! Hash generation and verification.
//!
//! [`Hasher`] sizes the output from the parameters, drives the derivation
//! primitive, and re-verifies every string it generates before handing it
//! out. Verification keeps the distinction between a wrong secret
//! ([`Verdict::NoMatch`]) and an unusable string
//! ([`CryptError::MalformedEncoding`]); callers decide how much to collapse.

use crate::encoding::EncodedHash;
use crate::error::CryptError;
use crate::memory::SecretBuffer;
use crate::params::{CostParams, HasherConfig, OUTPUT_LEN};
use crate::primitive::{Argon2i, DerivationPrimitive, Status};
use crate::salt::{gensalt, DEFAULT_SALT_LEN};

/// Outcome of a verification that ran to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Verdict {
    /// The secret produced the stored tag.
    Match,
    /// The string is well formed but the secret does not match.
    NoMatch,
}

impl Verdict {
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Generates and verifies encoded hashes with a fixed configuration.
///
/// Stateless between calls: every call owns its buffers, and nothing is
/// cached. A `Hasher` can be shared freely across threads when `P` allows it.
#[derive(Clone, Debug)]
pub struct Hasher<P = Argon2i> {
    config: HasherConfig,
    primitive: P,
}

impl Default for Hasher<Argon2i> {
    fn default() -> Self {
        Self {
            config: HasherConfig::default(),
            primitive: Argon2i,
        }
    }
}

impl Hasher<Argon2i> {
    /// Build a hasher backed by [`Argon2i`].
    ///
    /// # Errors
    ///
    /// Returns `CryptError::InvalidConfig` if the configuration is out of bounds.
    pub fn new(config: HasherConfig) -> Result<Self, CryptError> {
        Self::with_primitive(config, Argon2i)
    }
}

impl<P: DerivationPrimitive> Hasher<P> {
    /// Build a hasher around a specific primitive.
    ///
    /// # Errors
    ///
    /// Returns `CryptError::InvalidConfig` if the configuration is out of bounds.
    pub fn with_primitive(config: HasherConfig, primitive: P) -> Result<Self, CryptError> {
        config.validate()?;
        Ok(Self { config, primitive })
    }

    #[must_use]
    pub const fn config(&self) -> &HasherConfig {
        &self.config
    }

    /// Generate an encoded hash with the configured cost parameters.
    ///
    /// # Errors
    ///
    /// See [`Hasher::generate_with`].
    pub fn generate(
        &self,
        secret: Option<&[u8]>,
        salt: Option<&[u8]>,
    ) -> Result<EncodedHash, CryptError> {
        self.generate_with(secret, salt, &self.config.params)
    }

    /// Generate an encoded hash with explicit cost parameters.
    ///
    /// The string is sized with the primitive's length computation before any
    /// derivation runs, and is verified against `secret` before it is
    /// returned. The internal copy of the secret is wiped on every path.
    ///
    /// # Errors
    ///
    /// - `CryptError::MissingSecret` / `CryptError::MissingSalt` for absent inputs
    /// - `CryptError::SecretTooLong` if the secret exceeds the configured limit
    /// - `CryptError::OutOfMemory` if a buffer cannot be allocated
    /// - `CryptError::Derivation` if the primitive rejects the inputs
    /// - `CryptError::SelfVerificationFailed` if the result does not verify
    pub fn generate_with(
        &self,
        secret: Option<&[u8]>,
        salt: Option<&[u8]>,
        params: &CostParams,
    ) -> Result<EncodedHash, CryptError> {
        let Some(secret) = secret else {
            tracing::warn!("argon2i generate: password missing");
            return Err(CryptError::MissingSecret);
        };
        let Some(salt) = salt else {
            tracing::warn!("argon2i generate: salt missing");
            return Err(CryptError::MissingSalt);
        };
        self.check_secret_len(secret)?;
        check_output_len(params.output_len)?;
        let secret = SecretBuffer::new(secret)?;

        let encoded_len = self.primitive.encoded_len(
            params.t_cost,
            params.m_cost,
            params.lanes,
            salt.len(),
            params.output_len,
        );

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(encoded_len).map_err(|_| {
            tracing::warn!(encoded_len, "argon2i generate: could not allocate memory for hash");
            CryptError::OutOfMemory
        })?;
        buffer.resize(encoded_len, 0u8);

        let written = self
            .primitive
            .hash_encoded(params, secret.expose(), salt, &mut buffer)
            .map_err(|status| {
                tracing::warn!(%status, "argon2i generate: derivation failed");
                CryptError::from_status(status)
            })?;
        buffer.truncate(written);

        let encoded = String::from_utf8(buffer).map_err(|_| {
            tracing::warn!("argon2i generate: primitive produced non-UTF-8 output");
            CryptError::from_status(Status::EncodingFail)
        })?;

        if let Err(status) = self.primitive.verify(&encoded, secret.expose()) {
            tracing::warn!(%status, "argon2i generate: self-verification failed");
            return Err(CryptError::SelfVerificationFailed);
        }

        Ok(EncodedHash::from_trusted(encoded))
    }

    /// Generate an encoded hash under a fresh random salt.
    ///
    /// # Errors
    ///
    /// See [`Hasher::generate_with`] and [`gensalt`].
    pub fn hash_with_random_salt(&self, secret: &[u8]) -> Result<EncodedHash, CryptError> {
        let salt = gensalt(DEFAULT_SALT_LEN)?;
        self.generate(Some(secret), Some(salt.as_bytes()))
    }

    /// Verify `secret` against an encoded hash.
    ///
    /// The tag comparison runs in constant time.
    ///
    /// # Errors
    ///
    /// - `CryptError::MissingSecret` if no secret is supplied
    /// - `CryptError::SecretTooLong` if the secret exceeds the configured limit
    /// - `CryptError::MalformedEncoding` if the string cannot be parsed or its
    ///   parameters are out of range
    /// - `CryptError::OutOfMemory` / `CryptError::Derivation` for internal failures
    pub fn verify(&self, encoded: &str, secret: Option<&[u8]>) -> Result<Verdict, CryptError> {
        let Some(secret) = secret else {
            tracing::warn!("argon2i verify: password missing");
            return Err(CryptError::MissingSecret);
        };
        self.check_secret_len(secret)?;
        let secret = SecretBuffer::new(secret)?;

        match self.primitive.verify(encoded, secret.expose()) {
            Ok(()) => Ok(Verdict::Match),
            Err(Status::VerifyMismatch) => {
                tracing::debug!("argon2i verify: password does not match");
                Ok(Verdict::NoMatch)
            }
            Err(status @ (Status::MemoryAllocationError | Status::InternalError)) => {
                tracing::warn!(%status, "argon2i verify: derivation failed");
                Err(CryptError::from_status(status))
            }
            Err(status) => {
                tracing::warn!(%status, "argon2i verify: malformed encoded hash");
                Err(CryptError::MalformedEncoding(status.message().to_owned()))
            }
        }
    }

    /// `true` only if `secret` matches `encoded`. Every failure reads as `false`.
    #[must_use]
    pub fn matches(&self, encoded: &str, secret: &[u8]) -> bool {
        matches!(self.verify(encoded, Some(secret)), Ok(Verdict::Match))
    }

    fn check_secret_len(&self, secret: &[u8]) -> Result<(), CryptError> {
        let max = self.config.max_secret_len;
        if secret.len() > max {
            tracing::warn!(len = secret.len(), max, "argon2i: password too long");
            return Err(CryptError::SecretTooLong {
                len: secret.len(),
                max,
            });
        }
        Ok(())
    }
}

/// Only 32-byte tags are representable; anything else is refused before a
/// buffer is sized for it.
fn check_output_len(output_len: usize) -> Result<(), CryptError> {
    let status = match output_len.cmp(&OUTPUT_LEN) {
        std::cmp::Ordering::Less => Status::OutputTooShort,
        std::cmp::Ordering::Greater => Status::OutputTooLong,
        std::cmp::Ordering::Equal => return Ok(()),
    };
    tracing::warn!(output_len, %status, "argon2i generate: unsupported output length");
    Err(CryptError::from_status(status))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
