//! Error types for `crypt-argon2`.

use thiserror::Error;

use crate::primitive::Status;

/// Errors produced while generating or verifying encoded hashes.
///
/// Every variant is terminal for the current call. No variant ever carries
/// secret bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptError {
    /// No secret was supplied.
    #[error("password missing")]
    MissingSecret,

    /// No salt (or encoded hash) was supplied.
    #[error("salt missing")]
    MissingSalt,

    /// The secret exceeds the configured maximum length.
    #[error("password too long: {len} bytes (maximum {max})")]
    SecretTooLong {
        /// Length of the rejected secret.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// A buffer for the encoded hash or the derivation memory could not be allocated.
    #[error("could not allocate memory for hash")]
    OutOfMemory,

    /// The derivation primitive rejected the parameters or failed internally.
    #[error("derivation failed: {message}")]
    Derivation {
        /// Status reported by the primitive.
        status: Status,
        /// Human-readable diagnostic from [`Status::message`].
        message: String,
    },

    /// A freshly generated hash did not verify against its own secret.
    #[error("generated hash failed self-verification")]
    SelfVerificationFailed,

    /// The secret does not match the encoded hash.
    #[error("password does not match")]
    NoMatch,

    /// The encoded hash string could not be parsed or is outside the supported profile.
    #[error("malformed encoded hash: {0}")]
    MalformedEncoding(String),

    /// Opaque verification failure returned by the dispatcher.
    ///
    /// Covers wrong secrets, malformed strings and internal errors alike.
    #[error("verification failed")]
    Rejected,

    /// The hasher configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The system random number generator failed while producing a salt.
    #[error("entropy source failure: {0}")]
    Entropy(String),
}

impl CryptError {
    /// Build a [`CryptError::Derivation`] from a primitive status.
    ///
    /// Allocation failures inside the primitive map to [`CryptError::OutOfMemory`].
    #[must_use]
    pub fn from_status(status: Status) -> Self {
        match status {
            Status::MemoryAllocationError => Self::OutOfMemory,
            status => Self::Derivation {
                status,
                message: status.message().to_owned(),
            },
        }
    }
}
