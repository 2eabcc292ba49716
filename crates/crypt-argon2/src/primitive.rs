//! The derivation primitive behind the codec.
//!
//! [`DerivationPrimitive`] is the seam between the crypt front end and the
//! Argon2 implementation: encoded-length computation, hash-and-encode, and
//! verify. [`Argon2i`] is the production implementation on top of the
//! RustCrypto `argon2` crate. Tests substitute their own implementations to
//! inject faults.

use std::fmt;

use argon2::{Algorithm, Argon2, AssociatedData, Block, KeyId, ParamsBuilder, Version};
use zeroize::Zeroizing;

use crate::encoding::{self, constant_time_eq, DecodedHash, VERSION_10, VERSION_13};
use crate::params::{
    CostParams, MAX_LANES, MAX_SALT_LEN, MIN_BLOCKS_PER_LANE, MIN_SALT_LEN, MIN_T_COST, OUTPUT_LEN,
};

/// Result code of a primitive operation in the `argon2i` profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Requested tag is shorter than the profile allows.
    OutputTooShort,
    /// Requested tag is longer than the profile allows.
    OutputTooLong,
    /// Secret does not fit in a `u32` length.
    PwdTooLong,
    /// Salt is under 8 bytes.
    SaltTooShort,
    /// Salt is over 48 bytes.
    SaltTooLong,
    /// Associated data is over 32 bytes.
    AdTooLong,
    /// Key identifier is over 8 bytes.
    KeyIdTooLong,
    /// `t_cost` is zero.
    TimeTooSmall,
    /// `m_cost` is below 8 blocks per lane.
    MemoryTooLittle,
    /// `m_cost` exceeds what the backend can address.
    MemoryTooMuch,
    /// `lanes` is zero.
    LanesTooFew,
    /// `lanes` exceeds 2^24 - 1.
    LanesTooMany,
    /// `threads` is zero.
    ThreadsTooFew,
    /// `threads` exceeds 2^24 - 1.
    ThreadsTooMany,
    /// Derivation memory could not be reserved.
    MemoryAllocationError,
    /// The encoded string did not fit the output buffer.
    EncodingFail,
    /// The encoded string is malformed.
    DecodingFail,
    /// The encoded string is not `$argon2i`.
    IncorrectType,
    /// Unknown Argon2 version.
    IncorrectVersion,
    /// The secret does not produce the stored tag.
    VerifyMismatch,
    /// Unexpected failure inside the backend.
    InternalError,
}

impl Status {
    /// Human-readable diagnostic. For logs only; never parse it.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::OutputTooShort => "Output is too short",
            Self::OutputTooLong => "Output is too long",
            Self::PwdTooLong => "Password is too long",
            Self::SaltTooShort => "Salt is too short",
            Self::SaltTooLong => "Salt is too long",
            Self::AdTooLong => "Associated data is too long",
            Self::KeyIdTooLong => "Key identifier is too long",
            Self::TimeTooSmall => "Time cost is too small",
            Self::MemoryTooLittle => "Memory cost is too small",
            Self::MemoryTooMuch => "Memory cost is too large",
            Self::LanesTooFew => "Too few lanes",
            Self::LanesTooMany => "Too many lanes",
            Self::ThreadsTooFew => "Not enough threads",
            Self::ThreadsTooMany => "Too many threads",
            Self::MemoryAllocationError => "Memory allocation error",
            Self::EncodingFail => "Encoding failed",
            Self::DecodingFail => "Decoding failed",
            Self::IncorrectType => "Encoding is not argon2i",
            Self::IncorrectVersion => "There is no such version of Argon2",
            Self::VerifyMismatch => "The password does not match the supplied hash",
            Self::InternalError => "Internal error in the derivation primitive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The three operations the crypt front end needs from Argon2.
pub trait DerivationPrimitive {
    /// Exact length of the encoded string `hash_encoded` writes for these
    /// parameters. Pure.
    fn encoded_len(
        &self,
        t_cost: u32,
        m_cost: u32,
        lanes: u32,
        salt_len: usize,
        output_len: usize,
    ) -> usize {
        encoding::encoded_len(t_cost, m_cost, lanes, salt_len, output_len)
    }

    /// Derive a tag and write the canonical encoded string into `out`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the parameter status for out-of-range inputs,
    /// `Status::MemoryAllocationError` if derivation memory is unavailable,
    /// and `Status::EncodingFail` if `out` is too small.
    fn hash_encoded(
        &self,
        params: &CostParams,
        secret: &[u8],
        salt: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Status>;

    /// Re-derive with the parameters embedded in `encoded` and compare.
    ///
    /// # Errors
    ///
    /// Returns `Status::VerifyMismatch` if the secret does not match, a
    /// decoding or parameter status if the string is unusable.
    fn verify(&self, encoded: &str, secret: &[u8]) -> Result<(), Status>;
}

/// Argon2i on top of the `argon2` crate.
///
/// `threads` is validated and recorded; the backing crate evaluates lanes
/// one after another, which yields the same tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct Argon2i;

/// Check the cost parameters shared by hashing and verification.
const fn check_costs(t_cost: u32, m_cost: u32, lanes: u32) -> Result<(), Status> {
    if t_cost < MIN_T_COST {
        return Err(Status::TimeTooSmall);
    }
    if lanes == 0 {
        return Err(Status::LanesTooFew);
    }
    if lanes > MAX_LANES {
        return Err(Status::LanesTooMany);
    }
    if m_cost < lanes.saturating_mul(MIN_BLOCKS_PER_LANE) {
        return Err(Status::MemoryTooLittle);
    }
    Ok(())
}

const fn check_salt(salt: &[u8]) -> Result<(), Status> {
    if salt.len() < MIN_SALT_LEN {
        return Err(Status::SaltTooShort);
    }
    if salt.len() > MAX_SALT_LEN {
        return Err(Status::SaltTooLong);
    }
    Ok(())
}

fn map_argon2_error(e: argon2::Error) -> Status {
    match e {
        argon2::Error::AdTooLong => Status::AdTooLong,
        argon2::Error::KeyIdTooLong => Status::KeyIdTooLong,
        argon2::Error::MemoryTooLittle => Status::MemoryTooLittle,
        argon2::Error::MemoryTooMuch => Status::MemoryTooMuch,
        argon2::Error::OutputTooShort => Status::OutputTooShort,
        argon2::Error::OutputTooLong => Status::OutputTooLong,
        argon2::Error::PwdTooLong => Status::PwdTooLong,
        argon2::Error::SaltTooShort => Status::SaltTooShort,
        argon2::Error::SaltTooLong => Status::SaltTooLong,
        argon2::Error::ThreadsTooFew => Status::LanesTooFew,
        argon2::Error::ThreadsTooMany => Status::LanesTooMany,
        argon2::Error::TimeTooSmall => Status::TimeTooSmall,
        argon2::Error::VersionInvalid => Status::IncorrectVersion,
        _ => Status::InternalError,
    }
}

/// Fields of one derivation, borrowed from the caller or the decoded string.
struct Derivation<'a> {
    version: u32,
    t_cost: u32,
    m_cost: u32,
    lanes: u32,
    keyid: &'a [u8],
    data: &'a [u8],
}

impl Derivation<'_> {
    /// Run Argon2i and return the 32-byte tag.
    ///
    /// Derivation memory is reserved fallibly and wiped when this returns,
    /// on success and on error alike.
    fn tag(&self, secret: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; OUTPUT_LEN]>, Status> {
        check_costs(self.t_cost, self.m_cost, self.lanes)?;
        check_salt(salt)?;
        if u32::try_from(secret.len()).is_err() {
            return Err(Status::PwdTooLong);
        }

        let version = match self.version {
            VERSION_13 => Version::V0x13,
            VERSION_10 => Version::V0x10,
            _ => return Err(Status::IncorrectVersion),
        };

        let mut builder = ParamsBuilder::new();
        builder
            .m_cost(self.m_cost)
            .t_cost(self.t_cost)
            .p_cost(self.lanes)
            .output_len(OUTPUT_LEN);
        if !self.keyid.is_empty() {
            builder.keyid(KeyId::new(self.keyid).map_err(|_| Status::KeyIdTooLong)?);
        }
        if !self.data.is_empty() {
            builder.data(AssociatedData::new(self.data).map_err(|_| Status::AdTooLong)?);
        }
        let params = builder.build().map_err(map_argon2_error)?;

        let block_count = params.block_count();
        let mut blocks: Zeroizing<Vec<Block>> = Zeroizing::new(Vec::new());
        blocks
            .try_reserve_exact(block_count)
            .map_err(|_| Status::MemoryAllocationError)?;
        blocks.resize(block_count, Block::default());

        let mut tag = Zeroizing::new([0u8; OUTPUT_LEN]);
        Argon2::new(Algorithm::Argon2i, version, params)
            .hash_password_into_with_memory(secret, salt, tag.as_mut_slice(), blocks.as_mut_slice())
            .map_err(map_argon2_error)?;
        Ok(tag)
    }
}

impl DerivationPrimitive for Argon2i {
    fn hash_encoded(
        &self,
        params: &CostParams,
        secret: &[u8],
        salt: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Status> {
        if params.threads == 0 {
            return Err(Status::ThreadsTooFew);
        }
        if params.threads > MAX_LANES {
            return Err(Status::ThreadsTooMany);
        }
        if params.output_len < OUTPUT_LEN {
            return Err(Status::OutputTooShort);
        }
        if params.output_len > OUTPUT_LEN {
            return Err(Status::OutputTooLong);
        }
        tracing::debug!(
            t_cost = params.t_cost,
            m_cost = params.m_cost,
            lanes = params.lanes,
            threads = params.threads,
            salt_len = salt.len(),
            "deriving argon2i tag"
        );

        let tag = Derivation {
            version: VERSION_13,
            t_cost: params.t_cost,
            m_cost: params.m_cost,
            lanes: params.lanes,
            keyid: &[],
            data: &[],
        }
        .tag(secret, salt)?;

        let encoded = DecodedHash {
            version: VERSION_13,
            m_cost: params.m_cost,
            t_cost: params.t_cost,
            lanes: params.lanes,
            keyid: Vec::new(),
            data: Vec::new(),
            salt: Some(salt.to_vec()),
            output: Some(tag.to_vec()),
        }
        .encode();

        let bytes = encoded.as_bytes();
        let dst = out.get_mut(..bytes.len()).ok_or(Status::EncodingFail)?;
        dst.copy_from_slice(bytes);
        Ok(bytes.len())
    }

    fn verify(&self, encoded: &str, secret: &[u8]) -> Result<(), Status> {
        let decoded = encoding::decode(encoded)?;
        let (Some(salt), Some(expected)) = (&decoded.salt, &decoded.output) else {
            return Err(Status::DecodingFail);
        };

        let tag = Derivation {
            version: decoded.version,
            t_cost: decoded.t_cost,
            m_cost: decoded.m_cost,
            lanes: decoded.lanes,
            keyid: &decoded.keyid,
            data: &decoded.data,
        }
        .tag(secret, salt)?;

        if constant_time_eq(tag.as_slice(), expected) {
            Ok(())
        } else {
            Err(Status::VerifyMismatch)
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
