//! PHC-style encoded hash strings.
//!
//! This module provides:
//! - [`encoded_len`]: exact length of a canonical string for a parameter set
//! - [`DecodedHash::encode`]: canonical encoder
//! - [`decode`]: strict decoder
//! - [`EncodedHash`]: owned, validated encoded string handed to callers
//! - [`constant_time_eq`]: tag comparison without early exit
//!
//! # Format
//!
//! ```text
//! $argon2i[$v=<num>]$m=<num>,t=<num>,p=<num>[,keyid=<b64>][,data=<b64>][$<b64>[$<b64>]]
//! ```
//!
//! - `<b64>` is standard Base64 without `=` padding or whitespace
//! - `keyid` is 1–8 bytes, `data` 1–32 bytes; both omitted when empty
//! - the trailing chunks are the salt (8–48 bytes) and the tag (32 bytes);
//!   a tag cannot appear without a salt
//! - a missing `v=` field means version 16

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use data_encoding::BASE64_NOPAD;
use serde::{Deserialize, Serialize};

use crate::error::CryptError;
use crate::params::{MAX_DATA_LEN, MAX_KEYID_LEN, MAX_SALT_LEN, MIN_SALT_LEN, OUTPUT_LEN};
use crate::primitive::Status;

/// Marker that starts every encoded hash.
pub const MARKER: char = '$';

/// Algorithm identifier, including the leading marker.
pub const PREFIX: &str = "$argon2i";

/// Argon2 version 1.3, emitted by the encoder.
pub const VERSION_13: u32 = 0x13;

/// Argon2 version 1.0, assumed when the `v=` field is absent.
pub const VERSION_10: u32 = 0x10;

/// Fixed characters of a generated string: `$argon2i`, `$v=`, `$m=`, `,t=`,
/// `,p=`, and the two `$` before salt and tag.
const FIXED_LEN: usize = PREFIX.len() + 3 + 3 + 3 + 3 + 1 + 1;

// ---------------------------------------------------------------------------
// Length computation
// ---------------------------------------------------------------------------

/// Number of decimal digits needed to print `n`.
fn decimal_len(n: u32) -> usize {
    n.checked_ilog10().map_or(1, |d| d.saturating_add(1) as usize)
}

/// Unpadded Base64 width of `n` bytes, saturating at `usize::MAX`.
///
/// `encode_len` asserts on lengths above `usize::MAX / 512`.
fn base64_len(n: usize) -> usize {
    if n > usize::MAX / 512 {
        usize::MAX
    } else {
        BASE64_NOPAD.encode_len(n)
    }
}

/// Exact length of the canonical string for a generated hash.
///
/// Covers the fixed prefix, the decimal parameter fields, the version field
/// and the unpadded Base64 widths of salt and tag. Pure and deterministic.
/// Saturates at `usize::MAX` for lengths no buffer could hold.
#[must_use]
pub fn encoded_len(t_cost: u32, m_cost: u32, lanes: u32, salt_len: usize, output_len: usize) -> usize {
    FIXED_LEN
        .saturating_add(decimal_len(VERSION_13))
        .saturating_add(decimal_len(m_cost))
        .saturating_add(decimal_len(t_cost))
        .saturating_add(decimal_len(lanes))
        .saturating_add(base64_len(salt_len))
        .saturating_add(base64_len(output_len))
}

// ---------------------------------------------------------------------------
// Decoded form
// ---------------------------------------------------------------------------

/// All fields of an encoded hash string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedHash {
    /// Argon2 version (`0x10` or `0x13`).
    pub version: u32,
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub lanes: u32,
    /// Key identifier, empty when absent.
    pub keyid: Vec<u8>,
    /// Associated data, empty when absent.
    pub data: Vec<u8>,
    /// Salt, if present.
    pub salt: Option<Vec<u8>>,
    /// Tag, if present. Never set without a salt.
    pub output: Option<Vec<u8>>,
}

impl DecodedHash {
    /// Length of the string [`DecodedHash::encode`] produces.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let mut len = PREFIX
            .len()
            .saturating_add(3)
            .saturating_add(decimal_len(self.version))
            .saturating_add(3)
            .saturating_add(decimal_len(self.m_cost))
            .saturating_add(3)
            .saturating_add(decimal_len(self.t_cost))
            .saturating_add(3)
            .saturating_add(decimal_len(self.lanes));
        if !self.keyid.is_empty() {
            len = len
                .saturating_add(",keyid=".len())
                .saturating_add(BASE64_NOPAD.encode_len(self.keyid.len()));
        }
        if !self.data.is_empty() {
            len = len
                .saturating_add(",data=".len())
                .saturating_add(BASE64_NOPAD.encode_len(self.data.len()));
        }
        if let Some(salt) = &self.salt {
            len = len
                .saturating_add(1)
                .saturating_add(BASE64_NOPAD.encode_len(salt.len()));
            if let Some(output) = &self.output {
                len = len
                    .saturating_add(1)
                    .saturating_add(BASE64_NOPAD.encode_len(output.len()));
            }
        }
        len
    }

    /// Produce the canonical string for these fields.
    ///
    /// The version field is always written. A tag without a salt is not
    /// representable and is dropped.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.encoded_len());
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{PREFIX}$v={}$m={},t={},p={}",
            self.version, self.m_cost, self.t_cost, self.lanes
        );
        if !self.keyid.is_empty() {
            out.push_str(",keyid=");
            out.push_str(&BASE64_NOPAD.encode(&self.keyid));
        }
        if !self.data.is_empty() {
            out.push_str(",data=");
            out.push_str(&BASE64_NOPAD.encode(&self.data));
        }
        if let Some(salt) = &self.salt {
            out.push(MARKER);
            out.push_str(&BASE64_NOPAD.encode(salt));
            if let Some(output) = &self.output {
                out.push(MARKER);
                out.push_str(&BASE64_NOPAD.encode(output));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Sequential reader over the encoded string.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    const fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    const fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Consume `lit` if the input starts with it.
    fn accept(&mut self, lit: &str) -> bool {
        match self.rest.strip_prefix(lit) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn expect(&mut self, lit: &str) -> Result<(), Status> {
        if self.accept(lit) {
            Ok(())
        } else {
            Err(Status::DecodingFail)
        }
    }

    /// Consume the longest prefix whose characters satisfy `pred`.
    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let end = self
            .rest
            .bytes()
            .position(|b| !pred(b))
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        head
    }

    /// Unsigned decimal without sign or leading zeros, fitting in `u32`.
    fn decimal(&mut self) -> Result<u32, Status> {
        let digits = self.take_while(|b| b.is_ascii_digit());
        if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
            return Err(Status::DecodingFail);
        }
        digits.parse().map_err(|_| Status::DecodingFail)
    }

    /// Unpadded standard Base64 run.
    fn base64(&mut self) -> Result<Vec<u8>, Status> {
        let chunk = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/');
        BASE64_NOPAD
            .decode(chunk.as_bytes())
            .map_err(|_| Status::DecodingFail)
    }
}

/// Parse an encoded hash string.
///
/// Only the grammar and the binary field lengths are checked here; cost
/// parameter bounds are enforced by the derivation primitive.
///
/// # Errors
///
/// - `Status::IncorrectType` if the algorithm is not `argon2i`
/// - `Status::IncorrectVersion` for versions other than 16 and 19
/// - `Status::SaltTooShort` / `SaltTooLong`, `OutputTooShort` / `OutputTooLong`,
///   `KeyIdTooLong`, `AdTooLong` for out-of-range binary fields
/// - `Status::DecodingFail` for any other syntax error
pub fn decode(encoded: &str) -> Result<DecodedHash, Status> {
    let mut cur = Cursor::new(encoded);

    cur.expect("$argon2")?;
    let kind = cur.take_while(|b| b != b'$');
    if kind != "i" {
        return Err(Status::IncorrectType);
    }

    let version = if cur.accept("$v=") {
        let v = cur.decimal()?;
        if v != VERSION_10 && v != VERSION_13 {
            return Err(Status::IncorrectVersion);
        }
        v
    } else {
        VERSION_10
    };

    cur.expect("$m=")?;
    let m_cost = cur.decimal()?;
    cur.expect(",t=")?;
    let t_cost = cur.decimal()?;
    cur.expect(",p=")?;
    let lanes = cur.decimal()?;

    let mut keyid = Vec::new();
    if cur.accept(",keyid=") {
        keyid = cur.base64()?;
        if keyid.is_empty() {
            return Err(Status::DecodingFail);
        }
        if keyid.len() > MAX_KEYID_LEN {
            return Err(Status::KeyIdTooLong);
        }
    }

    let mut data = Vec::new();
    if cur.accept(",data=") {
        data = cur.base64()?;
        if data.is_empty() {
            return Err(Status::DecodingFail);
        }
        if data.len() > MAX_DATA_LEN {
            return Err(Status::AdTooLong);
        }
    }

    let mut decoded = DecodedHash {
        version,
        m_cost,
        t_cost,
        lanes,
        keyid,
        data,
        salt: None,
        output: None,
    };

    if cur.is_empty() {
        return Ok(decoded);
    }

    cur.expect("$")?;
    let salt = cur.base64()?;
    if salt.len() < MIN_SALT_LEN {
        return Err(Status::SaltTooShort);
    }
    if salt.len() > MAX_SALT_LEN {
        return Err(Status::SaltTooLong);
    }
    decoded.salt = Some(salt);

    if cur.is_empty() {
        return Ok(decoded);
    }

    cur.expect("$")?;
    let output = cur.base64()?;
    if output.len() < OUTPUT_LEN {
        return Err(Status::OutputTooShort);
    }
    if output.len() > OUTPUT_LEN {
        return Err(Status::OutputTooLong);
    }
    decoded.output = Some(output);

    if !cur.is_empty() {
        return Err(Status::DecodingFail);
    }
    Ok(decoded)
}

// ---------------------------------------------------------------------------
// Constant-time comparison
// ---------------------------------------------------------------------------

/// Constant-time byte comparison for tags.
///
/// Returns `true` iff both slices have equal length and identical contents.
/// The length is public (fixed by the format); the contents are compared
/// with OR accumulation so the running time does not depend on where the
/// first differing byte is.
#[must_use]
#[inline(never)]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= std::hint::black_box(x ^ y);
    }
    diff == 0
}

// ---------------------------------------------------------------------------
// EncodedHash
// ---------------------------------------------------------------------------

/// An encoded hash string owned by the caller.
///
/// Immutable once built. Values produced by this crate are canonical;
/// values parsed with [`FromStr`] are grammar-checked but kept byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncodedHash(String);

impl EncodedHash {
    /// Wrap a string that the caller has already checked.
    pub(crate) const fn from_trusted(encoded: String) -> Self {
        Self(encoded)
    }

    /// Borrow the encoded string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Give up the wrapper and return the string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the embedded fields.
    ///
    /// # Errors
    ///
    /// Returns `CryptError::MalformedEncoding` if the string does not parse.
    pub fn decode(&self) -> Result<DecodedHash, CryptError> {
        decode(&self.0).map_err(|s| CryptError::MalformedEncoding(s.message().to_owned()))
    }
}

impl FromStr for EncodedHash {
    type Err = CryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s).map_err(|st| CryptError::MalformedEncoding(st.message().to_owned()))?;
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for EncodedHash {
    type Error = CryptError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        decode(&s).map_err(|st| CryptError::MalformedEncoding(st.message().to_owned()))?;
        Ok(Self(s))
    }
}

impl From<EncodedHash> for String {
    fn from(hash: EncodedHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for EncodedHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
