//! `crypt-argon2`: `crypt(3)`-style Argon2i password hashing.
//!
//! Produces and verifies self-describing encoded hash strings such as
//! `$argon2i$v=19$m=4096,t=10,p=1$<salt>$<tag>`. The Argon2 rounds come
//! from the `argon2` crate; this crate owns the string format, the
//! generate/verify dispatch, and the handling of secrets around them.
//!
//! No network, no async, no global state: every call is a blocking,
//! self-contained computation.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;
pub mod params;

pub mod encoding;
pub mod primitive;

pub mod codec;
pub mod dispatch;

pub mod salt;

pub use codec::{Hasher, Verdict};
pub use dispatch::{crypt_argon2i, crypt_argon2i_generate, Dispatcher, Mode};
pub use encoding::{constant_time_eq, decode, encoded_len, DecodedHash, EncodedHash};
pub use error::CryptError;
pub use memory::SecretBuffer;
pub use params::{CostParams, HasherConfig};
pub use primitive::{Argon2i, DerivationPrimitive, Status};
pub use salt::{gensalt, DEFAULT_SALT_LEN};
