//! Scoped storage for secrets.
//!
//! Every copy of a caller's secret made by this crate lives in a
//! [`SecretBuffer`]:
//! - zeroed on drop via `secrecy`/[`zeroize`], on success and error paths alike
//! - pages locked in RAM via `mlock` (best effort) so it is not swapped out
//! - masked in `Debug`/`Display`

use secrecy::{ExposeSecret, SecretSlice};
use std::fmt;

use crate::error::CryptError;

// ---------------------------------------------------------------------------
// Platform-specific memory locking
// ---------------------------------------------------------------------------

/// RAII guard that unlocks memory on drop.
struct LockedRegion {
    ptr: *const u8,
    len: usize,
    locked: bool,
}

// SAFETY: The pointer is only handed to mlock/munlock, which are
// thread-safe. The bytes are owned by the enclosing SecretBuffer and are
// never read through LockedRegion.
unsafe impl Send for LockedRegion {}
unsafe impl Sync for LockedRegion {}

impl LockedRegion {
    /// Lock a region. If `mlock` fails the region stays unlocked and a
    /// warning is logged once per process.
    fn try_lock(ptr: *const u8, len: usize) -> Self {
        let locked = platform::try_mlock(ptr, len);
        if !locked && len > 0 {
            static WARNED: std::sync::Once = std::sync::Once::new();
            WARNED.call_once(|| {
                tracing::warn!(
                    "mlock failed; secret buffers may be swapped to disk \
                     (consider raising RLIMIT_MEMLOCK)"
                );
            });
        }
        Self { ptr, len, locked }
    }
}

impl Drop for LockedRegion {
    fn drop(&mut self) {
        if self.locked {
            platform::try_munlock(self.ptr, self.len);
        }
    }
}

// ---------------------------------------------------------------------------
// SecretBuffer
// ---------------------------------------------------------------------------

/// Heap buffer holding a copy of a secret.
///
/// Wraps [`SecretSlice<u8>`] and adds `mlock` plus masked formatting.
/// The contents are overwritten with zeros when the buffer is dropped.
pub struct SecretBuffer {
    inner: SecretSlice<u8>,
    lock: LockedRegion,
}

impl SecretBuffer {
    /// Copy `data` into a new locked buffer.
    ///
    /// The allocation is reserved fallibly so an exhausted heap surfaces as
    /// an error instead of an abort.
    ///
    /// # Errors
    ///
    /// Returns `CryptError::OutOfMemory` if the allocation fails.
    pub fn new(data: &[u8]) -> Result<Self, CryptError> {
        let mut copy = Vec::new();
        copy.try_reserve_exact(data.len())
            .map_err(|_| CryptError::OutOfMemory)?;
        copy.extend_from_slice(data);
        let inner: SecretSlice<u8> = copy.into();
        let exposed = inner.expose_secret();
        let lock = LockedRegion::try_lock(exposed.as_ptr(), exposed.len());
        Ok(Self { inner, lock })
    }

    /// Borrow the secret bytes. Keep the borrow as short as possible.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the buffer's pages are `mlock`ed.
    #[must_use]
    pub const fn is_mlocked(&self) -> bool {
        self.lock.locked
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

impl fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

// ---------------------------------------------------------------------------
// Platform-specific implementations
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod platform {
    pub(super) fn try_mlock(ptr: *const u8, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        // SAFETY: mlock accepts any pointer/length pair; an invalid range is
        // reported as ENOMEM, which we treat as "not locked".
        unsafe { libc::mlock(ptr.cast(), len) == 0 }
    }

    pub(super) fn try_munlock(ptr: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        // SAFETY: munlock on a range we locked earlier. Failure is harmless.
        unsafe {
            libc::munlock(ptr.cast(), len);
        }
    }
}

#[cfg(not(unix))]
mod platform {
    pub(super) fn try_mlock(_ptr: *const u8, _len: usize) -> bool {
        false
    }

    pub(super) fn try_munlock(_ptr: *const u8, _len: usize) {}
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
