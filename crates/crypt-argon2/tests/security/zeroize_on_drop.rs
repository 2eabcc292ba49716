//! Verify that `SecretBuffer` wipes its contents on drop.
//!
//! After the buffer is dropped the allocator may reuse or write metadata
//! into the freed block, so the check scans for a sentinel pattern instead
//! of expecting all zeros.
//!
//! **UB caveat:** reading freed memory is undefined behaviour. These are
//! best-effort smoke tests meant for the debug profile.

use crypt_argon2::SecretBuffer;

/// Sentinel pattern, easy to spot in memory.
const SENTINEL: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];

fn sentinel_survives_drop(len: usize) -> bool {
    let data: Vec<u8> = SENTINEL.iter().copied().cycle().take(len).collect();

    let data_ptr: *const u8;
    let data_len: usize;
    {
        let buf = SecretBuffer::new(&data).expect("allocation should succeed");
        let exposed = buf.expose();
        data_ptr = exposed.as_ptr();
        data_len = exposed.len();
        assert_eq!(&exposed[..4], &SENTINEL);
    }

    // SAFETY: intentionally reads memory freed just above; test-only.
    unsafe {
        let slice = std::slice::from_raw_parts(data_ptr, data_len);
        slice.windows(4).any(|w| w == SENTINEL)
    }
}

#[test]
fn secret_buffer_sentinel_not_found_after_drop() {
    assert!(
        !sentinel_survives_drop(512),
        "Sentinel pattern found in memory after SecretBuffer drop"
    );
}

#[test]
fn secret_buffer_large_allocation_sentinel_cleared() {
    assert!(
        !sentinel_survives_drop(65_536),
        "Sentinel pattern found in 64KB SecretBuffer after drop"
    );
}

#[test]
fn secret_buffer_debug_never_shows_content() {
    let buf = SecretBuffer::new(&SENTINEL).expect("allocation should succeed");
    let debug = format!("{buf:?}");
    assert_eq!(debug, "SecretBuffer(***)");
    assert!(!debug.contains("222"));
}
