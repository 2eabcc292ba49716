//! `mlock` status of secret copies.
//!
//! Locking is best effort: containers and CI runners often have a zero
//! `RLIMIT_MEMLOCK`, so these tests only assert when the lock succeeded.

use crypt_argon2::SecretBuffer;

#[cfg(unix)]
#[test]
fn secret_buffer_reports_mlock_status() {
    let buf = SecretBuffer::new(b"mlock test password").expect("allocation should succeed");
    let is_locked = buf.is_mlocked();
    eprintln!("mlock status: {is_locked}");
    assert_eq!(buf.expose(), b"mlock test password");
}

#[cfg(target_os = "linux")]
#[test]
fn mlock_is_visible_in_vmlck_on_linux() {
    let vmlck_before = read_vmlck_kb();

    // 64 KiB, well above page granularity.
    let buf = SecretBuffer::new(&vec![0xA5; 65_536]).expect("allocation should succeed");

    if buf.is_mlocked() {
        let vmlck_after = read_vmlck_kb();
        assert!(
            vmlck_after >= vmlck_before,
            "VmLck did not grow after mlock: before={vmlck_before}kB, after={vmlck_after}kB"
        );
    } else {
        eprintln!("mlock unavailable (likely RLIMIT_MEMLOCK); skipping VmLck check");
    }
}

#[cfg(target_os = "linux")]
fn read_vmlck_kb() -> u64 {
    let status =
        std::fs::read_to_string("/proc/self/status").expect("failed to read /proc/self/status");
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmLck:"))
        .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse().ok())
        .unwrap_or(0)
}
