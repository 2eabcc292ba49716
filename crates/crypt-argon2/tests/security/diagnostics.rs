//! Secrets must never reach error messages or log output.

use std::io;
use std::sync::{Arc, Mutex};

use crypt_argon2::{crypt_argon2i, CostParams, CryptError, Hasher, HasherConfig};

const SENTINEL: &str = "S3NT1NEL-p4ssw0rd";

/// `io::Write` sink shared with the test body.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn with_captured_logs(f: impl FnOnce()) -> String {
    let sink = Captured::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    sink.text()
}

fn fast_hasher() -> Hasher {
    Hasher::new(HasherConfig {
        params: CostParams {
            t_cost: 1,
            m_cost: 32,
            lanes: 1,
            threads: 1,
            output_len: 32,
        },
        ..HasherConfig::default()
    })
    .unwrap()
}

#[test]
fn failure_paths_do_not_log_the_secret() {
    let logs = with_captured_logs(|| {
        let hasher = fast_hasher();
        let secret = Some(SENTINEL.as_bytes());

        // Derivation error (salt too short).
        let _ = hasher.generate(secret, Some(b"short".as_slice()));
        // Mismatch and malformed verification.
        let hash = hasher.generate(Some(b"other".as_slice()), Some(b"saltsalt".as_slice())).unwrap();
        let _ = hasher.verify(hash.as_str(), secret);
        let _ = hasher.verify("$argon2i$v=19$m=32,t=1,p=1$???", secret);
        // Secret too long.
        let long = SENTINEL.repeat(10);
        let _ = hasher.generate(Some(long.as_bytes()), Some(b"saltsalt".as_slice()));
        // Dispatcher paths.
        let _ = crypt_argon2i(secret, Some("$argon2i$broken"));
        let _ = crypt_argon2i(secret, None);
    });

    assert!(!logs.is_empty(), "failures should be logged");
    assert!(
        !logs.contains(SENTINEL),
        "secret found in log output:\n{logs}"
    );
}

#[test]
fn error_messages_do_not_contain_the_secret() {
    let hasher = fast_hasher();
    let secret = Some(SENTINEL.as_bytes());

    let errors: Vec<CryptError> = vec![
        hasher
            .generate(secret, Some(b"short".as_slice()))
            .unwrap_err(),
        hasher
            .verify("$argon2i$v=19$m=32,t=1,p=1$???", secret)
            .unwrap_err(),
        hasher
            .generate(Some(SENTINEL.repeat(10).as_bytes()), Some(b"saltsalt".as_slice()))
            .unwrap_err(),
        crypt_argon2i(secret, Some("$argon2i$broken")).unwrap_err(),
    ];

    for err in errors {
        let display = err.to_string();
        let debug = format!("{err:?}");
        assert!(!display.contains(SENTINEL), "secret in Display: {display}");
        assert!(!debug.contains(SENTINEL), "secret in Debug: {debug}");
    }
}

#[test]
fn encoded_hash_does_not_contain_the_secret() {
    let hash = fast_hasher()
        .generate(Some(SENTINEL.as_bytes()), Some(b"saltsalt".as_slice()))
        .unwrap();
    assert!(!hash.as_str().contains(SENTINEL));
}
