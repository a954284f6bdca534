use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Installs a test-friendly tracing subscriber exactly once per test binary.
///
/// Honors `RUST_LOG`; output goes through the test writer so it is captured
/// per test.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// True when the tests run with UID 0, where permission checks never fail.
#[cfg(test)]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
