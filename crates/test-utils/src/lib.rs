//! Shared helpers for `with-env` tests: fake helper-command runner, fake
//! provisioner and a config builder.

pub mod builders;
pub mod fake_provisioner;
pub mod fake_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Upper bound for any single lifecycle under test. Generous enough for the
/// grace-period tests, short enough that a missed teardown fails fast.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Route crate logs into the test harness's captured output.
///
/// Defaults to `with_env=debug`; override with `RUST_LOG`. Output only shows
/// for failing tests unless run with `--nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,with_env=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await `f`, panicking if it outlives [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("lifecycle did not finish within {TEST_TIMEOUT:?}"),
    }
}
