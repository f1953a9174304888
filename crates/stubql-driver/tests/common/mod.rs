//! Shared helpers for stub driver integration tests

#![allow(dead_code)]

use std::sync::Arc;
use stubql_driver::{Database, DriverRegistry, StubDriver};

/// Install a test-friendly subscriber once per test binary
pub fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("stubql_driver=debug".parse().unwrap())
                    .add_directive("stubql_core=debug".parse().unwrap()),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// A fresh driver registered with its own registry, so tests never share stubs
pub fn isolated_driver() -> (StubDriver, Arc<DriverRegistry>) {
    initialize_logging();
    let driver = StubDriver::new();
    let registry = Arc::new(DriverRegistry::new());
    assert!(driver.register(&registry));
    (driver, registry)
}

pub async fn open(registry: &DriverRegistry, dsn: &str) -> anyhow::Result<Database> {
    Ok(registry.open(stubql_driver::DRIVER_NAME, dsn).await?)
}
