//! Stub driver implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use stubql_core::{Connection, DatabaseDriver, DriverRegistry, Result};

use crate::{CsvFixture, DriverConfig, OpenResponder, StubConnection};

/// Driver behind the crate-level free functions
static GLOBAL_DRIVER: OnceLock<StubDriver> = OnceLock::new();

struct DriverState {
    config: DriverConfig,
    open: RwLock<Option<OpenResponder>>,
    connections: RwLock<HashMap<String, Arc<StubConnection>>>,
}

/// Driver that hands out [`StubConnection`]s, one per DSN.
///
/// Clones share state, so a clone registered with a [`DriverRegistry`] sees
/// every stub added through the original.
#[derive(Clone)]
pub struct StubDriver {
    inner: Arc<DriverState>,
}

impl StubDriver {
    pub fn new() -> Self {
        tracing::debug!("stub driver initialized");
        Self::from_config(DriverConfig::default())
    }

    /// Create a driver with explicit settings
    pub fn with_config(config: DriverConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(name = %config.name, delimiter = %config.delimiter, date_policy = ?config.date_policy, "stub driver initialized");
        Ok(Self::from_config(config))
    }

    fn from_config(config: DriverConfig) -> Self {
        Self {
            inner: Arc::new(DriverState {
                config,
                open: RwLock::new(None),
                connections: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide driver, configured from the environment on first use
    pub fn global() -> &'static StubDriver {
        GLOBAL_DRIVER.get_or_init(|| match DriverConfig::from_env() {
            Ok(config) => Self::from_config(config),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid stub driver environment, using defaults");
                Self::from_config(DriverConfig::default())
            }
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.inner.config
    }

    /// Register this driver under its configured name.
    ///
    /// Returns `false` if the name was already taken.
    pub fn register(&self, registry: &DriverRegistry) -> bool {
        self.register_as(registry, &self.inner.config.name)
    }

    /// Register this driver under `name`, ignoring the configured one
    pub fn register_as(&self, registry: &DriverRegistry, name: &str) -> bool {
        registry.register(name, Arc::new(self.clone()))
    }

    /// Replace connection lookup with `respond` until cleared or reset
    pub fn set_open_responder<F>(&self, respond: F)
    where
        F: Fn(&str) -> Result<Arc<dyn Connection>> + Send + Sync + 'static,
    {
        let respond: OpenResponder = Arc::new(respond);
        *self.inner.open.write() = Some(respond);
    }

    pub fn clear_open_responder(&self) {
        *self.inner.open.write() = None;
    }

    /// The connection for `dsn`, created on first use
    pub fn connection(&self, dsn: &str) -> Arc<StubConnection> {
        if let Some(conn) = self.inner.connections.read().get(dsn) {
            return Arc::clone(conn);
        }

        let mut connections = self.inner.connections.write();
        let conn = connections
            .entry(dsn.to_string())
            .or_insert_with(|| Arc::new(StubConnection::new(dsn)));
        Arc::clone(conn)
    }

    /// The connection for the empty DSN
    pub fn default_connection(&self) -> Arc<StubConnection> {
        self.connection("")
    }

    /// Use `conn` for `dsn`, returning the connection it replaced
    pub fn set_connection(
        &self,
        dsn: &str,
        conn: Arc<StubConnection>,
    ) -> Option<Arc<StubConnection>> {
        tracing::debug!(dsn = %dsn, "installing stub connection");
        self.inner.connections.write().insert(dsn.to_string(), conn)
    }

    /// DSNs that currently have a connection
    pub fn dsns(&self) -> Vec<String> {
        let mut dsns: Vec<String> = self.inner.connections.read().keys().cloned().collect();
        dsns.sort();
        dsns
    }

    /// A fixture builder using this driver's delimiter and date policy
    pub fn fixture<I, S>(&self, columns: I) -> CsvFixture
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = &self.inner.config;
        let fixture = CsvFixture::new(columns).delimiter(config.delimiter_byte());
        match config.date_policy {
            Some(policy) => fixture.date_policy(policy),
            None => fixture,
        }
    }

    /// Forget every connection, stub and responder.
    ///
    /// Connections already handed out are cleared as well, so stale handles
    /// stop answering with old stubs.
    pub fn reset(&self) {
        let connections: Vec<Arc<StubConnection>> = self
            .inner
            .connections
            .write()
            .drain()
            .map(|(_, conn)| conn)
            .collect();
        for conn in &connections {
            conn.reset();
        }
        *self.inner.open.write() = None;
        tracing::info!(connections = connections.len(), "stub driver reset");
    }
}

impl Default for StubDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StubDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubDriver")
            .field("config", &self.inner.config)
            .field("connections", &self.inner.connections.read().len())
            .field("open_responder", &self.inner.open.read().is_some())
            .finish()
    }
}

#[async_trait]
impl DatabaseDriver for StubDriver {
    /// The configured name, `stubql` by default
    fn name(&self) -> &str {
        &self.inner.config.name
    }

    fn display_name(&self) -> &str {
        "Stub SQL"
    }

    #[tracing::instrument(skip(self))]
    async fn open(&self, dsn: &str) -> Result<Arc<dyn Connection>> {
        let responder = self.inner.open.read().clone();
        if let Some(respond) = responder {
            tracing::debug!("open answered by responder");
            return respond(dsn);
        }

        let conn = self.connection(dsn);
        conn.reopen();
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatePolicy, RowSet};
    use stubql_core::{StubqlError, Value};

    #[tokio::test]
    async fn test_open_returns_same_connection_per_dsn() {
        let driver = StubDriver::new();
        let a = driver.open("a").await.unwrap();
        let again = driver.open("a").await.unwrap();
        let b = driver.open("b").await.unwrap();

        let addr = |conn: &Arc<dyn Connection>| Arc::as_ptr(conn) as *const ();
        assert_eq!(addr(&a), addr(&again));
        assert_ne!(addr(&a), addr(&b));
        assert_eq!(driver.dsns(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_open_reopens_closed_connection() {
        let driver = StubDriver::new();
        let conn = driver.open("").await.unwrap();
        conn.close().await.unwrap();
        assert!(conn.is_closed());

        let reopened = driver.open("").await.unwrap();
        assert!(!reopened.is_closed());
        assert!(!conn.is_closed());
    }

    #[tokio::test]
    async fn test_open_responder() {
        let driver = StubDriver::new();
        driver.set_open_responder(|dsn| Err(StubqlError::other(format!("refused {}", dsn))));
        let err = driver.open("db").await.err().unwrap();
        assert_eq!(err.to_string(), "refused db");

        driver.clear_open_responder();
        driver.open("db").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_clears_handed_out_connections() {
        let driver = StubDriver::new();
        let conn = driver.default_connection();
        conn.stub_query("select 1", RowSet::empty(["n"]));
        driver.set_open_responder(|_| Err(StubqlError::other("down")));

        driver.reset();

        assert_eq!(conn.stub_count(), 0);
        assert!(driver.dsns().is_empty());
        let fresh = driver.open("").await.unwrap();
        assert!(fresh.query("select 1", &[]).await.err().unwrap().is_not_stubbed());
    }

    #[test]
    fn test_set_connection_replaces() {
        let driver = StubDriver::new();
        let first = driver.connection("x");
        let replacement = Arc::new(StubConnection::new("x"));
        let previous = driver.set_connection("x", Arc::clone(&replacement)).unwrap();

        assert!(Arc::ptr_eq(&previous, &first));
        assert!(Arc::ptr_eq(&driver.connection("x"), &replacement));
    }

    #[test]
    fn test_fixture_uses_config() {
        let driver = StubDriver::with_config(DriverConfig {
            delimiter: '|',
            date_policy: Some(DatePolicy::Rfc3339),
            ..DriverConfig::default()
        })
        .unwrap();

        let rows = driver
            .fixture(["id", "created"])
            .parse("1|2012-10-01 01:00:01")
            .unwrap();
        assert_eq!(rows.rows()[0][1], Value::from("2012-10-01 01:00:01"));
    }

    #[test]
    fn test_register_uses_configured_name() {
        let registry = DriverRegistry::new();
        let driver = StubDriver::with_config(DriverConfig {
            name: "testdb".into(),
            ..DriverConfig::default()
        })
        .unwrap();

        assert_eq!(driver.name(), "testdb");
        assert!(driver.register(&registry));
        assert!(!driver.register(&registry));
        assert!(registry.has("testdb"));
        assert!(!registry.has("stubql"));

        assert!(driver.register_as(&registry, "testdb-alias"));
        assert_eq!(registry.list().len(), 2);
    }
}
