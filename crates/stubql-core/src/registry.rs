//! Driver registry for looking up drivers by name

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::{Database, DatabaseDriver, Result, StubqlError};

/// Process-wide registry used by [`DriverRegistry::global`]
static GLOBAL_REGISTRY: OnceLock<DriverRegistry> = OnceLock::new();

/// Registry of available database drivers
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, Arc<dyn DatabaseDriver>>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: RwLock::new(HashMap::new()),
        }
    }

    /// The registry shared by the whole process
    pub fn global() -> &'static DriverRegistry {
        GLOBAL_REGISTRY.get_or_init(DriverRegistry::new)
    }

    /// Register a driver under `name`.
    ///
    /// The first registration wins; later ones are ignored and `false` is returned.
    pub fn register(&self, name: &str, driver: Arc<dyn DatabaseDriver>) -> bool {
        let mut drivers = self.drivers.write();
        if drivers.contains_key(name) {
            tracing::debug!(driver = %name, "driver already registered, ignoring");
            return false;
        }
        tracing::info!(driver = %name, display_name = driver.display_name(), "registering database driver");
        drivers.insert(name.to_string(), driver);
        true
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.read().get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// List all registered driver names
    pub fn list(&self) -> Vec<String> {
        self.drivers.read().keys().cloned().collect()
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.read().contains_key(name)
    }

    /// Open a connection through the driver registered as `name`
    #[tracing::instrument(skip(self))]
    pub async fn open(&self, name: &str, dsn: &str) -> Result<Database> {
        let driver = self
            .get(name)
            .ok_or_else(|| StubqlError::DriverNotFound(name.to_string()))?;
        let conn = driver.open(dsn).await?;
        Ok(Database::new(name, dsn, conn))
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
