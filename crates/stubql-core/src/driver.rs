//! Database driver trait definition

use crate::{Connection, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Human-readable name (e.g., "stubql")
    fn name(&self) -> &str;

    /// Display name for UI and logs
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Driver version
    fn version(&self) -> &'static str {
        "0.1.0"
    }

    /// Open a connection identified by `dsn`.
    ///
    /// The DSN is opaque to the registry; each driver decides what it means.
    async fn open(&self, dsn: &str) -> Result<Arc<dyn Connection>>;
}
