//! Stub SQL driver
//!
//! A driver that never talks to a database. Tests register canned results
//! for query text, then run code that goes through the ordinary driver
//! contract from `stubql-core`:
//!
//! ```ignore
//! let conn = stubql_driver::default_connection();
//! conn.stub_query(
//!     "SELECT name FROM users WHERE id = ?",
//!     rows_from_csv(["name"], "tim")?,
//! );
//!
//! let db = stubql_driver::open("").await?;
//! let row = db.query_row("select name from users where id = ?", &[Value::Int64(1)]).await?;
//! ```
//!
//! Query text is matched case-insensitively with all whitespace ignored.
//! Responders replace the canned results when the answer has to depend on
//! the call.

mod config;
mod connection;
mod driver;
mod fixture;
mod normalize;
mod rows;
mod stubs;

pub use config::{DriverConfig, ENV_DATE_POLICY, ENV_DELIMITER, ENV_DRIVER_NAME};
pub use connection::{StubConnection, StubStatement, StubTransaction};
pub use driver::StubDriver;
pub use fixture::{
    CsvFixture, DatePolicy, date_policy, rows_from_csv, rows_from_csv_with_delimiter,
    set_date_policy,
};
pub use normalize::{QueryKey, normalize};
pub use rows::{RowSet, StubRows};
pub use stubs::{
    ExecResponder, Hooks, OpenResponder, QueryResponder, StubRegistry, StubbedOutcome,
    TxResponder,
};

pub use stubql_core::{
    ColumnMeta, Connection, Database, DatabaseDriver, DriverRegistry, ExecResult,
    PreparedStatement, QueryResult, Result, Row, Rows, StubqlError, Transaction, Value,
    collect_rows,
};

use std::sync::Arc;

/// Name the default driver registers under
pub const DRIVER_NAME: &str = "stubql";

/// Register the process-wide driver with the global registry.
///
/// Safe to call any number of times; returns `true` only for the call that
/// actually registered it.
pub fn register() -> bool {
    StubDriver::global().register(DriverRegistry::global())
}

/// Open `dsn` through the global registry, registering the driver first if needed
pub async fn open(dsn: &str) -> Result<Database> {
    register();
    let name = &StubDriver::global().config().name;
    DriverRegistry::global().open(name, dsn).await
}

/// The process-wide driver's connection for the empty DSN
pub fn default_connection() -> Arc<StubConnection> {
    StubDriver::global().default_connection()
}

/// The process-wide driver's connection for `dsn`
pub fn connection(dsn: &str) -> Arc<StubConnection> {
    StubDriver::global().connection(dsn)
}

/// Clear every connection and responder on the process-wide driver
pub fn reset() {
    StubDriver::global().reset();
}
