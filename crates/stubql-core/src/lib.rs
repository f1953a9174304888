//! stubql Core - the driver contract shared by stubql crates
//!
//! This crate defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection`, `PreparedStatement`, `Transaction`, `Rows` - the
//!   connection lifecycle a driver must satisfy
//! - `DriverRegistry` - name-keyed driver lookup, with a process-wide instance
//! - `Database` - the caller-side handle returned by `DriverRegistry::open`
//! - Common types like `Value`, `Row`, `ExecResult`, etc.

mod connection;
mod database;
mod driver;
mod error;
mod registry;
mod types;

pub use connection::*;
pub use database::*;
pub use driver::*;
pub use error::*;
pub use registry::*;
pub use types::*;
