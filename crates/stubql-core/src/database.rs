//! Caller-side handle over a driver connection

use std::sync::Arc;

use crate::{
    Connection, ExecResult, PreparedStatement, Result, Row, Rows, Transaction, Value,
    check_argument_count,
};

/// An open database handle, as handed out by [`crate::DriverRegistry::open`].
///
/// Every call goes through `prepare` on the underlying connection and checks
/// the argument count against the statement before running it.
pub struct Database {
    driver: String,
    dsn: String,
    conn: Arc<dyn Connection>,
}

impl Database {
    pub fn new(driver: &str, dsn: &str, conn: Arc<dyn Connection>) -> Self {
        Self {
            driver: driver.to_string(),
            dsn: dsn.to_string(),
            conn,
        }
    }

    /// Name the driver was registered under
    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// The underlying driver connection
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.conn
    }

    pub async fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement>> {
        self.conn.prepare(sql).await
    }

    /// Run a query and return its cursor
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Box<dyn Rows>> {
        let stmt = self.conn.prepare(sql).await?;
        check_argument_count(stmt.as_ref(), params)?;
        stmt.query(params).await
    }

    /// Run a query and return its first row, if any
    pub async fn query_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        let mut rows = self.query(sql, params).await?;
        let columns: Arc<[String]> = rows.columns().to_vec().into();
        let mut dest = vec![Value::Null; columns.len()];
        let row = if rows.next(&mut dest)? {
            Some(Row::new(columns, dest))
        } else {
            None
        };
        rows.close()?;
        Ok(row)
    }

    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        let stmt = self.conn.prepare(sql).await?;
        check_argument_count(stmt.as_ref(), params)?;
        stmt.execute(params).await
    }

    pub async fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.conn.begin_transaction().await
    }

    pub async fn close(&self) -> Result<()> {
        self.conn.close().await
    }
}
