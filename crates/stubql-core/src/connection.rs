//! Connection, statement, transaction and cursor traits

use crate::{ColumnMeta, ExecResult, QueryResult, Result, Row, StubqlError, Value};
use async_trait::async_trait;
use std::sync::Arc;

/// A database connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "stubql")
    fn driver_name(&self) -> &str;

    /// Prepare a statement bound to `sql`.
    ///
    /// Drivers may defer all validation to execution time.
    async fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement>>;

    /// Execute a statement that modifies data (INSERT/UPDATE/DELETE)
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        let stmt = self.prepare(sql).await?;
        stmt.execute(params).await
    }

    /// Execute a query that returns rows (SELECT)
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Box<dyn Rows>> {
        let stmt = self.prepare(sql).await?;
        stmt.query(params).await
    }

    /// Begin a transaction
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>>;

    /// Close the connection. Closing twice is not an error.
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// A prepared statement
#[async_trait]
pub trait PreparedStatement: Send + Sync {
    /// The SQL text this statement was prepared from
    fn sql(&self) -> &str;

    /// Number of placeholders the statement expects.
    ///
    /// `None` tells the caller not to check the argument count.
    fn num_input(&self) -> Option<usize>;

    /// Execute the prepared statement with parameters
    async fn execute(&self, params: &[Value]) -> Result<ExecResult>;

    /// Query the prepared statement with parameters
    async fn query(&self, params: &[Value]) -> Result<Box<dyn Rows>>;

    /// Close/deallocate the prepared statement. Closing twice is not an error.
    async fn close(&self) -> Result<()>;
}

/// A database transaction
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Forward-only cursor over the rows a query produced.
pub trait Rows: Send {
    /// Column names, in the order values are written by [`Rows::next`]
    fn columns(&self) -> &[String];

    /// Copy the next row into `dest`.
    ///
    /// Returns `Ok(true)` when a row was written and `Ok(false)` once the rows
    /// are exhausted; the cursor is closed at that point and any further call
    /// fails with [`StubqlError::RowsClosed`].
    fn next(&mut self, dest: &mut [Value]) -> Result<bool>;

    /// Close the cursor. Closing twice is not an error.
    fn close(&mut self) -> Result<()>;
}

/// Drain a cursor into a materialized [`QueryResult`].
pub fn collect_rows(rows: &mut dyn Rows) -> Result<QueryResult> {
    let names: Arc<[String]> = rows.columns().to_vec().into();
    let columns = names
        .iter()
        .enumerate()
        .map(|(ordinal, name)| ColumnMeta {
            name: name.clone(),
            data_type: "DYNAMIC".to_string(),
            nullable: true,
            ordinal,
        })
        .collect();

    let mut result = QueryResult {
        columns,
        ..QueryResult::empty()
    };
    let mut dest = vec![Value::Null; names.len()];
    while rows.next(&mut dest)? {
        result.rows.push(Row::new(Arc::clone(&names), dest.clone()));
    }

    tracing::debug!(row_count = result.rows.len(), "rows collected");
    Ok(result)
}

/// Reject a call whose argument count disagrees with the statement.
pub fn check_argument_count(stmt: &dyn PreparedStatement, params: &[Value]) -> Result<()> {
    match stmt.num_input() {
        Some(expected) if expected != params.len() => Err(StubqlError::ArgumentCount {
            expected,
            found: params.len(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecRows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
        pos: usize,
        closed: bool,
    }

    impl Rows for VecRows {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        fn next(&mut self, dest: &mut [Value]) -> Result<bool> {
            if self.closed {
                return Err(StubqlError::RowsClosed);
            }
            match self.rows.get(self.pos) {
                Some(row) => {
                    dest.clone_from_slice(row);
                    self.pos += 1;
                    Ok(true)
                }
                None => {
                    self.closed = true;
                    Ok(false)
                }
            }
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn test_collect_rows() {
        let mut rows = VecRows {
            columns: vec!["id".into(), "name".into()],
            rows: vec![
                vec![Value::Int64(1), Value::from("tim")],
                vec![Value::Int64(2), Value::from("joe")],
            ],
            pos: 0,
            closed: false,
        };

        let result = collect_rows(&mut rows).unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.column_count(), 2);
        assert_eq!(result.columns[1].name, "name");
        assert_eq!(result.columns[1].ordinal, 1);
        assert_eq!(result.rows[1].get_by_name("name"), Some(&Value::from("joe")));
        assert!(matches!(
            rows.next(&mut [Value::Null, Value::Null]),
            Err(StubqlError::RowsClosed)
        ));
    }
}
