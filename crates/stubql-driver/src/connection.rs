//! Stub connection implementation

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stubql_core::{
    Connection, ExecResult, PreparedStatement, Result, Rows, StubqlError, Transaction, Value,
};

use crate::{ExecResponder, Hooks, QueryResponder, RowSet, StubRegistry, TxResponder};

/// State shared by a connection and every statement and transaction it hands out
#[derive(Default)]
struct ConnState {
    stubs: RwLock<StubRegistry>,
    hooks: RwLock<Hooks>,
    call_log: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl ConnState {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StubqlError::ConnectionClosed);
        }
        Ok(())
    }

    fn resolve_query(&self, sql: &str, params: &[Value]) -> Result<RowSet> {
        self.ensure_open()?;
        self.call_log.lock().push(sql.to_string());

        // Responders run outside the lock so they may stub on this connection.
        let responder = self.hooks.read().query.clone();
        match responder {
            Some(respond) => {
                tracing::debug!("query answered by responder");
                respond(sql, params)
            }
            None => self.stubs.read().resolve_query(sql),
        }
    }

    fn resolve_exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.ensure_open()?;
        self.call_log.lock().push(sql.to_string());

        let responder = self.hooks.read().exec.clone();
        match responder {
            Some(respond) => {
                tracing::debug!("exec answered by responder");
                respond(sql, params)
            }
            None => self.stubs.read().resolve_exec(sql),
        }
    }
}

fn run_tx_hook(hook: Option<TxResponder>) -> Result<()> {
    match hook {
        Some(respond) => respond(),
        None => Ok(()),
    }
}

/// A connection whose answers come from registered stubs.
///
/// Queries are matched by normalized text (see [`crate::QueryKey`]); a query
/// or exec responder, when set, answers every call instead of the stubs.
pub struct StubConnection {
    dsn: String,
    state: Arc<ConnState>,
}

impl StubConnection {
    pub fn new(dsn: &str) -> Self {
        tracing::debug!(dsn = %dsn, "creating stub connection");
        Self {
            dsn: dsn.to_string(),
            state: Arc::new(ConnState::default()),
        }
    }

    /// The DSN this connection was created for
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Answer `query` with `rows`
    pub fn stub_query(&self, query: &str, rows: RowSet) {
        tracing::debug!(sql_preview = %preview(query), rows = rows.len(), "stubbing query");
        self.state.stubs.write().stub_rows(query, rows);
    }

    /// Fail both reads and writes of `query` with `err`
    pub fn stub_query_error(&self, query: &str, err: StubqlError) {
        tracing::debug!(sql_preview = %preview(query), error = %err, "stubbing query error");
        self.state.stubs.write().stub_error(query, err);
    }

    /// Answer writes of `query` with `result`
    pub fn stub_exec(&self, query: &str, result: ExecResult) {
        tracing::debug!(sql_preview = %preview(query), ?result, "stubbing exec");
        self.state.stubs.write().stub_exec(query, result);
    }

    pub fn set_query_responder<F>(&self, respond: F)
    where
        F: Fn(&str, &[Value]) -> Result<RowSet> + Send + Sync + 'static,
    {
        let respond: QueryResponder = Arc::new(respond);
        self.state.hooks.write().query = Some(respond);
    }

    pub fn set_exec_responder<F>(&self, respond: F)
    where
        F: Fn(&str, &[Value]) -> Result<ExecResult> + Send + Sync + 'static,
    {
        let respond: ExecResponder = Arc::new(respond);
        self.state.hooks.write().exec = Some(respond);
    }

    pub fn set_begin_responder<F>(&self, respond: F)
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.state.hooks.write().begin = Some(Arc::new(respond));
    }

    pub fn set_commit_responder<F>(&self, respond: F)
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.state.hooks.write().commit = Some(Arc::new(respond));
    }

    pub fn set_rollback_responder<F>(&self, respond: F)
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.state.hooks.write().rollback = Some(Arc::new(respond));
    }

    /// Remove every responder hook, leaving stubs in place
    pub fn clear_responders(&self) {
        *self.state.hooks.write() = Hooks::default();
    }

    /// Number of registered stubs
    pub fn stub_count(&self) -> usize {
        self.state.stubs.read().len()
    }

    /// Raw text of every query and exec this connection has answered, oldest first
    pub fn call_log(&self) -> Vec<String> {
        self.state.call_log.lock().clone()
    }

    /// Drop all stubs, responders and the call log
    pub fn reset(&self) {
        self.state.stubs.write().clear();
        *self.state.hooks.write() = Hooks::default();
        self.state.call_log.lock().clear();
    }

    pub(crate) fn reopen(&self) {
        if self.state.closed.swap(false, Ordering::SeqCst) {
            tracing::debug!(dsn = %self.dsn, "reopening closed stub connection");
        }
    }

    /// Prepare a statement without boxing it
    pub fn prepare_stub(&self, sql: &str) -> Result<StubStatement> {
        self.state.ensure_open()?;
        Ok(StubStatement {
            sql: sql.to_string(),
            state: Arc::clone(&self.state),
            closed: AtomicBool::new(false),
        })
    }
}

impl std::fmt::Debug for StubConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubConnection")
            .field("dsn", &self.dsn)
            .field("stubs", &self.stub_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn preview(sql: &str) -> String {
    sql.chars().take(100).collect()
}

#[async_trait]
impl Connection for StubConnection {
    fn driver_name(&self) -> &str {
        crate::DRIVER_NAME
    }

    #[tracing::instrument(skip(self, sql), fields(dsn = %self.dsn, sql_preview = %preview(sql)))]
    async fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement>> {
        Ok(Box::new(self.prepare_stub(sql)?))
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        self.state.ensure_open()?;
        tracing::debug!(dsn = %self.dsn, "beginning stub transaction");

        let hook = self.state.hooks.read().begin.clone();
        run_tx_hook(hook)?;

        Ok(Box::new(StubTransaction {
            state: Arc::clone(&self.state),
        }))
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!(dsn = %self.dsn, "closing stub connection");
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

/// Statement bound to query text; its outcome is resolved when it runs.
pub struct StubStatement {
    sql: String,
    state: Arc<ConnState>,
    closed: AtomicBool,
}

impl StubStatement {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StubqlError::StatementClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl PreparedStatement for StubStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    /// Stubs don't know how many placeholders a query has, so callers are
    /// told not to check.
    fn num_input(&self) -> Option<usize> {
        None
    }

    #[tracing::instrument(skip(self, params), fields(sql_preview = %preview(&self.sql)))]
    async fn execute(&self, params: &[Value]) -> Result<ExecResult> {
        self.ensure_open()?;
        let result = self.state.resolve_exec(&self.sql, params)?;
        tracing::debug!(
            last_insert_id = result.last_insert_id,
            rows_affected = result.rows_affected,
            "stub exec answered"
        );
        Ok(result)
    }

    #[tracing::instrument(skip(self, params), fields(sql_preview = %preview(&self.sql)))]
    async fn query(&self, params: &[Value]) -> Result<Box<dyn Rows>> {
        self.ensure_open()?;
        let rows = self.state.resolve_query(&self.sql, params)?;
        tracing::debug!(row_count = rows.len(), "stub query answered");
        Ok(Box::new(rows.cursor()))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Transaction handle; commit and rollback succeed unless a responder says otherwise.
pub struct StubTransaction {
    state: Arc<ConnState>,
}

#[async_trait]
impl Transaction for StubTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        tracing::debug!("committing stub transaction");
        let hook = self.state.hooks.read().commit.clone();
        run_tx_hook(hook)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        tracing::debug!("rolling back stub transaction");
        let hook = self.state.hooks.read().rollback.clone();
        run_tx_hook(hook)
    }
}
