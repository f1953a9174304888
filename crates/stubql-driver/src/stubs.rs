//! Canned outcomes keyed by normalized query text, plus responder hooks

use std::collections::HashMap;
use std::sync::Arc;
use stubql_core::{Connection, ExecResult, Result, StubqlError, Value};

use crate::{QueryKey, RowSet};

/// Computes rows for a query at call time
pub type QueryResponder = Arc<dyn Fn(&str, &[Value]) -> Result<RowSet> + Send + Sync>;

/// Computes a write outcome at call time
pub type ExecResponder = Arc<dyn Fn(&str, &[Value]) -> Result<ExecResult> + Send + Sync>;

/// Decides whether a begin, commit or rollback succeeds
pub type TxResponder = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Replaces the driver's own connection lookup
pub type OpenResponder = Arc<dyn Fn(&str) -> Result<Arc<dyn Connection>> + Send + Sync>;

/// What a stubbed query answers with. Exactly one case is ever active.
#[derive(Debug, Clone)]
pub enum StubbedOutcome {
    Rows(RowSet),
    Exec(ExecResult),
    Error(StubqlError),
}

/// Per-connection map from normalized query text to its canned outcome.
///
/// One outcome per key; registering the same (or an equivalent) query again
/// replaces the earlier outcome.
#[derive(Debug, Default)]
pub struct StubRegistry {
    entries: HashMap<QueryKey, StubbedOutcome>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `outcome` for `query`, returning the outcome it replaced
    pub fn insert(&mut self, query: &str, outcome: StubbedOutcome) -> Option<StubbedOutcome> {
        let key = QueryKey::new(query);
        let previous = self.entries.insert(key, outcome);
        if previous.is_some() {
            tracing::debug!(%key, "replacing existing stub");
        }
        previous
    }

    pub fn stub_rows(&mut self, query: &str, rows: RowSet) {
        self.insert(query, StubbedOutcome::Rows(rows));
    }

    pub fn stub_exec(&mut self, query: &str, result: ExecResult) {
        self.insert(query, StubbedOutcome::Exec(result));
    }

    pub fn stub_error(&mut self, query: &str, err: StubqlError) {
        self.insert(query, StubbedOutcome::Error(err));
    }

    pub fn get(&self, query: &str) -> Option<&StubbedOutcome> {
        self.entries.get(&QueryKey::new(query))
    }

    pub fn remove(&mut self, query: &str) -> Option<StubbedOutcome> {
        self.entries.remove(&QueryKey::new(query))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Resolve a read. Write outcomes don't answer reads.
    pub fn resolve_query(&self, query: &str) -> Result<RowSet> {
        match self.get(query) {
            Some(StubbedOutcome::Rows(rows)) => Ok(rows.clone()),
            Some(StubbedOutcome::Error(err)) => Err(err.clone()),
            Some(StubbedOutcome::Exec(_)) | None => Err(not_stubbed(query)),
        }
    }

    /// Resolve a write. Row outcomes don't answer writes.
    pub fn resolve_exec(&self, query: &str) -> Result<ExecResult> {
        match self.get(query) {
            Some(StubbedOutcome::Exec(result)) => Ok(*result),
            Some(StubbedOutcome::Error(err)) => Err(err.clone()),
            Some(StubbedOutcome::Rows(_)) | None => Err(not_stubbed(query)),
        }
    }
}

fn not_stubbed(query: &str) -> StubqlError {
    tracing::warn!(query = %query, "query not stubbed");
    StubqlError::NotStubbed {
        query: query.to_string(),
    }
}

/// Dynamic responders installed on a connection. A set responder takes
/// precedence over the static registry.
#[derive(Clone, Default)]
pub struct Hooks {
    pub query: Option<QueryResponder>,
    pub exec: Option<ExecResponder>,
    pub begin: Option<TxResponder>,
    pub commit: Option<TxResponder>,
    pub rollback: Option<TxResponder>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows_from_csv;

    #[test]
    fn test_last_registration_wins() {
        let mut registry = StubRegistry::new();
        registry.stub_rows("select 1", rows_from_csv(["n"], "1").unwrap());
        registry.stub_rows("SELECT   1", rows_from_csv(["n"], "2").unwrap());

        assert_eq!(registry.len(), 1);
        let rows = registry.resolve_query("select 1").unwrap();
        assert_eq!(rows.rows()[0][0], Value::from("2"));
    }

    #[test]
    fn test_error_answers_reads_and_writes() {
        let mut registry = StubRegistry::new();
        registry.stub_error("delete from users", StubqlError::other("locked"));

        let read = registry.resolve_query("DELETE FROM users").unwrap_err();
        let write = registry.resolve_exec("delete from users").unwrap_err();
        assert_eq!(read.to_string(), "locked");
        assert_eq!(write.to_string(), "locked");
    }

    #[test]
    fn test_outcome_kind_must_match_call() {
        let mut registry = StubRegistry::new();
        registry.stub_exec("insert into users values (1)", ExecResult::new(1, 1));
        registry.stub_rows("select * from users", RowSet::empty(["id"]));

        assert!(registry.resolve_query("insert into users values (1)").unwrap_err().is_not_stubbed());
        assert!(registry.resolve_exec("select * from users").unwrap_err().is_not_stubbed());
        assert_eq!(
            registry.resolve_exec("insert into users values (1)").unwrap(),
            ExecResult::new(1, 1)
        );
    }

    #[test]
    fn test_unknown_query_names_raw_text() {
        let registry = StubRegistry::new();
        let err = registry.resolve_query("select count(*) from foobar").unwrap_err();
        assert_eq!(err.to_string(), "query not stubbed: select count(*) from foobar");
    }

    #[test]
    fn test_clear_and_remove() {
        let mut registry = StubRegistry::new();
        registry.stub_exec("a", ExecResult::default());
        registry.stub_exec("b", ExecResult::default());
        assert!(registry.remove("A").is_some());
        registry.clear();
        assert!(registry.is_empty());
    }
}
