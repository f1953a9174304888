//! In-memory row sets and the cursors that walk them

use std::sync::Arc;
use stubql_core::{ColumnMeta, Result, Rows, StubqlError, Value};

/// An ordered, immutable set of rows aligned to a fixed column list.
///
/// Cloning shares the underlying rows. Every call to [`RowSet::cursor`]
/// starts a fresh cursor at the first row, so one stub can back any number
/// of queries without them seeing each other's position.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    columns: Arc<[String]>,
    rows: Arc<[Vec<Value>]>,
}

impl RowSet {
    /// Build a row set from typed values. Every row must have one value per column.
    pub fn new<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Arc<[String]> = columns.into_iter().map(Into::into).collect();
        Self::from_parts(columns, rows)
    }

    pub(crate) fn from_parts(columns: Arc<[String]>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(StubqlError::MalformedFixture {
                record: idx + 1,
                expected: columns.len(),
                found: row.len(),
            });
        }

        Ok(Self {
            columns,
            rows: rows.into(),
        })
    }

    /// A row set with columns but no rows
    pub fn empty<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Arc::from(Vec::new()),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column metadata; types are unknown, so every column reports `DYNAMIC`
    pub fn column_meta(&self) -> Vec<ColumnMeta> {
        self.columns
            .iter()
            .enumerate()
            .map(|(ordinal, name)| ColumnMeta {
                name: name.clone(),
                data_type: "DYNAMIC".to_string(),
                nullable: true,
                ordinal,
            })
            .collect()
    }

    /// Start a new cursor positioned before the first row
    pub fn cursor(&self) -> StubRows {
        StubRows {
            set: self.clone(),
            pos: 0,
            closed: false,
        }
    }
}

/// Cursor over a [`RowSet`]
#[derive(Debug)]
pub struct StubRows {
    set: RowSet,
    pos: usize,
    closed: bool,
}

impl StubRows {
    /// Index of the next row to be read
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Rows for StubRows {
    fn columns(&self) -> &[String] {
        self.set.columns()
    }

    fn next(&mut self, dest: &mut [Value]) -> Result<bool> {
        if self.closed {
            return Err(StubqlError::RowsClosed);
        }
        if dest.len() != self.set.columns.len() {
            return Err(StubqlError::Destination {
                expected: self.set.columns.len(),
                found: dest.len(),
            });
        }

        match self.set.rows.get(self.pos) {
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
