//! Query text normalization
//!
//! Stubs are looked up by a digest of the query text with every whitespace
//! character removed and letters lowercased, so a stub written as
//! `SELECT COUNT(*) FROM foo` also answers `select count(*)   from foo`.
//! Nothing SQL-aware happens here: `select 'a b'` and `select 'ab'` share a key.

use sha2::{Digest, Sha256};
use std::fmt;

/// Fixed-width lookup key derived from raw query text
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey([u8; 32]);

impl QueryKey {
    pub fn new(query: &str) -> Self {
        let digest = Sha256::digest(normalize(query).as_bytes());
        Self(digest.into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<&str> for QueryKey {
    fn from(query: &str) -> Self {
        QueryKey::new(query)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryKey({})", &hex::encode(self.0)[..12])
    }
}

/// The canonical text a query is hashed from
pub fn normalize(query: &str) -> String {
    query
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
