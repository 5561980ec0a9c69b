// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The `"baseId.tableId"` table reference.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a source string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Input was empty.
    #[error("source is empty; expected \"baseId.tableId\"")]
    Empty,
    /// Input did not split into exactly two segments.
    #[error("invalid source \"{input}\": expected \"baseId.tableId\", found {segments} segment(s)")]
    SegmentCount {
        /// Offending input.
        input: String,
        /// Number of `.`-separated segments found.
        segments: usize,
    },
    /// One of the two segments was blank.
    #[error("invalid source \"{0}\": baseId and tableId must both be non-empty")]
    EmptySegment(String),
}

/// Composite identifier of one table in the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableRef {
    /// Base (project) id.
    pub base_id: String,
    /// Table (model) id.
    pub table_id: String,
}

impl TableRef {
    /// Build from parts without validation.
    pub fn new(base_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            table_id: table_id.into(),
        }
    }

    /// Parse `"baseId.tableId"`; anything other than two non-empty segments is rejected.
    pub fn parse(source: &str) -> Result<Self, SourceError> {
        if source.trim().is_empty() {
            return Err(SourceError::Empty);
        }
        let segments: Vec<&str> = source.split('.').collect();
        let [base, table] = segments.as_slice() else {
            return Err(SourceError::SegmentCount {
                input: source.to_string(),
                segments: segments.len(),
            });
        };
        if base.trim().is_empty() || table.trim().is_empty() {
            return Err(SourceError::EmptySegment(source.to_string()));
        }
        Ok(Self::new(*base, *table))
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.base_id, self.table_id)
    }
}

impl FromStr for TableRef {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TableRef {
    type Error = SourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TableRef> for String {
    fn from(value: TableRef) -> Self {
        value.to_string()
    }
}
