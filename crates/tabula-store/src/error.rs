// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed store failures naming the operation and the target table.

use std::time::Duration;

use thiserror::Error;

/// Store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Column metadata fetch.
    Columns,
    /// Paginated read.
    List,
    /// Row creation.
    Create,
    /// Row update.
    Update,
    /// Row deletion.
    Delete,
    /// Table lookup by name.
    FindTable,
    /// Related-table rows for a link-to-record column.
    RelatedRows,
}

impl StoreOp {
    /// Stable lowercase name used in messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::FindTable => "find_table",
            Self::RelatedRows => "related_rows",
        }
    }

    /// Reads may be retried; mutations may not.
    pub fn is_read(self) -> bool {
        matches!(
            self,
            Self::Columns | Self::List | Self::FindTable | Self::RelatedRows
        )
    }
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreErrorKind {
    /// Table or row does not exist.
    #[error("not found")]
    NotFound,
    /// The remote call did not finish within the policy timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Backend answered with an error status.
    #[error("backend returned {status}: {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Backend-provided message.
        message: String,
    },
    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request was rejected before or by the backend as invalid.
    #[error("{0}")]
    InvalidInput(String),
}

/// Failure of one store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op} failed for {table}: {kind}")]
pub struct StoreError {
    /// Operation.
    pub op: StoreOp,
    /// Table reference (or lookup name) the call targeted.
    pub table: String,
    /// Failure detail.
    pub kind: StoreErrorKind,
}

impl StoreError {
    /// Build an error.
    pub fn new(op: StoreOp, table: impl Into<String>, kind: StoreErrorKind) -> Self {
        Self {
            op,
            table: table.into(),
            kind,
        }
    }

    /// Shorthand for [`StoreErrorKind::NotFound`].
    pub fn not_found(op: StoreOp, table: impl Into<String>) -> Self {
        Self::new(op, table, StoreErrorKind::NotFound)
    }

    /// Shorthand for [`StoreErrorKind::InvalidInput`].
    pub fn invalid(op: StoreOp, table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(op, table, StoreErrorKind::InvalidInput(message.into()))
    }

    /// True for "table or row not found".
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }

    /// Timeouts, transport failures, and 5xx answers are transient.
    pub fn is_transient(&self) -> bool {
        match &self.kind {
            StoreErrorKind::Timeout(_) | StoreErrorKind::Transport(_) => true,
            StoreErrorKind::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for a user-facing notification.
    pub fn summary(&self) -> String {
        match &self.kind {
            StoreErrorKind::Backend { message, .. } | StoreErrorKind::InvalidInput(message) => {
                message.clone()
            }
            StoreErrorKind::NotFound if matches!(self.op, StoreOp::Update | StoreOp::Delete) => {
                "Record not found".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn display_names_operation_and_table() {
        let err = StoreError::new(
            StoreOp::Update,
            "p1.t2",
            StoreErrorKind::Backend {
                status: 500,
                message: "boom".into(),
            },
        );
        assert_eq!(err.to_string(), "update failed for p1.t2: backend returned 500: boom");
        assert!(err.is_transient());
        assert_eq!(err.summary(), "boom");
    }

    #[test]
    fn not_found_is_distinct_and_not_transient() {
        let err = StoreError::not_found(StoreOp::Update, "p1.t2");
        assert!(err.is_not_found());
        assert!(!err.is_transient());
        assert_eq!(err.summary(), "Record not found");
    }
}
