// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! List queries, paging metadata, and table/base descriptors.

use serde::{Deserialize, Serialize};

use crate::{Column, Row};

/// Optional filters for a paginated list call. Unset fields are omitted from
/// the outgoing request, never defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Rows to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Backend filter expression, e.g. `(name,eq,X)`.
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    /// Sort expression, e.g. `-CreatedAt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl ListQuery {
    /// Query with only a limit.
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Set fields as `(name, value)` query pairs.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(w) = self.where_clause.as_deref().filter(|w| !w.is_empty()) {
            pairs.push(("where", w.to_string()));
        }
        if let Some(s) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("sort", s.to_string()));
        }
        pairs
    }
}

/// Paging metadata reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Total rows matching the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    /// First page flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_first_page: Option<bool>,
    /// Last page flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_last_page: Option<bool>,
}

/// One page of rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListResponse {
    /// Rows on this page.
    #[serde(default)]
    pub list: Vec<Row>,
    /// Paging metadata.
    #[serde(default, rename = "pageInfo")]
    pub page_info: PageInfo,
}

/// A table as listed by the backend's meta API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table id.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Internal table name.
    #[serde(default)]
    pub table_name: String,
}

impl TableInfo {
    /// Case-insensitive match against title or internal name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.title.eq_ignore_ascii_case(name) || self.table_name.eq_ignore_ascii_case(name)
    }
}

/// Table metadata including its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Table id.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Internal table name.
    #[serde(default)]
    pub table_name: String,
    /// Column set.
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// A base (project).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseInfo {
    /// Base id.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn unset_filters_are_omitted() {
        assert!(ListQuery::default().to_pairs().is_empty());
        let q = ListQuery {
            limit: Some(5),
            where_clause: Some(String::new()),
            sort: Some("-name".into()),
            ..ListQuery::default()
        };
        assert_eq!(
            q.to_pairs(),
            vec![("limit", "5".to_string()), ("sort", "-name".to_string())]
        );
    }

    #[test]
    fn page_info_uses_camel_case() {
        let info: PageInfo = serde_json::from_value(serde_json::json!({
            "totalRows": 5, "isLastPage": true, "pageSize": 25
        }))
        .unwrap();
        assert_eq!(info.total_rows, Some(5));
        assert_eq!(info.is_last_page, Some(true));
        let back = serde_json::to_value(&info).unwrap();
        assert_eq!(back["isLastPage"], serde_json::json!(true));
        assert!(back.get("page").is_none());
    }

    #[test]
    fn table_name_match_is_case_insensitive() {
        let t = TableInfo {
            id: "t1".into(),
            title: "Tasks".into(),
            table_name: "nc_tasks".into(),
        };
        assert!(t.matches_name("tasks"));
        assert!(t.matches_name("NC_TASKS"));
        assert!(!t.matches_name("task"));
    }
}
