//! Database connection models for the Superset database API.
//!
//! Superset owns the canonical connection records; these models only shape
//! the requests this workspace proposes and the responses it inspects.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single column filter in a Superset search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseFilter {
    /// Column to filter on.
    pub col: String,
    /// Filter operator.
    pub opr: String,
    /// Value to compare against.
    pub value: String,
}

impl DatabaseFilter {
    /// Exact-match filter on a column.
    pub fn eq(col: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            col: col.into(),
            opr: "eq".to_string(),
            value: value.into(),
        }
    }
}

/// The `q` query parameter of the database search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSearchQuery {
    /// Filters applied to the search, combined with AND.
    pub filters: Vec<DatabaseFilter>,
}

impl DatabaseSearchQuery {
    /// Builds an exact-match search on the connection display name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            filters: vec![DatabaseFilter::eq("database_name", name)],
        }
    }

    /// Serializes the query for the `q` URL parameter.
    pub fn to_query_value(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Response body from the database search endpoint.
///
/// Only the match count matters here; the item list is ignored.
#[derive(Debug, Deserialize)]
pub struct DatabaseSearchResponse {
    /// Number of connections matching the filters.
    #[serde(default)]
    pub count: u64,
}

/// Request body for creating a database connection record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDatabaseRequest {
    /// Connection display name; the unique key on the Superset side.
    #[validate(length(min = 1, max = 250, message = "Name must be 1-250 characters"))]
    pub database_name: String,
    /// SQLAlchemy connection URI Superset uses to reach the database.
    #[validate(length(min = 1, message = "Connection URI must not be empty"))]
    pub sqlalchemy_uri: String,
    /// Whether the connection is available in SQL Lab.
    pub expose_in_sqllab: bool,
    /// Whether asynchronous query execution is allowed.
    pub allow_run_async: bool,
}

impl CreateDatabaseRequest {
    /// Creates a connection payload exposed in SQL Lab with async execution
    /// enabled.
    pub fn new(database_name: impl Into<String>, sqlalchemy_uri: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            sqlalchemy_uri: sqlalchemy_uri.into(),
            expose_in_sqllab: true,
            allow_run_async: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_wire_format() {
        let query = DatabaseSearchQuery::by_name("analytics");
        assert_eq!(
            query.to_query_value().unwrap(),
            r#"{"filters":[{"col":"database_name","opr":"eq","value":"analytics"}]}"#
        );
    }

    #[test]
    fn test_create_request_flags() {
        let req = CreateDatabaseRequest::new("analytics", "postgresql+psycopg2://u:p@h:5432/analytics");
        assert!(req.expose_in_sqllab);
        assert!(req.allow_run_async);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_empty_name() {
        let req = CreateDatabaseRequest::new("", "postgresql+psycopg2://u:p@h:5432/analytics");
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_search_response_defaults_count() {
        let resp: DatabaseSearchResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.count, 0);
    }
}
