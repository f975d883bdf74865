use serde::{Deserialize, Serialize};

/// Structured filter payload accepted by the find endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    #[serde(rename = "where")]
    pub where_clause: Option<serde_json::Value>,
    pub order: Option<serde_json::Value>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NLike,
    ILike,
    In,
    NIn,
    Between,
    Null,
}

#[derive(Debug, Clone)]
pub struct FilterWhereOptions {
    /// Include soft-deleted rows (`deleted_at IS NOT NULL`)
    pub include_deleted: bool,
}

impl Default for FilterWhereOptions {
    fn default() -> Self {
        Self {
            include_deleted: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// A generated query fragment plus its positional parameters
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}

/// Identifier check shared by table, column, and order validation.
/// Accepts `[a-zA-Z_][a-zA-Z0-9_]*` only, which is what gets interpolated
/// into quoted SQL identifiers.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_validation() {
        assert!(is_valid_identifier("pages"));
        assert!(is_valid_identifier("_audit_log"));
        assert!(is_valid_identifier("client_vehicles2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2pages"));
        assert!(!is_valid_identifier("pages; drop table"));
        assert!(!is_valid_identifier("pa-ges"));
    }

    #[test]
    fn filter_data_accepts_where_key() {
        let data: FilterData = serde_json::from_value(serde_json::json!({
            "where": { "published": true },
            "limit": 10
        }))
        .unwrap();
        assert!(data.where_clause.is_some());
        assert_eq!(data.limit, Some(10));
    }
}
