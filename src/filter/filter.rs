use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{
    is_valid_identifier, FilterData, FilterOrderInfo, FilterWhereOptions, SqlResult,
};

/// Builds a SELECT over one table from a structured filter payload.
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            options: FilterWhereOptions::default(),
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select {
            self.select(select)?;
        }
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        let limit = data
            .limit
            .unwrap_or(crate::config::config().filter.default_limit);
        self.limit(limit, data.offset)?;
        Ok(self)
    }

    pub fn include_deleted(&mut self, include: bool) -> &mut Self {
        self.options.include_deleted = include;
        self
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column == "*" {
                continue;
            }
            if !is_valid_identifier(column) {
                return Err(FilterError::InvalidColumn(column.clone()));
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit(
                "Limit must be non-negative".to_string(),
            ));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset(
                    "Offset must be non-negative".to_string(),
                ));
            }
        }

        // Cap at the configured maximum
        let max_limit = crate::config::config().filter.max_limit;
        let applied = if limit > max_limit {
            tracing::debug!("limit {} exceeds max {}, capping", limit, max_limit);
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let (where_clause, params) = self.build_where()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.build_where()?;
        let query = format!(
            "SELECT COUNT(*) as count FROM \"{}\" WHERE {}",
            self.table_name, where_clause
        );
        Ok(SqlResult { query, params })
    }

    fn build_where(&self) -> Result<(String, Vec<Value>), FilterError> {
        if let Some(ref where_data) = self.where_data {
            FilterWhere::generate(where_data, 0, &self.options)
        } else {
            Ok(FilterWhere::generate_empty(&self.options))
        }
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_query_assembly() {
        let mut filter = Filter::new("products").unwrap();
        filter
            .assign(FilterData {
                select: Some(vec!["id".into(), "name".into()]),
                where_clause: Some(json!({ "brand": "Bosch" })),
                order: Some(json!("name asc")),
                limit: Some(20),
                offset: Some(40),
            })
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT \"id\", \"name\" FROM \"products\" WHERE \"deleted_at\" IS NULL AND \"brand\" = $1 ORDER BY \"name\" ASC LIMIT 20 OFFSET 40"
        );
        assert_eq!(sql.params, vec![json!("Bosch")]);
    }

    #[test]
    fn count_query_keeps_where() {
        let mut filter = Filter::new("clients").unwrap();
        filter.where_clause(json!({ "profile": "wholesale" })).unwrap();
        let sql = filter.to_count_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) as count FROM \"clients\" WHERE \"deleted_at\" IS NULL AND \"profile\" = $1"
        );
    }

    #[test]
    fn limit_is_capped_by_config() {
        // Development preset caps at 1000
        let mut filter = Filter::new("pages").unwrap();
        filter.limit(10_000, None).unwrap();
        let sql = filter.to_sql().unwrap();
        assert!(sql.query.contains("LIMIT 1000"));
    }

    #[test]
    fn rejects_bad_table_name() {
        assert!(Filter::new("pages; drop").is_err());
        assert!(Filter::new("").is_err());
    }

    #[test]
    fn default_limit_applied_when_missing() {
        let mut filter = Filter::new("pages").unwrap();
        filter.assign(FilterData::default()).unwrap();
        let sql = filter.to_sql().unwrap();
        assert!(sql.query.contains("LIMIT 50"));
    }
}
