use serde_json::Value;

use super::error::FilterError;
use super::types::{is_valid_identifier, FilterOp, FilterWhereOptions};

/// Compiles a JSON condition tree into a parameterized SQL predicate.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut builder = Self::new(starting_param_index);
        let mut parts = builder.soft_delete_conditions(options);
        let compiled = builder.compile(where_data)?;
        if !compiled.is_empty() {
            parts.push(compiled);
        }
        let clause = if parts.is_empty() {
            "1=1".to_string()
        } else {
            parts.join(" AND ")
        };
        Ok((clause, builder.param_values))
    }

    pub fn generate_empty(options: &FilterWhereOptions) -> (String, Vec<Value>) {
        let builder = Self::new(0);
        let parts = builder.soft_delete_conditions(options);
        let clause = if parts.is_empty() {
            "1=1".to_string()
        } else {
            parts.join(" AND ")
        };
        (clause, vec![])
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause(
                "WHERE must be an object".to_string(),
            )),
        }
    }

    fn soft_delete_conditions(&self, options: &FilterWhereOptions) -> Vec<String> {
        if options.include_deleted {
            vec![]
        } else {
            vec!["\"deleted_at\" IS NULL".to_string()]
        }
    }

    /// Compile one condition tree; returns "" for an empty object
    fn compile(&mut self, where_data: &Value) -> Result<String, FilterError> {
        match where_data {
            Value::Null => Ok(String::new()),
            Value::Object(obj) => {
                let mut parts = Vec::new();
                for (key, value) in obj {
                    if key.starts_with('$') {
                        parts.push(self.compile_logical(key, value)?);
                    } else {
                        parts.push(self.compile_field(key, value)?);
                    }
                }
                Ok(parts.join(" AND "))
            }
            _ => Err(FilterError::InvalidWhereClause(
                "Unsupported WHERE format".to_string(),
            )),
        }
    }

    fn compile_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("{} requires an array", op))
                })?;
                if arr.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{} requires a non-empty array",
                        op
                    )));
                }
                let mut parts = Vec::new();
                for v in arr {
                    parts.push(format!("({})", self.compile(v)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(parts.join(joiner))
            }
            "$not" => Ok(format!("NOT ({})", self.compile(value)?)),
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    fn compile_field(&mut self, field: &str, value: &Value) -> Result<String, FilterError> {
        if !is_valid_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }

        if let Value::Object(obj) = value {
            let mut parts = Vec::new();
            for (op_key, op_val) in obj {
                let op = Self::map_operator(op_key)?;
                parts.push(self.condition_sql(field, op, op_val)?);
            }
            Ok(parts.join(" AND "))
        } else {
            // Implicit equality: { field: value }
            self.condition_sql(field, FilterOp::Eq, value)
        }
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$nlike" => FilterOp::NLike,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn condition_sql(
        &mut self,
        column: &str,
        op: FilterOp,
        data: &Value,
    ) -> Result<String, FilterError> {
        let col = format!("\"{}\"", column);
        match op {
            FilterOp::Eq => {
                if data.is_null() {
                    Ok(format!("{} IS NULL", col))
                } else {
                    Ok(format!("{} = {}", col, self.param(data.clone())))
                }
            }
            FilterOp::Ne => {
                if data.is_null() {
                    Ok(format!("{} IS NOT NULL", col))
                } else {
                    Ok(format!("{} <> {}", col, self.param(data.clone())))
                }
            }
            FilterOp::Gt => Ok(format!("{} > {}", col, self.param(data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", col, self.param(data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", col, self.param(data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", col, self.param(data.clone()))),
            FilterOp::Like => Ok(format!("{} LIKE {}", col, self.param(data.clone()))),
            FilterOp::NLike => Ok(format!("{} NOT LIKE {}", col, self.param(data.clone()))),
            FilterOp::ILike => Ok(format!("{} ILIKE {}", col, self.param(data.clone()))),
            FilterOp::In | FilterOp::NIn => {
                let negate = op == FilterOp::NIn;
                if let Value::Array(values) = data {
                    if values.is_empty() {
                        // IN () matches nothing; NOT IN () matches everything
                        return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                    }
                    let params: Vec<String> =
                        values.iter().map(|v| self.param(v.clone())).collect();
                    let kw = if negate { "NOT IN" } else { "IN" };
                    Ok(format!("{} {} ({})", col, kw, params.join(", ")))
                } else {
                    Err(FilterError::InvalidOperatorData(
                        "$in/$nin require an array".to_string(),
                    ))
                }
            }
            FilterOp::Between => {
                if let Value::Array(values) = data {
                    if values.len() != 2 {
                        return Err(FilterError::InvalidOperatorData(
                            "$between requires exactly 2 values".to_string(),
                        ));
                    }
                    Ok(format!(
                        "{} BETWEEN {} AND {}",
                        col,
                        self.param(values[0].clone()),
                        self.param(values[1].clone())
                    ))
                } else {
                    Err(FilterError::InvalidOperatorData(
                        "$between requires an array with 2 values".to_string(),
                    ))
                }
            }
            FilterOp::Null => match data {
                Value::Bool(true) => Ok(format!("{} IS NULL", col)),
                Value::Bool(false) => Ok(format!("{} IS NOT NULL", col)),
                _ => Err(FilterError::InvalidOperatorData(
                    "$null requires a boolean".to_string(),
                )),
            },
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gen(where_data: Value) -> (String, Vec<Value>) {
        FilterWhere::generate(&where_data, 0, &FilterWhereOptions::default()).unwrap()
    }

    #[test]
    fn implicit_equality() {
        let (sql, params) = gen(json!({ "slug": "delivery" }));
        assert_eq!(sql, "\"deleted_at\" IS NULL AND \"slug\" = $1");
        assert_eq!(params, vec![json!("delivery")]);
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let (sql, params) = gen(json!({ "parent_id": null }));
        assert!(sql.ends_with("\"parent_id\" IS NULL"));
        assert!(params.is_empty());
    }

    #[test]
    fn operators_compile_with_positional_params() {
        let (sql, params) = gen(json!({
            "stock": { "$gte": 1, "$lt": 100 },
            "brand": { "$in": ["Bosch", "Mann"] }
        }));
        assert!(sql.contains("\"stock\" >= $1"));
        assert!(sql.contains("\"stock\" < $2"));
        assert!(sql.contains("\"brand\" IN ($3, $4)"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn logical_or_wraps_subclauses() {
        let (sql, params) = gen(json!({
            "$or": [ { "role": "admin" }, { "role": "editor" } ]
        }));
        assert!(sql.contains("(\"role\" = $1) OR (\"role\" = $2)"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, _) = gen(json!({ "id": { "$in": [] } }));
        assert!(sql.contains("1=0"));
    }

    #[test]
    fn include_deleted_drops_soft_delete_guard() {
        let opts = FilterWhereOptions {
            include_deleted: true,
        };
        let (sql, _) = FilterWhere::generate(&json!({ "slug": "x" }), 0, &opts).unwrap();
        assert_eq!(sql, "\"slug\" = $1");
    }

    #[test]
    fn rejects_injection_in_column_names() {
        let err = FilterWhere::generate(
            &json!({ "slug\"; drop table pages; --": "x" }),
            0,
            &FilterWhereOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn rejects_unknown_operator() {
        let err = FilterWhere::generate(
            &json!({ "slug": { "$regex": ".*" } }),
            0,
            &FilterWhereOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedOperator(_)));
    }
}
