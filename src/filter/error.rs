use thiserror::Error;

/// Errors raised while compiling a structured filter into SQL. Every variant
/// surfaces as a 400 at the API boundary.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Table name is not a valid identifier: {0}")]
    InvalidTableName(String),

    #[error("Column name is not a valid identifier: {0}")]
    InvalidColumn(String),

    #[error("Malformed where clause: {0}")]
    InvalidWhereClause(String),

    #[error("Operator is not part of the filter language: {0}")]
    UnsupportedOperator(String),

    #[error("Operand does not fit the operator: {0}")]
    InvalidOperatorData(String),

    #[error("Limit out of range: {0}")]
    InvalidLimit(String),

    #[error("Offset out of range: {0}")]
    InvalidOffset(String),
}
