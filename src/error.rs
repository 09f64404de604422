//! Error types for the aggregation layer.

use thiserror::Error;

use crate::data::model::FieldValue;

#[derive(Error, Debug)]
pub enum AggregateError {
    /// The dataset has no rows to aggregate.
    #[error("no rows to aggregate")]
    EmptyInput,

    /// A filter value matched no rows.
    #[error("no rows where '{column}' == {value}")]
    EmptyGroup { column: String, value: FieldValue },

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}', row {row}: '{value}' is not numeric")]
    NonNumeric {
        column: String,
        row: usize,
        value: FieldValue,
    },

    /// Every cell of the column in the selected rows is null.
    #[error("column '{0}' has no values to average")]
    NoValues(String),

    #[error("histogram needs at least one bin")]
    ZeroBins,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AggregateError>;
