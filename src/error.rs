#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("confidence interval computation failed: {0}")]
    IntervalComputation(String),
    #[error("no data supplied and no variables recoverable from the fit environment")]
    DataReconstruction,
    #[error("dimension mismatch: expected {expected} rows, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("test result has none of estimate, statistic, p.value or parameter")]
    InvalidTestResult,
    #[error("invalid confidence level {0}, must be in (0, 1)")]
    InvalidConfidenceLevel(f64),
    #[error("column name {0} not found")]
    ColumnNameNotFound(String),
    #[error("duplicate column name {0}")]
    DuplicateColumnName(String),
    #[error("column names do not match")]
    ColumnNamesMismatch,
    #[error("column {0} has mismatched types")]
    ColumnTypeMismatch(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("r error: {0}")]
    R(String),
}

#[cfg(feature = "r")]
impl From<extendr_api::Error> for Error {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn from(err: extendr_api::Error) -> Self {
        Error::R(err.to_string())
    }
}

#[cfg(feature = "r")]
impl From<Error> for extendr_api::Error {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn from(e: Error) -> Self {
        extendr_api::Error::Other(e.to_string())
    }
}
