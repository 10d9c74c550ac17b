use thiserror::Error;

/// Errors in indicator definitions, raised at registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unsupported measure '{0}' (expected value, sojourn-time, nb-occurrences or had-value)")]
    UnsupportedMeasure(String),

    #[error("unsupported statistic '{0}' (expected mean or stddev)")]
    UnsupportedStatistic(String),

    #[error("unsupported comparison operator '{0}'")]
    UnsupportedOperator(String),

    #[error("indicator '{indicator}' refers to unknown {kind} '{target}'")]
    UnknownTarget {
        indicator: String,
        kind: &'static str,
        target: String,
    },

    #[error("indicator '{0}' is already registered")]
    DuplicateIndicator(String),

    #[error("indicator '{0}' has no statistic")]
    NoStatistic(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
