/// Errors that can occur when fetching metrics from a provider.
///
/// A window with no datapoints is not an error: the [`crate::MetricSource`]
/// contract maps it to `0.0`.
///
/// # Examples
///
/// ```rust
/// use costwarden_metrics::error::MetricError;
///
/// let err = MetricError::Timeout { secs: 30 };
/// assert!(err.to_string().contains("30"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    /// The monitoring provider rejected or failed the request.
    #[error("metric provider error: {message}")]
    Provider { message: String },

    /// The fetch did not complete within the configured per-fetch timeout.
    #[error("metric fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The evaluation run was cancelled while the fetch was queued.
    #[error("metric fetch cancelled")]
    Cancelled,
}

/// Convenience type alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, MetricError>;
