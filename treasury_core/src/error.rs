use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreasuryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("document {id} is missing `{field}`")]
    MissingField { id: u64, field: &'static str },

    #[error("store error: {0}")]
    Store(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid ingestion plan: {0}")]
    InvalidPlan(String),

    #[error(
        "blocks {start}..={end} overlap {existing_start}..={existing_end}, already ingested for {address}"
    )]
    RangeOverlap {
        address: String,
        start: u64,
        end: u64,
        existing_start: u64,
        existing_end: u64,
    },
}

impl TreasuryError {
    /// Transport failures, timeouts, rate limits and server errors are worth another attempt.
    /// Everything else fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            TreasuryError::Http(err) => !err.is_decode() && !err.is_builder(),
            TreasuryError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Store errors abort a stage; every other error is local to one page, batch or document.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TreasuryError::Store(_) | TreasuryError::Io(_))
    }
}

pub type TreasuryResult<T> = Result<T, TreasuryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retry_classes() {
        let rate_limited = TreasuryError::Status {
            endpoint: "search".to_string(),
            status: 429,
            body: String::new(),
        };
        let unavailable = TreasuryError::Status {
            endpoint: "search".to_string(),
            status: 503,
            body: String::new(),
        };
        let forbidden = TreasuryError::Status {
            endpoint: "search".to_string(),
            status: 403,
            body: "bad key".to_string(),
        };

        assert!(rate_limited.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!forbidden.is_retryable());
    }

    #[test]
    fn test_malformed_is_not_retryable() {
        let err = TreasuryError::Malformed("no result.items".to_string());
        assert!(!err.is_retryable());
        assert!(!err.is_fatal());
    }
}
