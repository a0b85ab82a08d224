use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Address blocked: {0}")]
    AddressBlocked(String),

    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    #[error("Request timeout: {0}")]
    TimeoutError(String),

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Failed to extract metadata: {0}")]
    ExtractError(String),

    #[error("No summarizer accepted the URL")]
    NoSummarizer,
}

impl SummaryError {
    pub fn log(&self) {
        match self {
            SummaryError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            SummaryError::AddressBlocked(e) => {
                warn!(error = %e, "Target address rejected");
            }
            SummaryError::FetchError(e) => {
                error!(error = %e, "Content fetch failed");
            }
            SummaryError::TimeoutError(e) => {
                warn!(error = %e, "Request timed out");
            }
            SummaryError::InvalidContentType(e) => {
                warn!(error = %e, "Disallowed content type received");
            }
            SummaryError::ExtractError(e) => {
                error!(error = %e, "Metadata extraction failed");
            }
            SummaryError::NoSummarizer => {
                error!("No summarizer accepted the URL");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_covers_every_variant() {
        let errors = [
            SummaryError::UrlParseError(url::ParseError::EmptyHost),
            SummaryError::AddressBlocked("10.0.0.1".to_string()),
            SummaryError::FetchError("connection refused".to_string()),
            SummaryError::TimeoutError("deadline elapsed".to_string()),
            SummaryError::InvalidContentType("application/pdf".to_string()),
            SummaryError::ExtractError("no discovery link".to_string()),
            SummaryError::NoSummarizer,
        ];
        for e in errors {
            e.log();
        }
    }
}
