//! Error types for conversion operations

use thiserror::Error;

/// Errors that can occur while rebuilding HTML from stored node records.
///
/// The forward pipeline (HTML to records) never returns these: it accepts
/// arbitrary input strings and degrades to an empty record list instead of
/// failing.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// A record is structurally invalid (for example an empty `tag`)
    #[error("invalid node record: {0}")]
    InvalidNode(String),
    /// A record array could not be parsed from JSON
    #[error("invalid node JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The base URL for link absolutization could not be parsed
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    /// Writing serialized HTML failed
    #[error("serialization failed: {0}")]
    Serialize(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConversionError::InvalidNode("missing tag".to_string());
        assert_eq!(err.to_string(), "invalid node record: missing tag");
    }

    #[test]
    fn test_base_url_error_display() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = ConversionError::InvalidBaseUrl {
            url: "not a url".to_string(),
            source,
        };
        assert!(err.to_string().contains("not a url"));
    }
}
