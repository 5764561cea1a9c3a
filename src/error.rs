// Analysis Errors
// Validation failures reported to callers with stable reason codes

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Text too short: {words} words, need at least {required}")]
    TextTooShort { words: usize, required: usize },
    #[error("Text too short for reliable analysis: {segments} segments, need at least {required}")]
    InsufficientSegments { segments: usize, required: usize },
    #[error("Segment size must be a positive number of words")]
    InvalidSegmentSize,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::TextTooShort { .. } => "TEXT_TOO_SHORT",
            AnalysisError::InsufficientSegments { .. } => "INSUFFICIENT_SEGMENTS",
            AnalysisError::InvalidSegmentSize => "INVALID_SEGMENT_SIZE",
            AnalysisError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Caller-side validation failure, as opposed to an internal fault.
    pub fn is_validation(&self) -> bool {
        !matches!(self, AnalysisError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        let e = AnalysisError::TextTooShort { words: 40, required: 100 };
        assert_eq!(e.code(), "TEXT_TOO_SHORT");
        assert!(e.to_string().contains("40 words"));
        assert!(e.is_validation());

        let e = AnalysisError::InsufficientSegments { segments: 1, required: 3 };
        assert_eq!(e.code(), "INSUFFICIENT_SEGMENTS");

        assert_eq!(AnalysisError::InvalidSegmentSize.code(), "INVALID_SEGMENT_SIZE");

        let e = AnalysisError::Internal("boom".to_string());
        assert_eq!(e.code(), "INTERNAL_ERROR");
        assert!(!e.is_validation());
    }
}
