use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the diary. Every variant ends only the current operation, the caller is
/// expected to report it and carry on.
#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("Invalid date {0:?}. Please use YYYY-MM-DD.")]
    InvalidDate(String),
    #[error("Invalid time: {0}.")]
    InvalidTime(String),
    #[error("Activity name can't be empty.")]
    EmptyActivity,
    #[error("No activities logged yet. Please log some activities first.")]
    NotFound(PathBuf),
    #[error("No data in the activity file.")]
    EmptyData,
    #[error("Failed to access activity file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write activity file: {0}")]
    Csv(#[from] csv::Error),
}

impl DiaryError {
    /// Informational conditions that aren't failures from the user's point of view.
    pub fn is_benign(&self) -> bool {
        matches!(self, DiaryError::NotFound(_) | DiaryError::EmptyData)
    }
}

pub type DiaryResult<T> = Result<T, DiaryError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::DiaryError;

    #[test]
    fn test_benign_errors() {
        assert!(DiaryError::NotFound(PathBuf::from("time_diary.csv")).is_benign());
        assert!(DiaryError::EmptyData.is_benign());
        assert!(!DiaryError::InvalidDate("2024-13-40".into()).is_benign());
        assert!(!DiaryError::EmptyActivity.is_benign());
    }
}
