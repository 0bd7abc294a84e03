use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("BAM input must be accompanied by PacBio index (.pbi): {0} not found")]
    MissingIndex(PathBuf),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("invalid PacBio index: {0}")]
    InvalidIndex(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("byte range table error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Stable name of the error kind, suitable for machine-readable reports.
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::MissingIndex(_) => "MissingIndexError",
            Error::Configuration(_) => "ConfigurationError",
            Error::InvalidIndex(_) => "InvalidIndex",
            Error::InvalidInput(_) => "InvalidInput",
            Error::Io(_) | Error::Csv(_) | Error::Json(_) => "IOFailure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_names() {
        assert_eq!(
            Error::MissingIndex(PathBuf::from("x.bam.pbi")).error_type(),
            "MissingIndexError"
        );
        assert_eq!(
            Error::Configuration("nchunks".to_string()).error_type(),
            "ConfigurationError"
        );
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        assert_eq!(Error::from(io).error_type(), "IOFailure");
    }

    #[test]
    fn test_missing_index_message_names_path() {
        let err = Error::MissingIndex(PathBuf::from("movie.subreads.bam.pbi"));
        assert!(err.to_string().contains("movie.subreads.bam.pbi"));
    }
}
