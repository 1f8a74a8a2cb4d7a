use thiserror::Error;

/// Failure kinds shared by every scout component.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// The URL is malformed or not recognized by the platform resolver.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// A caller-supplied argument is out of range or unknown.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Network or platform-side failure (removed, geo-blocked, login-walled,
    /// blocked scrape, timeout, missing external tool).
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    /// Output could not be written (permissions, free space).
    #[error("disk write failed: {0}")]
    DiskWrite(String),
    /// Media file is missing, unreadable or corrupt.
    #[error("decode failed: {0}")]
    Decode(String),
    /// Container or codec cannot be processed.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl ScoutError {
    /// Stable snake_case name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::DiskWrite(_) => "disk_write",
            Self::Decode(_) => "decode",
            Self::UnsupportedFormat(_) => "unsupported_format",
        }
    }

    /// Process exit code for the CLI. Exit 2 stays reserved for usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidUrl(_) => 3,
            Self::InvalidArgument(_) => 4,
            Self::SourceUnavailable(_) => 5,
            Self::DiskWrite(_) => 6,
            Self::Decode(_) => 7,
            Self::UnsupportedFormat(_) => 8,
        }
    }

    pub fn source_unavailable(context: &str, err: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable(format!("{context}: {err}"))
    }

    pub fn disk_write(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::DiskWrite(format!("{}: {err}", path.display()))
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            ScoutError::InvalidUrl(String::new()),
            ScoutError::InvalidArgument(String::new()),
            ScoutError::SourceUnavailable(String::new()),
            ScoutError::DiskWrite(String::new()),
            ScoutError::Decode(String::new()),
            ScoutError::UnsupportedFormat(String::new()),
        ];
        let mut codes: Vec<u8> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
        assert!(!codes.contains(&2));
    }

    #[test]
    fn test_display_is_single_line() {
        let err = ScoutError::source_unavailable("view request", "timed out");
        assert_eq!(err.to_string(), "source unavailable: view request: timed out");
        assert_eq!(err.kind(), "source_unavailable");
    }
}
