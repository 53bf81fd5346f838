use strum_macros::Display;

/// Coarse classification of an [`Error`], handy for matching without fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    InvalidArgument,
    FetchFailed,
    ParseFailed,
    NotFound,
    Config,
}

/// Errors surfaced by [`crate::TasbihKit`].
///
/// `Clone` because every caller coalesced onto one load receives the same failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Rejected before any I/O happened.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The category file could not be retrieved.
    #[error("failed to fetch category '{category}': {reason}")]
    FetchFailed {
        category: String,
        status: Option<u16>,
        reason: String,
    },

    /// The category file was retrieved but is not a JSON array of items.
    #[error("failed to parse category '{category}': {reason}")]
    ParseFailed { category: String, reason: String },

    #[error("tasbih with ID '{id}' not found in category '{category}'")]
    NotFound { category: String, id: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl Error {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn fetch_failed(
        category: impl ToString,
        status: Option<u16>,
        reason: impl Into<String>,
    ) -> Self {
        Self::FetchFailed {
            category: category.to_string(),
            status,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::FetchFailed { .. } => ErrorKind::FetchFailed,
            Self::ParseFailed { .. } => ErrorKind::ParseFailed,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// HTTP status of the failed fetch, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::FetchFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the failure evicted the cache entry, so a retry fetches again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::ParseFailed { .. })
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
