#[derive(Debug, thiserror::Error)]
pub enum TcError {
    #[error("pricing data: {0}")]
    Format(#[from] FormatError),

    #[cfg(feature = "network")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "network")]
    #[error("pricing download failed (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("bad calculator config: {0}")]
    Config(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Reasons a pricing table is rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("dataset looks empty, it needs a header row and at least one data row")]
    TooShort,

    #[error("missing required headers: {}", missing.join(", "))]
    MissingHeaders { missing: Vec<String> },

    #[error("no valid rows found, check that Input $/1M and Output $/1M are numeric (like $1.25)")]
    NoValidRows,
}

pub type Result<T> = std::result::Result<T, TcError>;
