use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

pub mod api;
pub mod config_reader;
pub mod io_json;
pub mod reporting;
pub mod service;
pub mod store;
pub mod tokens;

/// The classes of failures a caller can observe.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorKind {
    /// Malformed ballot or request. Nothing was changed.
    Validation,
    /// Bad or missing credential or voting token. Nothing was changed.
    Auth,
    /// The voting token was already used. Nothing was changed.
    TokenState,
    NotFound,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Auth => "AuthError",
            ErrorKind::TokenState => "TokenStateError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Storage => "StorageError",
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BoxError {
    #[snafu(display("Invalid ballot: {source}"))]
    InvalidBallot { source: seat_tally::InvalidBallot },
    #[snafu(display("Invalid request: {message}"))]
    InvalidRequest { message: String },
    #[snafu(display("Invalid count {count}: must be between 1 and {max}"))]
    InvalidTokenCount { count: i64, max: i64 },
    #[snafu(display("An election already exists in {path}"))]
    ExistingElection { path: String },

    #[snafu(display("Unauthorized"))]
    Unauthorized {},
    #[snafu(display("Invalid token"))]
    UnknownToken {},
    #[snafu(display("Token already used"))]
    TokenConsumed {},

    #[snafu(display("Unknown results view {mode:?}"))]
    UnknownView { mode: String },
    #[snafu(display("No candidate list found at {path}"))]
    MissingCandidates { path: String },

    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing JSON"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("The ballot store is unavailable"))]
    StoreUnavailable {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BoxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoxError::InvalidBallot { .. }
            | BoxError::InvalidRequest { .. }
            | BoxError::InvalidTokenCount { .. }
            | BoxError::ExistingElection { .. } => ErrorKind::Validation,
            BoxError::Unauthorized {} | BoxError::UnknownToken {} => ErrorKind::Auth,
            BoxError::TokenConsumed {} => ErrorKind::TokenState,
            BoxError::UnknownView { .. } | BoxError::MissingCandidates { .. } => {
                ErrorKind::NotFound
            }
            BoxError::OpeningJson { .. }
            | BoxError::ParsingJson { .. }
            | BoxError::WritingJson { .. }
            | BoxError::SerializingJson { .. }
            | BoxError::StoreUnavailable {}
            | BoxError::Whatever { .. } => ErrorKind::Storage,
        }
    }

    /// The equivalent HTTP status.
    pub fn status(&self) -> u16 {
        match self {
            BoxError::Unauthorized {} => 401,
            BoxError::UnknownToken {} | BoxError::TokenConsumed {} => 403,
            _ => match self.kind() {
                ErrorKind::Validation => 400,
                ErrorKind::Auth | ErrorKind::TokenState => 403,
                ErrorKind::NotFound => 404,
                ErrorKind::Storage => 500,
            },
        }
    }

    /// The ballot failure tag, for refused ballots.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            BoxError::InvalidBallot { source } => Some(source.reason()),
            _ => None,
        }
    }
}

pub type BoxResult<T> = Result<T, BoxError>;

/// Logs a failed request with a level that matches how surprising it is.
pub(crate) fn log_failure(operation: &str, e: &BoxError) {
    match e.kind() {
        ErrorKind::Storage => warn!("{}: {}", operation, e),
        ErrorKind::Auth => info!("{}: refused: {}", operation, e),
        _ => debug!("{}: refused: {}", operation, e),
    }
}
