use std::path::PathBuf;

use thiserror::Error;

pub const ERR_PARSE: &str = "PARSE_ERROR";
pub const ERR_RESOLUTION: &str = "RESOLUTION_ERROR";
pub const ERR_IO: &str = "IO_ERROR";
pub const ERR_AMBIGUOUS_SPECIFIER: &str = "AMBIGUOUS_SPECIFIER";

/// Every failure the aggregation pipeline can report.
///
/// None of these are recovered inside the crate: a failure anywhere in a scan
/// aborts the whole aggregation.
#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Parse error in '{file}' at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },
    #[error("Cannot resolve '{specifier}' imported by '{importer}' (looked for '{}')", resolved.display())]
    Resolution {
        importer: String,
        specifier: String,
        resolved: PathBuf,
    },
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Specifier '{specifier}' refers to both '{first}' and '{second}'")]
    AmbiguousSpecifier {
        specifier: String,
        first: String,
        second: String,
    },
}

impl AggregateError {
    pub fn parse(file: &str, line: usize, message: impl Into<String>) -> Self {
        AggregateError::Parse {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AggregateError::Parse { .. } => ERR_PARSE,
            AggregateError::Resolution { .. } => ERR_RESOLUTION,
            AggregateError::Io { .. } => ERR_IO,
            AggregateError::AmbiguousSpecifier { .. } => ERR_AMBIGUOUS_SPECIFIER,
        }
    }
}

pub type Result<T, E = AggregateError> = std::result::Result<T, E>;
