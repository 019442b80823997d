use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where in the input a malformed fragment was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// 1-based line, with a 1-based column when the decoder reports one.
    Line { line: usize, column: Option<usize> },
    /// 0-based index of a record inside a structured list.
    Record(usize),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Line {
                line,
                column: Some(column),
            } => write!(f, "line {line}, column {column}"),
            Position::Line { line, column: None } => write!(f, "line {line}"),
            Position::Record(index) => write!(f, "record {index}"),
        }
    }
}

/// All errors produced by Fruitpal.
#[derive(Error, Debug)]
pub enum FruitpalError {
    /// The input is not well-formed for its format.
    #[error("Malformed input at {position}: {reason} (near `{fragment}`)")]
    MalformedInput {
        position: Position,
        fragment: String,
        reason: String,
    },

    /// A structured record lacks one of the required fields.
    #[error("Record {index} is missing expected field {field}")]
    MissingField { field: String, index: usize },

    /// A caller-supplied query parameter is out of contract.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An enumeration key outside the supported set.
    #[error("List of the value {key} is not available. Valid options: {}", valid.join(", "))]
    UnknownKey { key: String, valid: Vec<String> },

    /// The query was well-formed but no record matched.
    #[error("Commodity {0} was not found")]
    NotFound(String),

    /// A background refresh could not produce a new snapshot.
    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The filesystem watcher could not be installed.
    #[error("Watch error: {0}")]
    Watch(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse error categories a front end can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    MissingField,
    InvalidArgument,
    NotFound,
    RefreshFailed,
    Io,
    Config,
}

impl ErrorKind {
    /// Stable process exit status for this kind of failure.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidArgument => 2,
            ErrorKind::MalformedInput => 3,
            ErrorKind::MissingField => 4,
            ErrorKind::NotFound => 5,
            ErrorKind::Io => 6,
            ErrorKind::Config => 7,
            ErrorKind::RefreshFailed => 8,
        }
    }
}

impl FruitpalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FruitpalError::MalformedInput { .. } => ErrorKind::MalformedInput,
            FruitpalError::MissingField { .. } => ErrorKind::MissingField,
            FruitpalError::InvalidArgument(_) | FruitpalError::UnknownKey { .. } => {
                ErrorKind::InvalidArgument
            }
            FruitpalError::NotFound(_) => ErrorKind::NotFound,
            FruitpalError::RefreshFailed(_) => ErrorKind::RefreshFailed,
            FruitpalError::FileRead { .. } | FruitpalError::Io(_) | FruitpalError::Watch(_) => {
                ErrorKind::Io
            }
            FruitpalError::Config(_) | FruitpalError::Other(_) => ErrorKind::Config,
        }
    }

    /// Shorthand for [`ErrorKind::exit_code`] on this error's kind.
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}

/// Convenience alias used throughout the fruitpal crates.
pub type Result<T> = std::result::Result<T, FruitpalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = FruitpalError::FileRead {
            path: PathBuf::from("/some/fruit_data.txt"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/fruit_data.txt"));
        assert!(msg.contains("no such file"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_error_display_malformed_line() {
        let err = FruitpalError::MalformedInput {
            position: Position::Line {
                line: 3,
                column: None,
            },
            fragment: "MANGO MEX 31 1.24".to_string(),
            reason: "line does not match".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed input at line 3: line does not match (near `MANGO MEX 31 1.24`)"
        );
    }

    #[test]
    fn test_position_display() {
        let pos = Position::Line {
            line: 2,
            column: Some(7),
        };
        assert_eq!(pos.to_string(), "line 2, column 7");
        assert_eq!(Position::Record(4).to_string(), "record 4");
    }

    #[test]
    fn test_error_display_missing_field() {
        let err = FruitpalError::MissingField {
            field: "FIXED_OVERHEAD".to_string(),
            index: 0,
        };
        assert_eq!(
            err.to_string(),
            "Record 0 is missing expected field FIXED_OVERHEAD"
        );
    }

    #[test]
    fn test_error_display_unknown_key_lists_valid_set() {
        let err = FruitpalError::UnknownKey {
            key: "weight".to_string(),
            valid: vec!["commodity".to_string(), "country".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "List of the value weight is not available. Valid options: commodity, country"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_error_display_not_found() {
        let err = FruitpalError::NotFound("apple".to_string());
        assert_eq!(err.to_string(), "Commodity apple was not found");
    }

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let kinds = [
            ErrorKind::MalformedInput,
            ErrorKind::MissingField,
            ErrorKind::InvalidArgument,
            ErrorKind::NotFound,
            ErrorKind::RefreshFailed,
            ErrorKind::Io,
            ErrorKind::Config,
        ];
        let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: FruitpalError = io_err.into();
        assert!(err.to_string().contains("denied"));
        assert_eq!(err.exit_code(), 6);
    }
}
