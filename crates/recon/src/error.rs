use std::fmt;

#[derive(Debug)]
pub enum LedgerError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty group list, threshold out of range, etc.).
    ConfigValidation(String),
    /// A configured regular expression failed to compile.
    InvalidPattern { field: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidPattern { field, message } => {
                write!(f, "invalid pattern in '{field}': {message}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Why a whole snapshot document was left out of a run.
///
/// These never abort the run: the ledger stays as of the previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The extraction collaborator could not produce a table grid.
    Extraction(String),
    /// The document carried no tables after page one.
    NoTables,
    /// Rows were present but none reconstructed into a task record.
    NoRecords,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction(msg) => write!(f, "table extraction failed: {msg}"),
            Self::NoTables => write!(f, "no task tables found after page one"),
            Self::NoRecords => write!(f, "no task records reconstructed"),
        }
    }
}

impl std::error::Error for SnapshotError {}
