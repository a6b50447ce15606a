use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid label schema: {0}")]
    InvalidSchema(String),

    #[error("Line {line}: unrecognized partition tag {tag:?}")]
    InvalidPartitionTag { line: u64, tag: String },

    #[error("Line {line}: expected {expected} fields, found {found}")]
    RowLengthMismatch {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid vote count {value:?} in column {column:?}")]
    VoteParseError {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Line {line}: every vote count is an outlier, nothing left to distill")]
    DegenerateVoteRow { line: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
