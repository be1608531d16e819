use std::fmt;

/// Errors surfaced by the query/report path (§7 of the design doc).
///
/// `IngestDrop` and `StreamReset` are deliberately not variants here: per
/// the error-handling design, those are contained inside a worker and never
/// propagate past it. They show up as log events instead.
#[derive(Debug, PartialEq, Eq)]
pub enum ExplorerError {
    /// A prefix or ASN failed to parse.
    BadInput(String),
    /// No IRR or BGP entry covers the query; a report cannot be produced.
    NoPrefix(String),
    /// A query arrived before every worker signalled ready.
    WorkerUnready,
    /// Uncaught downstream failure.
    Internal(String),
}

impl std::error::Error for ExplorerError {}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorerError::BadInput(msg) => write!(f, "{msg}"),
            ExplorerError::NoPrefix(msg) => write!(f, "{msg}"),
            ExplorerError::WorkerUnready => {
                write!(f, "a worker has not signalled ready yet")
            }
            ExplorerError::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

pub type ExplorerResult<T> = Result<T, ExplorerError>;
