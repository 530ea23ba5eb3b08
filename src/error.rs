use thiserror::Error;

use crate::data::blocks::Channel;

/// Conditions that stop the whole computation.
#[derive(Debug, Error)]
pub enum Nem12Error {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed input at row {row}, column {column}: {reason}")]
    MalformedInput {
        row: usize,
        column: usize,
        reason: String,
    },

    #[error("need at least two record 200 headers, found {found}")]
    InsufficientHeaders { found: usize },

    #[error("no header row carries the {channel} tag {tag:?} in column {column}")]
    MissingChannelTag {
        channel: Channel,
        tag: String,
        column: usize,
    },

    #[error("{channel} tag {tag:?} appears on several header rows: {rows:?}")]
    DuplicateChannelTag {
        channel: Channel,
        tag: String,
        rows: Vec<usize>,
    },
}

pub type Result<T> = std::result::Result<T, Nem12Error>;
