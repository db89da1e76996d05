use thiserror::Error;

use crate::flight::MIN_RECORD_FIELDS;

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Response did not have the expected JSON shape: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Response contained no entries")]
    EmptyResponse,
    #[error("Response entry has no text field `{0}`")]
    MissingField(&'static str),
    #[error("Flight record has {len} fields, expected at least {}", MIN_RECORD_FIELDS)]
    RecordTooShort { len: usize },
    #[error("Flight record field {index} is not a number")]
    NotANumber { index: usize },
}
