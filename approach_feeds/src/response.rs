use serde_json::{Map, Value};

use crate::error::{FeedError, FeedResult};

/// Both the advisory and the weather source answer with an array holding a
/// single object. Returns the text stored under `field` in the first entry.
pub fn first_text_field(body: &str, field: &'static str) -> FeedResult<String> {
    let entries: Vec<Map<String, Value>> = serde_json::from_str(body)?;
    let first = entries.into_iter().next().ok_or(FeedError::EmptyResponse)?;
    first
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(FeedError::MissingField(field))
}
