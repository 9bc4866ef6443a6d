use serde::de::DeserializeOwned;

use crate::error::PipelineError;

/// Pull a tag-delimited JSON payload out of free-form model output.
///
/// Model replies routinely wrap the payload in explanatory prose, so the
/// prompt contract is a named tag pair (`<brief_json>...</brief_json>`) and
/// extraction is strict about it: first locate the delimited region, then
/// parse it. No heuristic brace scanning, which would happily pick up
/// JSON-looking text in the surrounding prose.
pub fn extract_tagged<T: DeserializeOwned>(raw: &str, tag: &str) -> Result<T, PipelineError> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = raw
        .find(&open)
        .ok_or_else(|| PipelineError::Extraction(format!("no <{}> tag found in response", tag)))?;
    let after_open = start + open.len();

    let end = raw[after_open..].find(&close).ok_or_else(|| {
        PipelineError::Extraction(format!("<{}> tag is never closed in response", tag))
    })?;

    let payload = raw[after_open..after_open + end].trim();

    serde_json::from_str(payload)
        .map_err(|e| PipelineError::Extraction(format!("invalid JSON inside <{}>: {}", tag, e)))
}
