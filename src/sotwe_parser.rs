use crate::sotwe_message::{FeedPayload, Payload, RawPost, UserInfo};
use serde_json::Value;
use tracing::warn;

const PRE_OPEN: &str = "<pre>";
const PRE_CLOSE: &str = "</pre>";

/// Pull the JSON document a browser shows inside `<pre>...</pre>` when it
/// renders a raw API response.
///
/// Missing markers or malformed JSON yield an empty object rather than an
/// error; the caller decides whether an empty document is fatal.
pub fn extract_json(html: &str) -> Value {
    let empty = || Value::Object(serde_json::Map::new());

    let Some(start) = html.find(PRE_OPEN) else {
        warn!("no <pre> block in solver response");
        return empty();
    };
    let Some(end) = html.find(PRE_CLOSE) else {
        warn!("no </pre> marker in solver response");
        return empty();
    };

    let body_start = start + PRE_OPEN.len();
    if end < body_start {
        warn!("</pre> precedes <pre> in solver response");
        return empty();
    }

    match serde_json::from_str(&html[body_start..end]) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "JSON parse error in solver response");
            empty()
        }
    }
}

impl Payload {
    /// Project an extracted JSON value onto the typed feed shape.
    ///
    /// `info` and every `data` entry are decoded on their own, so one
    /// malformed post is dropped without losing the rest.
    pub fn from_value(value: Value) -> Self {
        let mut map = match value {
            Value::Object(map) if map.is_empty() => return Payload::Empty,
            Value::Object(map) => map,
            _ => {
                warn!("solver payload is not a JSON object");
                return Payload::Empty;
            }
        };

        let info = match map.remove("info") {
            None | Some(Value::Null) => None,
            Some(raw) => match serde_json::from_value::<UserInfo>(raw) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!(error = %e, "unreadable user info in solver payload");
                    None
                }
            },
        };

        let data = match map.remove("data") {
            None | Some(Value::Null) => None,
            Some(Value::Array(entries)) => Some(
                entries
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, raw)| match serde_json::from_value::<RawPost>(raw) {
                        Ok(post) => Some(post),
                        Err(e) => {
                            warn!(index, error = %e, "skipping unreadable post");
                            None
                        }
                    })
                    .collect(),
            ),
            Some(_) => {
                warn!("`data` in solver payload is not an array");
                None
            }
        };

        Payload::Parsed(FeedPayload { info, data })
    }

    pub fn from_html(html: &str) -> Self {
        Self::from_value(extract_json(html))
    }
}
