use serde::Serialize;

/// Structured result of one prompt session.
///
/// `items` is the invocation's trailing payload, handed through untouched for
/// the external dispatcher. `response` is present only when a line was
/// actually submitted; cancellation leaves it out entirely.
#[derive(Debug, Serialize)]
pub struct Answer {
    pub items: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}
