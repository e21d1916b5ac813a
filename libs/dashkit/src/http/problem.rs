use serde::Deserialize;
use serde_json::Value;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// RFC 9457 Problem Details as returned by the dashboard API on errors.
/// Every member is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: Option<u16>,
    pub detail: String,
    pub instance: String,
    pub code: String,
    pub request_id: Option<String>,
    pub errors: Option<Vec<ValidationError>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationError {
    pub detail: String,
    /// JSON Pointer to the invalid location (e.g., "/user/email").
    pub pointer: String,
}

impl Problem {
    /// `detail`, falling back to `title`, plus any field-level errors.
    pub fn summary(&self) -> Option<String> {
        let head = [&self.detail, &self.title]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())?
            .to_string();

        match self.errors.as_deref() {
            Some(errs) if !errs.is_empty() => {
                let fields = errs
                    .iter()
                    .map(|e| format!("{}: {}", e.pointer.trim_start_matches('/'), e.detail))
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(format!("{head} ({fields})"))
            }
            _ => Some(head),
        }
    }

    pub fn code(&self) -> Option<&str> {
        let c = self.code.trim();
        (!c.is_empty()).then_some(c)
    }
}

/// Extract a readable message (and machine code, if any) from an error body.
/// Tries problem details, then `{"message": ..}` / `{"error": ..}`, then a
/// short plain-text body, then the status line.
pub fn error_message(status: u16, body: &[u8]) -> (String, Option<String>) {
    if let Ok(problem) = serde_json::from_slice::<Problem>(body) {
        if let Some(summary) = problem.summary() {
            return (summary, problem.code().map(str::to_string));
        }
    }

    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(s)) = map.get(key) {
                if !s.trim().is_empty() {
                    return (s.trim().to_string(), None);
                }
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() && text.len() <= 200 && !text.starts_with('{') {
        return (text.to_string(), None);
    }

    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("request failed");
    (format!("{reason} ({status})"), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_detail_preferred_over_title() {
        let body = br#"{"type":"about:blank","title":"Not Found","status":404,"detail":"Child 7 not found","code":"CHILD_NOT_FOUND"}"#;
        let (msg, code) = error_message(404, body);
        assert_eq!(msg, "Child 7 not found");
        assert_eq!(code.as_deref(), Some("CHILD_NOT_FOUND"));
    }

    #[test]
    fn problem_validation_errors_are_listed() {
        let body = br#"{"title":"Validation Failed","status":422,"detail":"Input validation errors","errors":[{"detail":"Email is required","pointer":"/email"}]}"#;
        let (msg, _) = error_message(422, body);
        assert_eq!(msg, "Input validation errors (email: Email is required)");
    }

    #[test]
    fn plain_message_body() {
        let (msg, code) = error_message(400, br#"{"message":"Quantity must be positive"}"#);
        assert_eq!(msg, "Quantity must be positive");
        assert!(code.is_none());

        let (msg, _) = error_message(500, br#"{"error":"boom"}"#);
        assert_eq!(msg, "boom");
    }

    #[test]
    fn text_and_empty_bodies() {
        let (msg, _) = error_message(502, b"upstream unavailable");
        assert_eq!(msg, "upstream unavailable");

        let (msg, _) = error_message(503, b"");
        assert_eq!(msg, "Service Unavailable (503)");
    }
}
