use serde_json::Value;
use thiserror::Error;

/// Body of a non-success node response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    Json(Value),
    Text(String),
    Empty,
}

impl ErrorPayload {
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    /// The `message` field of a JSON object payload.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Json(Value::Object(map)) => map.get("message").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Json(Value::String(s)) => s.clone(),
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::Empty => "empty response body".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeFailure {
    #[error("node responded with status {status}: {}", .payload.describe())]
    Application { status: u16, payload: ErrorPayload },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl NodeFailure {
    /// The server-provided `message`, when the error body has one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Application { payload, .. } => payload.message(),
            _ => None,
        }
    }

    /// Best human-readable description: server message, then raw error
    /// body, then the failure itself.
    pub fn display_text(&self) -> String {
        if let Some(message) = self.message() {
            return message.to_string();
        }
        match self {
            Self::Application {
                status,
                payload: ErrorPayload::Empty,
            } => format!("node responded with status {status}"),
            Self::Application { payload, .. } => payload.describe(),
            Self::Transport(detail) => detail.clone(),
            Self::Decode(_) => self.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("port {0} is not one of the configured node ports")]
    UnknownPort(u16),
    #[error("unknown transaction field '{0}' (expected sender, recipient or amount)")]
    UnknownField(String),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_error_body_is_kept_verbatim() {
        let failure = NodeFailure::Application {
            status: 400,
            payload: ErrorPayload::from_body("Missing values"),
        };
        assert_eq!(failure.message(), None);
        assert_eq!(failure.display_text(), "Missing values");
    }

    #[test]
    fn json_error_message_wins() {
        let failure = NodeFailure::Application {
            status: 500,
            payload: ErrorPayload::from_body(r#"{"message":"mining halted","code":7}"#),
        };
        assert_eq!(failure.message(), Some("mining halted"));
        assert_eq!(failure.display_text(), "mining halted");
    }

    #[test]
    fn json_error_without_message_is_rendered_as_json() {
        let payload = ErrorPayload::from_body(r#"{"error":"nope"}"#);
        assert_eq!(payload, ErrorPayload::Json(json!({"error": "nope"})));
        assert_eq!(payload.describe(), r#"{"error":"nope"}"#);
    }

    #[test]
    fn empty_error_body_mentions_status() {
        let failure = NodeFailure::Application {
            status: 502,
            payload: ErrorPayload::from_body("  "),
        };
        assert_eq!(failure.display_text(), "node responded with status 502");
    }

    #[test]
    fn transport_failure_text_is_the_detail() {
        let failure = NodeFailure::Transport("connection refused".into());
        assert_eq!(failure.display_text(), "connection refused");
        assert_eq!(failure.to_string(), "transport failure: connection refused");
    }
}
