use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::llm::provider::{ChatMessage, LlmError};

/// One submission as it travels to the relay. `mode` stays a raw tag so that
/// unknown tags can reach the general-assistant fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(
        rename = "conversationHistory",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub history: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ChatMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ChatMessage>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    InvalidInput(String),
    ConfigurationError(String),
    BackendError { status: u16, body: String },
    EmptyResponse,
    TransportError(String),
}

impl TurnError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::ConfigurationError(_) => "configuration_error",
            Self::BackendError { .. } => "backend_error",
            Self::EmptyResponse => "empty_response",
            Self::TransportError(_) => "transport_error",
        }
    }
}

impl Display for TurnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(msg) | Self::ConfigurationError(msg) => f.write_str(msg),
            Self::BackendError { status, body } => {
                write!(f, "OpenAI API error: {status} - {body}")
            }
            Self::EmptyResponse => write!(f, "No response from AI"),
            Self::TransportError(msg) => write!(f, "relay transport error: {msg}"),
        }
    }
}

impl Error for TurnError {}

impl From<LlmError> for TurnError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => Self::ConfigurationError(err.to_string()),
            LlmError::HttpStatus { status, body } => Self::BackendError { status, body },
            LlmError::Transport(msg) | LlmError::Parse(msg) => Self::TransportError(msg),
            LlmError::EmptyResponse => Self::EmptyResponse,
        }
    }
}

pub type TurnResult = Result<String, TurnError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyBody {
    pub response: String,
}

/// Error payload returned by the relay server. `kind` and `upstreamStatus`
/// let an HTTP client rebuild the exact `TurnError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl From<&TurnError> for FailureBody {
    fn from(err: &TurnError) -> Self {
        let (error, detail, upstream_status) = match err {
            TurnError::InvalidInput(msg) | TurnError::ConfigurationError(msg) => {
                (msg.clone(), None, None)
            }
            TurnError::BackendError { status, body } => (
                format!("OpenAI API error: {status}"),
                Some(body.clone()),
                Some(*status),
            ),
            TurnError::EmptyResponse => (err.to_string(), None, None),
            TurnError::TransportError(msg) => (
                "Failed to reach completion backend".to_string(),
                Some(msg.clone()),
                None,
            ),
        };

        Self {
            error,
            detail,
            kind: Some(err.kind().to_string()),
            upstream_status,
        }
    }
}

impl FailureBody {
    /// Rebuilds the error a relay server reported with HTTP `status`. Bodies
    /// without a known `kind` are treated as backend failures.
    pub fn into_turn_error(self, status: u16) -> TurnError {
        match self.kind.as_deref() {
            Some("invalid_input") => TurnError::InvalidInput(self.error),
            Some("configuration_error") => TurnError::ConfigurationError(self.error),
            Some("backend_error") => TurnError::BackendError {
                status: self.upstream_status.unwrap_or(status),
                body: self.detail.unwrap_or_default(),
            },
            Some("empty_response") => TurnError::EmptyResponse,
            Some("transport_error") => TurnError::TransportError(self.detail.unwrap_or(self.error)),
            _ => TurnError::BackendError {
                status,
                body: match self.detail {
                    Some(detail) => format!("{}: {detail}", self.error),
                    None => self.error,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FailureBody, TurnError, TurnRequest};
    use crate::llm::provider::{ChatMessage, LlmError};
    use serde_json::json;

    #[test]
    fn request_uses_conversation_history_wire_name() {
        let request = TurnRequest {
            message: "hi".to_string(),
            model: None,
            history: vec![ChatMessage::user("a"), ChatMessage::assistant("b")],
            mode: Some("business".to_string()),
        };

        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({
                "message": "hi",
                "conversationHistory": [
                    {"role": "user", "content": "a"},
                    {"role": "assistant", "content": "b"}
                ],
                "mode": "business"
            })
        );
    }

    #[test]
    fn request_tolerates_missing_and_null_fields() {
        let request: TurnRequest =
            serde_json::from_str(r#"{"conversationHistory": null}"#).expect("deserialize");
        assert_eq!(request.message, "");
        assert!(request.history.is_empty());
        assert_eq!(request.model, None);
        assert_eq!(request.mode, None);
    }

    #[test]
    fn llm_errors_map_onto_turn_errors() {
        assert_eq!(
            TurnError::from(LlmError::MissingApiKey),
            TurnError::ConfigurationError("OPENAI_API_KEY not configured".to_string())
        );
        assert_eq!(
            TurnError::from(LlmError::HttpStatus {
                status: 503,
                body: "busy".to_string()
            }),
            TurnError::BackendError {
                status: 503,
                body: "busy".to_string()
            }
        );
        assert_eq!(
            TurnError::from(LlmError::Parse("eof".to_string())),
            TurnError::TransportError("eof".to_string())
        );
        assert_eq!(
            TurnError::from(LlmError::EmptyResponse),
            TurnError::EmptyResponse
        );
    }

    #[test]
    fn failure_body_round_trips_every_kind() {
        let errors = [
            TurnError::InvalidInput("No message provided".to_string()),
            TurnError::ConfigurationError("OPENAI_API_KEY not configured".to_string()),
            TurnError::BackendError {
                status: 401,
                body: "bad key".to_string(),
            },
            TurnError::EmptyResponse,
            TurnError::TransportError("connection refused".to_string()),
        ];

        for err in errors {
            let body = FailureBody::from(&err);
            assert_eq!(body.kind.as_deref(), Some(err.kind()));
            assert_eq!(body.into_turn_error(502), err);
        }
    }

    #[test]
    fn foreign_failure_body_becomes_backend_error() {
        let body: FailureBody = serde_json::from_value(json!({
            "error": "OpenAI API error: 500 - boom",
            "detail": "stack"
        }))
        .expect("deserialize");

        assert_eq!(
            body.into_turn_error(500),
            TurnError::BackendError {
                status: 500,
                body: "OpenAI API error: 500 - boom: stack".to_string()
            }
        );
    }
}
