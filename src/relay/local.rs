use tracing::debug;

use super::Relay;
use super::prompts::resolve_system_prompt;
use super::turn::{TurnError, TurnRequest, TurnResult};
use crate::llm::provider::{ChatMessage, CompletionBackend, CompletionInput};

pub const MAX_OUTPUT_TOKENS: u32 = 2000;

/// In-process relay: resolves the mode prompt and makes one backend call.
/// `backend` is `None` when no credential was configured.
#[derive(Debug, Clone)]
pub struct PromptRelay<B> {
    backend: Option<B>,
    default_model: String,
}

impl<B: CompletionBackend> PromptRelay<B> {
    pub fn new(backend: Option<B>, default_model: impl Into<String>) -> Self {
        Self {
            backend,
            default_model: default_model.into(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn select_model<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|model| !model.is_empty())
            .unwrap_or(&self.default_model)
    }
}

/// `[system(prompt), ...history, user(message)]`, in that order.
pub fn assemble_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(message));
    messages
}

impl<B: CompletionBackend + Sync> Relay for PromptRelay<B> {
    async fn relay(&self, request: &TurnRequest) -> TurnResult {
        if request.message.trim().is_empty() {
            return Err(TurnError::InvalidInput("No message provided".to_string()));
        }

        let Some(backend) = &self.backend else {
            return Err(TurnError::ConfigurationError(
                "OPENAI_API_KEY not configured".to_string(),
            ));
        };

        let model = self.select_model(request.model.as_deref()).to_string();
        let messages = assemble_messages(
            resolve_system_prompt(request.mode.as_deref()),
            &request.history,
            &request.message,
        );
        debug!(
            model = %model,
            mode = request.mode.as_deref().unwrap_or("<none>"),
            message_count = messages.len(),
            "calling completion backend"
        );

        let output = backend
            .complete(CompletionInput {
                model,
                messages,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            })
            .await?;
        Ok(output.text)
    }
}
