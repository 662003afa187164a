use serde::{Deserialize, Serialize};

use super::provider::{
    ChatMessage, CompletionBackend, CompletionInput, CompletionOutput, LlmError, LlmResult,
};
use crate::http::client::HttpClient;

#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(http: HttpClient, api_key: Option<String>, base_url: String) -> LlmResult<Self> {
        let api_key = api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn extract_text(resp: ChatCompletionResponse) -> LlmResult<String> {
        resp.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, input: CompletionInput) -> LlmResult<CompletionOutput> {
        let payload = ChatCompletionRequest {
            model: &input.model,
            messages: &input.messages,
            max_completion_tokens: input.max_output_tokens,
        };
        let resp = self
            .http
            .post_json(&self.endpoint(), Some(&self.api_key), &payload)
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !(200..300).contains(&resp.status) {
            return Err(LlmError::HttpStatus {
                status: resp.status,
                body: resp.body,
            });
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&resp.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        let text = Self::extract_text(parsed)?;
        Ok(CompletionOutput { text })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}
