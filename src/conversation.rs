use crate::llm::provider::ChatMessage;
use crate::relay::{Mode, Relay, TurnError, TurnRequest, TurnResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    /// A relay call is outstanding for `pending`.
    Sending { pending: String },
    /// The last turn failed. `unsent` is kept for an explicit retry.
    Failed { error: TurnError, unsent: String },
}

/// Client-side state for one conversation: the transcript plus the turn
/// state machine. Rendering is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    mode: Mode,
    model: String,
    transcript: Vec<ChatMessage>,
    input: String,
    state: TurnState,
}

impl Conversation {
    pub fn new(mode: Mode, model: impl Into<String>) -> Self {
        Self {
            mode,
            model: model.into(),
            transcript: Vec::new(),
            input: String::new(),
            state: TurnState::Idle,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, TurnState::Sending { .. })
    }

    pub fn last_error(&self) -> Option<&TurnError> {
        match &self.state {
            TurnState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Applies to the next submission; an in-flight request keeps its own copy.
    pub fn change_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn change_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Starts a turn and returns the request to relay, or `None` when the
    /// text is blank or another turn is still outstanding.
    pub fn begin_turn(&mut self, text: &str) -> Option<TurnRequest> {
        let message = text.trim();
        if message.is_empty() || self.is_sending() {
            return None;
        }

        let message = message.to_string();
        self.input.clear();
        self.state = TurnState::Sending {
            pending: message.clone(),
        };

        Some(TurnRequest {
            message,
            model: Some(self.model.clone()),
            history: self.transcript.clone(),
            mode: Some(self.mode.tag().to_string()),
        })
    }

    /// Settles the outstanding turn. Without one the result is dropped.
    pub fn finish_turn(&mut self, result: TurnResult) {
        if !self.is_sending() {
            return;
        }
        let TurnState::Sending { pending } = std::mem::replace(&mut self.state, TurnState::Idle)
        else {
            return;
        };

        match result {
            Ok(reply) => {
                self.transcript
                    .extend([ChatMessage::user(pending), ChatMessage::assistant(reply)]);
            }
            Err(error) => {
                self.state = TurnState::Failed {
                    error,
                    unsent: pending,
                };
            }
        }
    }

    /// Runs one full turn. Returns `None` when the submission was ignored.
    pub async fn submit<R: Relay>(&mut self, relay: &R, text: &str) -> Option<TurnResult> {
        let request = self.begin_turn(text)?;
        let result = relay.relay(&request).await;
        self.finish_turn(result.clone());
        Some(result)
    }

    pub async fn submit_input<R: Relay>(&mut self, relay: &R) -> Option<TurnResult> {
        let text = self.input.clone();
        self.submit(relay, &text).await
    }

    /// Clears a failure and hands back the text that was not delivered.
    pub fn dismiss_error(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, TurnState::Idle) {
            TurnState::Failed { unsent, .. } => Some(unsent),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Resubmits the text of the last failed turn with the current mode and model.
    pub async fn retry<R: Relay>(&mut self, relay: &R) -> Option<TurnResult> {
        let unsent = self.dismiss_error()?;
        self.submit(relay, &unsent).await
    }
}
