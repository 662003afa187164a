mod local;
pub mod mode;
pub mod prompts;
mod remote;
pub mod turn;

pub use local::{MAX_OUTPUT_TOKENS, PromptRelay, assemble_messages};
pub use mode::Mode;
pub use remote::HttpRelay;
pub use turn::{TurnError, TurnRequest, TurnResult};

/// Turns one request into exactly one reply or error. Implementations hold
/// no per-call state.
pub trait Relay {
    fn relay(
        &self,
        request: &TurnRequest,
    ) -> impl std::future::Future<Output = TurnResult> + Send;
}
