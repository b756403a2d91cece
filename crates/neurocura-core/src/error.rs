use neurocura_llm::LlmError;
use neurocura_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("A request is already in flight for session {session_id}")]
    RequestInFlight { session_id: String },
}

impl CoreError {
    pub fn is_busy(&self) -> bool {
        matches!(self, CoreError::RequestInFlight { .. })
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
