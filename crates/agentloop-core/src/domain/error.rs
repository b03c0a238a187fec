//! Error taxonomy for the orchestration loop.

/// Failures while pulling a JSON object out of free-text model output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no valid JSON object found in model response")]
    NoJsonFound,

    #[error("malformed JSON object: {message}")]
    MalformedJson {
        message: String,
        /// The `{...}` span that failed to parse.
        fragment: String,
    },
}

/// Failures raised by a model-invocation collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("http error: {0}")]
    Http(String),

    #[error("model backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode model response: {0}")]
    Decode(String),

    #[error("scripted model has no responses left")]
    Exhausted,

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ModelError::Decode(err.to_string())
        } else {
            ModelError::Http(err.to_string())
        }
    }
}

/// Errors that end a loop run. None of them are recovered inside the loop.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("response parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("model invocation failed: {0}")]
    ModelInvocation(#[from] ModelError),

    #[error("planner proposal has the wrong shape: {0}")]
    InvalidProposal(String),

    #[error("turn limit exceeded: reviewer still reports an issue after {max_turns} turns")]
    TurnLimitExceeded { max_turns: u32 },
}

/// Result type for loop operations.
pub type Result<T> = std::result::Result<T, LoopError>;
