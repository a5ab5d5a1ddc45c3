use thiserror::Error;

pub const ERROR_BODY: &str = "You can try again, or you can raise a support ticket.";
pub const METRIC_DATA_TITLE: &str = "We are sorry, but we failed to retrieve your data.";
pub const CONDITION_TITLE: &str = "We are sorry, but we failed to evaluate your alert condition.";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// The text shown to the user as the API message: the response body
    /// verbatim for HTTP failures, the transport error otherwise.
    pub fn api_message(&self) -> &str {
        match self {
            FetchError::Transport { message, .. } => message,
            FetchError::Status { body, .. } => body,
            FetchError::Decode { message, .. } => message,
        }
    }
}

/// Failure of a graph operation, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("metric data fetch failed: {0}")]
    MetricData(#[source] FetchError),

    #[error("condition evaluation failed: {0}")]
    ConditionEvaluation(#[source] FetchError),
}

impl GraphError {
    pub fn dialog(&self) -> ErrorDialog {
        let (title, source) = match self {
            GraphError::MetricData(e) => (METRIC_DATA_TITLE, e),
            GraphError::ConditionEvaluation(e) => (CONDITION_TITLE, e),
        };
        ErrorDialog {
            title: title.to_string(),
            body: ERROR_BODY.to_string(),
            api_message: source.api_message().to_string(),
        }
    }
}

/// What the user sees when an operation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDialog {
    pub title: String,
    pub body: String,
    pub api_message: String,
}
