use thiserror::Error;

use crate::wizard::WizardStage;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("no wizard transition out of stage `{from}`")]
    NoTransition { from: WizardStage },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint `{endpoint}`: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("{action} request failed to reach the server: {source}")]
    Network {
        action: &'static str,
        source: reqwest::Error,
    },
    #[error("{action} response did not match the expected schema: {source}")]
    Decode {
        action: &'static str,
        source: serde_json::Error,
    },
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// True for failures that were dispatched as `*_NETWORK_FAIL`.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}
