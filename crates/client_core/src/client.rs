use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use shared::{
    domain::{ContestId, CvrId, FileType},
    error::ApiError,
    protocol::{AcvrSubmission, CountyDashboardResponse, DeleteFileRequest, SubmittedBallotNotFound},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    action::{Action, ActionName, ActionPhase},
    adapter::{format_standardize_contests, parse_county_dashboard},
    config::ClientSettings,
    error::ClientError,
    state::ServerRefreshPayload,
    ClientEvent,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of a request the server answered.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub accepted: bool,
    pub status: StatusCode,
    /// Parsed response body, `{}` when the body was not JSON.
    pub body: Value,
}

impl SubmitOutcome {
    pub fn error(&self) -> Option<ApiError> {
        if self.accepted {
            return None;
        }
        ApiError::from_body(&self.body)
    }
}

/// Orders refresh responses by the time their request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshResponse {
    pub ticket: RefreshTicket,
    pub payload: ServerRefreshPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Fresh(RefreshResponse),
    Rejected { status: StatusCode, body: Value },
}

#[async_trait]
pub trait DashboardRefresher: Send + Sync {
    async fn county_dashboard_refresh(&self) -> Result<RefreshOutcome, ClientError>;
}

pub struct RlaClient {
    http: Client,
    base_url: Url,
    events: broadcast::Sender<ClientEvent>,
    refresh_seq: AtomicU64,
}

impl RlaClient {
    pub fn new(settings: &ClientSettings) -> Result<Arc<Self>, ClientError> {
        Self::with_timeout(&settings.server_url, settings.request_timeout())
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Arc<Self>, ClientError> {
        // Session cookies ride along on every request.
        let http = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        let base_url = normalize_base_url(server_url)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Arc::new(Self {
            http,
            base_url,
            events,
            refresh_seq: AtomicU64::new(0),
        }))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        info!(notice = %message, "client: notice");
        let _ = self.events.send(ClientEvent::Notice(message));
    }

    fn dispatch(&self, action: Action) {
        debug!(event = %action, "client: dispatch");
        let _ = self.events.send(ClientEvent::Action(action));
    }

    fn endpoint(&self, name: ActionName) -> Result<Url, ClientError> {
        self.base_url
            .join(name.endpoint())
            .map_err(|source| ClientError::InvalidEndpoint {
                endpoint: name.endpoint().to_string(),
                source,
            })
    }

    /// Runs one request through the SEND / OK / FAIL / NETWORK_FAIL cycle.
    /// Transport failures are dispatched and then returned to the caller.
    async fn perform(
        &self,
        name: ActionName,
        request: RequestBuilder,
    ) -> Result<SubmitOutcome, ClientError> {
        self.dispatch(Action::new(name, ActionPhase::Send));

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                warn!(action = %name, error = %source, "client: network failure");
                self.dispatch(Action::new(name, ActionPhase::NetworkFail));
                return Err(ClientError::Network {
                    action: name.as_str(),
                    source,
                });
            }
        };

        let status = response.status();
        let body = json_or_empty(response).await;

        if !status.is_success() {
            warn!(action = %name, status = status.as_u16(), "client: request rejected");
            self.dispatch(Action::with_data(name, ActionPhase::Fail, body.clone()));
            return Ok(SubmitOutcome {
                accepted: false,
                status,
                body,
            });
        }

        self.dispatch(Action::with_data(name, ActionPhase::Ok, body.clone()));
        Ok(SubmitOutcome {
            accepted: true,
            status,
            body,
        })
    }

    pub async fn submit<B>(&self, name: ActionName, body: &B) -> Result<SubmitOutcome, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(name)?;
        self.perform(name, self.http.post(url).json(body)).await
    }

    pub async fn delete_file(&self, file_type: FileType) -> Result<SubmitOutcome, ClientError> {
        self.submit(ActionName::DeleteFile, &DeleteFileRequest { file_type })
            .await
    }

    pub async fn standardize_contests<I>(&self, form: I) -> Result<SubmitOutcome, ClientError>
    where
        I: IntoIterator<Item = (ContestId, String)>,
    {
        let body = format_standardize_contests(form);
        self.submit(ActionName::StandardizeContestsForAudit, &body)
            .await
    }

    pub async fn upload_acvr(
        &self,
        submission: &AcvrSubmission,
    ) -> Result<SubmitOutcome, ClientError> {
        self.submit(ActionName::UploadAcvr, submission).await
    }

    /// A re-audit comment marks the submission as a re-audit.
    pub async fn ballot_not_found(
        &self,
        id: CvrId,
        reaudit_comment: Option<String>,
    ) -> Result<SubmitOutcome, ClientError> {
        let body = SubmittedBallotNotFound {
            id,
            reaudit: reaudit_comment.is_some(),
            comment: reaudit_comment.unwrap_or_default(),
        };
        self.submit(ActionName::BallotNotFound, &body).await
    }

    pub async fn start_next_round(&self) -> Result<SubmitOutcome, ClientError> {
        self.submit(ActionName::StartNextRound, &json!({})).await
    }

    pub async fn fetch_county_dashboard(&self) -> Result<RefreshOutcome, ClientError> {
        let name = ActionName::CountyDashboardRefresh;
        let ticket = RefreshTicket(self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1);
        let url = self.endpoint(name)?;

        let outcome = self.perform(name, self.http.get(url)).await?;
        if !outcome.accepted {
            return Ok(RefreshOutcome::Rejected {
                status: outcome.status,
                body: outcome.body,
            });
        }

        let wire: CountyDashboardResponse = serde_json::from_value(outcome.body)
            .map_err(|source| ClientError::Decode {
                action: name.as_str(),
                source,
            })?;

        Ok(RefreshOutcome::Fresh(RefreshResponse {
            ticket,
            payload: parse_county_dashboard(wire),
        }))
    }
}

#[async_trait]
impl DashboardRefresher for RlaClient {
    async fn county_dashboard_refresh(&self) -> Result<RefreshOutcome, ClientError> {
        self.fetch_county_dashboard().await
    }
}

async fn json_or_empty(response: Response) -> Value {
    response.json::<Value>().await.unwrap_or_else(|_| json!({}))
}

/// `Url::join` drops the last path segment unless the base ends in `/`.
fn normalize_base_url(server_url: &str) -> Result<Url, ClientError> {
    let trimmed = server_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|source| ClientError::InvalidEndpoint {
        endpoint: server_url.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
