//! Follow-up work triggered by completed actions, and periodic dashboard
//! polling.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast::error::RecvError, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{error, info, warn};

use crate::{
    action::{Action, ActionName, ActionPhase},
    client::{DashboardRefresher, RefreshOutcome, RlaClient},
    error::ClientError,
    route::BoardRouteLocator,
    store::{CountyStore, StoreEvent},
    ClientEvent,
};

pub const BALLOT_NOT_FOUND_NOTICE: &str = "Previous ballot recorded as Not Found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUp {
    pub notice: Option<&'static str>,
    pub refresh_dashboard: bool,
}

/// Reaction table, keyed on successful actions only.
pub fn follow_up(action: &Action) -> Option<FollowUp> {
    if action.phase != ActionPhase::Ok {
        return None;
    }
    match action.name {
        ActionName::BallotNotFound => Some(FollowUp {
            notice: Some(BALLOT_NOT_FOUND_NOTICE),
            refresh_dashboard: true,
        }),
        ActionName::UploadAcvr | ActionName::DeleteFile => Some(FollowUp {
            notice: None,
            refresh_dashboard: true,
        }),
        ActionName::StandardizeContestsForAudit
        | ActionName::StartNextRound
        | ActionName::CountyDashboardRefresh => None,
    }
}

/// Fetches the dashboard and hands it to the store. Returns whether the store
/// applied it.
pub async fn refresh_store<R: BoardRouteLocator>(
    source: &dyn DashboardRefresher,
    store: &Mutex<CountyStore<R>>,
) -> Result<bool, ClientError> {
    match source.county_dashboard_refresh().await? {
        RefreshOutcome::Fresh(response) => {
            let mut store = store.lock().await;
            Ok(store.dispatch(StoreEvent::DashboardRefreshed(response)))
        }
        RefreshOutcome::Rejected { status, .. } => {
            warn!(status = status.as_u16(), "reactions: dashboard refresh rejected");
            Ok(false)
        }
    }
}

pub fn spawn_reactions<R>(
    client: Arc<RlaClient>,
    store: Arc<Mutex<CountyStore<R>>>,
) -> JoinHandle<()>
where
    R: BoardRouteLocator + 'static,
{
    let mut events = client.subscribe_events();
    tokio::spawn(async move {
        loop {
            let action = match events.recv().await {
                Ok(ClientEvent::Action(action)) => action,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "reactions: event stream lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let Some(follow) = follow_up(&action) else {
                continue;
            };
            info!(event = %action, "reactions: handling follow-up");

            if let Some(notice) = follow.notice {
                client.notify(notice);
            }
            if follow.refresh_dashboard {
                if let Err(err) = refresh_store(client.as_ref(), &store).await {
                    error!(event = %action, error = %err, "reactions: follow-up refresh failed");
                }
            }
        }
    })
}

pub fn spawn_dashboard_poller<R>(
    source: Arc<dyn DashboardRefresher>,
    store: Arc<Mutex<CountyStore<R>>>,
    period: Duration,
) -> JoinHandle<()>
where
    R: BoardRouteLocator + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = refresh_store(source.as_ref(), &store).await {
                warn!(error = %err, "poller: dashboard refresh failed");
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/reactions_tests.rs"]
mod tests;
