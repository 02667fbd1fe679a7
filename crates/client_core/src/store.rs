//! Single-owner container for the county dashboard state.

use std::collections::BTreeMap;

use shared::{
    domain::{ContestId, CvrId},
    protocol::ContestMarks,
};
use tracing::{debug, warn};

use crate::{
    client::{RefreshResponse, RefreshTicket},
    merge::DashboardStateMerger,
    route::BoardRouteLocator,
    state::{CountyDashboardState, CurrentBallot, DeepMerge},
};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    DashboardRefreshed(RefreshResponse),
    SelectBallot(CurrentBallot),
    UpdateAcvr {
        cvr_id: CvrId,
        contest_id: ContestId,
        marks: ContestMarks,
    },
    SetReauditComment(Option<String>),
    Logout,
}

/// Pure transition function. Ticket ordering is enforced by [`CountyStore`],
/// not here.
pub fn reduce<R: BoardRouteLocator>(
    state: &CountyDashboardState,
    event: StoreEvent,
    merger: &DashboardStateMerger<R>,
) -> CountyDashboardState {
    match event {
        StoreEvent::DashboardRefreshed(response) => merger.merge(state, response.payload),
        StoreEvent::SelectBallot(ballot) => CountyDashboardState {
            current_ballot: Some(ballot),
            ..state.clone()
        },
        StoreEvent::UpdateAcvr {
            cvr_id,
            contest_id,
            marks,
        } => {
            let mut next = state.clone();
            next.acvrs.deep_merge(BTreeMap::from([(
                cvr_id,
                BTreeMap::from([(contest_id, marks)]),
            )]));
            next
        }
        StoreEvent::SetReauditComment(comment) => {
            let mut next = state.clone();
            next.final_review.comment = comment;
            next
        }
        StoreEvent::Logout => CountyDashboardState::default(),
    }
}

pub struct CountyStore<R: BoardRouteLocator> {
    state: CountyDashboardState,
    merger: DashboardStateMerger<R>,
    last_refresh: Option<RefreshTicket>,
}

impl<R: BoardRouteLocator> CountyStore<R> {
    pub fn new(route: R) -> Self {
        Self {
            state: CountyDashboardState::default(),
            merger: DashboardStateMerger::new(route),
            last_refresh: None,
        }
    }

    pub fn state(&self) -> &CountyDashboardState {
        &self.state
    }

    pub fn route_mut(&mut self) -> &mut R {
        self.merger.route_mut()
    }

    pub fn last_refresh(&self) -> Option<RefreshTicket> {
        self.last_refresh
    }

    /// Applies `event` and reports whether the state was replaced. Refresh
    /// responses older than the last applied one are dropped, including
    /// across a logout.
    pub fn dispatch(&mut self, event: StoreEvent) -> bool {
        // Tickets keep increasing across sessions, so `last_refresh` survives
        // logout and still fences responses requested before it.
        if let StoreEvent::DashboardRefreshed(response) = &event {
            if self.last_refresh.is_some_and(|last| response.ticket <= last) {
                warn!(
                    ticket = response.ticket.0,
                    last_applied = self.last_refresh.map(|t| t.0),
                    "store: dropping stale dashboard refresh"
                );
                return false;
            }
            self.last_refresh = Some(response.ticket);
        }

        debug!(event = event_name(&event), "store: reduce");
        self.state = reduce(&self.state, event, &self.merger);
        true
    }
}

fn event_name(event: &StoreEvent) -> &'static str {
    match event {
        StoreEvent::DashboardRefreshed(_) => "dashboard_refreshed",
        StoreEvent::SelectBallot(_) => "select_ballot",
        StoreEvent::UpdateAcvr { .. } => "update_acvr",
        StoreEvent::SetReauditComment(_) => "set_reaudit_comment",
        StoreEvent::Logout => "logout",
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
