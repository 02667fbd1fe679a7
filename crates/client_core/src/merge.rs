//! Reconciliation of a dashboard refresh payload into the current state.

use tracing::trace;

use crate::{
    route::BoardRouteLocator,
    state::{CountyDashboardState, DeepMerge, ServerRefreshPayload},
};

/// Produces the next state from `prev` and a refresh payload without
/// touching `prev`.
///
/// `audit_board_count` is dropped before merging so that a payload without it
/// leaves no value. `audit_boards` and `current_round` are taken from the
/// payload as-is: an empty board list means the board signed out, and a
/// missing round means the county is between rounds.
pub fn merge(prev: &CountyDashboardState, payload: ServerRefreshPayload) -> CountyDashboardState {
    let mut next = prev.clone();
    next.audit_board_count = None;

    let mut payload = payload;
    let audit_boards = std::mem::take(&mut payload.audit_boards);
    let current_round = payload.current_round.take();

    next.deep_merge(payload);

    next.audit_boards = audit_boards;
    next.current_round = current_round;
    next
}

/// [`merge`] followed by the audit board route overlay.
pub struct DashboardStateMerger<R: BoardRouteLocator> {
    route: R,
}

impl<R: BoardRouteLocator> DashboardStateMerger<R> {
    pub fn new(route: R) -> Self {
        Self { route }
    }

    pub fn route(&self) -> &R {
        &self.route
    }

    pub fn route_mut(&mut self) -> &mut R {
        &mut self.route
    }

    pub fn merge(
        &self,
        prev: &CountyDashboardState,
        payload: ServerRefreshPayload,
    ) -> CountyDashboardState {
        let mut next = merge(prev, payload);
        if let Some(index) = self.route.audit_board_index() {
            trace!(audit_board_index = index, "merge: overlaying board index from route");
            next.audit_board_index = Some(index);
        }
        next
    }
}

#[cfg(test)]
#[path = "tests/merge_tests.rs"]
mod tests;
