//! Read-only views over [`CountyDashboardState`] used to gate UI flows.

use shared::domain::{CountyAsmState, CvrId};

use crate::state::{BallotSequenceAssignment, CountyDashboardState, Round, UploadedFile};

pub fn uploaded_both_files(state: &CountyDashboardState) -> bool {
    let has_hash = |file: &Option<UploadedFile>| file.as_ref().is_some_and(|f| f.hash.is_some());
    has_hash(&state.ballot_manifest) && has_hash(&state.cvr_export)
}

pub fn missed_deadline(state: &CountyDashboardState) -> bool {
    state.asm.county == Some(CountyAsmState::DeadlineMissed)
}

/// `None` until both record counts are known.
pub fn file_counts_match(state: &CountyDashboardState) -> Option<bool> {
    Some(state.ballot_manifest_count? == state.cvr_export_count?)
}

pub fn audit_started(state: &CountyDashboardState) -> bool {
    matches!(
        state.asm.county,
        Some(CountyAsmState::CountyAuditUnderway | CountyAsmState::CountyAuditComplete)
    )
}

pub fn audit_complete(state: &CountyDashboardState) -> bool {
    state.asm.county == Some(CountyAsmState::CountyAuditComplete)
}

pub fn all_rounds_complete(state: &CountyDashboardState) -> bool {
    if audit_complete(state) {
        return true;
    }
    let finished = state
        .rounds
        .as_deref()
        .is_some_and(|rounds| !rounds.is_empty() && rounds.iter().all(|r| r.complete));
    finished && state.current_round.is_none()
}

pub fn current_round_number(state: &CountyDashboardState) -> Option<u32> {
    state.current_round.as_ref().map(|round| round.number)
}

/// The round before the current one, or the latest round when the county is
/// between rounds.
pub fn previous_round(state: &CountyDashboardState) -> Option<&Round> {
    let rounds = state.rounds.as_deref()?;
    match current_round_number(state) {
        Some(current) => rounds.iter().find(|r| current.checked_sub(1) == Some(r.number)),
        None => rounds.iter().max_by_key(|r| r.number),
    }
}

/// True while the audit is underway and fewer boards are signed in than the
/// county configured.
pub fn can_sign_in(state: &CountyDashboardState) -> bool {
    let expected = state.audit_board_count.unwrap_or(1) as usize;
    state.asm.county == Some(CountyAsmState::CountyAuditUnderway)
        && state.audit_boards.len() < expected
}

/// True when this session's board is signed in and a round is in progress.
pub fn can_audit(state: &CountyDashboardState) -> bool {
    let board_index = state.audit_board_index.unwrap_or(0);
    let signed_in = state.audit_boards.iter().any(|b| b.index == board_index);
    let round_open = state.current_round.as_ref().is_some_and(|r| !r.complete);
    signed_in && round_open
}

fn board_segment(state: &CountyDashboardState) -> Option<BallotSequenceAssignment> {
    let assignment = state.ballot_sequence_assignment.as_deref()?;
    assignment
        .get(state.audit_board_index.unwrap_or(0))
        .copied()
}

pub fn total_ballots_for_board(state: &CountyDashboardState) -> Option<usize> {
    board_segment(state).map(|segment| segment.count)
}

fn board_ballots(state: &CountyDashboardState) -> Option<&[CvrId]> {
    let segment = board_segment(state)?;
    let cvrs = state.cvrs_to_audit.as_deref()?;
    let end = segment.index.checked_add(segment.count)?.min(cvrs.len());
    cvrs.get(segment.index..end)
}

/// One-based position of the current ballot within this board's share.
pub fn current_ballot_number(state: &CountyDashboardState) -> Option<usize> {
    let current = state.current_ballot.as_ref()?;
    board_ballots(state)?
        .iter()
        .position(|id| *id == current.id)
        .map(|pos| pos + 1)
}

pub fn is_re_auditing(state: &CountyDashboardState) -> bool {
    state
        .final_review
        .comment
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty())
}

#[cfg(test)]
#[path = "tests/selectors_tests.rs"]
mod tests;
