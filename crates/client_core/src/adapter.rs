//! Conversion between server wire schemas and client state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use shared::{
    domain::ContestId,
    protocol::{
        AuditBoardWire, BallotSequenceAssignmentWire, CountyDashboardResponse, RoundWire,
        StandardizeContest, UploadedFileWire,
    },
};
use tracing::warn;

use crate::{
    date,
    state::{
        AsmStates, AuditBoard, BallotSequenceAssignment, Round, ServerRefreshPayload, UploadedFile,
    },
};

pub fn parse_county_dashboard(wire: CountyDashboardResponse) -> ServerRefreshPayload {
    ServerRefreshPayload {
        id: wire.id,
        asm: AsmStates {
            county: wire.asm_state,
            audit_board: wire.audit_board_asm_state,
        },
        audit_boards: wire.audit_boards.map(parse_audit_boards).unwrap_or_default(),
        audit_board_count: wire.audit_board_count,
        ballot_manifest: wire.ballot_manifest_file.map(parse_uploaded_file),
        cvr_export: wire.cvr_export_file.map(parse_uploaded_file),
        ballot_manifest_count: wire.ballot_manifest_count,
        cvr_export_count: wire.cvr_export_count,
        current_round: wire.current_round.map(parse_round),
        rounds: wire
            .rounds
            .map(|rounds| rounds.into_iter().map(parse_round).collect()),
        ballot_sequence_assignment: wire
            .ballot_sequence_assignment
            .map(|segments| segments.into_iter().map(parse_segment).collect()),
        cvrs_to_audit: wire.cvrs_to_audit,
        ballots_remaining_in_round: wire.ballots_remaining_in_round,
        audited_ballot_count: wire.audited_ballot_count,
        estimated_ballots_to_audit: wire.estimated_ballots_to_audit,
        disagreement_count: wire.disagreement_count,
        discrepancy_count: wire
            .discrepancy_count
            .map(parse_discrepancies)
            .unwrap_or_default(),
        election_date: wire.election_date.as_deref().and_then(parse_election_date),
        general_information: wire.general_information,
        ..ServerRefreshPayload::default()
    }
}

/// The server keys boards by stringified index; the client wants them in
/// index order.
fn parse_audit_boards(boards: BTreeMap<String, AuditBoardWire>) -> Vec<AuditBoard> {
    let mut parsed: Vec<AuditBoard> = boards
        .into_iter()
        .filter_map(|(key, board)| match key.parse::<usize>() {
            Ok(index) => Some(AuditBoard {
                index,
                members: board.members,
                sign_in_time: board.sign_in_time,
            }),
            Err(_) => {
                warn!(key = %key, "adapter: skipping audit board with non-numeric index");
                None
            }
        })
        .collect();
    parsed.sort_by_key(|board| board.index);
    parsed
}

fn parse_round(round: RoundWire) -> Round {
    Round {
        number: round.number,
        expected_count: round.expected_count,
        actual_count: round.actual_count,
        complete: round.end_time.is_some(),
        start_time: round.start_time,
        end_time: round.end_time,
    }
}

fn parse_segment(segment: BallotSequenceAssignmentWire) -> BallotSequenceAssignment {
    BallotSequenceAssignment {
        index: segment.index,
        count: segment.count,
    }
}

fn parse_uploaded_file(file: UploadedFileWire) -> UploadedFile {
    UploadedFile {
        file_id: file.file_id,
        file_name: file.file_name,
        status: file.status,
        timestamp: file.timestamp,
        hash: file.hash,
        error_message: file.error_message,
        approximate_record_count: file.approximate_record_count,
    }
}

fn parse_election_date(raw: &str) -> Option<DateTime<Utc>> {
    match date::parse(raw) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(error = %err, "adapter: ignoring election date");
            None
        }
    }
}

fn parse_discrepancies(counts: BTreeMap<String, u64>) -> BTreeMap<ContestId, u64> {
    counts
        .into_iter()
        .filter_map(|(key, count)| match key.parse::<i64>() {
            Ok(id) => Some((ContestId(id), count)),
            Err(_) => {
                warn!(key = %key, "adapter: skipping discrepancy count with non-numeric contest id");
                None
            }
        })
        .collect()
}

/// Flattens the contest-name form into the `set-contest-names` body.
pub fn format_standardize_contests<I>(form: I) -> Vec<StandardizeContest>
where
    I: IntoIterator<Item = (ContestId, String)>,
{
    form.into_iter()
        .map(|(contest, name)| StandardizeContest { contest, name })
        .collect()
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
