//! Client-side county dashboard state and its deep-merge rules.

use std::collections::{btree_map::Entry, BTreeMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{AuditBoardAsmState, ContestId, CountyAsmState, CountyId, CvrId, Elector, FileId},
    protocol::ContestMarks,
};

/// Field-wise "incoming wins" merge. Records recurse field by field, keyed
/// maps recurse key by key, vectors and scalars are replaced, and a `None`
/// incoming value leaves the existing slot untouched.
pub trait DeepMerge {
    fn deep_merge(&mut self, incoming: Self);
}

macro_rules! replace_on_merge {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DeepMerge for $ty {
                fn deep_merge(&mut self, incoming: Self) {
                    *self = incoming;
                }
            }
        )*
    };
}

macro_rules! merge_fields {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl DeepMerge for $ty {
            fn deep_merge(&mut self, incoming: Self) {
                $( self.$field.deep_merge(incoming.$field); )*
            }
        }
    };
}

replace_on_merge!(
    bool,
    u32,
    u64,
    usize,
    String,
    DateTime<Utc>,
    CountyId,
    CvrId,
    FileId,
    CountyAsmState,
    AuditBoardAsmState,
);

impl<T> DeepMerge for Vec<T> {
    fn deep_merge(&mut self, incoming: Self) {
        *self = incoming;
    }
}

impl<T: DeepMerge> DeepMerge for Option<T> {
    fn deep_merge(&mut self, incoming: Self) {
        let Some(incoming) = incoming else {
            return;
        };
        match self {
            Some(current) => current.deep_merge(incoming),
            None => *self = Some(incoming),
        }
    }
}

impl<K: Ord, V: DeepMerge> DeepMerge for BTreeMap<K, V> {
    fn deep_merge(&mut self, incoming: Self) {
        for (key, value) in incoming {
            match self.entry(key) {
                Entry::Occupied(mut slot) => slot.get_mut().deep_merge(value),
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }
    }
}

impl DeepMerge for ContestMarks {
    fn deep_merge(&mut self, incoming: Self) {
        self.choices.deep_merge(incoming.choices);
        self.comments.deep_merge(incoming.comments);
        self.no_consensus.deep_merge(incoming.no_consensus);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsmStates {
    pub county: Option<CountyAsmState>,
    pub audit_board: Option<AuditBoardAsmState>,
}

merge_fields!(AsmStates { county, audit_board });

/// A signed-in pair of board members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditBoard {
    pub index: usize,
    pub members: Vec<Elector>,
    pub sign_in_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub expected_count: u64,
    pub actual_count: u64,
    pub complete: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

merge_fields!(Round {
    number,
    expected_count,
    actual_count,
    complete,
    start_time,
    end_time,
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_id: FileId,
    pub file_name: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub hash: Option<String>,
    pub error_message: Option<String>,
    pub approximate_record_count: Option<u64>,
}

merge_fields!(UploadedFile {
    file_id,
    file_name,
    status,
    timestamp,
    hash,
    error_message,
    approximate_record_count,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSequenceAssignment {
    pub index: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentBallot {
    pub id: CvrId,
    pub imprinted_id: Option<String>,
}

merge_fields!(CurrentBallot { id, imprinted_id });

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReview {
    pub comment: Option<String>,
}

merge_fields!(FinalReview { comment });

/// Marks entered by the board for one ballot card, keyed by contest.
pub type AcvrForm = BTreeMap<ContestId, ContestMarks>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyDashboardState {
    pub id: Option<CountyId>,
    pub asm: AsmStates,
    pub audit_boards: Vec<AuditBoard>,
    pub audit_board_count: Option<u32>,
    /// Which board this browser session acts for. Never sent by the server.
    pub audit_board_index: Option<usize>,
    pub ballot_manifest: Option<UploadedFile>,
    pub cvr_export: Option<UploadedFile>,
    pub ballot_manifest_count: Option<u64>,
    pub cvr_export_count: Option<u64>,
    pub current_round: Option<Round>,
    pub rounds: Option<Vec<Round>>,
    pub ballot_sequence_assignment: Option<Vec<BallotSequenceAssignment>>,
    pub cvrs_to_audit: Option<Vec<CvrId>>,
    pub ballots_remaining_in_round: Option<u64>,
    pub audited_ballot_count: Option<u64>,
    pub estimated_ballots_to_audit: Option<u64>,
    pub disagreement_count: Option<u64>,
    pub discrepancy_count: BTreeMap<ContestId, u64>,
    pub election_date: Option<DateTime<Utc>>,
    pub general_information: Option<String>,
    pub current_ballot: Option<CurrentBallot>,
    pub acvrs: BTreeMap<CvrId, AcvrForm>,
    pub final_review: FinalReview,
}

merge_fields!(CountyDashboardState {
    id,
    asm,
    audit_boards,
    audit_board_count,
    audit_board_index,
    ballot_manifest,
    cvr_export,
    ballot_manifest_count,
    cvr_export_count,
    current_round,
    rounds,
    ballot_sequence_assignment,
    cvrs_to_audit,
    ballots_remaining_in_round,
    audited_ballot_count,
    estimated_ballots_to_audit,
    disagreement_count,
    discrepancy_count,
    election_date,
    general_information,
    current_ballot,
    acvrs,
    final_review,
});

/// Sparse view of [`CountyDashboardState`] produced by the refresh adapter.
/// Client-local fields (`acvrs`, `final_review`, `audit_board_index`) are
/// left at their defaults by the adapter.
pub type ServerRefreshPayload = CountyDashboardState;

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
