use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AuditBoardAsmState, ContestId, CountyAsmState, CountyId, CvrId, Elector, FileId, FileType,
};

/// Body of `GET county-dashboard`. Every field is optional because the server
/// omits whatever does not apply to the county's current state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountyDashboardResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CountyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asm_state: Option<CountyAsmState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_board_asm_state: Option<AuditBoardAsmState>,
    /// Keyed by the board's index rendered as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_boards: Option<BTreeMap<String, AuditBoardWire>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_board_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_manifest_file: Option<UploadedFileWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvr_export_file: Option<UploadedFileWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_manifest_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvr_export_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_round: Option<RoundWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<Vec<RoundWire>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_sequence_assignment: Option<Vec<BallotSequenceAssignmentWire>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballots_remaining_in_round: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audited_ballot_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_ballots_to_audit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disagreement_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancy_count: Option<BTreeMap<String, u64>>,
    /// Either a bare `YYYY-MM-DD` date or a full timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub election_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvrs_to_audit: Option<Vec<CvrId>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditBoardWire {
    pub members: Vec<Elector>,
    pub sign_in_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFileWire {
    pub file_id: FileId,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county_id: Option<CountyId>,
    pub file_name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_record_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundWire {
    pub number: u32,
    pub expected_count: u64,
    #[serde(default)]
    pub actual_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotSequenceAssignmentWire {
    pub index: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFileRequest {
    #[serde(rename = "fileType")]
    pub file_type: FileType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardizeContest {
    pub contest: ContestId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedBallotNotFound {
    pub id: CvrId,
    #[serde(default)]
    pub reaudit: bool,
    #[serde(default)]
    pub comment: String,
}

/// One contest's interpretation on an audited ballot card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestMarks {
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default)]
    pub no_consensus: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcvrSubmission {
    pub auditor_board_index: usize,
    pub cvr_id: CvrId,
    pub audit_cvr: BTreeMap<ContestId, ContestMarks>,
    #[serde(default)]
    pub reaudit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
