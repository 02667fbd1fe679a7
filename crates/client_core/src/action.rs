//! Request lifecycle events.
//!
//! Every server action is reported as `{NAME}_SEND` before the request goes
//! out, then exactly one of `{NAME}_OK`, `{NAME}_FAIL` (the server answered
//! with an error status) or `{NAME}_NETWORK_FAIL` (no usable answer).

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    DeleteFile,
    StandardizeContestsForAudit,
    UploadAcvr,
    BallotNotFound,
    StartNextRound,
    CountyDashboardRefresh,
}

impl ActionName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeleteFile => "DELETE_FILE",
            Self::StandardizeContestsForAudit => "STANDARDIZE_CONTESTS_FOR_AUDIT",
            Self::UploadAcvr => "UPLOAD_ACVR",
            Self::BallotNotFound => "BALLOT_NOT_FOUND",
            Self::StartNextRound => "START_NEXT_ROUND",
            Self::CountyDashboardRefresh => "COUNTY_DASHBOARD_REFRESH",
        }
    }

    /// Server endpoint path, relative to the configured base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::DeleteFile => "delete-file",
            Self::StandardizeContestsForAudit => "set-contest-names",
            Self::UploadAcvr => "upload-audit-cvr",
            Self::BallotNotFound => "ballot-not-found",
            Self::StartNextRound => "start-audit-round",
            Self::CountyDashboardRefresh => "county-dashboard",
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionPhase {
    Send,
    Ok,
    Fail,
    NetworkFail,
}

impl ActionPhase {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Send => "SEND",
            Self::Ok => "OK",
            Self::Fail => "FAIL",
            Self::NetworkFail => "NETWORK_FAIL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: ActionName,
    pub phase: ActionPhase,
    /// Parsed response body for `Ok`/`Fail`; `None` otherwise.
    pub data: Option<Value>,
}

impl Action {
    pub fn new(name: ActionName, phase: ActionPhase) -> Self {
        Self {
            name,
            phase,
            data: None,
        }
    }

    pub fn with_data(name: ActionName, phase: ActionPhase, data: Value) -> Self {
        Self {
            name,
            phase,
            data: Some(data),
        }
    }

    pub fn is(&self, name: ActionName, phase: ActionPhase) -> bool {
        self.name == name && self.phase == phase
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name.as_str(), self.phase.suffix())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_wire_event_names() {
        let send = Action::new(ActionName::DeleteFile, ActionPhase::Send);
        assert_eq!(send.to_string(), "DELETE_FILE_SEND");

        let fail = Action::new(
            ActionName::StandardizeContestsForAudit,
            ActionPhase::NetworkFail,
        );
        assert_eq!(
            fail.to_string(),
            "STANDARDIZE_CONTESTS_FOR_AUDIT_NETWORK_FAIL"
        );
    }

    #[test]
    fn carries_response_data() {
        let ok = Action::with_data(
            ActionName::BallotNotFound,
            ActionPhase::Ok,
            json!({ "id": 4 }),
        );
        assert!(ok.is(ActionName::BallotNotFound, ActionPhase::Ok));
        assert!(!ok.is(ActionName::BallotNotFound, ActionPhase::Fail));
        assert_eq!(ok.data, Some(json!({ "id": 4 })));
    }
}
