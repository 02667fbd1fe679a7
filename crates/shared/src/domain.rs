use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(CountyId);
id_newtype!(CvrId);
id_newtype!(ContestId);
id_newtype!(FileId);

/// Uploaded county file kinds, as named by the `delete-file` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "bmi")]
    BallotManifest,
    #[serde(rename = "cvr")]
    CvrExport,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BallotManifest => "bmi",
            Self::CvrExport => "cvr",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bmi" | "manifest" | "ballot-manifest" => Ok(Self::BallotManifest),
            "cvr" | "cvr-export" => Ok(Self::CvrExport),
            other => Err(format!("unrecognized file type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountyAsmState {
    CountyInitialState,
    BallotManifestOk,
    CvrsOk,
    BallotManifestAndCvrsOk,
    CountyAuditUnderway,
    CountyAuditComplete,
    DeadlineMissed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditBoardAsmState {
    AuditInitialState,
    AuditInProgressState,
    SignoffIntermediateAuditReportState,
    SubmitAuditReportState,
    #[serde(other)]
    Unknown,
}

/// One member of an audit board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elector {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub political_party: Option<String>,
}
