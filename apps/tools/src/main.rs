use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, load_settings_from},
    date,
    reactions::{refresh_store, spawn_reactions},
    selectors, ClientSettings, CountyStore, RlaClient, StaticRoute, SubmitOutcome,
    WizardController,
};
use shared::{
    domain::{ContestId, CvrId, FileType},
    protocol::{AcvrSubmission, ContestMarks},
};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rla-tools", about = "Drive a risk-limiting audit server from the command line")]
struct Cli {
    /// Settings file; defaults to ./client.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// Location used to pick the active audit board, e.g. /county/board/0.
    #[arg(long)]
    board_route: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the county dashboard and print the merged client state.
    Refresh {
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    DeleteFile {
        /// `bmi` or `cvr`.
        file_type: FileType,
    },
    StandardizeContests {
        /// Pairs of `contest_id=name`.
        #[arg(required = true, value_parser = parse_contest_name)]
        names: Vec<(ContestId, String)>,
    },
    BallotNotFound {
        cvr_id: i64,
        #[arg(long)]
        reaudit_comment: Option<String>,
    },
    /// Submit the board's interpretation of one ballot card.
    UploadAcvr {
        cvr_id: i64,
        #[arg(long, default_value_t = 0)]
        board_index: usize,
        /// `contest_id=choice`; repeat for several choices or contests.
        #[arg(long = "choice", value_parser = parse_contest_name)]
        choices: Vec<(ContestId, String)>,
        /// Contest ids the board could not agree on.
        #[arg(long = "no-consensus")]
        no_consensus: Vec<i64>,
        #[arg(long)]
        reaudit_comment: Option<String>,
    },
    StartNextRound,
    /// Walk the ballot audit wizard: each step is `advance` or `retreat`.
    Wizard { steps: Vec<String> },
}

fn parse_contest_name(raw: &str) -> Result<(ContestId, String), String> {
    let (id, name) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected contest_id=name, got `{raw}`"))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid contest id `{id}`: {e}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty contest name for contest {id}"));
    }
    Ok((ContestId(id), name.to_string()))
}

fn build_acvr(
    cvr_id: CvrId,
    board_index: usize,
    choices: Vec<(ContestId, String)>,
    no_consensus: &[i64],
    reaudit_comment: Option<String>,
) -> AcvrSubmission {
    let mut audit_cvr: BTreeMap<ContestId, ContestMarks> = BTreeMap::new();
    for (contest, choice) in choices {
        audit_cvr.entry(contest).or_default().choices.push(choice);
    }
    for contest in no_consensus {
        audit_cvr.entry(ContestId(*contest)).or_default().no_consensus = true;
    }
    AcvrSubmission {
        auditor_board_index: board_index,
        cvr_id,
        audit_cvr,
        reaudit: reaudit_comment.is_some(),
        comment: reaudit_comment,
    }
}

fn resolve_settings(cli: &Cli) -> ClientSettings {
    let mut settings = match &cli.config {
        Some(path) => load_settings_from(path),
        None => load_settings(),
    };
    if let Some(url) = &cli.server_url {
        settings.server_url = url.clone();
    }
    if let Some(route) = &cli.board_route {
        settings.board_route = Some(route.clone());
    }
    settings
}

fn report(action: &str, outcome: SubmitOutcome) -> Result<()> {
    if !outcome.accepted {
        let status = outcome.status;
        return match outcome.error() {
            Some(err) => Err(err).context(format!("{action} rejected ({status})")),
            None => bail!("{action} rejected ({status}): {}", outcome.body),
        };
    }
    println!("{}", serde_json::to_string_pretty(&outcome.body)?);
    Ok(())
}

fn run_wizard(steps: &[String]) -> Result<()> {
    let mut wizard = WizardController::new();
    println!("{}", wizard.stage());
    for step in steps {
        let stage = match step.as_str() {
            "advance" => wizard.advance(),
            "retreat" => wizard.retreat()?,
            other => bail!("unknown wizard step `{other}`"),
        };
        println!("{stage}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli);
    info!(server_url = %settings.server_url, "rla-tools: starting");

    let client = RlaClient::new(&settings).context("failed to build audit client")?;

    match cli.command {
        Command::Refresh { times } => {
            let route = settings
                .board_route
                .clone()
                .map(StaticRoute::new)
                .unwrap_or_default();
            let store = Arc::new(Mutex::new(CountyStore::new(route)));
            let reactions = spawn_reactions(client.clone(), store.clone());

            for round in 0..times.max(1) {
                if round > 0 {
                    tokio::time::sleep(settings.refresh_interval()).await;
                }
                refresh_store(client.as_ref(), &store)
                    .await
                    .context("dashboard refresh failed")?;
                let guard = store.lock().await;
                let state = guard.state();
                info!(
                    can_audit = selectors::can_audit(state),
                    audit_started = selectors::audit_started(state),
                    round = selectors::current_round_number(state),
                    election_date = state.election_date.as_ref().map(date::format),
                    "rla-tools: dashboard refreshed"
                );
                println!("{}", serde_json::to_string_pretty(state)?);
            }
            reactions.abort();
        }
        Command::DeleteFile { file_type } => {
            report("delete-file", client.delete_file(file_type).await?)?;
        }
        Command::StandardizeContests { names } => {
            report(
                "standardize-contests",
                client.standardize_contests(names).await?,
            )?;
        }
        Command::BallotNotFound {
            cvr_id,
            reaudit_comment,
        } => {
            report(
                "ballot-not-found",
                client.ballot_not_found(CvrId(cvr_id), reaudit_comment).await?,
            )?;
        }
        Command::UploadAcvr {
            cvr_id,
            board_index,
            choices,
            no_consensus,
            reaudit_comment,
        } => {
            let submission = build_acvr(
                CvrId(cvr_id),
                board_index,
                choices,
                &no_consensus,
                reaudit_comment,
            );
            report("upload-acvr", client.upload_acvr(&submission).await?)?;
        }
        Command::StartNextRound => {
            report("start-next-round", client.start_next_round().await?)?;
        }
        Command::Wizard { steps } => run_wizard(&steps)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use shared::error::ApiError;

    use super::*;

    #[test]
    fn parses_contest_name_pairs() {
        assert_eq!(
            parse_contest_name("12= Governor ").expect("pair"),
            (ContestId(12), "Governor".to_string())
        );
        assert!(parse_contest_name("Governor").is_err());
        assert!(parse_contest_name("x=Governor").is_err());
        assert!(parse_contest_name("3=").is_err());
    }

    #[test]
    fn cli_flags_override_settings() {
        let cli = Cli::parse_from([
            "rla-tools",
            "--config",
            "/nonexistent/client.toml",
            "--server-url",
            "http://audit.local/api",
            "--board-route",
            "/county/board/1",
            "start-next-round",
        ]);
        let settings = resolve_settings(&cli);
        assert_eq!(settings.server_url, "http://audit.local/api");
        assert_eq!(settings.board_route.as_deref(), Some("/county/board/1"));
    }

    #[test]
    fn wizard_rejects_retreat_from_list() {
        assert!(run_wizard(&["advance".to_string(), "retreat".to_string()]).is_ok());
        assert!(run_wizard(&["retreat".to_string()]).is_err());
        assert!(run_wizard(&["jump".to_string()]).is_err());
    }

    #[test]
    fn upload_acvr_groups_choices_by_contest() {
        let cli = Cli::parse_from([
            "rla-tools",
            "upload-acvr",
            "42",
            "--board-index",
            "1",
            "--choice",
            "3=Yes",
            "--choice",
            "5=Smith",
            "--choice",
            "5=Jones",
            "--no-consensus",
            "7",
        ]);
        let Command::UploadAcvr {
            cvr_id,
            board_index,
            choices,
            no_consensus,
            reaudit_comment,
        } = cli.command
        else {
            panic!("expected upload-acvr");
        };

        let submission = build_acvr(
            CvrId(cvr_id),
            board_index,
            choices,
            &no_consensus,
            reaudit_comment,
        );
        assert_eq!(submission.auditor_board_index, 1);
        assert_eq!(submission.cvr_id, CvrId(42));
        assert!(!submission.reaudit);
        assert_eq!(submission.audit_cvr[&ContestId(3)].choices, vec!["Yes"]);
        assert_eq!(
            submission.audit_cvr[&ContestId(5)].choices,
            vec!["Smith", "Jones"]
        );
        assert!(submission.audit_cvr[&ContestId(7)].no_consensus);
        assert!(submission.audit_cvr[&ContestId(7)].choices.is_empty());
    }

    #[test]
    fn rejection_keeps_server_reason_as_source() {
        let outcome = SubmitOutcome {
            accepted: false,
            status: reqwest::StatusCode::CONFLICT,
            body: serde_json::json!({ "result": "round already started" }),
        };
        let err = report("start-next-round", outcome).expect_err("rejected");
        assert_eq!(
            err.to_string(),
            "start-next-round rejected (409 Conflict)"
        );
        let reason = err.downcast_ref::<ApiError>().expect("server reason");
        assert_eq!(reason.message, "round already started");
    }

    #[test]
    fn delete_file_accepts_server_file_type_names() {
        let cli = Cli::parse_from(["rla-tools", "delete-file", "bmi"]);
        assert!(matches!(
            cli.command,
            Command::DeleteFile {
                file_type: FileType::BallotManifest
            }
        ));
    }
}
