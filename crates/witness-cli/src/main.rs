//! `witness`: command-line client for the Witness review workflow.
//!
//! # Usage
//!
//! ```text
//! witness --url http://localhost:8080 --user operator --password secret queue
//! witness --config ~/.config/witness/config.toml review 12 --reviewer 3 --all-checked
//! witness submit capture.jsonl --acknowledge
//! ```

mod capture;
mod client;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, ReviewOutcome, SubmitOutcome};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use witness_core::{
  duplicate::{Confirmations, DuplicateQuery, GateDecision, check_duplicates},
  incident::VerificationStatus,
  legal,
  review::ReviewChecklist,
  scrolly::{Record, Scene, resolve_scene},
  tags::ViolationKind,
};

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "witness", about = "Command-line client for the Witness platform")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the Witness server (default: http://localhost:8080).
  #[arg(long, env = "WITNESS_URL")]
  url: Option<String>,

  /// Operator username.
  #[arg(long, env = "WITNESS_USER")]
  user: Option<String>,

  /// Operator password (plaintext).
  #[arg(long, env = "WITNESS_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List incidents awaiting review.
  Queue {
    #[arg(long, value_parser = parse_status)]
    status: Option<VerificationStatus>,
  },
  /// Show an incident's dossier and outstanding validation issues.
  Show { id: i64 },
  /// Submit a review for an incident.
  Review {
    id:          i64,
    /// Reviewer id.
    #[arg(long)]
    reviewer:    i64,
    /// Tick every checklist box for the incident's current evidence.
    #[arg(long)]
    all_checked: bool,
  },
  /// Reject an incident.
  Reject {
    id:       i64,
    #[arg(long)]
    reviewer: i64,
    #[arg(long)]
    reason:   String,
  },
  /// Look for existing records of a person before reporting.
  CheckDuplicates {
    #[arg(long)]
    name:     Option<String>,
    #[arg(long)]
    date:     Option<NaiveDate>,
    #[arg(long)]
    facility: Option<String>,
    /// Source URL (repeatable).
    #[arg(long = "source")]
    urls:     Vec<String>,
  },
  /// Submit a browser-extension capture as a guest report.
  Submit {
    /// Saved session (`.json`) or action log (`.jsonl`).
    file:               PathBuf,
    /// Confirm this is not the verified incident that matched.
    #[arg(long)]
    different_incident: bool,
    /// Acknowledge that similar reports are awaiting review.
    #[arg(long)]
    acknowledge:        bool,
  },
  /// Resolve a scrollytelling scene and print the result as JSON.
  Resolve {
    /// Scene definition (JSON).
    scene:   PathBuf,
    /// Records to resolve against (JSON array); defaults to the server's
    /// published incidents.
    #[arg(long)]
    records: Option<PathBuf>,
  },
  /// Print the legal reference for a violation type.
  Legal {
    #[arg(value_parser = parse_violation)]
    violation: ViolationKind,
  },
}

fn parse_status(s: &str) -> Result<VerificationStatus, String> {
  s.parse().map_err(|_| format!("unknown status {s:?}"))
}

fn parse_violation(s: &str) -> Result<ViolationKind, String> {
  s.parse().map_err(|_| format!("unknown violation type {s:?}"))
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags and env override the config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Queue { status } => {
      let status = status.or(Some(VerificationStatus::Pending));
      let incidents = client.list_incidents(status).await?;
      if incidents.is_empty() {
        println!("queue is empty");
      }
      for incident in &incidents {
        println!("{}", render::queue_line(incident));
      }
    }

    Command::Show { id } => {
      let view = client.verify_view(id).await?;
      print!("{}", render::dossier(&view));
    }

    Command::Review { id, reviewer, all_checked } => {
      let checklist = if all_checked {
        let view = client.verify_view(id).await?;
        ReviewChecklist::all_checked(&view.dossier)
      } else {
        ReviewChecklist::default()
      };
      match client.review(id, reviewer, &checklist).await? {
        ReviewOutcome::Accepted(accepted) => {
          println!("{} ({})", accepted.message, accepted.incident.verification_status);
        }
        ReviewOutcome::Blocked { status, error, issues } => {
          eprint!("{}", render::issues(&issues));
          bail!("review refused ({status}): {error}");
        }
      }
    }

    Command::Reject { id, reviewer, reason } => {
      let incident = client.reject(id, reviewer, &reason).await?;
      println!("incident {} rejected", incident.id);
    }

    Command::CheckDuplicates { name, date, facility, urls } => {
      let query = DuplicateQuery { victim_name: name, date_of_death: date, facility, source_urls: urls };
      let report = check_duplicates(client, &query).await;
      print!("{}", render::duplicate_report(&report));
    }

    Command::Submit { file, different_incident, acknowledge } => {
      let session = capture::load(&file)?;
      if session.is_empty() {
        bail!("{} holds no captured data", file.display());
      }
      let report = session.into_guest_report();

      let duplicates = check_duplicates(client, &report.duplicate_query()).await;
      let confirmations =
        Confirmations { different_incident, acknowledged_unverified: acknowledge };
      let decision = duplicates.decide(confirmations);
      if decision != GateDecision::Proceed {
        print!("{}", render::duplicate_report(&duplicates));
        bail!("{}", render::decision(&decision));
      }

      match client.submit_report(&report).await? {
        SubmitOutcome::Created(submission) => {
          println!("report {} received; thank you", submission.id);
        }
        SubmitOutcome::Refused(reason) => bail!("submission refused: {reason}"),
      }
    }

    Command::Resolve { scene, records } => {
      let raw = std::fs::read_to_string(&scene)
        .with_context(|| format!("reading scene {}", scene.display()))?;
      let scene: Scene = serde_json::from_str(&raw).context("parsing scene")?;

      let resolved = match records {
        Some(path) => {
          let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading records {}", path.display()))?;
          let records: Vec<Record> = serde_json::from_str(&raw).context("parsing records")?;
          serde_json::to_value(resolve_scene(&scene, &records))?
        }
        None => serde_json::Value::Object(client.resolve_scene(&scene).await?),
      };
      println!("{}", serde_json::to_string_pretty(&resolved)?);
    }

    Command::Legal { violation } => print!("{}", render::legal(legal::reference(violation))),
  }
  Ok(())
}
