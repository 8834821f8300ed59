//! Subcommand implementations.

use std::io::BufRead;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{info, warn};

use rulecheck_rules::loader::{LoadResult, LoadStatus};
use rulecheck_rules::{check_references, RuleLoader, ValidateError, ValidationOutcome, Validator};

use crate::payload;
use crate::terminal::Terminal;

/// Overall result of a command, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Valid,
    Rejected,
    Defect,
}

impl Status {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Status::Valid => ExitCode::SUCCESS,
            Status::Rejected => ExitCode::from(1),
            Status::Defect => ExitCode::from(2),
        }
    }
}

// ── check ───────────────────────────────────────────────────────────

pub fn check_reference(loader: &RuleLoader, reference: &str, terminal: &Terminal) -> Result<Status> {
    match check_references(loader, reference) {
        Ok(_) => {
            terminal.print_valid(reference)?;
            Ok(Status::Valid)
        }
        Err(e) => {
            terminal.print_rejected(&format!("{reference}: {e}"))?;
            Ok(Status::Rejected)
        }
    }
}

pub fn check_all(loader: &RuleLoader, terminal: &Terminal) -> Result<Status> {
    let results = loader
        .load_all()
        .with_context(|| format!("failed to scan {}", loader.rules_dir().display()))?;

    let mut status = Status::Valid;
    for LoadResult { path, status: load } in &results {
        match load {
            LoadStatus::Loaded { reference } => match check_references(loader, reference) {
                Ok(_) => terminal.print_valid(reference)?,
                Err(e) => {
                    terminal.print_rejected(&format!("{reference}: {e}"))?;
                    status = status.max(Status::Rejected);
                }
            },
            LoadStatus::Failed { error } => {
                terminal.print_rejected(&format!("{}: {error}", path.display()))?;
                status = status.max(Status::Rejected);
            }
            LoadStatus::Skipped { reason } => {
                terminal.print_info(&format!("skipped {} ({reason})", path.display()))?;
            }
        }
    }
    info!(documents = results.len(), "rules directory checked");
    Ok(status)
}

// ── validate ────────────────────────────────────────────────────────

pub fn validate_one(validator: &Validator, reference: &str, input: &str, terminal: &Terminal) -> Result<Status> {
    let payload = payload::read_payload(input)?;
    report(validator.validate(reference, &payload), terminal)
}

/// Validate newline-delimited JSON payloads; blank lines are ignored.
///
/// The exit status is the worst status seen across all payloads.
pub fn validate_lines(validator: &Validator, reference: &str, input: &str, terminal: &Terminal) -> Result<Status> {
    let reader = payload::open_lines(input)?;
    let mut worst = Status::Valid;

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("failed to read payload line")?;
        if line.trim().is_empty() {
            continue;
        }
        let status = match payload::parse_json(&line) {
            Ok(payload) => report(validator.validate(reference, &payload), terminal)?,
            Err(e) => {
                warn!(line = number + 1, error = %e, "skipping unreadable payload");
                terminal.print_error(&format!("line {}: {e:#}", number + 1))?;
                Status::Defect
            }
        };
        worst = worst.max(status);
    }
    Ok(worst)
}

/// Print the outcome document and map the result to a status.
fn report(result: Result<(), ValidateError>, terminal: &Terminal) -> Result<Status> {
    match result {
        Ok(()) => {
            terminal.print_json(&outcome_json(ValidationOutcome::valid()))?;
            Ok(Status::Valid)
        }
        Err(ValidateError::Rejected { messages }) => {
            terminal.print_json(&outcome_json(ValidationOutcome::invalid(messages)))?;
            Ok(Status::Rejected)
        }
        Err(e) => {
            terminal.print_error(&e.to_string())?;
            Ok(Status::Defect)
        }
    }
}

fn outcome_json(outcome: ValidationOutcome) -> Value {
    serde_json::to_value(&outcome).unwrap_or_else(|e| json!({"error": e.to_string()}))
}
