//! Invitation code commands.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use tomblr_core::error::AppError;
use tomblr_entity::access_code::{AccessCode, CreateAccessCode};
use tomblr_service::RequestContext;

use super::Toolkit;
use crate::output::{self, OutputFormat};

/// Codes inserted by `codes seed`, with optional expiry dates.
const SEED_CODES: &[(&str, Option<(i32, u32, u32)>)] = &[
    ("TOMBLR-2026-EARLY", Some((2026, 12, 31))),
    ("ACCESS-NG-PRIV", Some((2026, 6, 1))),
    ("DATA-STORAGE-ONE", Some((2026, 3, 1))),
    ("ADMN-BETA-01", None),
    ("ADMN-BETA-02", None),
    ("ADMN-BETA-03", None),
];

/// Arguments for code commands
#[derive(Debug, Args)]
pub struct CodesArgs {
    /// Codes subcommand
    #[command(subcommand)]
    pub command: CodesCommand,
}

/// Code subcommands
#[derive(Debug, Subcommand)]
pub enum CodesCommand {
    /// Generate fresh random codes
    Generate {
        /// How many codes (1-100)
        #[arg(short, long, default_value = "5")]
        count: u32,
    },
    /// List the most recent codes
    List,
    /// Insert the fixed launch codes, skipping existing ones
    Seed,
}

/// Code display row
#[derive(Debug, Serialize, Tabled)]
struct CodeRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Used")]
    used: bool,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<AccessCode> for CodeRow {
    fn from(c: AccessCode) -> Self {
        Self {
            code: c.code,
            used: c.is_used,
            expires: c
                .expires_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "never".to_string()),
            created: c.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute code commands
pub async fn execute(
    args: &CodesArgs,
    kit: &Toolkit,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = RequestContext::system();

    match &args.command {
        CodesCommand::Generate { count } => {
            let codes = kit.access.generate(&ctx, Some(*count)).await?;
            output::print_success(&format!("Generated {} access code(s)", codes.len()));
            print_codes(codes, format);
        }
        CodesCommand::List => {
            let codes = kit.access.list_recent(&ctx).await?;
            print_codes(codes, format);
        }
        CodesCommand::Seed => {
            let codes = seed_codes()?;
            let inserted = kit.access.seed(&codes).await?;
            output::print_success(&format!(
                "Seeded {} of {} code(s); the rest already existed",
                inserted.len(),
                codes.len()
            ));
            print_codes(inserted, format);
        }
    }

    Ok(())
}

fn print_codes(codes: Vec<AccessCode>, format: OutputFormat) {
    let rows: Vec<CodeRow> = codes.into_iter().map(CodeRow::from).collect();
    output::print_list(&rows, format);
}

fn seed_codes() -> Result<Vec<CreateAccessCode>, AppError> {
    SEED_CODES
        .iter()
        .map(|(code, expiry)| {
            let expires_at = (*expiry).map(end_of_day).transpose()?;
            Ok(CreateAccessCode {
                code: (*code).to_string(),
                expires_at,
            })
        })
        .collect()
}

fn end_of_day((y, m, d): (i32, u32, u32)) -> Result<DateTime<Utc>, AppError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::internal(format!("Invalid seed date {y}-{m}-{d}")))
}
