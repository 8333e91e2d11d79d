//! User management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use tomblr_core::error::AppError;
use tomblr_database::UserStore;
use tomblr_entity::user::{SubscriptionTier, UserRole, UserSummary};
use tomblr_service::RequestContext;

use super::Toolkit;
use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UsersArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UsersCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List all users with usage
    List,
    /// Change a user's subscription tier
    SetTier {
        /// Login email
        #[arg(short, long)]
        email: String,
        /// FREE, PRO or BUSINESS
        #[arg(short, long)]
        tier: String,
    },
    /// Change a user's role
    SetRole {
        /// Login email
        #[arg(short, long)]
        email: String,
        /// USER or ADMIN
        #[arg(short, long)]
        role: String,
    },
}

/// User display row
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Used")]
    storage_used: String,
    #[tabled(rename = "Files")]
    file_count: i64,
}

impl From<UserSummary> for UserRow {
    fn from(u: UserSummary) -> Self {
        Self {
            id: u.id.to_string(),
            email: u.email,
            name: u.name,
            role: u.role.to_string(),
            tier: u.tier.to_string(),
            storage_used: human_bytes(u.storage_used),
            file_count: u.file_count,
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UsersArgs,
    kit: &Toolkit,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = RequestContext::system();

    match &args.command {
        UsersCommand::List => {
            let users = kit.admin.list_users(&ctx).await?;
            let rows: Vec<UserRow> = users.into_iter().map(UserRow::from).collect();
            output::print_list(&rows, format);
        }
        UsersCommand::SetTier { email, tier } => {
            let tier: SubscriptionTier = tier.parse()?;
            let user = find_user(kit, email).await?;
            kit.admin.update_user_tier(&ctx, user.id, tier).await?;
            output::print_success(&format!("{} is now on the {tier} tier", user.email));
            output::print_kv("Storage limit", &human_bytes(tier.storage_limit_bytes()));
        }
        UsersCommand::SetRole { email, role } => {
            let role: UserRole = role.parse()?;
            let user = find_user(kit, email).await?;
            kit.admin.update_user_role(&ctx, user.id, role).await?;
            output::print_success(&format!("{} now has role {role}", user.email));
        }
    }

    Ok(())
}

async fn find_user(
    kit: &Toolkit,
    email: &str,
) -> Result<tomblr_entity::user::User, AppError> {
    kit.users
        .find_by_email(&email.trim().to_lowercase())
        .await?
        .ok_or_else(|| AppError::not_found(format!("User '{email}' not found")))
}

fn human_bytes(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(5_368_709_120), "5.0 GB");
    }
}
