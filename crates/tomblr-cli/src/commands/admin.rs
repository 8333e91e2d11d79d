//! Admin account commands.

use clap::{Args, Subcommand};

use tomblr_core::error::AppError;

use super::{Toolkit, input_error};
use crate::output;

/// Arguments for admin commands
#[derive(Debug, Args)]
pub struct AdminArgs {
    /// Admin subcommand
    #[command(subcommand)]
    pub command: AdminCommand,
}

/// Admin subcommands
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Create an admin account, or promote an existing one
    Create {
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
        /// Login email
        #[arg(short, long)]
        email: Option<String>,
        /// Six-digit PIN (will prompt if not provided)
        #[arg(short, long)]
        pin: Option<String>,
    },
}

/// Execute admin commands
pub async fn execute(args: &AdminArgs, kit: &Toolkit) -> Result<(), AppError> {
    match &args.command {
        AdminCommand::Create { name, email, pin } => {
            let name = match name {
                Some(n) => n.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Admin name")
                    .default("Admin".to_string())
                    .interact_text()
                    .map_err(input_error)?,
            };

            let email = match email {
                Some(e) => e.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Admin email")
                    .interact_text()
                    .map_err(input_error)?,
            };

            let pin = match pin {
                Some(p) => p.clone(),
                None => dialoguer::Password::new()
                    .with_prompt("Admin PIN (6 digits)")
                    .with_confirmation("Confirm PIN", "PINs do not match")
                    .interact()
                    .map_err(input_error)?,
            };

            let user = kit.accounts.create_admin(&name, &email, &pin).await?;

            output::print_success(&format!("Admin '{}' ready (id: {})", user.email, user.id));
            output::print_kv("Name", &user.name);
            output::print_kv("Role", &user.role.to_string());
        }
    }

    Ok(())
}
