//! Auth command - identity session management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;

use lyceum_session::SessionStatus;

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in with this device's identity
    Login,

    /// Log out and forget the stored session
    Logout,

    /// Show the current identity
    Status,
}

#[derive(Debug, Serialize)]
struct AuthStatusOutput {
    authenticated: bool,
    principal: Option<String>,
    provider: String,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    let green = Style::new().green();
    let dim = Style::new().dim();

    match args.command {
        AuthCommand::Login => {
            if let Some(principal) = app.session().principal() {
                if ctx.json_output {
                    return super::print_json(&AuthStatusOutput {
                        authenticated: true,
                        principal: Some(principal.to_string()),
                        provider: app.session().provider_name().to_string(),
                    });
                }
                println!(
                    "Already logged in as {}",
                    style(principal.short()).cyan()
                );
                return Ok(());
            }

            let principal = app.login().await?;
            if ctx.json_output {
                super::print_json(&AuthStatusOutput {
                    authenticated: true,
                    principal: Some(principal.to_string()),
                    provider: app.session().provider_name().to_string(),
                })?;
            } else {
                println!(
                    "{} Logged in as {}",
                    green.apply_to("✓"),
                    style(principal.short()).cyan()
                );
                if ctx.verbose {
                    println!("{}", dim.apply_to(format!("Principal: {}", principal)));
                }
            }
        }
        AuthCommand::Logout => {
            let was = app.session().principal();
            app.logout().await?;
            if ctx.json_output {
                super::print_json(&serde_json::json!({ "loggedOut": was.is_some() }))?;
            } else if was.is_some() {
                println!("{} Logged out", green.apply_to("✓"));
            } else {
                println!("{}", dim.apply_to("Not logged in"));
            }
        }
        AuthCommand::Status => {
            let status = app.session().status();
            let provider = app.session().provider_name().to_string();
            if ctx.json_output {
                return super::print_json(&AuthStatusOutput {
                    authenticated: status.principal().is_some(),
                    principal: status.principal().map(|p| p.to_string()),
                    provider,
                });
            }

            super::print_header("Session");
            match status {
                SessionStatus::Authenticated(principal) => {
                    println!(
                        "  {} {}",
                        dim.apply_to("Status:"),
                        green.apply_to("● logged in")
                    );
                    println!("  {} {}", dim.apply_to("Principal:"), principal);
                }
                _ => {
                    println!("  {} {}", dim.apply_to("Status:"), "○ anonymous");
                    println!(
                        "  {}",
                        dim.apply_to("Log in with: lyceum auth login")
                    );
                }
            }
            println!("  {} {}", dim.apply_to("Provider:"), provider);
        }
    }

    Ok(())
}
