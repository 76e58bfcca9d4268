//! Payment command - checkout returns and status.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};

use lyceum_domain::{ConfirmOutcome, ReturnKind, classify_return};
use lyceum_types::StripeSessionStatus;

use super::{Context, print_header, print_json};

/// Arguments for the payment command.
#[derive(Args, Debug)]
pub struct PaymentArgs {
    #[command(subcommand)]
    pub command: PaymentCommand,
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommand {
    /// Handle the URL the payment page sent you back to
    Return {
        /// Full return URL, including its query string
        url: String,

        /// Do not show your courses after confirming
        #[arg(long)]
        no_dashboard: bool,
    },

    /// Show the provider's status for a checkout session
    Status {
        /// Checkout session ID
        session_id: String,
    },
}

/// Run the payment command.
pub async fn run(args: PaymentArgs, ctx: &Context) -> Result<()> {
    match args.command {
        PaymentCommand::Return { url, no_dashboard } => cmd_return(&url, no_dashboard, ctx).await,
        PaymentCommand::Status { session_id } => cmd_status(&session_id, ctx).await,
    }
}

async fn cmd_return(url: &str, no_dashboard: bool, ctx: &Context) -> Result<()> {
    let dim = Style::new().dim();

    let ret = match classify_return(url) {
        ReturnKind::Success(ret) => ret,
        ReturnKind::Cancelled => {
            if ctx.json_output {
                return print_json(&serde_json::json!({ "status": "cancelled" }));
            }
            println!("Payment cancelled. You have not been charged.");
            return Ok(());
        }
        // Nothing to confirm, which is not an error.
        ReturnKind::Unrecognized => {
            if ctx.json_output {
                return print_json(&serde_json::json!({ "status": "ignored" }));
            }
            println!(
                "{}",
                dim.apply_to("Not a payment return (no courseId/sessionId); nothing to confirm.")
            );
            return Ok(());
        }
    };

    let app = ctx.connect().await?;

    let spinner = if ctx.json_output {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        pb.set_message("Processing your payment...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    let outcome = app.payments().confirm(ret.clone()).await;
    spinner.finish_and_clear();

    let outcome = outcome?;
    if ctx.json_output {
        let status = match outcome {
            ConfirmOutcome::Enrolled { .. } => "enrolled",
            ConfirmOutcome::AlreadyInProgress => "in-progress",
            ConfirmOutcome::AlreadyCompleted => "completed",
        };
        return print_json(&serde_json::json!({
            "courseId": ret.course_id,
            "sessionId": ret.session_id,
            "status": status,
        }));
    }

    match outcome {
        ConfirmOutcome::Enrolled { redirect_after } => {
            println!();
            println!("{}", style("Payment successful!").green().bold());
            println!(
                "You are now enrolled in {}.",
                style(&ret.course_id).cyan()
            );
            if no_dashboard {
                return Ok(());
            }
            println!(
                "{}",
                dim.apply_to(format!(
                    "Opening your courses in {}s...",
                    redirect_after.as_secs()
                ))
            );
            tokio::time::sleep(redirect_after).await;
            println!();
            print_header("My Courses");
            for course in app.queries().my_enrolled_courses().await?.unwrap_or_default() {
                println!("  {} {}", dim.apply_to(format!("[{}]", course.id)), course.title);
            }
        }
        ConfirmOutcome::AlreadyInProgress => {
            println!("{}", dim.apply_to("This payment is already being confirmed"));
        }
        ConfirmOutcome::AlreadyCompleted => {
            println!("{}", dim.apply_to("This payment was already confirmed"));
        }
    }

    Ok(())
}

async fn cmd_status(session_id: &str, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    let status = app.payments().checkout_status(session_id).await?;

    if ctx.json_output {
        return print_json(&status);
    }

    let dim = Style::new().dim();
    print_header("Checkout Session");
    println!("  {} {}", dim.apply_to("Session:"), session_id);
    match status {
        StripeSessionStatus::Completed {
            response,
            user_principal,
        } => {
            println!(
                "  {} {}",
                dim.apply_to("Status:"),
                Style::new().green().apply_to("● completed")
            );
            if let Some(principal) = user_principal {
                println!("  {} {}", dim.apply_to("Paid by:"), principal);
            }
            if ctx.verbose {
                println!("  {} {}", dim.apply_to("Response:"), response);
            }
        }
        StripeSessionStatus::Failed { error } => {
            println!(
                "  {} {}",
                dim.apply_to("Status:"),
                Style::new().red().apply_to("● failed")
            );
            println!("  {} {}", dim.apply_to("Error:"), error);
        }
    }
    Ok(())
}
