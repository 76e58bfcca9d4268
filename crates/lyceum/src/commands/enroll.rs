//! Enroll command.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use lyceum_domain::EnrollOutcome;

use super::Context;

/// Arguments for the enroll command.
#[derive(Args, Debug)]
pub struct EnrollArgs {
    /// Course ID
    pub course_id: String,
}

/// Run the enroll command.
pub async fn run(args: EnrollArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;

    match app.enroll(&args.course_id).await? {
        EnrollOutcome::Enrolled => {
            if ctx.json_output {
                super::print_json(&serde_json::json!({
                    "courseId": args.course_id,
                    "enrolled": true,
                }))?;
            }
        }
        EnrollOutcome::Checkout(redirect) => {
            if ctx.json_output {
                return super::print_json(&serde_json::json!({
                    "courseId": redirect.intent.course_id,
                    "enrolled": false,
                    "sessionId": redirect.intent.external_session_id,
                    "checkoutUrl": redirect.url,
                }));
            }
            let dim = Style::new().dim();
            println!();
            println!("Complete payment at:");
            println!("  {}", style(&redirect.url).cyan().underlined());
            println!();
            println!(
                "{}",
                dim.apply_to("Then pass the page you return to: lyceum payment return <url>")
            );
        }
    }

    Ok(())
}
