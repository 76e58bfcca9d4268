//! Status command - shows backend reachability and local state.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use lyceum_client::Readiness;

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also show query cache statistics
    #[arg(short, long)]
    pub detailed: bool,
}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput {
    reachable: bool,
    server_url: String,
    readiness: &'static str,
    principal: Option<String>,
    course_count: Option<usize>,
    error: Option<String>,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    let server_url = app
        .client()
        .base_url()
        .map(|u| u.to_string())
        .unwrap_or_default();

    let readiness = app.client().readiness();
    let readiness_label = match &readiness {
        Readiness::Unavailable => "unavailable",
        Readiness::Anonymous => "anonymous",
        Readiness::Authenticated(_) => "authenticated",
    };

    // A catalog read doubles as the health check.
    let catalog = app.queries().courses().await;
    let (reachable, course_count, error) = match &catalog {
        Ok(Some(courses)) => (true, Some(courses.len()), None),
        Ok(None) => (false, None, Some("client not ready".to_string())),
        Err(e) => (false, None, Some(e.to_string())),
    };

    if ctx.json_output {
        let output = StatusOutput {
            reachable,
            server_url,
            readiness: readiness_label,
            principal: readiness.principal().map(|p| p.to_string()),
            course_count,
            error,
        };
        return super::print_json(&output);
    }

    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();

    println!();
    println!("{}", style("Lyceum Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    if reachable {
        println!("  {} {}", dim.apply_to("Backend:"), green.apply_to("● reachable"));
    } else {
        println!("  {} {}", dim.apply_to("Backend:"), red.apply_to("● unreachable"));
    }
    println!("  {} {}", dim.apply_to("Server:"), server_url);
    println!("  {} {}", dim.apply_to("Session:"), readiness_label);
    if let Some(p) = readiness.principal() {
        println!("  {} {}", dim.apply_to("Principal:"), p.short());
    }
    if let Some(n) = course_count {
        println!("  {} {}", dim.apply_to("Courses:"), n);
    }
    if let Some(e) = &error
        && ctx.verbose
    {
        println!();
        println!("  {} {}", dim.apply_to("Error:"), e);
    }

    if args.detailed {
        let stats = app.cache().stats();
        println!();
        println!("{}", dim.apply_to("─".repeat(40)));
        println!();
        println!(
            "  {} {}/{} entries, {} loading",
            dim.apply_to("Cache:"),
            stats.size,
            stats.capacity,
            stats.loading
        );
        println!(
            "  {} {} hits, {} misses",
            dim.apply_to("Reads:"),
            stats.hits,
            stats.misses
        );
        println!(
            "  {} {}",
            dim.apply_to("In flight:"),
            app.client().in_flight()
        );
    }
    println!();

    Ok(())
}
