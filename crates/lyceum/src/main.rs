//! Lyceum - course marketplace client
//!
//! Main entry point for the Lyceum CLI.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{
    ConsoleNotifier, admin, auth, config, courses, enroll, instructors, live_classes, payment,
    profile, review, status,
};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Lyceum - browse courses, enroll and manage the marketplace
#[derive(Parser)]
#[command(name = "lyceum")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend URL, overriding the current context
    #[arg(long, global = true, env = "LYCEUM_SERVER_URL")]
    pub server: Option<String>,

    /// Named context from the client config
    #[arg(long, global = true, env = "LYCEUM_CONTEXT")]
    pub context: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, log out and show the current identity
    Auth(auth::AuthArgs),

    /// Browse the course catalog
    Courses(courses::CoursesArgs),

    /// Enroll in a course (free courses directly, paid ones via checkout)
    Enroll(enroll::EnrollArgs),

    /// Review a course you are enrolled in
    Review(review::ReviewArgs),

    /// Complete or inspect a checkout
    Payment(payment::PaymentArgs),

    /// Show or update your profile
    Profile(profile::ProfileArgs),

    /// List upcoming live classes
    LiveClasses(live_classes::LiveClassesArgs),

    /// Browse instructors
    Instructors(instructors::InstructorsArgs),

    /// Admin console: key management and catalog writes
    Admin(admin::AdminArgs),

    /// Manage client configuration and contexts
    Config(config::ConfigArgs),

    /// Show backend, session and cache status
    Status(status::StatusArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "lyceum=debug,lyceum_domain=debug,lyceum_cache=debug,lyceum_session=debug,lyceum_client=debug,lyceum_config=debug,info"
    } else {
        "lyceum=warn,lyceum_domain=warn,lyceum_session=warn,warn"
    };

    let log_dir = lyceum_config::log_dir().unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "lyceum.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "lyceum=trace,lyceum_domain=trace,lyceum_cache=trace,lyceum_session=trace,lyceum_client=trace,lyceum_config=trace,info",
                )),
        )
        .init();

    let notifier = Arc::new(ConsoleNotifier::new(cli.json));
    let ctx = commands::Context {
        server_override: cli.server,
        context_name: cli.context,
        json_output: cli.json,
        verbose: cli.verbose,
        notifier: notifier.clone(),
    };

    let result = match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Courses(args) => courses::run(args, &ctx).await,
        Commands::Enroll(args) => enroll::run(args, &ctx).await,
        Commands::Review(args) => review::run(args, &ctx).await,
        Commands::Payment(args) => payment::run(args, &ctx).await,
        Commands::Profile(args) => profile::run(args, &ctx).await,
        Commands::LiveClasses(args) => live_classes::run(args, &ctx).await,
        Commands::Instructors(args) => instructors::run(args, &ctx).await,
        Commands::Admin(args) => admin::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // The user has already seen this one as a notification.
        Err(e) if notifier.reported_error() => {
            tracing::debug!(error = %e, "command failed");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    }
}
