//! Admin command - key management and catalog writes.
//!
//! Writes need an admin role and a key verified in this process, so every
//! write subcommand takes `--admin-key` and verifies it first.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::Style;

use lyceum_domain::{AppContext, KeyStatus};
use lyceum_types::{Course, Instructor, LiveClass, StripeConfiguration, Time};

use super::{Context, print_header, print_json};

/// Arguments for the admin command.
#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

/// Key for gated writes.
#[derive(Args, Debug)]
pub struct KeyArg {
    /// Admin key
    #[arg(long, env = "LYCEUM_ADMIN_KEY", hide_env_values = true)]
    pub admin_key: String,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Show admin access and payment setup
    Status,

    /// Check an admin key
    VerifyKey {
        /// Key to check
        key: String,
    },

    /// Set the admin key (first-time setup)
    SetKey {
        /// New key
        key: String,
    },

    /// Add a course to the catalog
    CreateCourse {
        #[command(flatten)]
        key: KeyArg,

        /// Course ID (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        category: String,

        #[arg(long, default_value = "Beginner")]
        difficulty: String,

        /// Instructor ID
        #[arg(long)]
        instructor: String,

        /// Duration in minutes
        #[arg(long, default_value = "0")]
        duration: u64,

        /// Price in cents
        #[arg(long, default_value = "0", conflicts_with = "free")]
        price: u64,

        /// Free course
        #[arg(long)]
        free: bool,

        /// Curriculum entry (repeatable)
        #[arg(long = "curriculum")]
        curriculum: Vec<String>,

        /// Prerequisite (repeatable)
        #[arg(long = "prerequisite")]
        prerequisites: Vec<String>,
    },

    /// Add an instructor
    AddInstructor {
        #[command(flatten)]
        key: KeyArg,

        /// Instructor ID (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        bio: String,

        /// Qualification (repeatable)
        #[arg(long = "qualification")]
        qualifications: Vec<String>,

        /// Years of experience
        #[arg(long, default_value = "0")]
        experience: u64,

        /// Profile image URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Schedule a live class
    Schedule {
        #[command(flatten)]
        key: KeyArg,

        /// Live class ID (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Course ID
        #[arg(long)]
        course: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Instructor ID
        #[arg(long)]
        instructor: String,

        /// Start time, RFC 3339 (e.g. 2026-11-02T18:00:00Z)
        #[arg(long, value_parser = parse_start)]
        start: Time,

        /// Duration in minutes
        #[arg(long, default_value = "60")]
        duration: u64,
    },

    /// Configure the payment provider
    Stripe {
        #[command(flatten)]
        key: KeyArg,

        /// Provider secret key
        #[arg(long, env = "LYCEUM_STRIPE_SECRET_KEY", hide_env_values = true)]
        secret_key: String,

        /// Comma-separated allowed countries, e.g. "US,CA,GB"
        #[arg(long, default_value = "US,CA,GB")]
        countries: String,
    },
}

/// Run the admin command.
pub async fn run(args: AdminArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    let gate = app.admin();

    match args.command {
        AdminCommand::Status => {
            let is_admin = app.queries().is_admin().await?;
            let stripe = app.queries().stripe_configured().await?;
            if ctx.json_output {
                return print_json(&serde_json::json!({
                    "authenticated": app.session().is_authenticated(),
                    "admin": is_admin,
                    "stripeConfigured": stripe,
                }));
            }
            let dim = Style::new().dim();
            print_header("Admin");
            println!(
                "  {} {}",
                dim.apply_to("Logged in:"),
                yes_no(app.session().is_authenticated())
            );
            println!("  {} {}", dim.apply_to("Admin role:"), yes_no(is_admin));
            match stripe {
                Some(configured) => {
                    println!("  {} {}", dim.apply_to("Payments:"), yes_no(configured))
                }
                None => println!("  {} {}", dim.apply_to("Payments:"), dim.apply_to("unknown")),
            }
        }
        AdminCommand::VerifyKey { key } => {
            gate.require_console().await?;
            let status = gate.verify_key(&key).await?;
            report_key_status(status, ctx)?;
        }
        AdminCommand::SetKey { key } => {
            gate.require_console().await?;
            gate.set_key(&key).await?;
        }
        AdminCommand::CreateCourse {
            key,
            id,
            title,
            description,
            category,
            difficulty,
            instructor,
            duration,
            price,
            free,
            curriculum,
            prerequisites,
        } => {
            unlock(&app, &key.admin_key).await?;
            let course = Course {
                id: id.unwrap_or_else(new_id),
                title,
                description,
                category,
                difficulty,
                instructor,
                duration,
                price: if free { 0 } else { price },
                is_free: free,
                curriculum,
                prerequisites,
                videos: Vec::new(),
            };
            let id = course.id.clone();
            gate.create_course(course).await?;
            print_created("courseId", &id, ctx)?;
        }
        AdminCommand::AddInstructor {
            key,
            id,
            name,
            bio,
            qualifications,
            experience,
            image,
        } => {
            unlock(&app, &key.admin_key).await?;
            let instructor = Instructor {
                id: id.unwrap_or_else(new_id),
                name,
                bio,
                qualifications,
                experience,
                profile_image: image,
            };
            let id = instructor.id.clone();
            gate.add_instructor(instructor).await?;
            print_created("instructorId", &id, ctx)?;
        }
        AdminCommand::Schedule {
            key,
            id,
            course,
            title,
            description,
            instructor,
            start,
            duration,
        } => {
            unlock(&app, &key.admin_key).await?;
            let live_class = LiveClass {
                id: id.unwrap_or_else(new_id),
                course_id: course,
                title,
                description,
                instructor,
                start_time: start,
                duration,
                attendees: Vec::new(),
                recording_url: None,
            };
            let id = live_class.id.clone();
            gate.schedule_live_class(live_class).await?;
            print_created("liveClassId", &id, ctx)?;
        }
        AdminCommand::Stripe {
            key,
            secret_key,
            countries,
        } => {
            unlock(&app, &key.admin_key).await?;
            gate.configure_stripe(StripeConfiguration::from_country_list(
                secret_key, &countries,
            ))
            .await?;
        }
    }

    Ok(())
}

/// Check console access and verify `key` for the writes that follow.
async fn unlock(app: &AppContext, key: &str) -> Result<()> {
    let gate = app.admin();
    gate.require_console().await?;
    match gate.verify_key(key).await? {
        KeyStatus::Verified => Ok(()),
        KeyStatus::Rejected => bail!("admin key rejected"),
        KeyStatus::NotConfigured => {
            print_set_key_hint();
            bail!("admin key not configured")
        }
    }
}

fn report_key_status(status: KeyStatus, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        let s = match status {
            KeyStatus::Verified => "verified",
            KeyStatus::Rejected => "rejected",
            KeyStatus::NotConfigured => "not-configured",
        };
        return print_json(&serde_json::json!({ "key": s }));
    }
    match status {
        KeyStatus::Verified => Ok(()),
        KeyStatus::Rejected => bail!("admin key rejected"),
        KeyStatus::NotConfigured => {
            print_set_key_hint();
            Ok(())
        }
    }
}

fn print_set_key_hint() {
    let dim = Style::new().dim();
    eprintln!(
        "{}",
        dim.apply_to("No admin key is configured yet; set one with: lyceum admin set-key <key>")
    );
}

fn print_created(field: &str, id: &str, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        let mut out = serde_json::Map::new();
        out.insert(field.to_string(), serde_json::Value::String(id.to_string()));
        print_json(&out)?;
    } else if ctx.verbose {
        println!("{}", Style::new().dim().apply_to(format!("ID: {}", id)));
    }
    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn parse_start(s: &str) -> std::result::Result<Time, String> {
    let t = chrono::DateTime::parse_from_rfc3339(s).map_err(|e| e.to_string())?;
    t.timestamp_nanos_opt()
        .ok_or_else(|| "start time out of range".to_string())
}
