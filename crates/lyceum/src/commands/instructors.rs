//! Instructors command.

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use console::{Style, style};

use super::{Context, not_ready, print_header, print_json, truncate};

/// Arguments for the instructors command.
#[derive(Args, Debug)]
pub struct InstructorsArgs {
    #[command(subcommand)]
    pub command: InstructorsCommand,
}

#[derive(Subcommand, Debug)]
pub enum InstructorsCommand {
    /// List instructors
    List,

    /// Show an instructor
    Show {
        /// Instructor ID
        id: String,
    },
}

/// Run the instructors command.
pub async fn run(args: InstructorsArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    let dim = Style::new().dim();

    match args.command {
        InstructorsCommand::List => {
            let instructors = app.queries().instructors().await?.ok_or_else(not_ready)?;
            if ctx.json_output {
                return print_json(&instructors);
            }
            print_header("Instructors");
            if instructors.is_empty() {
                println!("{}", dim.apply_to("No instructors"));
            }
            for i in &instructors {
                println!(
                    "{} {} {}",
                    dim.apply_to(format!("[{}]", i.id)),
                    style(&i.name).bold(),
                    dim.apply_to(truncate(&i.bio, 50))
                );
            }
        }
        InstructorsCommand::Show { id } => {
            let instructor = app
                .queries()
                .instructor(&id)
                .await?
                .ok_or_else(|| anyhow!("instructor '{}' not found", id))?;
            if ctx.json_output {
                return print_json(&instructor);
            }
            print_header(&instructor.name);
            println!("{}", instructor.bio);
            println!();
            println!(
                "  {} {} years",
                dim.apply_to("Experience:"),
                instructor.experience
            );
            for q in &instructor.qualifications {
                println!("  - {}", q);
            }
        }
    }
    Ok(())
}
