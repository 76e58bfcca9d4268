//! Profile command.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use lyceum_domain::Mutation;
use lyceum_types::UserProfile;

use super::{Context, not_ready, print_header, print_json};

/// Arguments for the profile command.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show your profile
    Show,

    /// Save your name and email
    Save {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// Show the role the backend assigns you
    Role,
}

/// Run the profile command.
pub async fn run(args: ProfileArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    let queries = app.queries();
    let dim = Style::new().dim();

    match args.command {
        ProfileCommand::Show => {
            let profile = queries.current_user_profile().await?;
            if ctx.json_output {
                return print_json(&profile);
            }
            print_header("Profile");
            match profile {
                Some(p) => {
                    println!("  {} {}", dim.apply_to("Name:"), p.name);
                    println!("  {} {}", dim.apply_to("Email:"), p.email);
                    println!(
                        "  {} {}",
                        dim.apply_to("Enrolled:"),
                        p.enrolled_courses.len()
                    );
                }
                None => println!("{}", dim.apply_to("No profile saved")),
            }
        }
        ProfileCommand::Save { name, email } => {
            let enrolled_courses = queries
                .current_user_profile()
                .await?
                .map(|p| p.enrolled_courses)
                .unwrap_or_default();
            let profile = UserProfile {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                enrolled_courses,
            };
            app.mutations()
                .mutate(Mutation::SaveProfile(profile.clone()))
                .await?;
            if ctx.json_output {
                print_json(&profile)?;
            }
        }
        ProfileCommand::Role => {
            let role = queries.caller_user_role().await?.ok_or_else(not_ready)?;
            if ctx.json_output {
                return print_json(&serde_json::json!({ "role": role }));
            }
            println!("{}", role);
        }
    }

    Ok(())
}
