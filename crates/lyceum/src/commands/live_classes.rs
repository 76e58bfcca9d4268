//! Live classes command.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::{Context, format_time, not_ready, print_header, print_json};

/// Arguments for the live-classes command.
#[derive(Args, Debug)]
pub struct LiveClassesArgs {
    /// Only classes for this course
    #[arg(short, long)]
    pub course: Option<String>,
}

/// Run the live-classes command.
pub async fn run(args: LiveClassesArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    let mut classes = app
        .queries()
        .upcoming_live_classes()
        .await?
        .ok_or_else(not_ready)?;
    if let Some(course) = &args.course {
        classes.retain(|c| &c.course_id == course);
    }
    classes.sort_by_key(|c| c.start_time);

    if ctx.json_output {
        return print_json(&classes);
    }

    let dim = Style::new().dim();
    print_header("Upcoming Live Classes");
    if classes.is_empty() {
        println!("{}", dim.apply_to("Nothing scheduled"));
    }
    for class in &classes {
        println!(
            "{} {} {}",
            style(format_time(class.start_time)).cyan(),
            style(&class.title).bold(),
            dim.apply_to(format!(
                "({} min, {} attending, course {})",
                class.duration,
                class.attendees.len(),
                class.course_id
            ))
        );
        if ctx.verbose && !class.description.is_empty() {
            println!("    {}", dim.apply_to(&class.description));
        }
    }
    Ok(())
}
