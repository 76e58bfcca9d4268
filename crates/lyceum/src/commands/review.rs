//! Review command.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the review command.
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Course ID
    pub course_id: String,

    /// Rating from 1 to 5
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: u8,

    /// Review text
    #[arg(short, long)]
    pub comment: String,
}

/// Run the review command.
pub async fn run(args: ReviewArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    app.submit_review(&args.course_id, args.rating, &args.comment)
        .await?;

    if ctx.json_output {
        super::print_json(&serde_json::json!({
            "courseId": args.course_id,
            "rating": args.rating,
            "submitted": true,
        }))?;
    }
    Ok(())
}
