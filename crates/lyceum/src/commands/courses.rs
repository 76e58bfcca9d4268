//! Courses command - catalog browsing.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};

use lyceum_domain::catalog::{categories, difficulties, split_by_price};
use lyceum_domain::{CatalogFilter, PriceFilter};
use lyceum_types::Course;

use super::{Context, format_time, not_ready, print_header, print_json, truncate};

/// Arguments for the courses command.
#[derive(Args, Debug)]
pub struct CoursesArgs {
    #[command(subcommand)]
    pub command: CoursesCommand,
}

#[derive(Subcommand, Debug)]
pub enum CoursesCommand {
    /// List catalog courses
    List {
        /// Case-insensitive match on title or description
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only this difficulty
        #[arg(short, long)]
        difficulty: Option<String>,

        /// all, free or paid
        #[arg(short, long, default_value = "all")]
        price: PriceFilter,

        /// Maximum courses to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Courses you are enrolled in
    Mine,

    /// Show a course
    Show {
        /// Course ID
        id: String,
    },

    /// List a course's videos
    Videos {
        /// Course ID
        id: String,
    },

    /// List a course's reviews
    Reviews {
        /// Course ID
        id: String,
    },

    /// Show a course's average rating
    Rating {
        /// Course ID
        id: String,
    },

    /// List the catalog's categories and difficulties
    Categories,
}

/// Run the courses command.
pub async fn run(args: CoursesArgs, ctx: &Context) -> Result<()> {
    let app = ctx.connect().await?;
    let queries = app.queries();
    let dim = Style::new().dim();

    match args.command {
        CoursesCommand::List {
            search,
            category,
            difficulty,
            price,
            limit,
        } => {
            let courses = queries.courses().await?.ok_or_else(not_ready)?;
            let mut filter = CatalogFilter::new().search(search).price(price);
            if let Some(category) = category {
                filter = filter.category(category);
            }
            if let Some(difficulty) = difficulty {
                filter = filter.difficulty(difficulty);
            }
            let matched = filter.apply(&courses);

            if ctx.json_output {
                return print_json(&matched);
            }

            print_header("Courses");
            if matched.is_empty() {
                println!("{}", dim.apply_to("No courses match"));
                return Ok(());
            }
            // Free first, as the catalog page shows them.
            let (free, paid) = split_by_price(&matched);
            for course in free.iter().chain(paid.iter()).take(limit) {
                print_course_line(course);
            }
            if matched.len() > limit {
                println!();
                println!(
                    "{}",
                    dim.apply_to(format!("... and {} more", matched.len() - limit))
                );
            }
        }
        CoursesCommand::Mine => {
            let courses = queries.my_enrolled_courses().await?.ok_or_else(not_ready)?;
            if ctx.json_output {
                return print_json(&courses);
            }
            print_header("My Courses");
            if courses.is_empty() {
                println!("{}", dim.apply_to("Not enrolled in any course yet"));
            }
            for course in &courses {
                print_course_line(course);
            }
        }
        CoursesCommand::Show { id } => {
            let course = queries.course(&id).await?.ok_or_else(not_ready)?;
            let rating = queries.course_rating(&id).await?;
            if ctx.json_output {
                return print_json(&serde_json::json!({
                    "course": course,
                    "rating": rating,
                }));
            }

            print_header(&course.title);
            println!("{}", course.description);
            println!();
            println!("  {} {}", dim.apply_to("ID:"), course.id);
            println!("  {} {}", dim.apply_to("Category:"), course.category);
            println!("  {} {}", dim.apply_to("Difficulty:"), course.difficulty);
            println!("  {} {}", dim.apply_to("Instructor:"), course.instructor);
            println!("  {} {} min", dim.apply_to("Duration:"), course.duration);
            println!("  {} {}", dim.apply_to("Price:"), price_styled(&course));
            match rating {
                Some(r) => println!("  {} {:.1} / 5", dim.apply_to("Rating:"), r),
                None => println!("  {} {}", dim.apply_to("Rating:"), dim.apply_to("none yet")),
            }
            if !course.prerequisites.is_empty() {
                println!();
                println!("{}", style("Prerequisites").bold());
                for p in &course.prerequisites {
                    println!("  - {}", p);
                }
            }
            if !course.curriculum.is_empty() {
                println!();
                println!("{}", style("Curriculum").bold());
                for (i, item) in course.curriculum.iter().enumerate() {
                    println!("  {:>2}. {}", i + 1, item);
                }
            }
        }
        CoursesCommand::Videos { id } => {
            let mut videos = queries.course_videos(&id).await?.ok_or_else(not_ready)?;
            videos.sort_by_key(|v| v.order);
            if ctx.json_output {
                return print_json(&videos);
            }
            print_header("Videos");
            if videos.is_empty() {
                println!("{}", dim.apply_to("No videos"));
            }
            for video in &videos {
                let lock = if video.is_paid { "$" } else { " " };
                println!(
                    "{} {:>2}. {} {}",
                    dim.apply_to(lock),
                    video.order,
                    video.title,
                    dim.apply_to(format!("({} min)", video.duration))
                );
            }
        }
        CoursesCommand::Reviews { id } => {
            let reviews = queries.course_reviews(&id).await?.ok_or_else(not_ready)?;
            if ctx.json_output {
                return print_json(&reviews);
            }
            print_header("Reviews");
            if reviews.is_empty() {
                println!("{}", dim.apply_to("No reviews yet"));
            }
            for review in &reviews {
                let stars = "★".repeat(review.rating as usize);
                println!(
                    "{} {} {}",
                    style(format!("{:<5}", stars)).yellow(),
                    dim.apply_to(format!(
                        "[{} {}]",
                        review.user_id.short(),
                        format_time(review.submitted_at)
                    )),
                    truncate(&review.comment, 60)
                );
            }
        }
        CoursesCommand::Rating { id } => {
            let rating = queries.course_rating(&id).await?;
            if ctx.json_output {
                return print_json(&serde_json::json!({ "courseId": id, "rating": rating }));
            }
            match rating {
                Some(r) => println!("{:.1} / 5", r),
                None => println!("{}", dim.apply_to("No ratings yet")),
            }
        }
        CoursesCommand::Categories => {
            let courses = queries.courses().await?.ok_or_else(not_ready)?;
            let categories = categories(&courses);
            let difficulties = difficulties(&courses);
            if ctx.json_output {
                return print_json(&serde_json::json!({
                    "categories": categories,
                    "difficulties": difficulties,
                }));
            }
            print_header("Categories");
            for c in &categories {
                println!("  {}", c);
            }
            println!();
            print_header("Difficulties");
            for d in &difficulties {
                println!("  {}", d);
            }
        }
    }

    Ok(())
}

fn price_styled(course: &Course) -> String {
    let label = course.price_label();
    if course.is_free {
        Style::new().green().apply_to(label).to_string()
    } else {
        label
    }
}

fn print_course_line(course: &Course) {
    let dim = Style::new().dim();
    println!(
        "{} {} {} {}",
        dim.apply_to(format!("[{}]", truncate(&course.id, 12))),
        style(truncate(&course.title, 40)).bold(),
        price_styled(course),
        dim.apply_to(format!("{} · {}", course.category, course.difficulty))
    );
}
