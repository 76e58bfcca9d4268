//! Operation groups.

mod admin;
mod courses;
mod instructors;
mod live_classes;
mod payments;
mod profile;
mod progress;
mod reviews;

pub use admin::AdminApi;
pub use courses::CoursesApi;
pub use instructors::InstructorsApi;
pub use live_classes::LiveClassesApi;
pub use payments::PaymentsApi;
pub use profile::ProfileApi;
pub use progress::ProgressApi;
pub use reviews::ReviewsApi;
