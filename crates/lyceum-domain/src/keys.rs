//! Query keys for cached backend reads.
//!
//! Every cached read and every invalidation goes through these
//! constructors, so a read and the writes that affect it always agree on
//! the key.

use lyceum_cache::QueryKey;

pub const COURSES: &str = "courses";
pub const COURSE: &str = "course";
pub const MY_ENROLLED_COURSES: &str = "myEnrolledCourses";
pub const COURSE_VIDEOS: &str = "courseVideos";
pub const COURSE_REVIEWS: &str = "courseReviews";
pub const COURSE_RATING: &str = "courseRating";
pub const UPCOMING_LIVE_CLASSES: &str = "upcomingLiveClasses";
pub const INSTRUCTORS: &str = "instructors";
pub const INSTRUCTOR: &str = "instructor";
pub const STRIPE_CONFIGURED: &str = "stripeConfigured";
pub const IS_ADMIN: &str = "isAdmin";
pub const CURRENT_USER_PROFILE: &str = "currentUserProfile";
pub const CALLER_USER_ROLE: &str = "callerUserRole";

fn root(name: &str) -> QueryKey {
    QueryKey::new([name])
}

fn scoped(name: &str, id: &str) -> QueryKey {
    root(name).with(id)
}

pub fn courses() -> QueryKey {
    root(COURSES)
}

pub fn course(id: &str) -> QueryKey {
    scoped(COURSE, id)
}

pub fn my_enrolled_courses() -> QueryKey {
    root(MY_ENROLLED_COURSES)
}

pub fn course_videos(course_id: &str) -> QueryKey {
    scoped(COURSE_VIDEOS, course_id)
}

pub fn course_reviews(course_id: &str) -> QueryKey {
    scoped(COURSE_REVIEWS, course_id)
}

pub fn course_rating(course_id: &str) -> QueryKey {
    scoped(COURSE_RATING, course_id)
}

pub fn upcoming_live_classes() -> QueryKey {
    root(UPCOMING_LIVE_CLASSES)
}

pub fn instructors() -> QueryKey {
    root(INSTRUCTORS)
}

pub fn instructor(id: &str) -> QueryKey {
    scoped(INSTRUCTOR, id)
}

pub fn stripe_configured() -> QueryKey {
    root(STRIPE_CONFIGURED)
}

pub fn is_admin() -> QueryKey {
    root(IS_ADMIN)
}

pub fn current_user_profile() -> QueryKey {
    root(CURRENT_USER_PROFILE)
}

pub fn caller_user_role() -> QueryKey {
    root(CALLER_USER_ROLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_keys_sit_under_their_root() {
        assert!(course_reviews("42").starts_with(&root(COURSE_REVIEWS)));
        assert!(!course_reviews("42").starts_with(&course_reviews("7")));
        assert_eq!(course("42").to_string(), "course/42");
        // "courses" is not a prefix of "course/42".
        assert!(!course("42").starts_with(&courses()));
    }
}
