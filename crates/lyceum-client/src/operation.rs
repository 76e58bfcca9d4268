//! Named backend operations.

use std::fmt;
use std::str::FromStr;

/// Every operation the backend actor exposes to this client.
///
/// The wire name (see [`Operation::as_str`]) is the actor's method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddInstructor,
    AssignCallerUserRole,
    CompleteVideo,
    CreateCheckoutSession,
    CreateCourse,
    EnrollInCourse,
    FilterCoursesByCategory,
    FilterCoursesByDifficulty,
    GetAllCourses,
    GetAllInstructors,
    GetCallerUserProfile,
    GetCallerUserRole,
    GetCourse,
    GetCourseAverageRating,
    GetCourseReviews,
    GetCourseVideos,
    GetFreeCourses,
    GetInstructor,
    GetMyEnrolledCourses,
    GetPaidCourses,
    GetStripeSessionStatus,
    GetUpcomingLiveClasses,
    GetUserProfile,
    GetVideoContent,
    IsCallerAdmin,
    IsStripeConfigured,
    ProcessCoursePayment,
    SaveCallerUserProfile,
    ScheduleLiveClass,
    SetAdminKey,
    SetStripeConfiguration,
    SubmitReview,
    UpdateVideoProgress,
    VerifyAdminKey,
}

impl Operation {
    /// All operations, in wire-name order.
    pub const ALL: [Operation; 34] = [
        Operation::AddInstructor,
        Operation::AssignCallerUserRole,
        Operation::CompleteVideo,
        Operation::CreateCheckoutSession,
        Operation::CreateCourse,
        Operation::EnrollInCourse,
        Operation::FilterCoursesByCategory,
        Operation::FilterCoursesByDifficulty,
        Operation::GetAllCourses,
        Operation::GetAllInstructors,
        Operation::GetCallerUserProfile,
        Operation::GetCallerUserRole,
        Operation::GetCourse,
        Operation::GetCourseAverageRating,
        Operation::GetCourseReviews,
        Operation::GetCourseVideos,
        Operation::GetFreeCourses,
        Operation::GetInstructor,
        Operation::GetMyEnrolledCourses,
        Operation::GetPaidCourses,
        Operation::GetStripeSessionStatus,
        Operation::GetUpcomingLiveClasses,
        Operation::GetUserProfile,
        Operation::GetVideoContent,
        Operation::IsCallerAdmin,
        Operation::IsStripeConfigured,
        Operation::ProcessCoursePayment,
        Operation::SaveCallerUserProfile,
        Operation::ScheduleLiveClass,
        Operation::SetAdminKey,
        Operation::SetStripeConfiguration,
        Operation::SubmitReview,
        Operation::UpdateVideoProgress,
        Operation::VerifyAdminKey,
    ];

    /// The actor method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::AddInstructor => "addInstructor",
            Operation::AssignCallerUserRole => "assignCallerUserRole",
            Operation::CompleteVideo => "completeVideo",
            Operation::CreateCheckoutSession => "createCheckoutSession",
            Operation::CreateCourse => "createCourse",
            Operation::EnrollInCourse => "enrollInCourse",
            Operation::FilterCoursesByCategory => "filterCoursesByCategory",
            Operation::FilterCoursesByDifficulty => "filterCoursesByDifficulty",
            Operation::GetAllCourses => "getAllCourses",
            Operation::GetAllInstructors => "getAllInstructors",
            Operation::GetCallerUserProfile => "getCallerUserProfile",
            Operation::GetCallerUserRole => "getCallerUserRole",
            Operation::GetCourse => "getCourse",
            Operation::GetCourseAverageRating => "getCourseAverageRating",
            Operation::GetCourseReviews => "getCourseReviews",
            Operation::GetCourseVideos => "getCourseVideos",
            Operation::GetFreeCourses => "getFreeCourses",
            Operation::GetInstructor => "getInstructor",
            Operation::GetMyEnrolledCourses => "getMyEnrolledCourses",
            Operation::GetPaidCourses => "getPaidCourses",
            Operation::GetStripeSessionStatus => "getStripeSessionStatus",
            Operation::GetUpcomingLiveClasses => "getUpcomingLiveClasses",
            Operation::GetUserProfile => "getUserProfile",
            Operation::GetVideoContent => "getVideoContent",
            Operation::IsCallerAdmin => "isCallerAdmin",
            Operation::IsStripeConfigured => "isStripeConfigured",
            Operation::ProcessCoursePayment => "processCoursePayment",
            Operation::SaveCallerUserProfile => "saveCallerUserProfile",
            Operation::ScheduleLiveClass => "scheduleLiveClass",
            Operation::SetAdminKey => "setAdminKey",
            Operation::SetStripeConfiguration => "setStripeConfiguration",
            Operation::SubmitReview => "submitReview",
            Operation::UpdateVideoProgress => "updateVideoProgress",
            Operation::VerifyAdminKey => "verifyAdminKey",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_unique() {
        let mut names: Vec<_> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Operation::ALL.len());
    }

    #[test]
    fn test_parse_operation() {
        assert_eq!(
            "enrollInCourse".parse::<Operation>().unwrap(),
            Operation::EnrollInCourse
        );
        assert!("transform".parse::<Operation>().is_err());
    }
}
