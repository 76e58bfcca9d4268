//! Courses API.

use lyceum_types::{Course, Video};

use crate::client::LyceumClient;
use crate::error::Result;
use crate::operation::Operation;

/// Courses API client.
pub struct CoursesApi {
    client: LyceumClient,
}

impl CoursesApi {
    pub(crate) fn new(client: LyceumClient) -> Self {
        Self { client }
    }

    /// List the whole catalog.
    pub async fn all(&self) -> Result<Vec<Course>> {
        self.client.call(Operation::GetAllCourses, vec![]).await
    }

    /// Get a course by ID.
    pub async fn get(&self, id: &str) -> Result<Course> {
        self.client
            .call(Operation::GetCourse, vec![LyceumClient::arg(id)?])
            .await
    }

    /// List free courses.
    pub async fn free(&self) -> Result<Vec<Course>> {
        self.client.call(Operation::GetFreeCourses, vec![]).await
    }

    /// List paid courses.
    pub async fn paid(&self) -> Result<Vec<Course>> {
        self.client.call(Operation::GetPaidCourses, vec![]).await
    }

    /// List courses in a category.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Course>> {
        self.client
            .call(
                Operation::FilterCoursesByCategory,
                vec![LyceumClient::arg(category)?],
            )
            .await
    }

    /// List courses at a difficulty level.
    pub async fn by_difficulty(&self, difficulty: &str) -> Result<Vec<Course>> {
        self.client
            .call(
                Operation::FilterCoursesByDifficulty,
                vec![LyceumClient::arg(difficulty)?],
            )
            .await
    }

    /// List a course's videos.
    pub async fn videos(&self, course_id: &str) -> Result<Vec<Video>> {
        self.client
            .call(Operation::GetCourseVideos, vec![LyceumClient::arg(course_id)?])
            .await
    }

    /// List the caller's enrolled courses.
    pub async fn enrolled(&self) -> Result<Vec<Course>> {
        self.client.call(Operation::GetMyEnrolledCourses, vec![]).await
    }

    /// Enroll the caller in a course.
    pub async fn enroll(&self, course_id: &str) -> Result<()> {
        self.client
            .call(Operation::EnrollInCourse, vec![LyceumClient::arg(course_id)?])
            .await
    }

    /// Create a course. Requires the admin key.
    pub async fn create(&self, course: &Course, admin_key: &str) -> Result<()> {
        self.client
            .call(
                Operation::CreateCourse,
                vec![LyceumClient::arg(course)?, LyceumClient::arg(admin_key)?],
            )
            .await
    }
}
