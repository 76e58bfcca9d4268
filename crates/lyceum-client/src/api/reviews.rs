//! Reviews API.

use lyceum_types::Review;

use crate::client::LyceumClient;
use crate::error::Result;
use crate::operation::Operation;

/// Reviews API client.
pub struct ReviewsApi {
    client: LyceumClient,
}

impl ReviewsApi {
    pub(crate) fn new(client: LyceumClient) -> Self {
        Self { client }
    }

    /// List reviews for a course.
    pub async fn list(&self, course_id: &str) -> Result<Vec<Review>> {
        self.client
            .call(Operation::GetCourseReviews, vec![LyceumClient::arg(course_id)?])
            .await
    }

    /// Average rating, or `None` when the course has no reviews.
    pub async fn average_rating(&self, course_id: &str) -> Result<Option<f64>> {
        self.client
            .call(
                Operation::GetCourseAverageRating,
                vec![LyceumClient::arg(course_id)?],
            )
            .await
    }

    /// Submit a review.
    pub async fn submit(&self, review: &Review) -> Result<()> {
        self.client
            .call(Operation::SubmitReview, vec![LyceumClient::arg(review)?])
            .await
    }
}
