//! Catalog types: courses, videos, reviews, instructors and live classes.

use serde::{Deserialize, Serialize};

use crate::{Principal, Time};

/// A course in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    /// Instructor ID.
    pub instructor: String,
    /// Total duration in minutes.
    pub duration: u64,
    /// Price in cents. Ignored when `is_free` is set.
    pub price: u64,
    pub is_free: bool,
    #[serde(default)]
    pub curriculum: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub videos: Vec<Video>,
}

impl Course {
    /// Display price: `FREE` or dollars with two decimals.
    pub fn price_label(&self) -> String {
        if self.is_free {
            "FREE".to_string()
        } else {
            format!("${}.{:02}", self.price / 100, self.price % 100)
        }
    }
}

/// A lecture video belonging to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    /// Duration in seconds.
    pub duration: u64,
    /// Position within the course.
    pub order: u64,
    pub content_url: String,
    pub is_paid: bool,
}

/// A student review of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user_id: Principal,
    pub course_id: String,
    /// 1 to 5 stars.
    pub rating: u8,
    pub comment: String,
    pub submitted_at: Time,
}

impl Review {
    /// Build a review stamped with the current time.
    pub fn new(
        user_id: Principal,
        course_id: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            course_id: course_id.into(),
            rating,
            comment: comment.into().trim().to_string(),
            submitted_at: crate::now_nanos(),
        }
    }
}

/// An instructor profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: String,
    pub name: String,
    pub bio: String,
    #[serde(default)]
    pub qualifications: Vec<String>,
    /// Years of experience.
    pub experience: u64,
    /// URL of the profile image blob, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// A scheduled live class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveClass {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub start_time: Time,
    /// Duration in minutes.
    pub duration: u64,
    #[serde(default)]
    pub attendees: Vec<Principal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
}
