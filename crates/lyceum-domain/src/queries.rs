//! Cached backend reads.
//!
//! Each read goes through the query cache under its well-known key. While
//! the client is not ready every read is inert and yields `None`; reads
//! keyed on an id are also inert when the id is empty.

use std::future::Future;

use lyceum_cache::{QueryCache, QueryKey};
use lyceum_client::LyceumClient;
use lyceum_types::{Course, Instructor, LiveClass, Review, UserProfile, UserRole, Video};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::keys;

/// Typed, cached reads over a [`LyceumClient`].
#[derive(Clone)]
pub struct Queries {
    client: LyceumClient,
    cache: QueryCache,
    cancel: Option<CancellationToken>,
}

impl Queries {
    pub fn new(client: LyceumClient, cache: QueryCache) -> Self {
        Self {
            client,
            cache,
            cancel: None,
        }
    }

    /// Reads through the returned handle give up once `token` fires. The
    /// underlying fetches still complete and populate the cache.
    pub fn with_cancel(&self, token: CancellationToken) -> Self {
        Self {
            cancel: Some(token),
            ..self.clone()
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn read<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(LyceumClient) -> Fut,
        Fut: Future<Output = lyceum_client::Result<T>> + Send + 'static,
    {
        let client = self.client.clone();
        let fetcher = move || fetch(client);
        let value = match &self.cancel {
            Some(token) => self.cache.read_with_cancel(&key, fetcher, token).await?,
            None => self.cache.read(&key, fetcher).await?,
        };
        Ok(value)
    }

    pub async fn courses(&self) -> Result<Option<Vec<Course>>> {
        self.read(keys::courses(), |c| async move { c.courses().all().await })
            .await
    }

    pub async fn course(&self, id: &str) -> Result<Option<Course>> {
        if id.is_empty() {
            return Ok(None);
        }
        let owned = id.to_string();
        self.read(keys::course(id), |c| async move { c.courses().get(&owned).await })
            .await
    }

    pub async fn my_enrolled_courses(&self) -> Result<Option<Vec<Course>>> {
        self.read(keys::my_enrolled_courses(), |c| async move {
            c.courses().enrolled().await
        })
        .await
    }

    pub async fn course_videos(&self, course_id: &str) -> Result<Option<Vec<Video>>> {
        if course_id.is_empty() {
            return Ok(None);
        }
        let owned = course_id.to_string();
        self.read(keys::course_videos(course_id), |c| async move {
            c.courses().videos(&owned).await
        })
        .await
    }

    pub async fn course_reviews(&self, course_id: &str) -> Result<Option<Vec<Review>>> {
        if course_id.is_empty() {
            return Ok(None);
        }
        let owned = course_id.to_string();
        self.read(keys::course_reviews(course_id), |c| async move {
            c.reviews().list(&owned).await
        })
        .await
    }

    /// Average rating; `None` when inert or when the course has no reviews.
    pub async fn course_rating(&self, course_id: &str) -> Result<Option<f64>> {
        if course_id.is_empty() {
            return Ok(None);
        }
        let owned = course_id.to_string();
        let rating = self
            .read(keys::course_rating(course_id), |c| async move {
                c.reviews().average_rating(&owned).await
            })
            .await?;
        Ok(rating.flatten())
    }

    pub async fn upcoming_live_classes(&self) -> Result<Option<Vec<LiveClass>>> {
        self.read(keys::upcoming_live_classes(), |c| async move {
            c.live_classes().upcoming().await
        })
        .await
    }

    pub async fn instructors(&self) -> Result<Option<Vec<Instructor>>> {
        self.read(keys::instructors(), |c| async move {
            c.instructors().all().await
        })
        .await
    }

    pub async fn instructor(&self, id: &str) -> Result<Option<Instructor>> {
        if id.is_empty() {
            return Ok(None);
        }
        let owned = id.to_string();
        let instructor = self
            .read(keys::instructor(id), |c| async move {
                c.instructors().get(&owned).await
            })
            .await?;
        Ok(instructor.flatten())
    }

    pub async fn stripe_configured(&self) -> Result<Option<bool>> {
        self.read(keys::stripe_configured(), |c| async move {
            c.payments().is_configured().await
        })
        .await
    }

    /// Whether the caller holds the admin role. Inert reads count as no.
    pub async fn is_admin(&self) -> Result<bool> {
        let admin = self
            .read(keys::is_admin(), |c| async move { c.profile().is_admin().await })
            .await?;
        Ok(admin.unwrap_or(false))
    }

    pub async fn current_user_profile(&self) -> Result<Option<UserProfile>> {
        let profile = self
            .read(keys::current_user_profile(), |c| async move {
                c.profile().caller().await
            })
            .await?;
        Ok(profile.flatten())
    }

    pub async fn caller_user_role(&self) -> Result<Option<UserRole>> {
        self.read(keys::caller_user_role(), |c| async move {
            c.profile().role().await
        })
        .await
    }

    /// Whether the caller is enrolled in `course_id`.
    pub async fn is_enrolled(&self, course_id: &str) -> Result<bool> {
        let enrolled = self.my_enrolled_courses().await?.unwrap_or_default();
        Ok(enrolled.iter().any(|c| c.id == course_id))
    }
}
