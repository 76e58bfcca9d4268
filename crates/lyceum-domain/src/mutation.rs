//! Remote writes and the cache invalidation that follows them.
//!
//! Every write is a [`Mutation`] variant. The orchestrator validates it
//! locally, issues the remote call on a spawned task, and on success
//! invalidates exactly the query prefixes the variant declares. Each write
//! ends in one notification.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lyceum_cache::{QueryCache, QueryKey};
use lyceum_client::LyceumClient;
use lyceum_types::{
    CheckoutSession, Course, Instructor, LiveClass, Review, ShoppingItem, StripeConfiguration,
    UserProfile,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DomainError, Result};
use crate::keys;
use crate::notify::{Notification, Notifier};

/// How many finished mutations [`MutationOrchestrator::records`] keeps.
const RECORD_HISTORY: usize = 64;

/// A remote write.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SaveProfile(UserProfile),
    Enroll {
        course_id: String,
    },
    SubmitReview(Review),
    SetStripeConfiguration(StripeConfiguration),
    ProcessCoursePayment {
        provider_id: String,
        course_id: String,
        session_id: String,
    },
    CreateCourse {
        course: Course,
        admin_key: String,
    },
    AddInstructor {
        instructor: Instructor,
        admin_key: String,
    },
    ScheduleLiveClass {
        live_class: LiveClass,
        admin_key: String,
    },
    CreateCheckoutSession {
        items: Vec<ShoppingItem>,
        success_url: String,
        cancel_url: String,
    },
    SetAdminKey {
        key: String,
    },
    VerifyAdminKey {
        key: String,
    },
    CompleteVideo {
        video_id: String,
    },
    UpdateVideoProgress {
        video_id: String,
        progress: u64,
    },
}

/// Which write a [`Mutation`] is, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    SaveProfile,
    Enroll,
    SubmitReview,
    SetStripeConfiguration,
    ProcessCoursePayment,
    CreateCourse,
    AddInstructor,
    ScheduleLiveClass,
    CreateCheckoutSession,
    SetAdminKey,
    VerifyAdminKey,
    CompleteVideo,
    UpdateVideoProgress,
}

impl MutationKind {
    /// Notification on success. `None` means the caller reports the
    /// outcome itself.
    pub fn success_message(self) -> Option<&'static str> {
        match self {
            MutationKind::SaveProfile => Some("Profile saved successfully"),
            MutationKind::Enroll => Some("Successfully enrolled in course"),
            MutationKind::SubmitReview => Some("Review submitted successfully"),
            MutationKind::SetStripeConfiguration => Some("Stripe configuration saved"),
            MutationKind::ProcessCoursePayment => Some("Payment processed successfully"),
            MutationKind::CreateCourse => Some("Course created successfully"),
            MutationKind::AddInstructor => Some("Instructor added successfully"),
            MutationKind::ScheduleLiveClass => Some("Live class scheduled successfully"),
            MutationKind::CreateCheckoutSession => Some("Redirecting to checkout"),
            MutationKind::SetAdminKey => Some("Admin key set successfully"),
            MutationKind::VerifyAdminKey => None,
            MutationKind::CompleteVideo => Some("Video marked as complete"),
            MutationKind::UpdateVideoProgress => Some("Progress saved"),
        }
    }

    /// Error notification used when the failure carries no message.
    pub fn error_fallback(self) -> &'static str {
        match self {
            MutationKind::SaveProfile => "Failed to save profile",
            MutationKind::Enroll => "Failed to enroll in course",
            MutationKind::SubmitReview => "Failed to submit review",
            MutationKind::SetStripeConfiguration => "Failed to save Stripe configuration",
            MutationKind::ProcessCoursePayment => "Failed to process payment",
            MutationKind::CreateCourse => "Failed to create course",
            MutationKind::AddInstructor => "Failed to add instructor",
            MutationKind::ScheduleLiveClass => "Failed to schedule live class",
            MutationKind::CreateCheckoutSession => "Failed to create checkout session",
            MutationKind::SetAdminKey => "Failed to set admin key",
            MutationKind::VerifyAdminKey => "Failed to verify admin key",
            MutationKind::CompleteVideo => "Failed to complete video",
            MutationKind::UpdateVideoProgress => "Failed to update progress",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::SaveProfile(_) => MutationKind::SaveProfile,
            Mutation::Enroll { .. } => MutationKind::Enroll,
            Mutation::SubmitReview(_) => MutationKind::SubmitReview,
            Mutation::SetStripeConfiguration(_) => MutationKind::SetStripeConfiguration,
            Mutation::ProcessCoursePayment { .. } => MutationKind::ProcessCoursePayment,
            Mutation::CreateCourse { .. } => MutationKind::CreateCourse,
            Mutation::AddInstructor { .. } => MutationKind::AddInstructor,
            Mutation::ScheduleLiveClass { .. } => MutationKind::ScheduleLiveClass,
            Mutation::CreateCheckoutSession { .. } => MutationKind::CreateCheckoutSession,
            Mutation::SetAdminKey { .. } => MutationKind::SetAdminKey,
            Mutation::VerifyAdminKey { .. } => MutationKind::VerifyAdminKey,
            Mutation::CompleteVideo { .. } => MutationKind::CompleteVideo,
            Mutation::UpdateVideoProgress { .. } => MutationKind::UpdateVideoProgress,
        }
    }

    /// Query prefixes made stale by a successful write.
    pub fn invalidates(&self) -> Vec<QueryKey> {
        match self {
            Mutation::SaveProfile(_) => vec![keys::current_user_profile()],
            Mutation::Enroll { .. } => vec![keys::my_enrolled_courses()],
            Mutation::SubmitReview(review) => vec![
                keys::course_reviews(&review.course_id),
                keys::course_rating(&review.course_id),
            ],
            Mutation::SetStripeConfiguration(_) => vec![keys::stripe_configured()],
            Mutation::ProcessCoursePayment { .. } => vec![keys::my_enrolled_courses()],
            Mutation::CreateCourse { .. } => vec![keys::courses()],
            Mutation::AddInstructor { .. } => vec![keys::instructors()],
            Mutation::ScheduleLiveClass { .. } => vec![keys::upcoming_live_classes()],
            Mutation::CreateCheckoutSession { .. }
            | Mutation::SetAdminKey { .. }
            | Mutation::VerifyAdminKey { .. }
            | Mutation::CompleteVideo { .. }
            | Mutation::UpdateVideoProgress { .. } => Vec::new(),
        }
    }

    /// Reject obviously invalid writes before any remote call.
    pub fn validate(&self) -> Result<()> {
        match self {
            Mutation::SaveProfile(profile) => {
                require(&profile.name, "Name is required")?;
                require(&profile.email, "Email is required")
            }
            Mutation::Enroll { course_id } => require(course_id, "Course id is required"),
            Mutation::SubmitReview(review) => {
                require(&review.course_id, "Course id is required")?;
                if !(1..=5).contains(&review.rating) {
                    return Err(DomainError::validation("Rating must be between 1 and 5"));
                }
                require(&review.comment, "Please enter a review comment")
            }
            Mutation::SetStripeConfiguration(config) => {
                require(&config.secret_key, "Stripe secret key is required")?;
                if config.allowed_countries.iter().all(|c| c.trim().is_empty()) {
                    return Err(DomainError::validation(
                        "At least one allowed country is required",
                    ));
                }
                Ok(())
            }
            Mutation::ProcessCoursePayment {
                provider_id,
                course_id,
                session_id,
            } => {
                require(provider_id, "Payment provider is required")?;
                require(course_id, "Course id is required")?;
                require(session_id, "Checkout session id is required")
            }
            Mutation::CreateCourse { course, admin_key } => {
                require(admin_key, "Admin key is required")?;
                require(&course.id, "Course id is required")?;
                require(&course.title, "Course title is required")?;
                if !course.is_free && course.price == 0 {
                    return Err(DomainError::validation("Paid courses need a price"));
                }
                Ok(())
            }
            Mutation::AddInstructor {
                instructor,
                admin_key,
            } => {
                require(admin_key, "Admin key is required")?;
                require(&instructor.id, "Instructor id is required")?;
                require(&instructor.name, "Instructor name is required")
            }
            Mutation::ScheduleLiveClass {
                live_class,
                admin_key,
            } => {
                require(admin_key, "Admin key is required")?;
                require(&live_class.id, "Live class id is required")?;
                require(&live_class.course_id, "Course id is required")?;
                require(&live_class.title, "Live class title is required")
            }
            Mutation::CreateCheckoutSession {
                items,
                success_url,
                cancel_url,
            } => {
                if items.is_empty() {
                    return Err(DomainError::validation("Checkout needs at least one item"));
                }
                require(success_url, "Success URL is required")?;
                require(cancel_url, "Cancel URL is required")
            }
            Mutation::SetAdminKey { key } | Mutation::VerifyAdminKey { key } => {
                require(key, "Please enter an admin key")
            }
            Mutation::CompleteVideo { video_id } => require(video_id, "Video id is required"),
            Mutation::UpdateVideoProgress { video_id, progress } => {
                require(video_id, "Video id is required")?;
                if *progress > 100 {
                    return Err(DomainError::validation("Progress must be between 0 and 100"));
                }
                Ok(())
            }
        }
    }

    /// Issue the remote call.
    async fn execute(self, client: &LyceumClient) -> Result<MutationOutput> {
        let output = match self {
            Mutation::SaveProfile(profile) => {
                client.profile().save(&profile).await?;
                MutationOutput::Done
            }
            Mutation::Enroll { course_id } => {
                client.courses().enroll(&course_id).await?;
                MutationOutput::Done
            }
            Mutation::SubmitReview(review) => {
                client.reviews().submit(&review).await?;
                MutationOutput::Done
            }
            Mutation::SetStripeConfiguration(config) => {
                client.payments().configure(&config).await?;
                MutationOutput::Done
            }
            Mutation::ProcessCoursePayment {
                provider_id,
                course_id,
                session_id,
            } => {
                client
                    .payments()
                    .process_course_payment(&provider_id, &course_id, &session_id)
                    .await?;
                MutationOutput::Done
            }
            Mutation::CreateCourse { course, admin_key } => {
                client.courses().create(&course, &admin_key).await?;
                MutationOutput::Done
            }
            Mutation::AddInstructor {
                instructor,
                admin_key,
            } => {
                client.instructors().add(&instructor, &admin_key).await?;
                MutationOutput::Done
            }
            Mutation::ScheduleLiveClass {
                live_class,
                admin_key,
            } => {
                client.live_classes().schedule(&live_class, &admin_key).await?;
                MutationOutput::Done
            }
            Mutation::CreateCheckoutSession {
                items,
                success_url,
                cancel_url,
            } => MutationOutput::Checkout(
                client
                    .payments()
                    .create_checkout_session(&items, &success_url, &cancel_url)
                    .await?,
            ),
            Mutation::SetAdminKey { key } => {
                client.admin().set_key(&key).await?;
                MutationOutput::Done
            }
            Mutation::VerifyAdminKey { key } => {
                MutationOutput::KeyValid(client.admin().verify_key(&key).await?)
            }
            Mutation::CompleteVideo { video_id } => {
                client.progress().complete_video(&video_id).await?;
                MutationOutput::Done
            }
            Mutation::UpdateVideoProgress { video_id, progress } => {
                client.progress().update(&video_id, progress).await?;
                MutationOutput::Done
            }
        };
        Ok(output)
    }
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(DomainError::validation(message))
    } else {
        Ok(())
    }
}

/// Value produced by a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutput {
    Done,
    Checkout(CheckoutSession),
    KeyValid(bool),
}

/// Lifecycle of one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Bookkeeping for one write.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub id: Uuid,
    pub kind: MutationKind,
    pub status: MutationStatus,
    /// Prefixes invalidated on success.
    pub invalidates: Vec<QueryKey>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MutationRecord {
    fn pending(kind: MutationKind, invalidates: Vec<QueryKey>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: MutationStatus::Pending,
            invalidates,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Runs writes and keeps the query cache consistent with them.
#[derive(Clone)]
pub struct MutationOrchestrator {
    client: LyceumClient,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    records: Arc<Mutex<VecDeque<MutationRecord>>>,
}

impl MutationOrchestrator {
    pub fn new(client: LyceumClient, cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            cache,
            notifier,
            records: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Recent writes, oldest first.
    pub fn records(&self) -> Vec<MutationRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Writes currently in flight.
    pub fn pending(&self) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.status == MutationStatus::Pending)
            .count()
    }

    /// Run one write to completion.
    ///
    /// The remote call and the invalidation run on their own task: dropping
    /// the returned future does not abort the write.
    pub async fn mutate(&self, mutation: Mutation) -> Result<MutationOutput> {
        let kind = mutation.kind();

        if let Err(e) = mutation.validate() {
            debug!(kind = %kind, error = %e, "mutation rejected locally");
            self.notify_error(kind, &e);
            return Err(e);
        }

        let record = MutationRecord::pending(kind, mutation.invalidates());
        let id = record.id;
        self.push_record(record);
        debug!(kind = %kind, %id, "mutation pending");

        let this = self.clone();
        let task = tokio::spawn(async move {
            let invalidates = mutation.invalidates();
            let result = mutation.execute(&this.client).await;
            this.settle(id, kind, &invalidates, &result);
            result
        });

        task.await
            .map_err(|e| DomainError::Internal(format!("mutation task failed: {}", e)))?
    }

    fn settle(
        &self,
        id: Uuid,
        kind: MutationKind,
        invalidates: &[QueryKey],
        result: &Result<MutationOutput>,
    ) {
        match result {
            Ok(_) => {
                let count = self.cache.invalidate_many(invalidates);
                info!(kind = %kind, %id, invalidated = count, "mutation succeeded");
                self.finish_record(id, MutationStatus::Success, None);
                if let Some(message) = kind.success_message() {
                    self.notifier.notify(Notification::success(message));
                }
            }
            Err(e) => {
                warn!(kind = %kind, %id, error = %e, "mutation failed");
                self.finish_record(id, MutationStatus::Error, Some(e.to_string()));
                self.notify_error(kind, e);
            }
        }
    }

    fn notify_error(&self, kind: MutationKind, error: &DomainError) {
        let message = error.to_string();
        let message = if message.trim().is_empty() {
            kind.error_fallback().to_string()
        } else {
            message
        };
        self.notifier.notify(Notification::error(message));
    }

    fn push_record(&self, record: MutationRecord) {
        let mut records = self.records.lock();
        while records.len() >= RECORD_HISTORY {
            // Drop the oldest finished record; pending ones stay.
            match records.iter().position(|r| r.status != MutationStatus::Pending) {
                Some(pos) => {
                    records.remove(pos);
                }
                None => break,
            }
        }
        records.push_back(record);
    }

    fn finish_record(&self, id: Uuid, status: MutationStatus, error: Option<String>) {
        let mut records = self.records.lock();
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.status = status;
            record.error = error;
            record.finished_at = Some(Utc::now());
        }
    }
}
