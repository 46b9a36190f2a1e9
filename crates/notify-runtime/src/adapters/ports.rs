//! # Storage Port
//!
//! The persistence the handlers need, expressed as a trait so the database
//! layer stays outside this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stronger_bus::HandlerError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    WorkoutComment,
}

/// Data shown with a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub actor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    /// Recipient.
    pub user_id: Uuid,
    pub payload: NotificationPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub user_id: Uuid,
    pub payload: NotificationPayload,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub request: String,
    pub duration_ms: u64,
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutComment {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub user_id: Uuid,
}

/// A workout with its comments loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub comments: Vec<WorkoutComment>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("backend: {0}")]
    Backend(String),
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        HandlerError::Store(err.to_string())
    }
}

/// Persistence used by the bus handlers.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, notification: NewNotification) -> Result<(), StoreError>;

    async fn store_trace(&self, trace: TraceRecord) -> Result<(), StoreError>;

    async fn get_workout_comment(&self, comment_id: Uuid) -> Result<WorkoutComment, StoreError>;

    /// Load a workout together with all of its comments.
    async fn get_workout(&self, workout_id: Uuid) -> Result<Workout, StoreError>;
}
