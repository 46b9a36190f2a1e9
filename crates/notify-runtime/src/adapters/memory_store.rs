//! # In-Memory Store
//!
//! `NotificationStore` backed by maps behind a `parking_lot::RwLock`. Used by
//! the binary when no database adapter is wired in, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::ports::{
    NewNotification, Notification, NotificationStore, StoreError, TraceRecord, Workout,
    WorkoutComment,
};

#[derive(Default)]
struct Tables {
    notifications: Vec<Notification>,
    traces: Vec<TraceRecord>,
    /// workout id -> owner id
    workouts: HashMap<Uuid, Uuid>,
    comments: HashMap<Uuid, WorkoutComment>,
    /// Insertion order of comments, for stable `get_workout` output.
    comment_order: Vec<Uuid>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a workout owned by `user_id`.
    pub fn insert_workout(&self, user_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.write().workouts.insert(id, user_id);
        id
    }

    /// Seed a comment by `user_id` on `workout_id`.
    pub fn insert_comment(&self, workout_id: Uuid, user_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        let mut tables = self.tables.write();
        tables.comments.insert(
            id,
            WorkoutComment {
                id,
                workout_id,
                user_id,
            },
        );
        tables.comment_order.push(id);
        id
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.tables.read().notifications.clone()
    }

    #[must_use]
    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.tables
            .read()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn traces(&self) -> Vec<TraceRecord> {
        self.tables.read().traces.clone()
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn create_notification(&self, notification: NewNotification) -> Result<(), StoreError> {
        self.tables.write().notifications.push(Notification {
            id: Uuid::new_v4(),
            kind: notification.kind,
            user_id: notification.user_id,
            payload: notification.payload,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn store_trace(&self, trace: TraceRecord) -> Result<(), StoreError> {
        self.tables.write().traces.push(trace);
        Ok(())
    }

    async fn get_workout_comment(&self, comment_id: Uuid) -> Result<WorkoutComment, StoreError> {
        self.tables
            .read()
            .comments
            .get(&comment_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "workout comment",
                id: comment_id,
            })
    }

    async fn get_workout(&self, workout_id: Uuid) -> Result<Workout, StoreError> {
        let tables = self.tables.read();
        let user_id = tables
            .workouts
            .get(&workout_id)
            .copied()
            .ok_or(StoreError::NotFound {
                entity: "workout",
                id: workout_id,
            })?;

        let comments = tables
            .comment_order
            .iter()
            .filter_map(|id| tables.comments.get(id))
            .filter(|c| c.workout_id == workout_id)
            .cloned()
            .collect();

        Ok(Workout {
            id: workout_id,
            user_id,
            comments,
        })
    }
}
