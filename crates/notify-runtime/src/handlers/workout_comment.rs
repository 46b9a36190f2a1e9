use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stronger_bus::{HandlerError, TypedHandler, WorkoutCommentPosted};
use tracing::error;
use uuid::Uuid;

use super::with_deadline;
use crate::adapters::{
    NewNotification, NotificationKind, NotificationPayload, NotificationStore, Workout,
    WorkoutComment,
};

/// Notifies everyone involved in a workout's thread about a new comment.
///
/// Recipients are the workout owner and every other commenter on the
/// workout, each once; the comment's author is never notified.
pub struct WorkoutCommentPostedHandler {
    store: Arc<dyn NotificationStore>,
    timeout: Duration,
}

impl WorkoutCommentPostedHandler {
    pub fn new(store: Arc<dyn NotificationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn notify_thread(&self, comment_id: Uuid) -> Result<(), HandlerError> {
        let comment = self.store.get_workout_comment(comment_id).await?;
        let workout = self.store.get_workout(comment.workout_id).await?;

        let mut failed = 0usize;
        for user_id in recipients(&comment, &workout) {
            let notification = NewNotification {
                kind: NotificationKind::WorkoutComment,
                user_id,
                payload: NotificationPayload {
                    actor_id: comment.user_id,
                    workout_id: Some(comment.workout_id),
                },
            };
            if let Err(e) = self.store.create_notification(notification).await {
                error!(user_id = %user_id, comment_id = %comment_id, error = %e, "Create notification failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(HandlerError::Store(format!(
                "{failed} comment notification(s) not created"
            )));
        }
        Ok(())
    }
}

/// Users to notify about `comment`, in a stable order.
fn recipients(comment: &WorkoutComment, workout: &Workout) -> BTreeSet<Uuid> {
    std::iter::once(workout.user_id)
        .chain(workout.comments.iter().map(|c| c.user_id))
        .filter(|user_id| *user_id != comment.user_id)
        .collect()
}

#[async_trait]
impl TypedHandler for WorkoutCommentPostedHandler {
    type Payload = WorkoutCommentPosted;

    async fn handle_payload(&self, payload: WorkoutCommentPosted) -> Result<(), HandlerError> {
        with_deadline(self.timeout, self.notify_thread(payload.comment_id)).await
    }
}
