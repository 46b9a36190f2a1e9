use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stronger_bus::{HandlerError, TypedHandler, UserFollowed};
use tracing::debug;

use super::with_deadline;
use crate::adapters::{NewNotification, NotificationKind, NotificationPayload, NotificationStore};

/// Notifies the followee that someone followed them.
pub struct FollowedUserHandler {
    store: Arc<dyn NotificationStore>,
    timeout: Duration,
}

impl FollowedUserHandler {
    pub fn new(store: Arc<dyn NotificationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl TypedHandler for FollowedUserHandler {
    type Payload = UserFollowed;

    async fn handle_payload(&self, payload: UserFollowed) -> Result<(), HandlerError> {
        debug!(follower = %payload.follower_id, followee = %payload.followee_id, "Creating follow notification");

        with_deadline(self.timeout, async {
            self.store
                .create_notification(NewNotification {
                    kind: NotificationKind::Follow,
                    user_id: payload.followee_id,
                    payload: NotificationPayload {
                        actor_id: payload.follower_id,
                        workout_id: None,
                    },
                })
                .await
                .map_err(HandlerError::from)
        })
        .await
    }
}
