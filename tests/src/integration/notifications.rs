//! # Notification Flows
//!
//! The runtime end to end: events emitted on its bus are turned into
//! notification and trace rows in the in-memory store.
//!
//! ```text
//! emit(UserFollowed)          ──► FollowedUserHandler         ──► Follow notification
//! emit(WorkoutCommentPosted)  ──► WorkoutCommentPostedHandler ──► one per thread member
//! tracer.trace(..).end(..)    ──► RequestTracedHandler        ──► trace row
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::{sleep, timeout};
    use uuid::Uuid;

    use notify_runtime::adapters::NotificationKind;
    use notify_runtime::{InMemoryStore, NotifyRuntime, RuntimeConfig};
    use stronger_bus::{topics, TopicState, UserFollowed, WorkoutCommentPosted};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn started() -> (NotifyRuntime, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let runtime = NotifyRuntime::new(RuntimeConfig::default(), store.clone());
        runtime.start().unwrap();
        (runtime, store)
    }

    async fn eventually(cond: impl Fn() -> bool) {
        timeout(Duration::from_secs(2), async {
            while !cond() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_follow_creates_notification_for_followee() {
        let (runtime, store) = started();
        let (follower, followee) = (Uuid::new_v4(), Uuid::new_v4());

        runtime
            .bus()
            .emit(UserFollowed {
                follower_id: follower,
                followee_id: followee,
            })
            .await;

        eventually(|| !store.notifications_for(followee).is_empty()).await;

        let received = store.notifications_for(followee);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].kind, NotificationKind::Follow);
        assert_eq!(received[0].payload.actor_id, follower);
        assert!(store.notifications_for(follower).is_empty());

        assert!(runtime.shutdown().await);
    }

    #[tokio::test]
    async fn test_comment_notifies_workout_thread() {
        let (runtime, store) = started();
        let (owner, friend, author) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let workout = store.insert_workout(owner);
        store.insert_comment(workout, friend);
        let comment = store.insert_comment(workout, author);

        runtime
            .bus()
            .emit(WorkoutCommentPosted {
                comment_id: comment,
            })
            .await;

        eventually(|| store.notifications().len() >= 2).await;
        sleep(Duration::from_millis(50)).await;

        assert_eq!(store.notifications().len(), 2);
        for user in [owner, friend] {
            let received = store.notifications_for(user);
            assert_eq!(received.len(), 1);
            assert_eq!(received[0].kind, NotificationKind::WorkoutComment);
            assert_eq!(received[0].payload.actor_id, author);
            assert_eq!(received[0].payload.workout_id, Some(workout));
        }
        assert!(store.notifications_for(author).is_empty());

        assert!(runtime.shutdown().await);
    }

    #[tokio::test]
    async fn test_traced_request_is_stored() {
        let (runtime, store) = started();

        runtime
            .tracer()
            .trace("/api.v1.WorkoutService/GetWorkout")
            .end(200)
            .await;

        eventually(|| !store.traces().is_empty()).await;

        let traces = store.traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].request, "/api.v1.WorkoutService/GetWorkout");
        assert_eq!(traces[0].status_code, 200);

        assert!(runtime.shutdown().await);
    }

    #[tokio::test]
    async fn test_missing_comment_leaves_store_untouched() {
        let (runtime, store) = started();
        let (owner, author) = (Uuid::new_v4(), Uuid::new_v4());
        let workout = store.insert_workout(owner);
        let comment = store.insert_comment(workout, author);

        runtime
            .bus()
            .emit(WorkoutCommentPosted {
                comment_id: Uuid::new_v4(),
            })
            .await;
        // A later comment on the same topic is still handled.
        runtime
            .bus()
            .emit(WorkoutCommentPosted {
                comment_id: comment,
            })
            .await;

        eventually(|| !store.notifications_for(owner).is_empty()).await;
        assert!(runtime.shutdown().await);
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.notifications_for(owner)[0].payload.actor_id, author);
    }

    #[tokio::test]
    async fn test_events_after_shutdown_are_dropped() {
        let (runtime, store) = started();
        assert!(runtime.shutdown().await);

        runtime
            .bus()
            .emit(UserFollowed {
                follower_id: Uuid::new_v4(),
                followee_id: Uuid::new_v4(),
            })
            .await;

        sleep(Duration::from_millis(50)).await;
        assert!(store.notifications().is_empty());
        for topic in [
            topics::USER_FOLLOWED,
            topics::REQUEST_TRACED,
            topics::WORKOUT_COMMENT_POSTED,
        ] {
            assert_eq!(runtime.bus().topic_state(topic), TopicState::Terminated);
        }
    }
}
