//! # Handler Registry
//!
//! The topic -> handler table the runtime binds at startup.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     HandlerRegistry                      │
//! │                                                          │
//! │  user.followed          ──► FollowedUserHandler          │
//! │  request.traced         ──► RequestTracedHandler         │
//! │  workout.comment_posted ──► WorkoutCommentPostedHandler  │
//! └───────────────────────────────┬──────────────────────────┘
//!                                 │ subscribe_all
//!                                 ▼
//!                         Bus<NotifyEvent>
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use stronger_bus::{topics, Bus, Decoding, Handler, NotifyEvent, SubscriptionError, Topic, TopicConfig};
use tracing::info;

use crate::adapters::NotificationStore;
use crate::handlers::{FollowedUserHandler, RequestTracedHandler, WorkoutCommentPostedHandler};

pub struct HandlerRegistry {
    handlers: BTreeMap<Topic, Arc<dyn Handler<NotifyEvent>>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// The standard table: one handler per application event.
    pub fn standard(store: Arc<dyn NotificationStore>, handler_timeout: Duration) -> Self {
        let mut registry = Self::empty();
        registry.register(
            topics::USER_FOLLOWED,
            Arc::new(Decoding::new(FollowedUserHandler::new(
                Arc::clone(&store),
                handler_timeout,
            ))),
        );
        registry.register(
            topics::REQUEST_TRACED,
            Arc::new(Decoding::new(RequestTracedHandler::new(
                Arc::clone(&store),
                handler_timeout,
            ))),
        );
        registry.register(
            topics::WORKOUT_COMMENT_POSTED,
            Arc::new(Decoding::new(WorkoutCommentPostedHandler::new(
                store,
                handler_timeout,
            ))),
        );
        registry
    }

    /// Add or replace the handler for `topic`.
    pub fn register(&mut self, topic: impl Into<Topic>, handler: Arc<dyn Handler<NotifyEvent>>) {
        self.handlers.insert(topic.into(), handler);
    }

    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.handlers.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Subscribe every handler on `bus`, stopping at the first rejection.
    pub fn subscribe_all(
        &self,
        bus: &Bus<NotifyEvent>,
        config: TopicConfig,
    ) -> Result<(), SubscriptionError> {
        for (topic, handler) in &self.handlers {
            bus.subscribe_shared(topic, Arc::clone(handler), config)?;
        }
        info!(topics = self.handlers.len(), "All handlers subscribed");
        Ok(())
    }
}
