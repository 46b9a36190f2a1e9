//! # Handlers and Subscriptions
//!
//! Defines the consuming side of the bus: the [`Handler`] contract a topic is
//! bound to, and the errors `subscribe` and handlers can produce.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::{DecodeError, NotifyEvent, Topic};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// A handler is already bound to the topic.
    #[error("handler already exists: {topic}")]
    AlreadySubscribed { topic: Topic },

    /// Worker count, capacity, or publish timeout is unusable.
    #[error("invalid config for topic {topic}: {reason}")]
    InvalidConfig { topic: Topic, reason: &'static str },

    /// The bus was stopped; topics cannot be (re)activated.
    #[error("bus stopped, cannot subscribe to {topic}")]
    Stopped { topic: Topic },

    /// Workers need a tokio runtime to be spawned on.
    #[error("subscribe must be called from within a tokio runtime")]
    NoRuntime,
}

/// Failure reported by a handler for one payload.
///
/// The worker logs it and moves on; nothing is retried.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("decode payload: {0}")]
    Decode(#[from] DecodeError),

    #[error("handler timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("store: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}

/// Consumer bound to one topic, invoked once per payload.
///
/// Implementations own their error handling: decode the payload, do the
/// work, and return `Err` for anything that went wrong. A panic is caught by
/// the worker but is not the intended failure path.
#[async_trait]
pub trait Handler<E: Send + 'static>: Send + Sync {
    async fn handle(&self, payload: E) -> Result<(), HandlerError>;
}

/// Handler built from an async closure. See [`handler_fn`].
pub struct HandlerFn<F>(F);

/// Wrap an async closure as a [`Handler`].
///
/// ```rust,ignore
/// bus.subscribe("user.followed", handler_fn(|p: String| async move {
///     tracing::info!(%p, "got one");
///     Ok(())
/// }))?;
/// ```
pub fn handler_fn<E, F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(E) -> Fut,
    Fut: Future<Output = Result<(), HandlerError>>,
{
    HandlerFn(f)
}

#[async_trait]
impl<E, F, Fut> Handler<E> for HandlerFn<F>
where
    E: Send + 'static,
    F: Fn(E) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, payload: E) -> Result<(), HandlerError> {
        (self.0)(payload).await
    }
}

/// Handler for exactly one [`NotifyEvent`] variant.
///
/// Wrap with [`Decoding`] to bind it on a `Bus<NotifyEvent>`; the adapter
/// performs the one checked conversion at the boundary.
#[async_trait]
pub trait TypedHandler: Send + Sync {
    type Payload: TryFrom<NotifyEvent, Error = DecodeError> + Send + 'static;

    async fn handle_payload(&self, payload: Self::Payload) -> Result<(), HandlerError>;
}

/// Adapts a [`TypedHandler`] to `Handler<NotifyEvent>`.
pub struct Decoding<H>(pub H);

impl<H> Decoding<H> {
    pub fn new(handler: H) -> Self {
        Self(handler)
    }

    pub fn inner(&self) -> &H {
        &self.0
    }
}

#[async_trait]
impl<H: TypedHandler> Handler<NotifyEvent> for Decoding<H> {
    async fn handle(&self, event: NotifyEvent) -> Result<(), HandlerError> {
        let payload = H::Payload::try_from(event)?;
        self.0.handle_payload(payload).await
    }
}
