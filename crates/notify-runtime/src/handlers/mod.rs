//! # Bus Handlers
//!
//! One handler per [`NotifyEvent`](stronger_bus::NotifyEvent) variant. Each
//! decodes its own payload (via [`Decoding`](stronger_bus::Decoding)), bounds
//! its store calls with a deadline, and reports failures as
//! [`HandlerError`] for the worker to log.

mod followed_user;
mod request_traced;
mod workout_comment;

pub use followed_user::FollowedUserHandler;
pub use request_traced::RequestTracedHandler;
pub use workout_comment::WorkoutCommentPostedHandler;

use std::future::Future;
use std::time::Duration;

use stronger_bus::HandlerError;

/// Run `work` with a deadline; the bus itself imposes none.
async fn with_deadline<T, F>(after: Duration, work: F) -> Result<T, HandlerError>
where
    F: Future<Output = Result<T, HandlerError>>,
{
    tokio::time::timeout(after, work)
        .await
        .unwrap_or(Err(HandlerError::Timeout { after }))
}
