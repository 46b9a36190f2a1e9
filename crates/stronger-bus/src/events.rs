//! # Topics and Events
//!
//! A [`Topic`] names one channel on the bus. The dispatcher itself is
//! payload-agnostic; the application's closed set of events lives in
//! [`NotifyEvent`], with one well-known topic per variant.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique string identifier of a topic.
///
/// Cheap to clone; compares, orders and hashes as its string. Well-known
/// names from [`topics`] are held without allocating.
#[derive(Clone)]
pub struct Topic(Name);

#[derive(Clone)]
enum Name {
    Static(&'static str),
    Shared(Arc<str>),
}

impl Topic {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Name::Shared(Arc::from(name.as_ref())))
    }

    /// Topic for a name with static lifetime, such as the ones in [`topics`].
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Name::Static(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Name::Static(name) => name,
            Name::Shared(name) => name,
        }
    }
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Topic {}

impl PartialOrd for Topic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Topic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

// Must agree with `Borrow<str>` so registry lookups by `&str` work.
impl Hash for Topic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Topic").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(Name::Shared(Arc::from(name)))
    }
}

impl From<&Topic> for Topic {
    fn from(topic: &Topic) -> Self {
        topic.clone()
    }
}

/// Topic names for [`NotifyEvent`] variants.
pub mod topics {
    pub const USER_FOLLOWED: &str = "user.followed";
    pub const REQUEST_TRACED: &str = "request.traced";
    pub const WORKOUT_COMMENT_POSTED: &str = "workout.comment_posted";
}

/// A user started following another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFollowed {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
}

/// An RPC finished; one row per request goes to the trace table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTraced {
    pub request: String,
    pub duration_ms: u64,
    pub status_code: u16,
}

/// A comment was posted on a workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutCommentPosted {
    pub comment_id: Uuid,
}

/// Every event the application publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotifyEvent {
    UserFollowed(UserFollowed),
    RequestTraced(RequestTraced),
    WorkoutCommentPosted(WorkoutCommentPosted),
}

impl NotifyEvent {
    /// Topic name this variant is published on.
    #[must_use]
    pub fn topic_name(&self) -> &'static str {
        match self {
            NotifyEvent::UserFollowed(_) => topics::USER_FOLLOWED,
            NotifyEvent::RequestTraced(_) => topics::REQUEST_TRACED,
            NotifyEvent::WorkoutCommentPosted(_) => topics::WORKOUT_COMMENT_POSTED,
        }
    }

    #[must_use]
    pub fn topic(&self) -> Topic {
        Topic::from_static(self.topic_name())
    }
}

impl From<UserFollowed> for NotifyEvent {
    fn from(payload: UserFollowed) -> Self {
        NotifyEvent::UserFollowed(payload)
    }
}

impl From<RequestTraced> for NotifyEvent {
    fn from(payload: RequestTraced) -> Self {
        NotifyEvent::RequestTraced(payload)
    }
}

impl From<WorkoutCommentPosted> for NotifyEvent {
    fn from(payload: WorkoutCommentPosted) -> Self {
        NotifyEvent::WorkoutCommentPosted(payload)
    }
}

/// A payload did not have the shape its handler expects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected event: expected {expected}, found {found}")]
    UnexpectedEvent {
        expected: &'static str,
        found: &'static str,
    },
}

macro_rules! impl_decode {
    ($variant:ident, $topic:expr) => {
        impl TryFrom<NotifyEvent> for $variant {
            type Error = DecodeError;

            fn try_from(event: NotifyEvent) -> Result<Self, Self::Error> {
                match event {
                    NotifyEvent::$variant(payload) => Ok(payload),
                    other => Err(DecodeError::UnexpectedEvent {
                        expected: $topic,
                        found: other.topic_name(),
                    }),
                }
            }
        }
    };
}

impl_decode!(UserFollowed, topics::USER_FOLLOWED);
impl_decode!(RequestTraced, topics::REQUEST_TRACED);
impl_decode!(WorkoutCommentPosted, topics::WORKOUT_COMMENT_POSTED);
