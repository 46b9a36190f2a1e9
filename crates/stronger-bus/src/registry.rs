//! # Topic Registry
//!
//! Maps each topic to its channel sender, its handler, and its worker pool.
//! The whole map sits behind one reader/writer lock owned by the bus:
//! publishers and workers read, `subscribe` and `stop` write.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::{PublishPolicy, TopicConfig};
use crate::events::Topic;
use crate::subscriber::Handler;

/// Lifecycle of a single topic.
///
/// `Unregistered -> Active -> Draining -> Terminated`, never back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicState {
    /// Nobody subscribed.
    Unregistered,
    /// Channel open, workers running.
    Active,
    /// Channel closed, workers still consuming buffered payloads.
    Draining,
    /// Channel closed and every worker exited.
    Terminated,
}

/// Number of workers of a topic that have not exited yet.
pub(crate) type LiveCount = Arc<watch::Sender<usize>>;

pub(crate) struct TopicEntry<E: Send + 'static> {
    /// `None` once the channel has been closed.
    sender: Option<mpsc::Sender<E>>,
    /// Flips to `true` on close; wakes publishers parked on a full channel.
    closed: watch::Sender<bool>,
    handler: Arc<dyn Handler<E>>,
    config: TopicConfig,
    live_workers: LiveCount,
    workers: Vec<JoinHandle<()>>,
}

impl<E: Send + 'static> TopicEntry<E> {
    pub(crate) fn new(
        sender: mpsc::Sender<E>,
        handler: Arc<dyn Handler<E>>,
        config: TopicConfig,
        live_workers: LiveCount,
        workers: Vec<JoinHandle<()>>,
    ) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            sender: Some(sender),
            closed,
            handler,
            config,
            live_workers,
            workers,
        }
    }

    fn state(&self) -> TopicState {
        if self.sender.is_some() {
            TopicState::Active
        } else if *self.live_workers.borrow() > 0 {
            TopicState::Draining
        } else {
            TopicState::Terminated
        }
    }
}

/// Result of resolving a topic for publishing.
pub(crate) enum Route<E> {
    Open {
        sender: mpsc::Sender<E>,
        policy: PublishPolicy,
        closed: watch::Receiver<bool>,
    },
    Closed,
    Missing,
}

pub(crate) struct TopicRegistry<E: Send + 'static> {
    topics: HashMap<Topic, TopicEntry<E>>,
    stopped: bool,
}

impl<E: Send + 'static> TopicRegistry<E> {
    pub(crate) fn new() -> Self {
        Self {
            topics: HashMap::new(),
            stopped: false,
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn contains(&self, topic: &Topic) -> bool {
        self.topics.contains_key(topic)
    }

    /// Bind a freshly started topic. Caller has checked `contains` under the
    /// same write guard.
    pub(crate) fn insert(&mut self, topic: Topic, entry: TopicEntry<E>) {
        self.topics.insert(topic, entry);
    }

    pub(crate) fn route(&self, topic: &str) -> Route<E> {
        match self.topics.get(topic) {
            None => Route::Missing,
            Some(entry) => match &entry.sender {
                Some(sender) => Route::Open {
                    sender: sender.clone(),
                    policy: entry.config.publish_policy,
                    closed: entry.closed.subscribe(),
                },
                None => Route::Closed,
            },
        }
    }

    pub(crate) fn handler(&self, topic: &str) -> Option<Arc<dyn Handler<E>>> {
        self.topics.get(topic).map(|entry| Arc::clone(&entry.handler))
    }

    pub(crate) fn state(&self, topic: &str) -> TopicState {
        self.topics
            .get(topic)
            .map_or(TopicState::Unregistered, TopicEntry::state)
    }

    pub(crate) fn config(&self, topic: &str) -> Option<TopicConfig> {
        self.topics.get(topic).map(|entry| entry.config)
    }

    pub(crate) fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.topics.keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Drop every registry-held sender. Returns the topics closed by this
    /// call; a second call closes nothing.
    pub(crate) fn close_all(&mut self) -> Vec<Topic> {
        self.stopped = true;
        self.topics
            .iter_mut()
            .filter_map(|(topic, entry)| {
                let sender = entry.sender.take()?;
                entry.closed.send_replace(true);
                drop(sender);
                Some(topic.clone())
            })
            .collect()
    }

    pub(crate) fn live_counts(&self) -> Vec<LiveCount> {
        self.topics
            .values()
            .map(|entry| Arc::clone(&entry.live_workers))
            .collect()
    }

    pub(crate) fn take_workers(&mut self) -> Vec<(Topic, JoinHandle<()>)> {
        self.topics
            .iter_mut()
            .flat_map(|(topic, entry)| {
                entry
                    .workers
                    .drain(..)
                    .map(move |handle| (topic.clone(), handle))
            })
            .collect()
    }
}
