//! # Delivery Scenarios
//!
//! Payloads published on a topic reach its handler exactly once, a panicking
//! handler only loses the payload it panicked on, and a topic accepts a
//! single handler.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::time::{sleep, timeout};

    use stronger_bus::{
        handler_fn, Bus, Decoding, HandlerError, NotifyEvent, RequestTraced, SubscriptionError,
        TopicConfig, TypedHandler, UserFollowed,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Poll `cond` until it holds or two seconds pass.
    async fn eventually(cond: impl Fn() -> bool) {
        timeout(Duration::from_secs(2), async {
            while !cond() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn recorder<T: Send + 'static>(
        seen: &Arc<Mutex<Vec<T>>>,
    ) -> impl stronger_bus::Handler<T> + 'static {
        let sink = Arc::clone(seen);
        handler_fn(move |payload: T| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(payload);
                Ok::<(), HandlerError>(())
            }
        })
    }

    // =============================================================================
    // EXACTLY-ONCE DELIVERY
    // =============================================================================

    #[tokio::test]
    async fn test_single_worker_counts_every_payload_in_order() {
        let bus = Bus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe_with(
            "test.count",
            recorder(&seen),
            TopicConfig::default().with_workers(1),
        )
        .unwrap();

        for n in 0..100u32 {
            bus.publish("test.count", n).await;
        }

        eventually(|| seen.lock().len() >= 100).await;
        sleep(Duration::from_millis(50)).await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 100);
        assert_eq!(*seen, (0..100).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_pool_delivers_each_payload_once() {
        let bus = Bus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("test.pool", recorder(&seen)).unwrap();

        for n in 0..500u32 {
            bus.publish("test.pool", n).await;
        }

        eventually(|| seen.lock().len() >= 500).await;
        sleep(Duration::from_millis(50)).await;

        let seen = seen.lock();
        let unique: HashSet<u32> = seen.iter().copied().collect();
        assert_eq!(seen.len(), 500);
        assert_eq!(unique.len(), 500);
    }

    #[tokio::test]
    async fn test_topics_are_independent() {
        let bus = Bus::new();
        let left = Arc::new(Mutex::new(Vec::new()));
        let right = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("left", recorder(&left)).unwrap();
        bus.subscribe("right", recorder(&right)).unwrap();

        bus.publish("left", "l1".to_string()).await;
        bus.publish("right", "r1".to_string()).await;
        bus.publish("left", "l2".to_string()).await;

        eventually(|| left.lock().len() == 2 && right.lock().len() == 1).await;

        let mut left = left.lock().clone();
        left.sort();
        assert_eq!(left, vec!["l1".to_string(), "l2".to_string()]);
        assert_eq!(right.lock().as_slice(), &["r1".to_string()]);
    }

    // =============================================================================
    // PANIC ISOLATION
    // =============================================================================

    #[tokio::test]
    async fn test_panicking_handler_loses_only_that_payload() {
        let bus = Bus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(
            "test.panic",
            handler_fn(move |payload: String| {
                let sink = Arc::clone(&sink);
                async move {
                    if payload == "bad" {
                        panic!("refusing {payload}");
                    }
                    sink.lock().push(payload);
                    Ok::<(), HandlerError>(())
                }
            }),
        )
        .unwrap();

        for payload in ["a", "bad", "c"] {
            bus.publish("test.panic", payload.to_string()).await;
        }

        eventually(|| seen.lock().len() >= 2).await;
        sleep(Duration::from_millis(50)).await;

        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen, vec!["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_single_worker_survives_repeated_panics() {
        let bus = Bus::new();
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&handled);
        bus.subscribe_with(
            "test.panic.single",
            handler_fn(move |n: u32| {
                let counter = Arc::clone(&counter);
                async move {
                    if n % 2 == 0 {
                        panic!("even payload {n}");
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), HandlerError>(())
                }
            }),
            TopicConfig::default().with_workers(1),
        )
        .unwrap();

        for n in 0..20u32 {
            bus.publish("test.panic.single", n).await;
        }

        eventually(|| handled.load(Ordering::SeqCst) >= 10).await;
        assert_eq!(handled.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_handler_error_does_not_stop_worker() {
        let bus = Bus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe_with(
            "test.errors",
            handler_fn(move |n: u32| {
                let sink = Arc::clone(&sink);
                async move {
                    if n == 1 {
                        return Err(HandlerError::Other("one is rejected".to_string()));
                    }
                    sink.lock().push(n);
                    Ok(())
                }
            }),
            TopicConfig::default().with_workers(1),
        )
        .unwrap();

        for n in 0..3u32 {
            bus.publish("test.errors", n).await;
        }

        eventually(|| seen.lock().len() >= 2).await;
        assert_eq!(seen.lock().as_slice(), &[0, 2]);
    }

    // =============================================================================
    // ONE HANDLER PER TOPIC
    // =============================================================================

    #[tokio::test]
    async fn test_second_subscribe_rejected_and_first_kept() {
        let bus = Bus::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        bus.subscribe(
            "x",
            handler_fn(move |_: u32| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), HandlerError>(())
                }
            }),
        )
        .unwrap();

        let counter = Arc::clone(&second);
        let err = bus
            .subscribe(
                "x",
                handler_fn(move |_: u32| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), HandlerError>(())
                    }
                }),
            )
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::AlreadySubscribed { .. }));
        assert_eq!(err.to_string(), "handler already exists: x");

        bus.publish("x", 1).await;

        eventually(|| first.load(Ordering::SeqCst) == 1).await;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    // =============================================================================
    // TYPED EVENTS
    // =============================================================================

    struct FollowCounter {
        count: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TypedHandler for FollowCounter {
        type Payload = UserFollowed;

        async fn handle_payload(&self, _: UserFollowed) -> Result<(), HandlerError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mismatched_event_is_rejected_at_decode() {
        let bus: Bus<NotifyEvent> = Bus::new();
        let handler = Arc::new(Decoding::new(FollowCounter {
            count: AtomicUsize::new(0),
        }));
        bus.subscribe_shared(
            stronger_bus::topics::USER_FOLLOWED,
            handler.clone(),
            TopicConfig::default().with_workers(1),
        )
        .unwrap();

        // Wrong payload on the right topic, then a correct one.
        bus.publish(
            stronger_bus::topics::USER_FOLLOWED,
            NotifyEvent::from(RequestTraced {
                request: "GET /healthz".to_string(),
                duration_ms: 1,
                status_code: 200,
            }),
        )
        .await;
        bus.emit(UserFollowed {
            follower_id: uuid::Uuid::new_v4(),
            followee_id: uuid::Uuid::new_v4(),
        })
        .await;

        eventually(|| handler.inner().count.load(Ordering::SeqCst) == 1).await;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(handler.inner().count.load(Ordering::SeqCst), 1);
    }
}
