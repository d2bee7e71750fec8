//! Badge counter integration tests
//!
//! Counters over the in-memory backend and over the REST store backed by a
//! mock server.

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{RowFactory, backend_for, memory_backend, session_for};
    use community_hub::core::counters::presets;
    use community_hub::storage::realtime::{ChangeEvent, ChangeKind};
    use community_hub::storage::remote::Query;
    use community_hub::storage::{ChangeFeed, DataStore, RestDataStore};
    use community_hub::{BadgeCounters, CounterState, CounterSynchronizer, UserRole};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_stream::StreamExt;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn wait_for(counter: &CounterSynchronizer, expected: u64) {
        let mut state = counter.watch();
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == CounterState::Ready(expected)),
        )
        .await
        .expect("timed out waiting for count")
        .unwrap();
    }

    /// All four admin badges follow inserts, updates and deletes
    #[tokio::test]
    async fn test_admin_badges_follow_changes() {
        let (store, feed) = memory_backend();
        store.insert("vendors", RowFactory::vendor("pending"));
        store.insert("vendors", RowFactory::vendor("approved"));
        store.insert("content_reports", RowFactory::report("pending"));
        store.insert("health_alerts", RowFactory::health_alert("resolved"));
        store.insert("contact_form_submissions", RowFactory::contact_submission("new"));

        let badges = BadgeCounters::start(
            &presets::all(),
            &session_for(UserRole::Owner),
            store.clone(),
            Arc::new(feed.clone()),
        )
        .await;
        badges.ready().await;
        assert_eq!(badges.total(), 3);
        assert_eq!(feed.active_subscriptions(), 4);

        store.insert("health_alerts", RowFactory::health_alert("open"));
        wait_for(badges.get(presets::HEALTH_ALERTS).unwrap(), 1).await;

        store.update(
            &Query::new("vendors").eq("status", "pending"),
            RowFactory::from_json(serde_json::json!({"status": "approved"})),
        );
        wait_for(badges.get(presets::PENDING_VENDORS).unwrap(), 0).await;

        store.delete(&Query::new("content_reports"));
        wait_for(badges.get(presets::MODERATION_QUEUE).unwrap(), 0).await;

        assert_eq!(badges.total(), 2);
        badges.stop().await;
        assert_eq!(feed.active_subscriptions(), 0);
    }

    /// Updates stream carries every transition
    #[tokio::test]
    async fn test_updates_stream() {
        let (store, feed) = memory_backend();
        let badges = BadgeCounters::start(
            &[presets::pending_vendors()],
            &session_for(UserRole::Admin),
            store.clone(),
            Arc::new(feed),
        )
        .await;
        badges.ready().await;

        let mut updates = badges.updates();
        store.insert("vendors", RowFactory::vendor("pending"));

        let seen = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some((name, state)) = updates.next().await {
                if state == CounterState::Ready(1) {
                    return name;
                }
            }
            String::new()
        })
        .await
        .unwrap();
        assert_eq!(seen, presets::PENDING_VENDORS);
        badges.stop().await;
    }

    /// Impersonating a non-staff role turns the admin badges off
    #[tokio::test]
    async fn test_impersonated_admin_sees_no_badges() {
        let (store, feed) = memory_backend();
        store.insert("vendors", RowFactory::vendor("pending"));

        let mut session = session_for(UserRole::Admin);
        session.effective_role = Some(UserRole::Caregiver);
        session.impersonating = true;

        let badges =
            BadgeCounters::start(&presets::all(), &session, store.clone(), Arc::new(feed.clone()))
                .await;
        badges.ready().await;

        assert_eq!(badges.total(), 0);
        assert_eq!(store.read_count(), 0);
        assert_eq!(feed.active_subscriptions(), 0);
    }

    /// Counter over the REST store re-counts on each notification
    #[tokio::test]
    async fn test_rest_counter_refetches_on_change() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/vendors"))
            .and(query_param("status", "eq.pending"))
            .and(header("prefer", "count=exact"))
            .and(header("apikey", "anon-key"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/4"))
            .expect(2)
            .mount(&server)
            .await;

        let store: Arc<dyn DataStore> =
            Arc::new(RestDataStore::new(&backend_for(&server.uri())).unwrap());
        let feed = community_hub::storage::MemoryChangeFeed::default();
        let counter = CounterSynchronizer::start(
            presets::pending_vendors(),
            &session_for(UserRole::Admin),
            store,
            Arc::new(feed.clone()) as Arc<dyn ChangeFeed>,
        )
        .await;
        assert_eq!(counter.ready().await, CounterState::Ready(4));

        let mut states = counter.watch();
        states.borrow_and_update();
        feed.publish(ChangeEvent::new(ChangeKind::Insert, "public", "vendors"));

        tokio::time::timeout(Duration::from_secs(5), async {
            // Loading, then ready again
            states.changed().await.unwrap();
            states.wait_for(|s| s.is_ready()).await.unwrap();
        })
        .await
        .unwrap();

        counter.stop().await;
        server.verify().await;
    }

    /// REST failures degrade the badge to zero
    #[tokio::test]
    async fn test_rest_failure_shows_zero() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/health_alerts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store: Arc<dyn DataStore> =
            Arc::new(RestDataStore::new(&backend_for(&server.uri())).unwrap());
        let counter = CounterSynchronizer::start(
            presets::health_alerts(),
            &session_for(UserRole::Admin),
            store,
            Arc::new(community_hub::storage::MemoryChangeFeed::default()),
        )
        .await;

        assert_eq!(counter.ready().await, CounterState::Ready(0));
        assert!(counter.is_active());
    }
}
