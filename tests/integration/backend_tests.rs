//! Backend client integration tests
//!
//! REST queries, function invocation and resource loading against a mock
//! server.

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{backend_for, config_for};
    use community_hub::storage::functions::CLEANUP_TEST_DATA;
    use community_hub::storage::remote::Query;
    use community_hub::storage::{MemoryStore, RestDataStore};
    use community_hub::{
        DataStore, FunctionsClient, HttpFetcher, Hub, HubError, LoaderService,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Selects send auth headers, the schema profile and the query string
    #[tokio::test]
    async fn test_select_sends_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/vendors"))
            .and(query_param("select", "id,status"))
            .and(query_param("status", "eq.pending"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "10"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(header("accept-profile", "public"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "status": "pending"},
                {"id": 2, "status": "pending"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let store = RestDataStore::new(&backend_for(&server.uri())).unwrap();
        let rows = store
            .select(
                &Query::new("vendors")
                    .columns(["id", "status"])
                    .eq("status", "pending")
                    .order_by("created_at", false)
                    .limit(10),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["id"], json!(2));
    }

    /// Count reads the total from Content-Range
    #[tokio::test]
    async fn test_count_reads_content_range() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/content_reports"))
            .and(query_param("status", "eq.pending"))
            .and(header("prefer", "count=exact"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "0-24/57"))
            .mount(&server)
            .await;

        let store = RestDataStore::new(&backend_for(&server.uri())).unwrap();
        let count = store
            .count(&Query::new("content_reports").eq("status", "pending"))
            .await
            .unwrap();
        assert_eq!(count, 57);
    }

    /// A count response without Content-Range is an error, not zero
    #[tokio::test]
    async fn test_count_without_content_range() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let store = RestDataStore::new(&backend_for(&server.uri())).unwrap();
        let result = store.count(&Query::new("vendors")).await;
        assert!(matches!(result, Err(HubError::Remote { status: 200, .. })));
    }

    /// Single returns the one matching row or nothing
    #[tokio::test]
    async fn test_single() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", "eq.u1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "u1", "role": "admin"}])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", "eq.missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = RestDataStore::new(&backend_for(&server.uri())).unwrap();
        let row = store
            .single(&Query::new("profiles").eq("id", "u1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["role"], json!("admin"));

        let none = store
            .single(&Query::new("profiles").eq("id", "missing"))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    /// Error bodies map onto Remote with the server's message
    #[tokio::test]
    async fn test_error_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "42P01",
                "message": "relation \"public.nope\" does not exist"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store = RestDataStore::new(&backend_for(&server.uri())).unwrap();

        let err = store.select(&Query::new("nope")).await.unwrap_err();
        match &err {
            HubError::Remote { status, message } => {
                assert_eq!(*status, 404);
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.is_transient());

        let err = store.select(&Query::new("down")).await.unwrap_err();
        assert!(matches!(err, HubError::Remote { status: 503, .. }));
        assert!(err.is_transient());
    }

    /// A request that outlives the client timeout is a transient timeout
    #[tokio::test]
    async fn test_slow_backend_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/vendors"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", "*/1")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut backend = backend_for(&server.uri());
        backend.timeout_secs = 1;
        let store = RestDataStore::new(&backend).unwrap();

        let err = store.count(&Query::new("vendors")).await.unwrap_err();
        assert!(matches!(err, HubError::Timeout(_)), "got {:?}", err);
        assert!(err.is_transient());
    }

    /// Functions receive the JSON payload and return their JSON reply
    #[tokio::test]
    async fn test_invoke_function() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/send-digest"))
            .and(header("authorization", "Bearer anon-key"))
            .and(body_json(json!({"week": 12})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sent": 3})))
            .mount(&server)
            .await;

        let functions = FunctionsClient::new(&backend_for(&server.uri())).unwrap();
        let reply: Value = functions
            .invoke("send-digest", &json!({"week": 12}))
            .await
            .unwrap();
        assert_eq!(reply, json!({"sent": 3}));
    }

    /// Function failures carry the function name and its error message
    #[tokio::test]
    async fn test_invoke_function_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/broken"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "missing field week"})),
            )
            .mount(&server)
            .await;

        let functions = FunctionsClient::new(&backend_for(&server.uri())).unwrap();
        let err = functions
            .invoke::<_, Value>("broken", &json!({}))
            .await
            .unwrap_err();
        match err {
            HubError::Function { name, message } => {
                assert_eq!(name, "broken");
                assert_eq!(message, "missing field week");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Test data cleanup posts to its function and accepts an empty reply
    #[tokio::test]
    async fn test_cleanup_test_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/functions/v1/{}", CLEANUP_TEST_DATA)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let functions = FunctionsClient::new(&backend_for(&server.uri())).unwrap();
        let reply = functions.cleanup_test_data().await.unwrap();
        assert_eq!(reply, Value::Null);
    }

    /// Hub retries a transient function failure and records the attempts
    #[tokio::test]
    async fn test_hub_invoke_retries_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/flaky"))
            .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let hub = Hub::with_session_store(config_for(&server.uri()), Arc::new(MemoryStore::new()))
            .unwrap();
        let reply: Value = hub.invoke("flaky", &json!({})).await.unwrap();

        assert_eq!(reply, json!({"ok": true}));
        assert_eq!(hub.retry_tracker().attempt_count(), 1);
        assert!(!hub.retry_tracker().is_retrying());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    /// Hub gives up after the configured retries
    #[tokio::test]
    async fn test_hub_invoke_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4)
            .mount(&server)
            .await;

        let hub = Hub::with_session_store(config_for(&server.uri()), Arc::new(MemoryStore::new()))
            .unwrap();
        let result: community_hub::Result<Value> = hub.invoke("down", &json!({})).await;

        assert!(matches!(result, Err(HubError::Function { .. })));
        assert_eq!(hub.retry_tracker().attempt_count(), 3);
    }

    /// Concurrent loads of one resource hit the server once
    #[tokio::test]
    async fn test_loader_fetches_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/js/maps.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("window.maps = {};")
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.uri())
            .unwrap();
        let loader = Arc::new(LoaderService::new(fetcher));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load("js/maps.js").await })
            })
            .collect();

        for handle in handles {
            let script = handle.await.unwrap().unwrap();
            assert_eq!(script.as_str(), "window.maps = {};");
        }
        assert!(loader.is_loaded("js/maps.js"));

        // Served from the cache from here on.
        loader.load("js/maps.js").await.unwrap();
        server.verify().await;
    }

    /// A failed load is retried on the next call
    #[tokio::test]
    async fn test_loader_failure_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sdk.js"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sdk.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("sdk"))
            .mount(&server)
            .await;

        let loader = LoaderService::new(HttpFetcher::new(Duration::from_secs(5)).unwrap());
        let url = format!("{}/sdk.js", server.uri());

        assert!(loader.load(&url).await.is_err());
        assert!(!loader.is_loaded(&url));
        assert_eq!(loader.load(&url).await.unwrap().as_str(), "sdk");
    }
}
