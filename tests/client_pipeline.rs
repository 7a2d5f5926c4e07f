//! End-to-end pipeline tests over real sockets and the default transport.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use tabfetch::{ClientConfig, ErrorKind, RequestClient, RequestOptions};

/// Config with fast backoff so retry tests stay quick.
fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 50;
    config
}

#[tokio::test]
async fn test_cold_then_warm_get_hits_backend_once() {
    let hits = Arc::new(AtomicU32::new(0));
    let addr = {
        let hits = Arc::clone(&hits);
        common::start_backend(move |_path| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (
                    200,
                    "application/json".to_string(),
                    r#"{"rows": 1}"#.to_string(),
                )
            }
        })
        .await
    };

    let client = RequestClient::new(test_config());
    let url = format!("http://{}/data.json", addr);

    let first = client.get(&url, RequestOptions::new()).await.unwrap();
    let second = client.get(&url, RequestOptions::new()).await.unwrap();

    assert!(!first.from_cache);
    assert_eq!(first.status, StatusCode::OK);
    assert!(second.from_cache);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(client.cache_stats().size, 1);
}

#[tokio::test]
async fn test_disabled_cache_hits_backend_every_time() {
    let hits = Arc::new(AtomicU32::new(0));
    let addr = {
        let hits = Arc::clone(&hits);
        common::start_backend(move |_path| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (200, "text/plain".to_string(), "ok".to_string())
            }
        })
        .await
    };

    let client = RequestClient::new(test_config());
    let url = format!("http://{}/data", addr);

    for _ in 0..2 {
        client
            .get(&url, RequestOptions::new().without_cache())
            .await
            .unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(client.cache_stats().size, 0);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_errors() {
    let hits = Arc::new(AtomicU32::new(0));
    let addr = {
        let hits = Arc::clone(&hits);
        common::start_backend(move |_path| {
            let hits = Arc::clone(&hits);
            async move {
                let count = hits.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    (503, "text/plain".to_string(), "unavailable".to_string())
                } else {
                    (200, "text/plain".to_string(), "recovered".to_string())
                }
            }
        })
        .await
    };

    let client = RequestClient::new(test_config());
    let url = format!("http://{}/flaky", addr);

    let response = client.get(&url, RequestOptions::new()).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_text(), Some("recovered"));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let hits = Arc::new(AtomicU32::new(0));
    let addr = {
        let hits = Arc::clone(&hits);
        common::start_backend(move |_path| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (404, "text/plain".to_string(), "missing".to_string())
            }
        })
        .await
    };

    let client = RequestClient::new(test_config());
    let url = format!("http://{}/absent", addr);

    let error = client.get(&url, RequestOptions::new()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Network);
    assert_eq!(error.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lru_eviction_across_distinct_urls() {
    let per_path = Arc::new(Mutex::new(HashMap::<String, u32>::new()));
    let addr = {
        let per_path = Arc::clone(&per_path);
        common::start_backend(move |path| {
            let per_path = Arc::clone(&per_path);
            async move {
                *per_path.lock().unwrap().entry(path).or_insert(0) += 1;
                (200, "text/plain".to_string(), "row".to_string())
            }
        })
        .await
    };

    let mut config = test_config();
    config.cache.max_entries = 2;
    let client = RequestClient::new(config);

    let url_a = format!("http://{}/a", addr);
    let url_b = format!("http://{}/b", addr);
    let url_c = format!("http://{}/c", addr);

    client.get(&url_a, RequestOptions::new()).await.unwrap();
    client.get(&url_b, RequestOptions::new()).await.unwrap();

    // Touch A so B becomes the LRU victim when C lands.
    assert!(client.get(&url_a, RequestOptions::new()).await.unwrap().from_cache);
    client.get(&url_c, RequestOptions::new()).await.unwrap();

    // B was evicted; A survived.
    assert!(!client.get(&url_b, RequestOptions::new()).await.unwrap().from_cache);
    assert!(client.get(&url_a, RequestOptions::new()).await.unwrap().from_cache);

    let counts = per_path.lock().unwrap();
    assert_eq!(counts.get("/a"), Some(&1));
    assert_eq!(counts.get("/b"), Some(&2));
    assert_eq!(counts.get("/c"), Some(&1));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let addr = common::start_backend(|_path| async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        (200, "text/plain".to_string(), "late".to_string())
    })
    .await;

    let client = RequestClient::new(test_config());
    let url = format!("http://{}/slow", addr);

    let error = client
        .get(
            &url,
            RequestOptions::new().with_timeout_ms(50).with_retry_limit(0),
        )
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_csv_body_decodes_as_text() {
    let addr = common::start_backend(|_path| async {
        (
            200,
            "text/csv".to_string(),
            "team,wins\nKC,14\n".to_string(),
        )
    })
    .await;

    let client = RequestClient::new(test_config());
    let url = format!("http://{}/stats.csv", addr);

    let response = client.get(&url, RequestOptions::new()).await.unwrap();

    assert_eq!(response.body.as_text(), Some("team,wins\nKC,14\n"));
    assert!(response.final_url.ends_with("/stats.csv"));
}
