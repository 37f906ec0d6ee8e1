//! Integration tests for mirroring delivered notifications.

#[path = "../helpers/mod.rs"]
mod helpers;

use anyhow::Result;
use helpers::{config_for, unreachable_url, with_mirror, FixedClock, TestRelay};
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn prowl_ok() -> MockServer {
    let prowl = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&prowl)
        .await;
    prowl
}

#[tokio::test]
async fn test_mirrors_delivered_notification() -> Result<()> {
    // Arrange
    let prowl = prowl_ok().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&store)
        .await;

    let config = with_mirror(config_for(&prowl), store.uri());
    // 1700000000 is 22:13:20 UTC, inside quiet hours there; at UTC-8 it is 14:13:20.
    let relay = TestRelay::start(config, FixedClock::at_unix(1_700_000_000, -8)).await?;

    // Act
    let status = relay.get("/MyApp/Deploy/Succeeded").await?;

    // Assert
    assert_eq!(status, 200);
    let requests = store.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body = String::from_utf8(requests[0].body.clone())?;
    let records: Vec<Value> = body
        .lines()
        .map(|line| serde_json::from_str(line))
        .collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["update"]["_id"], "1700000000_h1");
    assert_eq!(records[0]["update"]["_index"], "prowl");
    assert_eq!(records[1]["doc"]["application"], "MyApp");
    assert_eq!(records[1]["doc"]["event"], "Deploy");
    assert_eq!(records[1]["doc"]["description"], "Succeeded");
    assert_eq!(records[1]["doc"]["value"], 1);
    assert_eq!(records[1]["doc"]["timestamp"], "1700000000");
    assert_eq!(records[1]["doc"]["timestamp2"], "2023-11-14T14:13:20-08:00");
    assert_eq!(records[1]["doc_as_upsert"], true);

    relay.shutdown().await
}

#[tokio::test]
async fn test_store_errors_do_not_change_response() -> Result<()> {
    let prowl = prowl_ok().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&store)
        .await;

    let config = with_mirror(config_for(&prowl), store.uri());
    let relay = TestRelay::start(config, FixedClock::at(12, 0)).await?;

    let status = relay.get("/MyApp/Deploy/Succeeded").await?;

    assert_eq!(status, 200);
    let errors = relay.event_log.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("boom"), "unexpected log: {}", errors[0]);

    relay.shutdown().await
}

#[tokio::test]
async fn test_unreachable_store_is_logged_only() -> Result<()> {
    let prowl = prowl_ok().await;
    let config = with_mirror(config_for(&prowl), unreachable_url());
    let relay = TestRelay::start(config, FixedClock::at(12, 0)).await?;

    let status = relay.get("/MyApp/Deploy/Succeeded").await?;

    assert_eq!(status, 200);
    let errors = relay.event_log.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Unable to mirror notification"));

    relay.shutdown().await
}

#[tokio::test]
async fn test_no_store_means_no_post() -> Result<()> {
    let prowl = prowl_ok().await;
    let relay = TestRelay::start(config_for(&prowl), FixedClock::at(12, 0)).await?;

    let status = relay.get("/MyApp/Deploy/Succeeded").await?;

    assert_eq!(status, 200);
    let requests = prowl.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
    assert!(relay.event_log.errors().is_empty());
    assert!(relay.event_log.infos.lock().unwrap().is_empty());

    relay.shutdown().await
}

#[tokio::test]
async fn test_failed_delivery_is_not_mirrored() -> Result<()> {
    let prowl = MockServer::start().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;

    let mut config = with_mirror(config_for(&prowl), store.uri());
    config.prowl_url = unreachable_url();
    let relay = TestRelay::start(config, FixedClock::at(12, 0)).await?;

    let status = relay.get("/MyApp/Deploy/Succeeded").await?;

    assert_eq!(status, 500);
    assert!(store.received_requests().await.unwrap().is_empty());

    relay.shutdown().await
}

#[tokio::test]
async fn test_suppressed_notification_is_not_mirrored() -> Result<()> {
    let prowl = prowl_ok().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;

    let config = with_mirror(config_for(&prowl), store.uri());
    let relay = TestRelay::start(config, FixedClock::at(22, 0)).await?;

    let status = relay.get("/MyApp/Deploy/Succeeded").await?;

    assert_eq!(status, 204);
    assert!(store.received_requests().await.unwrap().is_empty());

    relay.shutdown().await
}
