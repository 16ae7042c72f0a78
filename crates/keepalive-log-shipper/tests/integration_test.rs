//! End-to-end tests against a mock aggregation endpoint.
//!
//! These exercise the full pipeline with the real HTTP transport:
//! enqueue, self-starting drain task, batching, bearer authentication,
//! and self-termination.

use keepalive_log_shipper::{LogDraft, Severity, Shipper, ShipperConfig};
use mockito::Server;
use tokio::time::{sleep, timeout, Duration};

fn shipper_for(server: &Server) -> Shipper {
    let config = ShipperConfig::new(
        true,
        "integration-token",
        format!("{}/v0/appXXXX/Logs", server.url()),
        "integration-device",
    );
    Shipper::with_http_transport(config)
}

#[tokio::test]
async fn shipper_posts_single_batch_with_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v0/appXXXX/Logs")
        .match_header("Authorization", "Bearer integration-token")
        .match_header("Content-Type", "application/json")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"records":[{"fields":{"Device":"integration-device"}}]}"#.to_string(),
        ))
        .with_status(200)
        .create_async()
        .await;

    let shipper = shipper_for(&server);
    shipper
        .enqueue(
            LogDraft::new(Severity::Warn, "app not running, restarting")
                .with_tag("AppWatcher"),
        )
        .expect("shipping enabled");

    let delivery = async {
        while !mock.matched_async().await {
            sleep(Duration::from_millis(50)).await;
        }
    };
    timeout(Duration::from_secs(5), delivery)
        .await
        .expect("timed out waiting for batch delivery");

    mock.assert_async().await;
}

#[tokio::test]
async fn shipper_splits_burst_into_capped_batches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v0/appXXXX/Logs")
        .match_header("Authorization", "Bearer integration-token")
        .with_status(200)
        .expect(3)
        .create_async()
        .await;

    let shipper = shipper_for(&server);
    // 23 events: 10 + 10 + 3, all within one cycle's request budget.
    for i in 0..23 {
        shipper
            .enqueue(LogDraft::new(Severity::Info, format!("burst event {i}")))
            .expect("shipping enabled");
    }

    let delivery = async {
        while !mock.matched_async().await {
            sleep(Duration::from_millis(50)).await;
        }
    };
    timeout(Duration::from_secs(5), delivery)
        .await
        .expect("timed out waiting for burst delivery");

    mock.assert_async().await;

    // The drain task is still pacing out its inter-send delays when the
    // last POST lands; wait for it to observe the empty queue and
    // release the activity flag.
    let termination = async {
        while shipper.is_active() {
            sleep(Duration::from_millis(50)).await;
        }
    };
    timeout(Duration::from_secs(5), termination)
        .await
        .expect("timed out waiting for task self-termination");
}

#[tokio::test]
async fn rejected_batch_is_dropped_without_retry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v0/appXXXX/Logs")
        .with_status(429)
        .expect(1)
        .create_async()
        .await;

    let shipper = shipper_for(&server);
    shipper
        .enqueue(LogDraft::new(Severity::Error, "doomed record"))
        .expect("shipping enabled");

    let delivery = async {
        while !mock.matched_async().await {
            sleep(Duration::from_millis(50)).await;
        }
    };
    timeout(Duration::from_secs(5), delivery)
        .await
        .expect("timed out waiting for rejected send");

    // Give any (erroneous) retry a chance to show up, then verify the
    // endpoint saw exactly one request.
    sleep(Duration::from_secs(2)).await;
    mock.assert_async().await;
    assert!(!shipper.is_active());
}
