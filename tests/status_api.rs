//! Status API tests.

use std::sync::Arc;
use std::time::Duration;

use stackrun::config::schema::RestartPolicy;
use stackrun::lifecycle::{startup, Shutdown};
use stackrun::supervisor::UnitState;

mod common;

#[tokio::test]
async fn status_endpoints_report_unit_states() {
    let init = common::shell("init", "true");
    let mut sleeper = common::shell("sleeper", "sleep 30");
    sleeper.restart = RestartPolicy::UnlessStopped;
    sleeper.depends_on = vec!["init".to_string()];
    sleeper.image = Some("example/sleeper:1".to_string());

    let mut config = common::stack(vec![init, sleeper]);
    config.name = "status-test".to_string();
    config.status.enabled = true;
    config.status.bind_address = "127.0.0.1:27171".to_string();

    let shutdown = Arc::new(Shutdown::new());
    let task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { startup::run_stack(&config, shutdown).await })
    };

    // Give the stack time to come up.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let base = "http://127.0.0.1:27171";

    let stack: serde_json::Value = client
        .get(format!("{}/stack", base))
        .send()
        .await
        .expect("status API unreachable")
        .json()
        .await
        .unwrap();
    assert_eq!(stack["stack"], "status-test");
    assert_eq!(stack["units"]["running"], 1);
    assert_eq!(stack["units"]["completed"], 1);

    let services: serde_json::Value = client
        .get(format!("{}/services", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = services
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["init", "sleeper"]);

    let sleeper_status: serde_json::Value = client
        .get(format!("{}/services/sleeper", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sleeper_status["state"], UnitState::Running.as_str());
    assert_eq!(sleeper_status["image"], "example/sleeper:1");

    let missing = client
        .get(format!("{}/services/nope", base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    shutdown.trigger();
    task.await.unwrap().unwrap();
}
