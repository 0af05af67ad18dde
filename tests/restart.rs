//! Restart policy tests.

use std::time::Duration;

use stackrun::config::schema::RestartPolicy;
use stackrun::supervisor::UnitState;

mod common;

#[tokio::test]
async fn on_failure_restarts_until_success() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("attempted");

    // Fails on the first run, succeeds on the second.
    let mut svc = common::shell("svc", r#"[ -f "$MARKER" ] && exit 0; touch "$MARKER"; exit 1"#);
    svc.restart = RestartPolicy::OnFailure;
    svc.env
        .insert("MARKER".to_string(), marker.display().to_string());

    let harness = common::start(common::stack(vec![svc]));
    harness.handle.await.unwrap().unwrap();

    let unit = harness.registry.get("svc").unwrap();
    assert_eq!(unit.state(), UnitState::Completed);
    assert_eq!(unit.restarts(), 1);
    assert_eq!(unit.details().exit_code, Some(0));
}

#[tokio::test]
async fn unless_stopped_restarts_even_after_clean_exit() {
    let mut svc = common::shell("svc", "true");
    svc.restart = RestartPolicy::UnlessStopped;

    let harness = common::start(common::stack(vec![svc]));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if harness.registry.get("svc").unwrap().restarts() >= 2 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "unit should keep restarting"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    harness.shutdown.trigger();
    let _ = harness.handle.await.unwrap();
    assert_eq!(
        harness.registry.get("svc").unwrap().state(),
        UnitState::Stopped
    );
}

#[tokio::test]
async fn one_shot_failure_is_terminal() {
    let svc = common::shell("svc", "exit 7");

    let harness = common::start(common::stack(vec![svc]));
    let result = harness.handle.await.unwrap();

    let unit = harness.registry.get("svc").unwrap();
    assert_eq!(unit.state(), UnitState::Failed);
    assert_eq!(unit.restarts(), 0);
    assert_eq!(unit.details().exit_code, Some(7));
    assert!(result.is_err());
}

#[tokio::test]
async fn stop_request_terminates_without_restart() {
    let mut svc = common::shell("svc", "sleep 30");
    svc.restart = RestartPolicy::UnlessStopped;

    let harness = common::start(common::stack(vec![svc]));

    assert!(
        common::wait_for_state(
            &harness.registry,
            "svc",
            UnitState::Running,
            Duration::from_secs(5)
        )
        .await
    );

    harness.shutdown.trigger();
    harness.handle.await.unwrap().unwrap();

    let unit = harness.registry.get("svc").unwrap();
    assert_eq!(unit.state(), UnitState::Stopped);
    assert_eq!(unit.restarts(), 0);
}

#[tokio::test]
async fn stack_settles_to_same_states_across_activations() {
    // The same definition reaches the same lifecycle states on every
    // activation, as a host restart would.
    for _ in 0..2 {
        let init = common::shell("init", "true");
        let mut svc = common::shell("svc", "sleep 30");
        svc.restart = RestartPolicy::UnlessStopped;
        svc.depends_on = vec!["init".to_string()];

        let harness = common::start(common::stack(vec![init, svc]));

        assert!(
            common::wait_for_state(
                &harness.registry,
                "svc",
                UnitState::Running,
                Duration::from_secs(5)
            )
            .await
        );
        assert_eq!(
            harness.registry.get("init").unwrap().state(),
            UnitState::Completed
        );

        harness.shutdown.trigger();
        harness.handle.await.unwrap().unwrap();
    }
}
