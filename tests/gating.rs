//! Ordering tests: the completion gate between one-shot and long-running
//! units.

use std::time::Duration;

use stackrun::config::schema::{RestartPolicy, RunSpec, ServiceConfig, SubpathConfig};
use stackrun::supervisor::UnitState;

mod common;

#[tokio::test]
async fn dependents_never_run_before_initializer_completes() {
    let init = common::shell("init", "sleep 0.3");
    let mut svc = common::shell("svc", "sleep 30");
    svc.depends_on = vec!["init".to_string()];

    let harness = common::start(common::stack(vec![init, svc]));

    // While the initializer has not completed, the dependent must not have
    // reached running.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let init_state = harness.registry.get("init").unwrap().state();
        let svc_state = harness.registry.get("svc").unwrap().state();

        if init_state == UnitState::Completed {
            break;
        }
        assert!(
            matches!(svc_state, UnitState::Pending | UnitState::Waiting),
            "dependent reached {:?} before initializer completed",
            svc_state
        );
        assert!(
            tokio::time::Instant::now() < deadline,
            "initializer did not complete"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(
        common::wait_for_state(
            &harness.registry,
            "svc",
            UnitState::Running,
            Duration::from_secs(5)
        )
        .await,
        "dependent should run after initializer completes"
    );

    harness.shutdown.trigger();
    let _ = harness.handle.await.unwrap();
}

#[tokio::test]
async fn failed_initializer_leaves_dependents_unstarted() {
    let init = common::shell("init", "exit 1");
    let mut proxy = common::shell("proxy", "sleep 30");
    proxy.depends_on = vec!["init".to_string()];
    let mut sync = common::shell("sync", "sleep 30");
    sync.depends_on = vec!["init".to_string()];

    let harness = common::start(common::stack(vec![init, proxy, sync]));
    let result = harness.handle.await.unwrap();

    assert_eq!(
        harness.registry.get("init").unwrap().state(),
        UnitState::Failed
    );
    for name in ["proxy", "sync"] {
        let unit = harness.registry.get(name).unwrap();
        assert_eq!(unit.state(), UnitState::Blocked, "{} must stay unstarted", name);
        assert!(unit.details().run_id.is_none(), "{} must never have run", name);
    }

    let err = result.unwrap_err();
    assert!(err.to_string().contains("init"));
}

#[tokio::test]
async fn gated_service_sees_prepared_volume_and_env() {
    let dir = tempfile::tempdir().unwrap();

    let init = ServiceConfig {
        name: "init".to_string(),
        image: None,
        run: RunSpec::PrepareVolume,
        env: Default::default(),
        ports: Vec::new(),
        restart: RestartPolicy::No,
        depends_on: Vec::new(),
    };

    let mut svc = common::shell("svc", r#"test -d "$DATA_DIR""#);
    svc.depends_on = vec!["init".to_string()];
    svc.env.insert(
        "DATA_DIR".to_string(),
        dir.path().join("sync-data").display().to_string(),
    );

    let mut config = common::stack(vec![init, svc]);
    config.volume.root = dir.path().to_path_buf();
    config.volume.subpaths = vec![SubpathConfig::new("sync-data")];

    let harness = common::start(config);
    harness.handle.await.unwrap().unwrap();

    assert_eq!(
        harness.registry.get("svc").unwrap().state(),
        UnitState::Completed,
        "service must see the directory the initializer created"
    );
}

#[tokio::test]
async fn hung_initializer_blocks_dependent_after_timeout() {
    let init = common::shell("init", "sleep 30");
    let mut svc = common::shell("svc", "true");
    svc.depends_on = vec!["init".to_string()];

    let mut config = common::stack(vec![init, svc]);
    config.supervisor.gate_timeout_secs = 1;

    let harness = common::start(config);

    assert!(
        common::wait_for_state(
            &harness.registry,
            "svc",
            UnitState::Blocked,
            Duration::from_secs(5)
        )
        .await,
        "dependent should be blocked once the gate times out"
    );

    harness.shutdown.trigger();
    let _ = harness.handle.await.unwrap();
}
