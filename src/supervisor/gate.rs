//! The completion gate.
//!
//! A unit with dependencies may not start until every named dependency has
//! published a successful completion. This is the only ordering primitive in
//! the model: a one-time barrier, not a recurring lock.
//!
//! The composition this replaces set no bound on how long dependents wait;
//! here the wait is bounded by a configurable timeout (zero disables it).

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::supervisor::unit::CompletionState;

/// Result of waiting on a unit's dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// All dependencies completed successfully.
    Ready,
    /// The named dependency finished without success; the dependent must
    /// never start.
    DependencyFailed(String),
    /// The named dependency did not finish within the allowed wait.
    TimedOut(String),
}

/// Wait until every dependency has published a terminal completion state.
///
/// `timeout` bounds the total wait across all dependencies; `None` waits
/// forever.
pub async fn wait_for_dependencies(
    deps: Vec<(String, watch::Receiver<CompletionState>)>,
    timeout: Option<Duration>,
) -> GateOutcome {
    let deadline = timeout.map(|t| Instant::now() + t);

    for (name, mut rx) in deps {
        let wait = rx.wait_for(|state| *state != CompletionState::Pending);

        let result = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, wait).await {
                Ok(result) => result,
                Err(_) => return GateOutcome::TimedOut(name),
            },
            None => wait.await,
        };

        match result {
            Ok(state) => {
                if *state != CompletionState::Succeeded {
                    return GateOutcome::DependencyFailed(name);
                }
            }
            // Publisher gone without a terminal state: treat as failed.
            Err(_) => return GateOutcome::DependencyFailed(name),
        }
    }

    GateOutcome::Ready
}
