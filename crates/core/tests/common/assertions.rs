//! Event collection and assertion helpers.

use cc_protocol::{BulkAction, Event, OpOutcome};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Receive events until one matches `pred` or `timeout` elapses.
///
/// Returns every event received, the matching one last. Panics on timeout.
#[allow(dead_code)]
pub async fn recv_until<F>(rx: &mut UnboundedReceiver<Event>, timeout: Duration, mut pred: F) -> Vec<Event>
where
    F: FnMut(&Event) -> bool,
{
    let mut seen = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) => {
                let done = pred(&event);
                seen.push(event);
                if done {
                    return seen;
                }
            }
            Ok(None) => panic!("event channel closed; received: {seen:?}"),
            Err(_) => panic!("timed out waiting for event; received: {seen:?}"),
        }
    }
}

/// Outcomes of the first `BulkCompleted` event for `action`.
#[allow(dead_code)]
pub fn bulk_outcomes(events: &[Event], action: BulkAction) -> Option<Vec<OpOutcome>> {
    events.iter().find_map(|e| match e {
        Event::BulkCompleted { action: a, outcomes } if *a == action => Some(outcomes.clone()),
        _ => None,
    })
}

/// The first single-operation outcome for `name`.
#[allow(dead_code)]
pub fn outcome_for<'a>(events: &'a [Event], name: &str) -> Option<&'a OpOutcome> {
    events.iter().find_map(|e| match e {
        Event::OperationCompleted { outcome } if outcome.name == name => Some(outcome),
        _ => None,
    })
}

/// Whether any event is a `ServerExited` for `name`.
#[allow(dead_code)]
pub fn has_exit(events: &[Event], name: &str) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::ServerExited { name: n, .. } if n == name))
}

/// Assert that every outcome succeeded.
#[allow(dead_code)]
pub fn assert_all_succeeded(outcomes: &[OpOutcome]) {
    for outcome in outcomes {
        assert!(outcome.success, "{} failed: {}", outcome.name, outcome.message);
    }
}
