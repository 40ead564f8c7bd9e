use super::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn no_wait() -> WaitPolicy {
    WaitPolicy {
        interval: Duration::ZERO,
        timeout: None,
    }
}

/// Describe function replaying `statuses` and counting polls.
fn scripted(
    statuses: &[StreamStatus],
) -> (Mutex<VecDeque<StreamStatus>>, AtomicUsize) {
    (
        Mutex::new(statuses.iter().cloned().collect()),
        AtomicUsize::new(0),
    )
}

async fn run_scripted(
    stream_name: &str,
    statuses: &[StreamStatus],
    policy: &WaitPolicy,
) -> (Result<ActiveStream, ReadinessError>, usize) {
    let (queue, polls) = scripted(statuses);
    let describe_fn = || {
        polls.fetch_add(1, Ordering::SeqCst);
        let next = queue.lock().unwrap().pop_front();
        async move {
            match next {
                Some(status) => Ok(StreamDescription {
                    stream_arn: String::from("arn:aws:firehose:eu-west-1:1:deliverystream/demo"),
                    status,
                }),
                None => Err(String::from("script exhausted")),
            }
        }
    };
    let result = await_active(stream_name, describe_fn, policy).await;
    (result, polls.load(Ordering::SeqCst))
}

#[tokio::test]
async fn await_active_test_creating_creating_active() {
    let (result, polls) = run_scripted(
        "demo",
        &[
            StreamStatus::Creating,
            StreamStatus::Creating,
            StreamStatus::Active,
        ],
        &no_wait(),
    )
    .await;
    let active = result.unwrap();
    assert_eq!(polls, 3);
    assert_eq!(active.stream_name(), "demo");
    assert_eq!(
        active.stream_arn(),
        "arn:aws:firehose:eu-west-1:1:deliverystream/demo"
    );
}

#[tokio::test]
async fn await_active_test_polls_twice_for_creating_then_active() {
    let (result, polls) = run_scripted(
        "demo",
        &[StreamStatus::Creating, StreamStatus::Active],
        &no_wait(),
    )
    .await;
    assert!(result.is_ok());
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn await_active_test_deleting_fails_immediately() {
    let (result, polls) = run_scripted(
        "demo",
        &[StreamStatus::Deleting, StreamStatus::Active],
        &no_wait(),
    )
    .await;
    assert_eq!(polls, 1);
    match result {
        Err(ReadinessError::Terminal {
            stream_name,
            status,
        }) => {
            assert_eq!(stream_name, "demo");
            assert_eq!(status, StreamStatus::Deleting);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn await_active_test_creating_failed_is_terminal() {
    let (result, _) = run_scripted(
        "demo",
        &[StreamStatus::Creating, StreamStatus::CreatingFailed],
        &no_wait(),
    )
    .await;
    assert!(matches!(
        result,
        Err(ReadinessError::Terminal {
            status: StreamStatus::CreatingFailed,
            ..
        })
    ));
}

#[tokio::test]
async fn await_active_test_unknown_status_keeps_polling() {
    let (result, polls) = run_scripted(
        "demo",
        &[
            StreamStatus::from("UPDATING"),
            StreamStatus::Creating,
            StreamStatus::Active,
        ],
        &no_wait(),
    )
    .await;
    assert!(result.is_ok());
    assert_eq!(polls, 3);
}

#[tokio::test]
async fn await_active_test_query_error_fails() {
    let (result, polls) = run_scripted("demo", &[StreamStatus::Creating], &no_wait()).await;
    assert_eq!(polls, 2);
    assert!(matches!(result, Err(ReadinessError::QueryFailed { .. })));
}

#[tokio::test]
async fn await_active_test_never_succeeds_while_creating() {
    let statuses = vec![StreamStatus::Creating; 50];
    let (result, polls) = run_scripted("demo", &statuses, &no_wait()).await;
    // script runs dry while still CREATING, which surfaces as a query error
    assert!(matches!(result, Err(ReadinessError::QueryFailed { .. })));
    assert_eq!(polls, 51);
}

#[tokio::test]
async fn await_active_test_timeout() {
    let statuses = vec![StreamStatus::Creating; 1000];
    let policy = WaitPolicy {
        interval: Duration::from_millis(5),
        timeout: Some(Duration::from_millis(20)),
    };
    let (result, polls) = run_scripted("demo", &statuses, &policy).await;
    assert!(matches!(result, Err(ReadinessError::TimedOut { .. })));
    assert!(polls >= 2 && polls < 1000);
}

#[test]
fn stream_status_test_parsing() {
    assert_eq!(StreamStatus::from("ACTIVE"), StreamStatus::Active);
    assert_eq!(StreamStatus::from("DELETING"), StreamStatus::Deleting);
    assert_eq!(StreamStatus::from("DELETING_FAILED"), StreamStatus::DeletingFailed);
    assert_eq!(StreamStatus::from("SUSPENDED").to_string(), "SUSPENDED");
    assert!(!StreamStatus::Creating.is_terminal_failure());
    assert!(StreamStatus::Suspended.is_terminal_failure());
}
