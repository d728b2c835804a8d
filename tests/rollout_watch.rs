// ABOUTME: Tests for the caller-side rollout polling loop.
// ABOUTME: Covers convergence, deadline, cancellation, and the query failure budget.

mod support;

use sortie::deploy::{DeploymentOutcome, PollPolicy, RolloutMonitor, RolloutState, watch};
use sortie::orchestrator::{QueryError, QueryErrorKind};
use sortie::types::LifecycleStatus::Running;
use std::future::pending;
use std::time::Duration;
use support::*;

fn policy(interval_ms: u64, timeout_ms: u64, max_query_failures: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(interval_ms),
        timeout: Duration::from_millis(timeout_ms),
        max_query_failures,
    }
}

fn rolling() -> (FakeOrchestrator, sortie::types::TaskSpecId) {
    let fake = FakeOrchestrator::new(registered(1, task_spec("web", "ghcr.io/org/web:v1", &[])), 2);
    let target = spec_id("web", 2);
    fake.retarget_service(&target);
    (fake, target)
}

#[tokio::test]
async fn returns_once_target_is_running() {
    init_tracing();
    let (fake, target) = rolling();
    let fake = fake
        .then_tasks(vec![])
        .then_tasks(vec![task(1, &target, Running)]);
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target.clone());

    let outcome = watch(&monitor, &policy(5, 5_000, 3), pending()).await.unwrap();

    assert_eq!(outcome, DeploymentOutcome::Running(target));
    assert_eq!(fake.count("ListTasks"), 2);
}

#[tokio::test]
async fn times_out_when_nothing_runs() {
    let (fake, target) = rolling();
    let fake = fake.then_tasks(vec![]);
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target);

    let outcome = watch(&monitor, &policy(10, 60, 3), pending()).await.unwrap();

    assert_eq!(outcome, DeploymentOutcome::TimedOut);
    assert_eq!(monitor.state(), RolloutState::TimedOut);
}

#[tokio::test]
async fn deadline_bounds_a_hung_sample() {
    let (fake, target) = rolling();
    let fake = fake.hang_next("ListTasks");
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target);

    let started = tokio::time::Instant::now();
    let outcome = watch(&monitor, &policy(10, 80, 3), pending()).await.unwrap();

    assert_eq!(outcome, DeploymentOutcome::TimedOut);
    assert_eq!(monitor.state(), RolloutState::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(fake.calls(), vec!["DescribeServices", "ListTasks"]);
}

#[tokio::test]
async fn abort_interrupts_a_hung_sample() {
    let (fake, target) = rolling();
    let fake = fake.hang_next("DescribeServices");
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target);

    let abort = tokio::time::sleep(Duration::from_millis(40));
    let outcome = watch(&monitor, &policy(10, 10_000, 3), abort).await.unwrap();

    assert_eq!(outcome, DeploymentOutcome::Aborted);
    assert_eq!(fake.count("DescribeServices"), 1);
}

#[tokio::test]
async fn stale_service_read_still_converges() {
    // Service read keeps showing the previous revision.
    let fake = FakeOrchestrator::new(registered(1, task_spec("web", "ghcr.io/org/web:v1", &[])), 2);
    let target = spec_id("web", 2);
    let fake = fake
        .then_tasks(vec![])
        .then_tasks(vec![task(1, &target, Running)]);
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target.clone());

    let outcome = watch(&monitor, &policy(1, 5_000, 3), pending()).await.unwrap();

    assert_eq!(outcome, DeploymentOutcome::Running(target));
}

#[tokio::test]
async fn stops_when_aborted() {
    let (fake, target) = rolling();
    let fake = fake.then_tasks(vec![]);
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target);

    let abort = tokio::time::sleep(Duration::from_millis(40));
    let outcome = watch(&monitor, &policy(10, 10_000, 3), abort).await.unwrap();

    assert_eq!(outcome, DeploymentOutcome::Aborted);
    assert_eq!(monitor.state(), RolloutState::Aborted);

    let calls = fake.calls().len();
    assert_eq!(monitor.sample().await.unwrap(), DeploymentOutcome::Aborted);
    assert_eq!(fake.calls().len(), calls);
}

#[tokio::test]
async fn tolerates_failures_within_budget() {
    let (fake, target) = rolling();
    let fake = fake
        .then_tasks(vec![task(1, &target, Running)])
        .fail_next("DescribeServices", service_error("DescribeServices"))
        .fail_next("DescribeServices", service_error("DescribeServices"));
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target.clone());

    let outcome = watch(&monitor, &policy(1, 5_000, 2), pending()).await.unwrap();

    assert_eq!(outcome, DeploymentOutcome::Running(target));
    assert_eq!(fake.count("DescribeServices"), 3);
}

#[tokio::test]
async fn returns_error_when_budget_is_exhausted() {
    let (fake, target) = rolling();
    let fake = fake
        .fail_next("DescribeServices", service_error("DescribeServices"))
        .fail_next("DescribeServices", service_error("DescribeServices"))
        .fail_next("DescribeServices", service_error("DescribeServices"));
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target);

    let err = watch(&monitor, &policy(1, 5_000, 2), pending())
        .await
        .unwrap_err();

    assert_eq!(err.operation(), "DescribeServices");
    assert_eq!(fake.count("DescribeServices"), 3);
    assert_eq!(monitor.state(), RolloutState::Start);
}

#[tokio::test]
async fn non_retriable_error_is_returned_at_once() {
    let (fake, target) = rolling();
    let fake = fake.fail_next(
        "DescribeServices",
        QueryError::NotFound {
            operation: "DescribeServices",
            resource: "web".to_string(),
        },
    );
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target);

    let err = watch(&monitor, &policy(1, 5_000, 3), pending())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), QueryErrorKind::NotFound);
    assert_eq!(fake.count("DescribeServices"), 1);
}

#[tokio::test]
async fn failure_count_resets_after_a_good_sample() {
    let (fake, target) = rolling();
    let fake = fake
        .then_tasks(vec![])
        .then_tasks(vec![task(1, &target, Running)])
        .fail_next("DescribeServices", service_error("DescribeServices"))
        .pass_next("DescribeServices")
        .fail_next("DescribeServices", service_error("DescribeServices"));
    let monitor = RolloutMonitor::new(&fake, cluster(), service(), target.clone());

    // Never two failures in a row, so a budget of one is enough.
    let outcome = watch(&monitor, &policy(1, 5_000, 1), pending()).await.unwrap();

    assert_eq!(outcome, DeploymentOutcome::Running(target));
    assert_eq!(fake.count("DescribeServices"), 4);
}

#[test]
fn default_policy() {
    let policy = PollPolicy::default();
    assert_eq!(policy.interval, Duration::from_secs(5));
    assert_eq!(policy.timeout, Duration::from_secs(600));
    assert_eq!(policy.max_query_failures, 3);
}
