// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end supervisor scenarios, driven entirely through fakes.

use std::sync::Arc;
use std::time::Duration;

use sentinel_adapters::{ChildEvent, FakeBroadcaster, FakeKvStore, FakeOsAdapter};
use sentinel_core::{DaemonConfig, FakeClock, ListenerSet, LifecycleState, Pid};
use sentinel_daemon::Supervisor;
use sentinel_wire::FromDaemon;
use tempfile::tempdir;

fn new_supervisor(
    os: Arc<FakeOsAdapter>,
    kv: Arc<FakeKvStore>,
    broadcaster: Arc<FakeBroadcaster>,
) -> Arc<Supervisor<FakeClock>> {
    Supervisor::new(os, kv, broadcaster, ListenerSet::default(), FakeClock::new())
}

/// Wait for a predicate to become true, polling frequently. Test-only; the
/// production wait primitive lives in `sentinel_daemon::await_condition`.
async fn wait_for<F, Fut>(mut predicate: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if predicate().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never became true");
}

async fn reply_port_bytes(port: u16) -> Vec<u8> {
    sentinel_wire::encode(&FromDaemon::ReplyPort { port }).unwrap()
}

// ── Happy path: start → handshake → RUNNING with TLS assembled ───────────

#[tokio::test]
async fn start_assembles_tls_and_reaches_running() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    os.seed_file(dir.path().join("tls/client/ca.crt"), b"ca".to_vec());
    os.seed_file(dir.path().join("tls/client/client.key"), b"key".to_vec());
    os.seed_file(dir.path().join("tls/client/client.pem"), b"cert".to_vec());

    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster.clone());

    let config = DaemonConfig::for_testing(dir.path());
    sup.start(config, false).await.expect("start should succeed");
    assert_eq!(sup.state().await, LifecycleState::Starting);

    let pid = sup.pid().await.expect("pid should be set after spawn");
    os.push_event(pid, ChildEvent::Message(reply_port_bytes(12798).await)).await;

    wait_for(|| async { sup.state().await == LifecycleState::Running }).await;

    let tls = sup.tls_config().await.expect("tls config should be assembled");
    assert_eq!(tls.ca, b"ca");
    assert_eq!(tls.port, 12798);
    assert!(broadcaster.state_changes().contains(&LifecycleState::Running));
}

// ── Graceful stop: cooperative exit wins, no kill issued ─────────────────

#[tokio::test]
async fn stop_waits_for_cooperative_exit_before_killing() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster);

    let config = DaemonConfig::for_testing(dir.path());
    sup.start(config, false).await.unwrap();
    let pid = sup.pid().await.unwrap();

    // Simulate the daemon exiting on its own once it sees the socket close.
    os.mark_dead(pid);
    os.push_event(pid, ChildEvent::Exit { code: Some(0), signal: None }).await;

    sup.stop().await.expect("stop should succeed");
    assert_eq!(sup.state().await, LifecycleState::Stopped);
    assert!(os.killed_pids().is_empty(), "cooperative exit should not need a kill");
}

// ── Stop escalates to kill once shutdown_timeout elapses ─────────────────

#[tokio::test(start_paused = true)]
async fn stop_escalates_to_kill_past_shutdown_timeout() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster);

    let mut config = DaemonConfig::for_testing(dir.path());
    config.shutdown_timeout_ms = 50;
    config.kill_timeout_ms = 50;
    sup.start(config, false).await.unwrap();
    let pid = sup.pid().await.unwrap();

    // Daemon never confirms exit on its own; stop() must escalate.
    sup.stop().await.expect("stop should still succeed via kill");
    assert_eq!(sup.state().await, LifecycleState::Stopped);
    assert_eq!(os.killed_pids(), vec![pid]);
}

// ── Self-update handshake: exit code 20 lands on UPDATED ─────────────────

#[tokio::test]
async fn expect_update_confirms_on_exit_code_twenty() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster);

    let config = DaemonConfig::for_testing(dir.path());
    sup.start(config, false).await.unwrap();
    let pid = sup.pid().await.unwrap();

    let sup2 = sup.clone();
    let update = tokio::spawn(async move { sup2.expect_update().await });

    wait_for(|| async { sup.state().await == LifecycleState::Updating }).await;
    os.mark_dead(pid);
    os.push_event(pid, ChildEvent::Exit { code: Some(20), signal: None }).await;

    update.await.unwrap().expect("update should complete");
    assert_eq!(sup.state().await, LifecycleState::Updated);
}

// ── expect_update times out and abandons as UPDATE_FAILED ────────────────

#[tokio::test(start_paused = true)]
async fn expect_update_times_out_to_update_failed() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster);

    let mut config = DaemonConfig::for_testing(dir.path());
    config.update_timeout_ms = 20;
    sup.start(config, false).await.unwrap();

    let err = sup.expect_update().await.expect_err("no confirmation should ever arrive");
    assert!(matches!(err, sentinel_daemon::UpdateError::UpdateTimeout));
    assert_eq!(sup.state().await, LifecycleState::UpdateFailed);
}

// ── A crash with no retries left lands on UNRECOVERABLE, not CRASHED ─────

#[tokio::test]
async fn exhausted_retries_land_on_unrecoverable() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster);

    let mut config = DaemonConfig::for_testing(dir.path());
    config.startup_max_retries = 0;
    sup.start(config, false).await.unwrap();
    let pid = sup.pid().await.unwrap();

    os.mark_dead(pid);
    os.push_event(pid, ChildEvent::Exit { code: Some(1), signal: None }).await;

    wait_for(|| async { sup.state().await == LifecycleState::Unrecoverable }).await;
    assert!(sup.pid().await.is_none(), "the dead child should have been reset");
}

// ── Orphan reaping: a pid left behind by a prior instance gets killed ────

#[tokio::test]
async fn start_reaps_an_orphaned_process_first() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());

    let config = DaemonConfig::for_testing(dir.path());
    let orphan_pid = Pid::new(4242);
    kv.seed(config.persistence_key.clone(), orphan_pid.as_u32() as i64);
    os.mark_alive(orphan_pid, config.daemon_process_name.clone());

    let sup = new_supervisor(os.clone(), kv, broadcaster);
    sup.start(config, false).await.expect("start should reap the orphan and proceed");

    assert_eq!(os.killed_pids(), vec![orphan_pid]);
    assert!(sup.pid().await.is_some(), "the new child should have spawned after reaping");
}

// ── Fault injection is a no-op without a connected child ─────────────────

#[tokio::test]
async fn inject_fault_is_a_no_op_without_a_child() {
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os, kv, broadcaster);

    sup.inject_fault("slow-sync", true, Some(Duration::from_millis(10))).await.expect("no-op success");
}

// ── A second start while already running is rejected ─────────────────────

#[tokio::test]
async fn second_start_while_running_fails_already_running() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster);

    let config = DaemonConfig::for_testing(dir.path());
    sup.start(config.clone(), false).await.unwrap();

    let err = sup.start(config, false).await.expect_err("a second start should be rejected");
    assert!(matches!(err, sentinel_daemon::StartError::AlreadyRunning));
}

// ── An unforced start past startup_max_retries is rejected ───────────────

#[tokio::test]
async fn unforced_start_past_max_retries_fails_too_many_retries() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster);

    let mut config = DaemonConfig::for_testing(dir.path());
    config.startup_max_retries = 5;
    sup.start(config, false).await.unwrap();
    let pid = sup.pid().await.unwrap();

    os.mark_dead(pid);
    os.push_event(pid, ChildEvent::Exit { code: Some(1), signal: None }).await;
    wait_for(|| async { sup.state().await == LifecycleState::Crashed }).await;

    // One crash against a retry budget of 5 is recoverable. If the operator
    // now restarts with a tighter budget that the single prior try already
    // meets or exceeds, the boundary check in `start` must reject it.
    let mut tighter_config = DaemonConfig::for_testing(dir.path());
    tighter_config.startup_max_retries = 1;
    let err = sup.start(tighter_config, false).await.expect_err("retries should be exhausted");
    assert!(matches!(err, sentinel_daemon::StartError::TooManyRetries(1)));
}

// ── A failed log-open aborts the start and leaves the FSM recoverable ────

#[tokio::test]
async fn open_log_append_failure_does_not_strand_starting() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    os.set_open_log_fails(true);
    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster);

    let mut config = DaemonConfig::for_testing(dir.path());
    config.startup_max_retries = 3;

    let err = sup.start(config.clone(), false).await.expect_err("log open should fail");
    assert!(matches!(err, sentinel_daemon::StartError::InternalIo(_)));
    assert_eq!(sup.state().await, LifecycleState::Crashed);
    assert!(sup.pid().await.is_none());

    // The FSM wasn't stranded in STARTING: a further start is accepted.
    os.set_open_log_fails(false);
    sup.start(config, false).await.expect("a subsequent start should succeed");
}

// ── A duplicate ReplyPort frame does not re-fire the RUNNING transition ──

#[tokio::test]
async fn duplicate_reply_port_frames_produce_one_running_transition() {
    let dir = tempdir().unwrap();
    let os = Arc::new(FakeOsAdapter::new());
    os.seed_file(dir.path().join("tls/client/ca.crt"), b"ca".to_vec());
    os.seed_file(dir.path().join("tls/client/client.key"), b"key".to_vec());
    os.seed_file(dir.path().join("tls/client/client.pem"), b"cert".to_vec());

    let kv = Arc::new(FakeKvStore::new());
    let broadcaster = Arc::new(FakeBroadcaster::new());
    let sup = new_supervisor(os.clone(), kv, broadcaster.clone());

    let config = DaemonConfig::for_testing(dir.path());
    sup.start(config, false).await.unwrap();
    let pid = sup.pid().await.unwrap();

    os.push_event(pid, ChildEvent::Message(reply_port_bytes(1234).await)).await;
    wait_for(|| async { sup.state().await == LifecycleState::Running }).await;

    // A second ReplyPort frame (a different port, so its processing is
    // observable) re-assembles TLS but must not fire another RUNNING
    // transition.
    os.push_event(pid, ChildEvent::Message(reply_port_bytes(5678).await)).await;
    wait_for(|| async { sup.tls_config().await.map(|t| t.port) == Some(5678) }).await;

    assert_eq!(sup.state().await, LifecycleState::Running);
    assert_eq!(
        broadcaster.state_changes().iter().filter(|s| **s == LifecycleState::Running).count(),
        1,
        "RUNNING should only be broadcast once"
    );
}
