//! End-to-end tests of the audit pipeline
//!
//! Captured requests go through the emitter, the worker pool and the
//! publisher into an in-memory broker, and are read back the way a consumer
//! would read them.

use async_trait::async_trait;
use mine_search::builders::build_audit_emitter;
use mine_search::config::{AuditSettings, Environment};
use mine_search::core::{
    AuditEmitter, CorrelationContext, DetailedAuditEvent, Identity, Outcome, PoolError, RequestMeta, RequestScope,
    SummaryAuditEvent, Task, TaskError,
};
use mine_search::infra::InMemoryBroker;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

fn settings(workers: usize, capacity: usize) -> AuditSettings {
    AuditSettings {
        worker_count: workers,
        queue_capacity: capacity,
        ..AuditSettings::for_environment(Environment::Dev)
    }
}

fn emitter(broker: &InMemoryBroker, workers: usize, capacity: usize) -> AuditEmitter {
    build_audit_emitter(&settings(workers, capacity), Arc::new(broker.clone())).unwrap()
}

fn captured_request() -> CorrelationContext {
    let scope = RequestScope::begin(
        RequestMeta {
            url: "http://mine.local/mine/v1/sample".into(),
            token: "token-abc".into(),
            user_agent: "okhttp/4.9".into(),
            client_ip: "10.1.2.3".into(),
        },
        Identity {
            customer_id: Some("c-1001".into()),
            phone: Some("0912345678".into()),
            app_version: Some("5.4.0".into()),
        },
    );
    std::thread::sleep(Duration::from_millis(3));
    scope.capture(
        "do_func_sample",
        json!({"type_request": "do_func_sample", "data": {"phone": "0912345678", "mail": "a@b.c"}}),
        Outcome {
            status: 1,
            message: "Ok".into(),
            detail: json!({"phone": "0912345678"}),
        },
    )
}

struct GatedTask(Arc<Semaphore>);

#[async_trait]
impl Task for GatedTask {
    fn describe(&self) -> String {
        "gated task".into()
    }

    async fn run(&self) -> Result<(), TaskError> {
        let _ = self.0.acquire().await;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_both_events_published_with_service_key() {
    let broker = InMemoryBroker::new();
    let emitter = emitter(&broker, 2, 16);

    let report = emitter.emit(captured_request());
    assert!(report.all_accepted());

    assert!(wait_for(Duration::from_secs(2), || broker.messages().len() == 2));
    let detailed = broker.messages_for("dev-mine-log");
    let summary = broker.messages_for("dev-mine");
    assert_eq!(detailed.len(), 1);
    assert_eq!(summary.len(), 1);
    assert_eq!(detailed[0].key, b"mine".to_vec());
    assert_eq!(summary[0].key, b"mine".to_vec());
    assert_eq!(summary[0].value.last(), Some(&b'\n'));

    emitter.pool().shutdown();
    assert_eq!(broker.connections_opened(), 2);
    assert_eq!(broker.connections_closed(), 2);
}

#[test]
fn test_failed_detailed_publish_does_not_stop_summary() {
    let broker = InMemoryBroker::new();
    broker.fail_writes_to("dev-mine-log");
    let emitter = emitter(&broker, 1, 16);

    emitter.emit(captured_request());

    assert!(wait_for(Duration::from_secs(2), || broker.messages_for("dev-mine").len() == 1));
    assert!(wait_for(Duration::from_secs(2), || emitter.pool().stats().failed_tasks == 1));
    assert!(broker.messages_for("dev-mine-log").is_empty());
    assert_eq!(broker.write_attempts(), vec!["dev-mine-log".to_string(), "dev-mine".to_string()]);

    emitter.pool().shutdown();
    // Close is attempted even after a failed write.
    assert_eq!(broker.connections_closed(), 2);
}

#[test]
fn test_failed_connection_does_not_stop_summary() {
    let broker = InMemoryBroker::new();
    broker.fail_connections_to("dev-mine-log");
    let emitter = emitter(&broker, 1, 16);

    emitter.emit(captured_request());

    assert!(wait_for(Duration::from_secs(2), || broker.messages_for("dev-mine").len() == 1));
    assert!(wait_for(Duration::from_secs(2), || emitter.pool().stats().failed_tasks == 1));
    emitter.pool().shutdown();
}

#[test]
fn test_consumer_round_trip() {
    let broker = InMemoryBroker::new();
    let emitter = emitter(&broker, 2, 16);
    let ctx = captured_request();

    emitter.emit(ctx.clone());
    assert!(wait_for(Duration::from_secs(2), || broker.messages().len() == 2));

    let detailed: DetailedAuditEvent =
        serde_json::from_slice(&broker.messages_for("dev-mine-log")[0].value).unwrap();
    let summary: SummaryAuditEvent = serde_json::from_slice(&broker.messages_for("dev-mine")[0].value).unwrap();

    assert_eq!(summary.customer_id, "c-1001");
    assert_eq!(summary.phone, "0912345678");
    assert_eq!(summary.app_version, "5.4.0");
    assert_eq!(summary.action_name, "do_func_sample");
    assert_eq!(summary.status, 1);
    assert_eq!(summary.url, "http://mine.local/mine/v1/sample");
    assert_eq!(summary.process_time, ctx.process_time());
    assert_eq!(summary.topic_name, "dev-mine");
    assert_eq!(summary.ip_address, "10.1.2.3");

    assert_eq!(detailed.func_name, "do_func_sample");
    assert_eq!(detailed.url, "http://mine.local/mine/v1/sample");
    assert_eq!(detailed.service_name, "mine");
    assert_eq!(detailed.user_agent, "okhttp/4.9");
    assert!((detailed.executed_time - ctx.elapsed().as_secs_f64()).abs() < 1e-9);
    assert!(detailed.executed_time >= 0.003);
    assert!(detailed.output.starts_with("(customerId c-1001, customerPhone 0912345678) --> status 1, msg Ok"));

    emitter.pool().shutdown();
}

#[test]
fn test_full_pool_rejects_without_blocking() {
    let broker = InMemoryBroker::new();
    let emitter = emitter(&broker, 1, 1);
    let gate = Arc::new(Semaphore::new(0));

    emitter.pool().execute(GatedTask(Arc::clone(&gate))).unwrap();
    assert!(wait_for(Duration::from_secs(2), || emitter.pool().stats().active_tasks == 1));
    emitter.pool().execute(GatedTask(Arc::clone(&gate))).unwrap();

    let start = Instant::now();
    let report = emitter.emit(captured_request());
    assert!(start.elapsed() < Duration::from_millis(50));
    assert_eq!(report.detailed, Err(PoolError::CapacityExceeded));
    assert_eq!(report.summary, Err(PoolError::CapacityExceeded));
    assert!(!report.all_accepted());

    gate.add_permits(2);
    emitter.pool().shutdown();
    assert!(broker.messages().is_empty());
}

#[test]
fn test_slow_broker_within_deadline_succeeds() {
    let broker = InMemoryBroker::new();
    broker.set_write_delay(Duration::from_millis(300));
    let mut settings = settings(2, 16);
    settings.write_timeout_secs = 1;
    let emitter = build_audit_emitter(&settings, Arc::new(broker.clone())).unwrap();

    emitter.emit(captured_request());
    assert!(wait_for(Duration::from_secs(3), || broker.messages().len() == 2));
    assert_eq!(emitter.pool().stats().failed_tasks, 0);
    emitter.pool().shutdown();
}
