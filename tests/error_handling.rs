//! Error handling and edge case tests.

use parking_lot::Mutex;
use resource_watch::{
    CancellationToken, CommandAnnotation, CommandState, NotificationConfig, NotificationError,
    PropertySnapshot, ResourceDefinition, ResourceNotificationService, ResourceRef,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn test_service() -> ResourceNotificationService {
    ResourceNotificationService::new(NotificationConfig::default(), CancellationToken::none())
}

fn flaky_resource(fail: Arc<AtomicBool>) -> ResourceRef {
    ResourceDefinition::new("flaky", "Container")
        .with_command(CommandAnnotation::new("restart", "Restart").with_update_state(move |_| {
            if fail.load(Ordering::SeqCst) {
                Err("health endpoint unavailable".into())
            } else {
                Ok(CommandState::Enabled)
            }
        }))
        .into_ref()
}

// --- Publish failures ---

#[test]
fn test_transform_error_is_returned_and_nothing_stored() {
    let service = test_service();
    let web = ResourceDefinition::new("web", "Project").into_ref();

    let result = service.publish_resource(&web, |_| {
        Err(NotificationError::transform(std::io::Error::new(
            std::io::ErrorKind::Other,
            "port lookup failed",
        )))
    });

    match result {
        Err(NotificationError::Transform(source)) => {
            assert_eq!(source.to_string(), "port lookup failed");
        }
        other => panic!("Expected Transform error, got {:?}", other),
    }
    assert!(service.current_snapshot(&web, "web").is_none());

    let sub = service.watch(CancellationToken::none());
    assert_eq!(sub.pending_replay(), 0);
}

#[test]
fn test_command_error_aborts_publish() {
    let fail = Arc::new(AtomicBool::new(false));
    let service = test_service();
    let resource = flaky_resource(Arc::clone(&fail));

    service.publish_resource(&resource, |s| Ok(s.with_state("Running"))).unwrap();

    let mut sub = service.watch(CancellationToken::timeout(Duration::from_millis(50)));
    assert!(sub.next().is_some()); // replay

    fail.store(true, Ordering::SeqCst);
    let err = service
        .publish_resource(&resource, |s| Ok(s.with_state("Stopping")))
        .unwrap_err();

    assert!(matches!(
        err,
        NotificationError::CommandState { ref command_type, .. } if command_type == "restart"
    ));
    assert!(err.to_string().contains("health endpoint unavailable"));

    // Previous snapshot kept, nothing broadcast.
    let current = service.current_snapshot(&resource, "flaky").unwrap();
    assert_eq!(current.state_text(), Some("Running"));
    assert!(sub.next().is_none());

    fail.store(false, Ordering::SeqCst);
    let event = service
        .publish_resource(&resource, |s| Ok(s.with_state("Stopping")))
        .unwrap();
    assert_eq!(event.snapshot().state_text(), Some("Stopping"));
}

// --- Wait failures ---

#[test]
fn test_wait_times_out_promptly() {
    let service = test_service();

    let start = Instant::now();
    let err = service
        .wait_for_resource_states(
            "web",
            &["Exited"],
            CancellationToken::timeout(Duration::from_millis(50)),
        )
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(2));
    match err {
        NotificationError::WaitCancelled { resource, target_states } => {
            assert_eq!(resource, "web");
            assert_eq!(target_states, vec!["Exited".to_string()]);
        }
        other => panic!("Expected WaitCancelled, got {:?}", other),
    }
    assert_eq!(service.subscriber_count(), 0);
}

#[test]
fn test_predicate_wait_cancelled() {
    let service = test_service();
    let web = ResourceDefinition::new("web", "Project").into_ref();
    service.publish_resource(&web, |s| Ok(s.with_state("Running"))).unwrap();

    let err = service
        .wait_for_resource_matching(
            "web",
            |event| event.snapshot().exit_code().is_some(),
            CancellationToken::timeout(Duration::from_millis(30)),
        )
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(err.to_string().contains("predicate"));
}

#[test]
fn test_already_cancelled_token_still_sees_current_state() {
    let service = test_service();
    let web = ResourceDefinition::new("web", "Project").into_ref();
    service.publish_resource(&web, |s| Ok(s.with_state("Running"))).unwrap();

    // The replay is delivered before cancellation is observed.
    let state = service
        .wait_for_resource("web", None, CancellationToken::timeout(Duration::ZERO))
        .unwrap();
    assert_eq!(state, "Running");
}

// --- Logging ---

/// Log sink shared between a test and its subscriber.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_logs<F: FnOnce()>(f: F) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    buffer.contents()
}

#[test]
fn test_publish_logs_state_changes() {
    let service = test_service();
    let web = ResourceDefinition::new("web", "Project").into_ref();

    let logs = capture_logs(|| {
        service.publish_resource(&web, |s| Ok(s.with_state("Starting"))).unwrap();
        service.publish_resource(&web, |s| Ok(s.with_state("Running"))).unwrap();
        let event = service
            .publish_resource(&web, |s| Ok(s.with_state("running")))
            .unwrap();
        assert_eq!(event.snapshot().state_text(), Some("running"));
    });

    let transitions: Vec<&str> = logs.lines().filter(|l| l.contains("changed state")).collect();
    // Case-only change is not a transition.
    assert_eq!(transitions.len(), 2, "{logs}");
    assert!(transitions[0].contains("Resource web/web changed state: Starting"), "{logs}");
    assert!(transitions[1].contains("Resource web/web changed state: Starting -> Running"), "{logs}");
    assert!(!logs.contains("Running -> running"), "{logs}");
    // Full records are off by default.
    assert!(!logs.contains("resource update published"), "{logs}");
}

#[test]
fn test_snapshot_tracing_emits_full_record() {
    let service = ResourceNotificationService::new(
        NotificationConfig {
            trace_snapshots: true,
            ..Default::default()
        },
        CancellationToken::none(),
    );
    let web = ResourceDefinition::new("web", "Project").into_ref();

    let logs = capture_logs(|| {
        service
            .publish_resource(&web, |s| {
                Ok(s.with_state("Running")
                    .with_exit_code(Some(0))
                    .with_property(PropertySnapshot::new("port", 8080)))
            })
            .unwrap();
    });

    assert_eq!(logs.matches("resource update published").count(), 1, "{logs}");
    assert!(logs.contains("resource_type=\"Project\""), "{logs}");
    assert!(logs.contains("port = 8080"), "{logs}");
}
