//! Integration tests for SessionController reconciliation
//!
//! These tests verify that the SessionController correctly:
//! - Admits each distinct path once per session
//! - Applies only the first terminal event per job
//! - Discards events for unknown paths and torn-down sessions
//! - Keeps a consistent job map under concurrent event delivery

use ocrdrop::models::{ActionKind, ActionState, JobStatus};
use ocrdrop::{JobPath, OcrEvent, Reconciliation, SessionController, SessionId, StateChange};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

#[tokio::test]
async fn test_resubmitting_a_path_is_a_no_op() {
    let controller = SessionController::new();
    let (session, admitted) = controller.register_batch(["a.png"]);
    assert_eq!(admitted.len(), 1);

    controller.apply_event(session, &OcrEvent::success("a.png", "first"));
    let mut rx = controller.subscribe();

    let (_, admitted) = controller.register_batch(["a.png"]);
    assert!(admitted.is_empty());
    let status = controller.status(&JobPath::from("a.png")).unwrap();
    assert_eq!(status.text(), Some("first"));
    assert!(rx.try_recv().is_err(), "No change should be emitted for a no-op batch");
}

#[tokio::test]
async fn test_batch_with_duplicates_and_known_paths() {
    let controller = SessionController::new();
    controller.register_batch(["b.png"]);

    let (_, admitted) = controller.register_batch(["a.png", "b.png", "a.png", "c.png"]);

    assert_eq!(admitted, vec![JobPath::from("a.png"), JobPath::from("c.png")]);
    let order: Vec<String> = controller
        .snapshot()
        .views()
        .into_iter()
        .map(|view| view.path.to_string())
        .collect();
    assert_eq!(order, vec!["b.png", "a.png", "c.png"]);
}

#[tokio::test]
async fn test_first_terminal_event_wins() {
    let controller = SessionController::new();
    let (session, _) = controller.register_batch(["a.png"]);

    let first = controller.apply_event(session, &OcrEvent::error("a.png", "low confidence"));
    let second = controller.apply_event(session, &OcrEvent::success("a.png", "late text"));

    assert!(first.is_applied());
    assert_eq!(second, Reconciliation::AlreadyTerminal);
    assert_eq!(
        controller.status(&JobPath::from("a.png")),
        Some(JobStatus::Failed {
            message: "low confidence".to_string()
        })
    );
    let slots = controller.actions(&JobPath::from("a.png")).unwrap();
    assert_eq!(slots.get(ActionKind::Export), ActionState::Disabled);
}

#[tokio::test]
async fn test_event_for_unknown_path_changes_nothing() {
    let controller = SessionController::new();
    let (session, _) = controller.register_batch(["a.png"]);
    let before = controller.snapshot();

    let outcome = controller.apply_event(session, &OcrEvent::success("z.png", "text"));

    assert_eq!(outcome, Reconciliation::UnknownPath);
    assert_eq!(controller.snapshot(), before);
    assert!(!controller.is_tracked(&JobPath::from("z.png")));
}

#[tokio::test]
async fn test_events_from_old_session_are_discarded() {
    let controller = SessionController::new();
    let (old, _) = controller.register_batch(["a.png"]);
    let new = controller.reset();
    controller.register_batch(["a.png"]);

    let outcome = controller.apply_event(old, &OcrEvent::success("a.png", "stale"));

    assert_eq!(outcome, Reconciliation::StaleSession);
    assert_eq!(new, SessionId::FIRST.next());
    assert_eq!(controller.status(&JobPath::from("a.png")), Some(JobStatus::Processing));
}

#[tokio::test]
async fn test_completion_enables_actions_and_notifies_subscribers() {
    let controller = SessionController::new();
    let mut rx1 = controller.subscribe();
    let mut rx2 = controller.subscribe();

    let (session, _) = controller.register_batch(["/scans/a.png"]);
    controller.apply_event(session, &OcrEvent::success("/scans/a.png", "# Title"));

    for rx in [&mut rx1, &mut rx2] {
        let registered = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for registration")
            .expect("Channel closed");
        assert!(matches!(registered, StateChange::JobsRegistered { .. }));

        let completed = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for completion")
            .expect("Channel closed");
        match completed {
            StateChange::JobCompleted { job, .. } => {
                assert_eq!(job.name, "a.png");
                assert_eq!(job.actions.export, ActionState::Enabled);
                assert_eq!(job.actions.copy, ActionState::Enabled);
            }
            other => panic!("Expected JobCompleted, got: {:?}", other),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_event_delivery_is_consistent() {
    let controller = Arc::new(SessionController::new());
    let paths: Vec<String> = (0..200).map(|n| format!("page-{n:03}.png")).collect();
    let (session, admitted) = controller.register_batch(paths.clone());
    assert_eq!(admitted.len(), 200);

    let mut handles = Vec::new();
    for (n, path) in paths.into_iter().enumerate() {
        let controller = Arc::clone(&controller);
        handles.push(tokio::spawn(async move {
            // Two racing events per path; exactly one may apply
            let ok = controller.apply_event(session, &OcrEvent::success(path.as_str(), "text"));
            let err = controller.apply_event(session, &OcrEvent::error(path.as_str(), "boom"));
            (n, ok.is_applied() as usize + err.is_applied() as usize)
        }));
    }

    for handle in handles {
        let (n, applied) = handle.await.unwrap();
        assert_eq!(applied, 1, "path {n} applied {applied} events");
    }

    let (processing, complete, failed) = controller.snapshot().status_counts();
    assert_eq!((processing, complete, failed), (0, 200, 0));
}
