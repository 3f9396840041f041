//! Session lifecycle: optimistic updates, snapshot merging, teardown.

use snowplan_engine::{EdgeHint, ProjectSession, SessionConfig, SessionError, SessionEvent};
use snowplan_model::{NewProject, Project, StepKey};
use snowplan_store::{FieldPath, ProjectStore, UpdateMap};
use snowplan_test_utils::{init_tracing, sample_spec, two_step_template, RecordingStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

async fn open_with(
    store: &RecordingStore,
    spec: NewProject,
) -> (ProjectSession, UnboundedReceiver<SessionEvent>) {
    init_tracing();
    let store: Arc<dyn ProjectStore> = Arc::new(store.clone());
    ProjectSession::create(store, spec, SessionConfig::new())
        .await
        .unwrap()
}

async fn next_project_changed(rx: &mut UnboundedReceiver<SessionEvent>) -> Project {
    loop {
        match timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(SessionEvent::ProjectChanged(project))) => return project,
            Ok(Some(_)) => continue,
            Ok(None) => panic!("event channel closed"),
            Err(_) => panic!("timed out waiting for ProjectChanged"),
        }
    }
}

async fn wait_update_count(store: &RecordingStore, count: usize) {
    timeout(Duration::from_secs(5), async {
        while store.update_count() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for store writes");
}

#[tokio::test]
async fn open_delivers_the_initial_snapshot() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Fresh")).await;

    let initial = next_project_changed(&mut events).await;
    assert_eq!(initial.id, session.project_id());
    assert_eq!(initial.current_step, Some(StepKey::from("summary")));
    assert_eq!(session.current_step(), Some(StepKey::from("summary")));
}

#[tokio::test]
async fn edits_are_optimistic_before_any_write_lands() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Optimistic")).await;
    let _ = next_project_changed(&mut events).await;

    let summary = StepKey::from("summary");
    session.edit_content(&summary, "typed just now").unwrap();

    // Visible in the cache and as an event immediately, with derived
    // fields recomputed, while the debounced write has not gone out.
    let cached = session.snapshot();
    let step = cached.step(&summary).unwrap();
    assert_eq!(step.content, "typed just now");
    assert_eq!(step.word_count, 3);
    assert!(step.completed);
    assert_eq!(store.update_count(), 0);

    let event = next_project_changed(&mut events).await;
    assert_eq!(event.step(&summary).unwrap().content, "typed just now");
}

#[tokio::test]
async fn remote_snapshot_updates_clean_fields() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Synced")).await;
    let _ = next_project_changed(&mut events).await;

    let notes = StepKey::from("notes");
    store
        .remote()
        .update(
            &session.project_id(),
            UpdateMap::content_edit(&notes, "written on another device"),
        )
        .await
        .unwrap();

    let merged = next_project_changed(&mut events).await;
    assert_eq!(
        merged.step(&notes).unwrap().content,
        "written on another device"
    );
    assert_eq!(session.snapshot(), merged);
}

#[tokio::test]
async fn snapshot_never_regresses_a_pending_edit() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Contended")).await;
    let _ = next_project_changed(&mut events).await;

    let summary = StepKey::from("summary");
    session.edit_content(&summary, "local draft").unwrap();
    let _ = next_project_changed(&mut events).await; // optimistic event

    // Another device writes a conflicting summary and renames the
    // project before our debounced write has gone out.
    store
        .remote()
        .update(
            &session.project_id(),
            UpdateMap::content_edit(&summary, "stale remote")
                .set(FieldPath::Title, snowplan_store::FieldValue::Text("Renamed elsewhere".into())),
        )
        .await
        .unwrap();

    let merged = next_project_changed(&mut events).await;
    assert_eq!(merged.step(&summary).unwrap().content, "local draft");
    assert_eq!(merged.step(&summary).unwrap().word_count, 2);
    assert_eq!(merged.title, "Renamed elsewhere");
}

#[tokio::test]
async fn selection_commits_without_debounce() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Selecting")).await;
    let _ = next_project_changed(&mut events).await;

    session.select_step(&StepKey::from("scenes")).unwrap();
    wait_update_count(&store, 1).await;

    let updates = store.updates();
    assert!(updates[0]
        .1
        .iter()
        .any(|(path, _)| matches!(path, FieldPath::CurrentStep)));

    // Re-selecting the current step is a no-op.
    session.select_step(&StepKey::from("scenes")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.update_count(), 1);
}

#[tokio::test]
async fn drag_to_top_swaps_a_two_step_project() {
    let store = RecordingStore::new();
    let spec = NewProject::new("Two Steps", two_step_template());
    let (session, mut events) = open_with(&store, spec).await;
    let _ = next_project_changed(&mut events).await;

    let characters = StepKey::from("characters");
    session.reorder(&characters, Some(EdgeHint::Top)).unwrap();

    let cached = session.snapshot();
    assert_eq!(cached.step(&characters).unwrap().order, 0);
    assert_eq!(cached.step(&StepKey::from("summary")).unwrap().order, 1);

    wait_update_count(&store, 1).await;
    let map = &store.updates()[0].1;
    let order_writes = map
        .iter()
        .filter(|(path, _)| matches!(path, FieldPath::StepOrder(_)))
        .count();
    assert_eq!(order_writes, 2);
}

#[tokio::test]
async fn zero_displacement_drag_is_a_no_op() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Still")).await;
    let _ = next_project_changed(&mut events).await;

    session
        .reorder_by_displacement(&StepKey::from("summary"), 120.0, 120.0)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.update_count(), 0);
}

#[tokio::test]
async fn unknown_step_is_rejected_before_any_mutation() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Strict")).await;
    let _ = next_project_changed(&mut events).await;
    let before = session.snapshot();

    let ghost = StepKey::from("ghost");
    assert!(matches!(
        session.edit_content(&ghost, "boo"),
        Err(SessionError::UnknownStep(_))
    ));
    assert!(matches!(
        session.select_step(&ghost),
        Err(SessionError::UnknownStep(_))
    ));
    assert!(matches!(
        session.reorder(&ghost, Some(EdgeHint::Bottom)),
        Err(SessionError::UnknownStep(_))
    ));
    assert_eq!(session.snapshot(), before);
}

#[tokio::test]
async fn rename_commits_immediately_and_optimistically() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Old Name")).await;
    let _ = next_project_changed(&mut events).await;

    session.rename("New Name").unwrap();
    assert_eq!(session.snapshot().title, "New Name");

    wait_update_count(&store, 1).await;
    let fetched = store.get(&session.project_id()).await.unwrap();
    assert_eq!(fetched.title, "New Name");
}

#[tokio::test]
async fn remote_delete_is_terminal() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Doomed")).await;
    let _ = next_project_changed(&mut events).await;

    store.remote().delete(&session.project_id()).await.unwrap();

    loop {
        match timeout(Duration::from_secs(5), events.recv()).await {
            Ok(Some(SessionEvent::ProjectGone)) => break,
            Ok(Some(_)) => continue,
            other => panic!("expected ProjectGone, got {other:?}"),
        }
    }
    timeout(Duration::from_secs(5), async {
        while !session.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session did not close after ProjectGone");
    assert!(matches!(
        session.edit_content(&StepKey::from("summary"), "too late"),
        Err(SessionError::Closed)
    ));
}

#[tokio::test]
async fn delete_destroys_the_project_and_the_session() {
    let store = RecordingStore::new();
    let (session, _events) = open_with(&store, sample_spec("Short-lived")).await;
    let id = session.project_id();

    session.delete().await.unwrap();
    assert!(matches!(
        store.get(&id).await,
        Err(snowplan_store::StoreError::NotFound)
    ));
}

#[tokio::test]
async fn teardown_halts_snapshot_delivery() {
    let store = RecordingStore::new();
    let (session, mut events) = open_with(&store, sample_spec("Quiet")).await;
    let _ = next_project_changed(&mut events).await;
    let id = session.project_id();

    session.teardown();

    store
        .remote()
        .update(&id, UpdateMap::rename("Edited after teardown"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn open_missing_project_is_not_found() {
    let store = RecordingStore::new();
    let arc: Arc<dyn ProjectStore> = Arc::new(store.clone());
    let result = ProjectSession::open(
        arc,
        snowplan_model::ProjectId::new(),
        SessionConfig::new(),
    )
    .await;
    assert!(matches!(
        result,
        Err(SessionError::Store(snowplan_store::StoreError::NotFound))
    ));
}
