mod support;

use std::sync::Arc;

use taskboard::attachments::LocalObjectStore;
use taskboard::auth::Identity;
use taskboard::cache::LoadStatus;
use taskboard::reorder::DropSurface;
use taskboard::service::TaskService;
use taskboard::store::{DocumentStore, MemoryStore};
use taskboard::task::{ActivityAction, Status, TaskDraft, TaskEdit};
use taskboard::Error;

use support::{order_of, seeded_service, task, USER};

#[tokio::test]
async fn list_drop_appends_to_target_and_closes_the_gap() {
    let mut service = seeded_service(vec![
        task("ta", Status::Todo, 1),
        task("moved", Status::Todo, 2),
        task("tb", Status::Todo, 4),
        task("c0", Status::Completed, 0),
        task("c4", Status::Completed, 4),
    ])
    .await;

    let outcome = service
        .drop_task("moved", Status::Completed, DropSurface::List)
        .await
        .unwrap()
        .expect("move happened");

    assert!(outcome.status_changed);
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.moved.order, 5);
    assert!(outcome.moved.completed);
    assert_eq!(order_of(&service, "moved"), 5);
    assert_eq!(order_of(&service, "ta"), 0);
    assert_eq!(order_of(&service, "tb"), 1);

    let store = service.repository().store();
    assert_eq!(store.get("ta").await.unwrap().unwrap().order, 0);
    assert_eq!(store.get("tb").await.unwrap().unwrap().order, 1);
    let persisted = store.get("moved").await.unwrap().unwrap();
    assert_eq!(persisted.status, Status::Completed);
    assert_eq!(
        persisted.last_activity().unwrap().details,
        "Task status changed to Completed via drag and drop"
    );
}

#[tokio::test]
async fn board_drop_leaves_origin_column_alone() {
    let mut service = seeded_service(vec![
        task("t0", Status::Todo, 0),
        task("t1", Status::Todo, 1),
        task("t2", Status::Todo, 2),
    ])
    .await;

    let outcome = service
        .drop_task("t0", Status::InProgress, DropSurface::Board)
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.renumbered.is_empty());
    assert_eq!(outcome.moved.order, 0);
    assert_eq!(order_of(&service, "t1"), 1);
    assert_eq!(order_of(&service, "t2"), 2);
}

#[tokio::test]
async fn board_drop_onto_own_column_is_a_noop() {
    let mut service = seeded_service(vec![task("t0", Status::Todo, 0)]).await;
    let before = service.snapshot();
    let outcome = service
        .drop_task("t0", Status::Todo, DropSurface::Board)
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert_eq!(*service.snapshot(), *before);
}

#[tokio::test]
async fn failed_renumbering_is_reported_not_rolled_back() {
    let mut service = seeded_service(vec![
        task("t0", Status::Todo, 0),
        task("t1", Status::Todo, 1),
        task("t2", Status::Todo, 2),
    ])
    .await;
    service.repository().store().fail_writes_to("t2").await;

    let outcome = service
        .drop_task("t0", Status::Completed, DropSurface::List)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.renumbered, vec![("t1".to_string(), 0)]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].task_id, "t2");

    let store = service.repository().store();
    assert_eq!(store.get("t0").await.unwrap().unwrap().status, Status::Completed);
    assert_eq!(store.get("t2").await.unwrap().unwrap().order, 2);
    let snapshot = service.snapshot();
    assert_eq!(snapshot.status, LoadStatus::Failed);
    assert!(snapshot.error.is_some());
}

#[tokio::test]
async fn checkbox_toggles_between_completed_and_todo() {
    let mut service = seeded_service(vec![
        task("a", Status::InProgress, 0),
        task("c", Status::Completed, 2),
        task("t", Status::Todo, 6),
    ])
    .await;

    let done = service.toggle_completed("a", true).await.unwrap();
    assert_eq!(done.status, Status::Completed);
    assert!(done.completed);
    assert_eq!(done.order, 3);
    assert_eq!(
        done.last_activity().unwrap().details,
        "Task marked as completed via checkbox"
    );

    let undone = service.toggle_completed("a", false).await.unwrap();
    assert_eq!(undone.status, Status::Todo);
    assert!(!undone.completed);
    assert_eq!(undone.order, 7);
}

#[tokio::test]
async fn dropdown_status_change_uses_manual_trigger() {
    let mut service = seeded_service(vec![task("a", Status::Todo, 0)]).await;
    let moved = service.set_status("a", Status::InProgress).await.unwrap();
    assert_eq!(
        moved.last_activity().unwrap().details,
        "Task status changed to In Progress"
    );
}

#[tokio::test]
async fn bulk_status_collects_failures_per_task() {
    let mut service = seeded_service(vec![
        task("a", Status::Todo, 0),
        task("b", Status::Todo, 1),
        task("c", Status::Completed, 9),
    ])
    .await;
    service.repository().store().fail_writes_to("b").await;
    service.select("a", true).unwrap();
    service.select("b", true).unwrap();

    let outcome = service.bulk_change_status(Status::Completed).await.unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(outcome.updated.len(), 1);
    assert_eq!(outcome.updated[0].id, "a");
    assert_eq!(outcome.updated[0].order, 10);
    assert_eq!(
        outcome.updated[0].last_activity().unwrap().details,
        "Task status changed to Completed via bulk update"
    );
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].task_id, "b");

    assert!(!service.selection().contains("a"));
    assert!(service.selection().contains("b"));
    let snapshot = service.snapshot();
    assert!(snapshot.get("a").unwrap().completed);
    assert_eq!(snapshot.get("b").unwrap().status, Status::Todo);
    assert!(snapshot.error.is_some());
}

#[tokio::test]
async fn bulk_delete_of_selection_skips_missing() {
    let mut service = seeded_service(vec![
        task("a", Status::Todo, 0),
        task("b", Status::Todo, 1),
        task("c", Status::Todo, 2),
    ])
    .await;
    service.select("a", true).unwrap();
    service.select("b", true).unwrap();
    service.select("c", true).unwrap();
    // Someone else removes b before the batch runs.
    service.repository().store().delete("b").await.unwrap();

    let outcome = service.delete_selected().await.unwrap();
    assert_eq!(outcome.deleted, vec!["a".to_string(), "c".to_string()]);
    assert_eq!(outcome.skipped, vec!["b".to_string()]);
    assert!(service.snapshot().tasks.is_empty());
    assert!(service.selection().is_empty());
}

#[tokio::test]
async fn selecting_unknown_task_fails() {
    let mut service = seeded_service(vec![task("a", Status::Todo, 0)]).await;
    assert!(service.select("nope", true).unwrap_err().is_not_found());
}

#[tokio::test]
async fn create_uses_signed_in_owner() {
    let mut service = seeded_service(Vec::new()).await;
    let created = service
        .create(TaskDraft::new("ignored", "Buy milk"))
        .await
        .unwrap();
    assert_eq!(created.user_id, USER);
    assert_eq!(created.order, 0);
    assert!(service.snapshot().contains(&created.id));
}

#[tokio::test]
async fn failed_write_keeps_cache_and_records_error() {
    let mut service = seeded_service(vec![task("a", Status::Todo, 0)]).await;
    service.repository().store().fail_next(1).await;

    let err = service.create(TaskDraft::new(USER, "x")).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    let snapshot = service.snapshot();
    assert_eq!(snapshot.status, LoadStatus::Failed);
    assert_eq!(snapshot.error.as_deref(), Some(err.to_string().as_str()));
    assert_eq!(snapshot.tasks.len(), 1);

    // Still usable afterwards.
    service.create(TaskDraft::new(USER, "y")).await.unwrap();
    assert_eq!(service.snapshot().status, LoadStatus::Succeeded);
}

#[tokio::test]
async fn edit_updates_cache_in_place() {
    let mut service = seeded_service(vec![task("a", Status::Todo, 0)]).await;
    let edit = TaskEdit {
        description: Some("with oat milk".to_string()),
        ..Default::default()
    };
    service.edit("a", &edit).await.unwrap();
    let cached = service.snapshot().get("a").cloned().unwrap();
    assert_eq!(cached.description, "with oat milk");
    assert_eq!(cached.last_activity().unwrap().action, ActivityAction::Updated);
    assert_eq!(
        cached.last_activity().unwrap().details,
        "Description was updated"
    );
}

#[tokio::test]
async fn sign_out_clears_tasks_and_selection() {
    let mut service = seeded_service(vec![task("a", Status::Todo, 0)]).await;
    service.select("a", true).unwrap();
    service.sign_out();

    assert!(service.snapshot().tasks.is_empty());
    assert!(service.snapshot().owner.is_none());
    assert!(service.selection().is_empty());
    assert!(matches!(
        service.create(TaskDraft::new(USER, "x")).await,
        Err(Error::NotSignedIn)
    ));
}

#[tokio::test]
async fn tasks_are_scoped_to_the_signed_in_user() {
    let mut foreign = task("theirs", Status::Todo, 0);
    foreign.user_id = "u2".to_string();
    let service = seeded_service(vec![task("mine", Status::Todo, 0), foreign]).await;
    let snapshot = service.snapshot();
    assert_eq!(snapshot.owner.as_deref(), Some(USER));
    assert!(snapshot.contains("mine"));
    assert!(!snapshot.contains("theirs"));
}

#[tokio::test]
async fn attach_uploads_and_records_url() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    store.seed(vec![task("a", Status::Todo, 0)]).await;
    let mut service =
        TaskService::new(store).with_object_store(Arc::new(LocalObjectStore::new(dir.path())));
    service.sign_in(Identity::new(USER)).await.unwrap();

    let task = service
        .attach("a", "receipt.png", b"png-bytes".to_vec())
        .await
        .unwrap();

    let url = task.file_url.clone().unwrap();
    assert!(url.starts_with("file://"));
    assert!(url.ends_with("taskImages/u1/receipt.png"));
    assert_eq!(
        task.last_activity().unwrap().details,
        "New file was attached"
    );
    let stored = dir.path().join("taskImages").join(USER).join("receipt.png");
    assert_eq!(std::fs::read(stored).unwrap(), b"png-bytes");
}

#[tokio::test]
async fn attach_rejects_path_like_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    store.seed(vec![task("a", Status::Todo, 0)]).await;
    let mut service =
        TaskService::new(store).with_object_store(Arc::new(LocalObjectStore::new(dir.path())));
    service.sign_in(Identity::new(USER)).await.unwrap();

    let err = service
        .attach("a", "../escape.png", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(service.snapshot().get("a").unwrap().file_url.is_none());
}

#[tokio::test]
async fn create_with_attachment_records_one_created_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = TaskService::new(MemoryStore::new())
        .with_object_store(Arc::new(LocalObjectStore::new(dir.path())));
    service.sign_in(Identity::new(USER)).await.unwrap();

    let task = service
        .create_with_attachment(TaskDraft::new("ignored", "Pay rent"), "lease.pdf", b"pdf".to_vec())
        .await
        .unwrap();

    assert_eq!(task.user_id, USER);
    assert!(task.file_url.as_deref().unwrap().ends_with("taskImages/u1/lease.pdf"));
    assert_eq!(task.activity.len(), 1);
    assert_eq!(task.activity[0].action, ActivityAction::Created);
    let stored = service.repository().store().get(&task.id).await.unwrap().unwrap();
    assert_eq!(stored, task);
    let object = dir.path().join("taskImages").join(USER).join("lease.pdf");
    assert_eq!(std::fs::read(object).unwrap(), b"pdf");
}

#[tokio::test]
async fn failed_upload_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = TaskService::new(MemoryStore::new())
        .with_object_store(Arc::new(LocalObjectStore::new(dir.path())));
    service.sign_in(Identity::new(USER)).await.unwrap();

    let err = service
        .create_with_attachment(TaskDraft::new(USER, "Pay rent"), "a/b.pdf", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(service.repository().store().is_empty().await);
    assert!(service.snapshot().tasks.is_empty());
}
