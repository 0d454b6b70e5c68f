#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use taskboard::auth::Identity;
use taskboard::service::TaskService;
use taskboard::store::MemoryStore;
use taskboard::task::{Category, Status, Task, TaskDraft};

pub const USER: &str = "u1";

/// `taskboard` pointed at `data_dir`, isolated from the caller's environment.
pub fn taskboard_cmd(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("taskboard").expect("binary");
    cmd.env_remove("TASKBOARD_USER")
        .env_remove("TASKBOARD_DATA_DIR")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

/// Run a command with `--json` and parse the success envelope.
pub fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let output = taskboard_cmd(data_dir)
        .args(args)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("json envelope")
}

/// Add a task as [`USER`] and return its id.
pub fn add_task(data_dir: &Path, title: &str, extra: &[&str]) -> String {
    let mut args = vec!["--user", USER, "add", title];
    args.extend_from_slice(extra);
    let value = run_json(data_dir, &args);
    value["data"]["task"]["id"]
        .as_str()
        .expect("task id")
        .to_string()
}

/// A stored record with a fixed id, as if created earlier.
pub fn task(id: &str, status: Status, order: i64) -> Task {
    let mut task = TaskDraft::new(USER, id)
        .with_status(status)
        .into_task(order);
    task.id = id.to_string();
    task
}

pub fn dated(id: &str, due: &str, category: Category) -> Task {
    let mut task = TaskDraft::new(USER, id)
        .with_category(category)
        .with_due_date(due)
        .into_task(0);
    task.id = id.to_string();
    task
}

/// Service over a memory store holding `tasks`, signed in as [`USER`].
pub async fn seeded_service(tasks: Vec<Task>) -> TaskService<MemoryStore> {
    let store = MemoryStore::new();
    store.seed(tasks).await;
    let mut service = TaskService::new(store);
    service
        .sign_in(Identity::new(USER))
        .await
        .expect("sign in");
    service
}

pub fn order_of(service: &TaskService<MemoryStore>, id: &str) -> i64 {
    service.snapshot().get(id).expect("cached task").order
}
