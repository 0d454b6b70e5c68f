//! Task records and the edit vocabulary around them.
//!
//! A task lives in exactly one status partition. Its `order` is only
//! meaningful inside that partition, and `completed` mirrors
//! `status == Completed` at all times.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kanban column / list section a task belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    #[serde(rename = "Todo")]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl Status {
    /// All statuses in board column order.
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "Todo",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(Status::Todo),
            "inprogress" => Ok(Status::InProgress),
            "completed" | "done" => Ok(Status::Completed),
            _ => Err(Error::Validation(format!(
                "unknown status '{raw}' (expected Todo|In Progress|Completed)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Work,
    Personal,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            _ => Err(Error::Validation(format!(
                "unknown category '{raw}' (expected Work|Personal)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    StatusChange,
}

/// One line of a task's mutation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub action: ActivityAction,
    pub details: String,
}

impl ActivityEntry {
    pub fn new(action: ActivityAction, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            details: details.into(),
        }
    }

    pub fn created(title: &str, status: Status) -> Self {
        Self::new(
            ActivityAction::Created,
            format!("Task \"{title}\" created with status \"{status}\""),
        )
    }
}

/// What initiated a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTrigger {
    ManualEdit,
    Checkbox,
    DragAndDrop,
    Bulk,
}

impl MoveTrigger {
    /// Activity text recorded when a task enters `status` via this trigger.
    pub fn describe(&self, status: Status) -> String {
        match self {
            MoveTrigger::ManualEdit => format!("Task status changed to {status}"),
            MoveTrigger::Checkbox => {
                if status.is_completed() {
                    "Task marked as completed via checkbox".to_string()
                } else {
                    "Task marked as incomplete via checkbox".to_string()
                }
            }
            MoveTrigger::DragAndDrop => {
                format!("Task status changed to {status} via drag and drop")
            }
            MoveTrigger::Bulk => format!("Task status changed to {status} via bulk update"),
        }
    }
}

/// A persisted task record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub category: Category,
    #[serde(default)]
    pub due_date: String,
    pub completed: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
}

impl Task {
    /// Move the task to `status`, keeping `completed` in step.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.completed = status.is_completed();
    }

    /// Append to the activity log. Existing entries are never touched.
    pub fn record(&mut self, entry: ActivityEntry) {
        self.activity.push(entry);
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Repair a record whose `completed` flag disagrees with its status.
    pub fn normalize(&mut self) {
        self.completed = self.status.is_completed();
    }

    pub fn last_activity(&self) -> Option<&ActivityEntry> {
        self.activity.last()
    }
}

/// Create-form input. Everything else is assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub category: Category,
    pub due_date: String,
    pub file_url: Option<String>,
}

impl TaskDraft {
    /// Quick-add defaults: Todo, Work, no description or attachment.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            description: String::new(),
            status: Status::Todo,
            category: Category::Work,
            due_date: String::new(),
            file_url: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = due_date.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_file_url(mut self, file_url: impl Into<String>) -> Self {
        self.file_url = Some(file_url.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::Validation("task owner cannot be empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Validation("task title cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Build the record to hand to the store. `id` is left empty for the
    /// store to assign.
    pub fn into_task(self, order: i64) -> Task {
        let title = self.title.trim().to_string();
        let entry = ActivityEntry::created(&title, self.status);
        Task {
            id: String::new(),
            user_id: self.user_id,
            title,
            description: self.description,
            status: self.status,
            category: self.category,
            due_date: self.due_date,
            completed: self.status.is_completed(),
            order,
            file_url: self.file_url,
            created_at: entry.timestamp,
            updated_at: None,
            activity: vec![entry],
        }
    }
}

/// Edit-form input. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub due_date: Option<String>,
    /// URL of a freshly uploaded attachment.
    pub file_url: Option<String>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        *self == TaskEdit::default()
    }

    /// Status after the edit, if it differs from `current`.
    pub fn status_change(&self, current: &Task) -> Option<Status> {
        self.status.filter(|status| *status != current.status)
    }

    /// Human-readable summary of what this edit changes on `current`.
    pub fn describe(&self, current: &Task) -> String {
        let mut changes = Vec::new();

        if let Some(title) = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| *t != current.title)
        {
            changes.push(format!(
                "Title changed from \"{}\" to \"{}\"",
                current.title, title
            ));
        }
        if self
            .description
            .as_deref()
            .is_some_and(|d| d != current.description)
        {
            changes.push("Description was updated".to_string());
        }
        if let Some(category) = self.category.filter(|c| *c != current.category) {
            changes.push(format!(
                "Category changed from \"{}\" to \"{}\"",
                current.category, category
            ));
        }
        if let Some(status) = self.status_change(current) {
            changes.push(format!(
                "Status changed from \"{}\" to \"{}\"",
                current.status, status
            ));
        }
        if let Some(due) = self.due_date.as_deref().filter(|d| *d != current.due_date) {
            changes.push(format!(
                "Due date changed from \"{}\" to \"{}\"",
                current.due_date, due
            ));
        }
        if self.file_url.is_some() {
            changes.push("New file was attached".to_string());
        }

        if changes.is_empty() {
            "Task was edited".to_string()
        } else {
            changes.join(", ")
        }
    }

    /// Apply the field changes to `task`. Order and activity are the
    /// caller's concern.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(status) = self.status {
            task.set_status(status);
        }
        if let Some(due) = &self.due_date {
            task.due_date = due.clone();
        }
        if let Some(url) = &self.file_url {
            task.file_url = Some(url.clone());
        }
    }
}
