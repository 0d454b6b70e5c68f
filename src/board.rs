//! Derived per-status views over a task snapshot.
//!
//! Views are recomputed from scratch on every call: filter, partition by
//! status, then a stable sort inside each partition. Pagination is kept
//! apart in [`Pager`] since it is view state, not a property of the data.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{Category, Status, Task};

/// Tasks shown per section before "load more"
pub const DEFAULT_PAGE_SIZE: usize = 5;

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Search box plus the two dropdown filters. Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_query: String,
    pub category: Option<Category>,
    pub due_date: Option<String>,
}

impl FilterCriteria {
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn is_searching(&self) -> bool {
        !self.search_query.is_empty()
    }

    pub fn matches_search(&self, task: &Task) -> bool {
        self.search_query.is_empty()
            || task
                .title
                .to_lowercase()
                .contains(&self.search_query.to_lowercase())
    }

    pub fn matches_category(&self, task: &Task) -> bool {
        self.category.map_or(true, |category| task.category == category)
    }

    pub fn matches_due_date(&self, task: &Task) -> bool {
        match self.due_date.as_deref() {
            None | Some("") => true,
            Some(due) => task.due_date == due,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.matches_search(task) && self.matches_category(task) && self.matches_due_date(task)
    }
}

/// Secondary ordering inside each section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// By the task's `order` index.
    #[default]
    Manual,
    DueAsc,
    DueDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Manual => "manual",
            SortOrder::DueAsc => "due_asc",
            SortOrder::DueDesc => "due_desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "manual" | "order" | "none" => Ok(SortOrder::Manual),
            "due_asc" | "asc" => Ok(SortOrder::DueAsc),
            "due_desc" | "desc" => Ok(SortOrder::DueDesc),
            _ => Err(Error::Validation(format!(
                "unknown sort '{raw}' (expected manual|due_asc|due_desc)"
            ))),
        }
    }
}

/// Check a due date typed by the user. Empty clears the date.
pub fn validate_due_date(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    NaiveDate::parse_from_str(trimmed, DUE_DATE_FORMAT)
        .map(|date| date.format(DUE_DATE_FORMAT).to_string())
        .map_err(|_| Error::Validation(format!("due date '{raw}' must look like YYYY-MM-DD")))
}

fn parse_due(task: &Task) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(task.due_date.trim(), DUE_DATE_FORMAT).ok()
}

/// Unparseable dates go last whichever direction is chosen.
fn compare_due(left: &Task, right: &Task, descending: bool) -> Ordering {
    match (parse_due(left), parse_due(right)) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of one section.
pub fn sort_section(section: &mut [&Task], sort: SortOrder) {
    match sort {
        SortOrder::Manual => section.sort_by_key(|task| task.order),
        SortOrder::DueAsc => section.sort_by(|a, b| compare_due(a, b, false)),
        SortOrder::DueDesc => section.sort_by(|a, b| compare_due(a, b, true)),
    }
}

/// The three sections derived from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView<'a> {
    pub todo: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
    searching: bool,
}

impl<'a> BoardView<'a> {
    pub fn derive(tasks: &'a [Task], criteria: &FilterCriteria, sort: SortOrder) -> Self {
        let mut view = BoardView {
            searching: criteria.is_searching(),
            ..Default::default()
        };
        for task in tasks.iter().filter(|task| criteria.matches(task)) {
            view.section_mut(task.status).push(task);
        }
        for status in Status::ALL {
            sort_section(view.section_mut(status), sort);
        }
        view
    }

    pub fn section(&self, status: Status) -> &[&'a Task] {
        match status {
            Status::Todo => &self.todo,
            Status::InProgress => &self.in_progress,
            Status::Completed => &self.completed,
        }
    }

    fn section_mut(&mut self, status: Status) -> &mut Vec<&'a Task> {
        match status {
            Status::Todo => &mut self.todo,
            Status::InProgress => &mut self.in_progress,
            Status::Completed => &mut self.completed,
        }
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    /// Kanban drops are disabled while a search is narrowing the columns.
    pub fn drops_enabled(&self) -> bool {
        !self.searching
    }

    /// True when a search is active and matched nothing.
    pub fn no_results(&self) -> bool {
        self.searching && self.is_empty()
    }
}

/// Per-section visible counts for "load more".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    visible: [usize; 3],
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

fn slot(status: Status) -> usize {
    match status {
        Status::Todo => 0,
        Status::InProgress => 1,
        Status::Completed => 2,
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            visible: [page_size; 3],
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn visible(&self, status: Status) -> usize {
        self.visible[slot(status)]
    }

    pub fn load_more(&mut self, status: Status) {
        let count = &mut self.visible[slot(status)];
        *count = count.saturating_add(self.page_size);
    }

    /// Show `pages` pages of `status` at once.
    pub fn show_pages(&mut self, status: Status, pages: usize) {
        self.visible[slot(status)] = self.page_size.saturating_mul(pages.max(1));
    }

    pub fn reset(&mut self) {
        self.visible = [self.page_size; 3];
    }

    /// The visible prefix of a section.
    pub fn page<'s, 'a>(&self, view: &'s BoardView<'a>, status: Status) -> &'s [&'a Task] {
        let section = view.section(status);
        &section[..section.len().min(self.visible(status))]
    }

    pub fn has_more(&self, view: &BoardView<'_>, status: Status) -> bool {
        view.section(status).len() > self.visible(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    fn task(id: &str, title: &str, status: Status, order: i64, due: &str) -> Task {
        let mut task = TaskDraft::new("u1", title)
            .with_status(status)
            .with_due_date(due)
            .into_task(order);
        task.id = id.to_string();
        task
    }

    fn ids(section: &[&Task]) -> Vec<String> {
        section.iter().map(|task| task.id.clone()).collect()
    }

    #[test]
    fn partitions_and_sorts_by_order() {
        let tasks = vec![
            task("a", "A", Status::Todo, 2, ""),
            task("b", "B", Status::Completed, 0, ""),
            task("c", "C", Status::Todo, 0, ""),
            task("d", "D", Status::InProgress, 0, ""),
        ];
        let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::Manual);
        assert_eq!(ids(&view.todo), vec!["c", "a"]);
        assert_eq!(ids(&view.in_progress), vec!["d"]);
        assert_eq!(ids(&view.completed), vec!["b"]);
    }

    #[test]
    fn due_date_ascending() {
        let tasks = vec![
            task("m", "M", Status::Todo, 0, "2025-03-01"),
            task("j", "J", Status::Todo, 1, "2025-01-01"),
            task("f", "F", Status::Todo, 2, "2025-02-01"),
        ];
        let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::DueAsc);
        assert_eq!(ids(&view.todo), vec!["j", "f", "m"]);

        let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::DueDesc);
        assert_eq!(ids(&view.todo), vec!["m", "f", "j"]);
    }

    #[test]
    fn due_date_ties_keep_prior_order() {
        let tasks = vec![
            task("x", "X", Status::Todo, 0, "2025-01-01"),
            task("y", "Y", Status::Todo, 1, "2025-01-01"),
        ];
        let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::DueDesc);
        assert_eq!(ids(&view.todo), vec!["x", "y"]);
    }

    #[test]
    fn unparseable_due_dates_sort_last() {
        let tasks = vec![
            task("n", "N", Status::Todo, 0, ""),
            task("d", "D", Status::Todo, 1, "2025-01-01"),
        ];
        for sort in [SortOrder::DueAsc, SortOrder::DueDesc] {
            let view = BoardView::derive(&tasks, &FilterCriteria::default(), sort);
            assert_eq!(ids(&view.todo), vec!["d", "n"]);
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let tasks = vec![
            task("a", "Buy Milk", Status::Todo, 0, ""),
            task("b", "Call mom", Status::Todo, 1, ""),
        ];
        let criteria = FilterCriteria::default().search("MILK");
        let view = BoardView::derive(&tasks, &criteria, SortOrder::Manual);
        assert_eq!(ids(&view.todo), vec!["a"]);
        assert!(!view.drops_enabled());
    }

    #[test]
    fn due_filter_is_exact_string_match() {
        let tasks = vec![
            task("a", "A", Status::Todo, 0, "2025-01-01"),
            task("b", "B", Status::Todo, 1, "2025-01-02"),
        ];
        let criteria = FilterCriteria::default().due_date("2025-01-01");
        let view = BoardView::derive(&tasks, &criteria, SortOrder::Manual);
        assert_eq!(ids(&view.todo), vec!["a"]);
    }

    #[test]
    fn no_results_only_when_searching() {
        let tasks: Vec<Task> = Vec::new();
        let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::Manual);
        assert!(!view.no_results());
        let view = BoardView::derive(&tasks, &FilterCriteria::default().search("x"), SortOrder::Manual);
        assert!(view.no_results());
    }

    #[test]
    fn pager_grows_by_page_size() {
        let tasks: Vec<Task> = (0..12)
            .map(|n| task(&format!("t{n}"), "T", Status::Todo, n, ""))
            .collect();
        let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::Manual);
        let mut pager = Pager::default();
        assert_eq!(pager.page(&view, Status::Todo).len(), 5);
        assert!(pager.has_more(&view, Status::Todo));
        pager.load_more(Status::Todo);
        assert_eq!(pager.page(&view, Status::Todo).len(), 10);
        pager.load_more(Status::Todo);
        assert_eq!(pager.page(&view, Status::Todo).len(), 12);
        assert!(!pager.has_more(&view, Status::Todo));
        assert_eq!(pager.visible(Status::Completed), 5);
    }

    #[test]
    fn huge_page_counts_saturate() {
        let tasks = vec![task("a", "A", Status::Todo, 0, "")];
        let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::Manual);
        let mut pager = Pager::default();
        pager.show_pages(Status::Todo, usize::MAX);
        assert_eq!(pager.visible(Status::Todo), usize::MAX);
        pager.load_more(Status::Todo);
        assert_eq!(pager.visible(Status::Todo), usize::MAX);
        assert_eq!(pager.page(&view, Status::Todo).len(), 1);
    }

    #[test]
    fn sort_names_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::DueAsc);
        assert_eq!("due-desc".parse::<SortOrder>().unwrap(), SortOrder::DueDesc);
        assert!("random".parse::<SortOrder>().is_err());
    }
}
