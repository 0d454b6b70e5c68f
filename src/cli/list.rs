//! taskboard list / board
//!
//! Both render the same derived view; they differ in layout and in whether
//! drag-and-drop is offered.

use crate::board::{validate_due_date, BoardView, FilterCriteria, Pager};
use crate::error::Result;
use crate::output::{emit_success, Screen};
use crate::task::{Status, Task};

use super::{Context, ViewArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    List,
    Board,
}

impl Layout {
    fn command(&self) -> &'static str {
        match self {
            Layout::List => "list",
            Layout::Board => "board",
        }
    }
}

#[derive(serde::Serialize)]
struct SectionReport<'a> {
    status: Status,
    total: usize,
    shown: Vec<&'a Task>,
    has_more: bool,
}

#[derive(serde::Serialize)]
struct ViewReport<'a> {
    sort: String,
    searching: bool,
    drops_enabled: bool,
    sections: Vec<SectionReport<'a>>,
}

pub async fn run(ctx: &Context, layout: Layout, args: ViewArgs) -> Result<()> {
    let mut criteria = FilterCriteria::default();
    if let Some(query) = args.search {
        criteria = criteria.search(query);
    }
    if let Some(category) = args.category {
        criteria = criteria.category(category);
    }
    if let Some(due) = args.due.as_deref() {
        let due = validate_due_date(due)?;
        if !due.is_empty() {
            criteria = criteria.due_date(due);
        }
    }
    let sort = match args.sort {
        Some(sort) => sort,
        None => ctx.config.board.sort()?,
    };

    let service = ctx.service().await?;
    let snapshot = service.snapshot();
    let view = BoardView::derive(&snapshot.tasks, &criteria, sort);

    let mut pager = Pager::new(ctx.config.board.page_size);
    for status in Status::ALL {
        let pages = if args.all {
            view.section(status).len().div_ceil(pager.page_size()).max(1)
        } else {
            args.pages.max(1)
        };
        pager.show_pages(status, pages);
    }

    let drops_enabled = layout == Layout::List || view.drops_enabled();
    let sections: Vec<SectionReport> = Status::ALL
        .into_iter()
        .map(|status| SectionReport {
            status,
            total: view.section(status).len(),
            shown: pager.page(&view, status).to_vec(),
            has_more: pager.has_more(&view, status),
        })
        .collect();

    let mut screen = Screen::new(format!(
        "taskboard {}: {} task(s)",
        layout.command(),
        view.len()
    ));
    if view.no_results() {
        screen.notice("no tasks match the current filters");
    }
    if layout == Layout::Board && !drops_enabled {
        screen.notice("moving tasks is disabled while searching");
    }
    for section in &sections {
        screen.section(section.status, section.total, &section.shown);
    }
    if sections.iter().any(|section| section.has_more) {
        screen.hint(format!(
            "taskboard {} --pages {}",
            layout.command(),
            args.pages.max(1).saturating_add(1)
        ));
    }

    let report = ViewReport {
        sort: sort.to_string(),
        searching: view.is_searching(),
        drops_enabled,
        sections,
    };
    emit_success(ctx.output, layout.command(), &report, Some(&screen))
}
