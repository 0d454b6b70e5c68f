mod support;

use taskboard::board::{BoardView, FilterCriteria, Pager, SortOrder};
use taskboard::task::{Category, Status, Task};

use support::{dated, task};

fn ids(section: &[&Task]) -> Vec<String> {
    section.iter().map(|task| task.id.clone()).collect()
}

fn titled(id: &str, title: &str, category: Category, due: &str) -> Task {
    let mut task = dated(id, due, category);
    task.title = title.to_string();
    task
}

#[test]
fn due_date_ascending_sorts_oldest_first() {
    let tasks = vec![
        dated("mar", "2025-03-01", Category::Work),
        dated("jan", "2025-01-01", Category::Work),
        dated("feb", "2025-02-01", Category::Work),
    ];
    let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::DueAsc);
    assert_eq!(ids(view.section(Status::Todo)), vec!["jan", "feb", "mar"]);

    let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::DueDesc);
    assert_eq!(ids(view.section(Status::Todo)), vec!["mar", "feb", "jan"]);
}

#[test]
fn filters_commute() {
    let tasks = vec![
        titled("1", "Buy milk", Category::Personal, "2025-01-01"),
        titled("2", "Buy stamps", Category::Work, "2025-01-01"),
        titled("3", "Milk the cow", Category::Personal, "2025-02-02"),
        titled("4", "Call bank", Category::Personal, "2025-01-01"),
        titled("5", "buy MILK again", Category::Personal, "2025-01-01"),
    ];
    let criteria = FilterCriteria::default()
        .search("milk")
        .category(Category::Personal)
        .due_date("2025-01-01");

    type Pred = fn(&FilterCriteria, &Task) -> bool;
    let predicates: [Pred; 3] = [
        FilterCriteria::matches_search,
        FilterCriteria::matches_category,
        FilterCriteria::matches_due_date,
    ];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    let expected: Vec<&str> = vec!["1", "5"];
    for order in orders {
        let mut remaining: Vec<&Task> = tasks.iter().collect();
        for index in order {
            remaining.retain(|task| predicates[index](&criteria, task));
        }
        let got: Vec<&str> = remaining.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(got, expected, "filter order {order:?}");
    }

    let view = BoardView::derive(&tasks, &criteria, SortOrder::Manual);
    assert_eq!(ids(view.section(Status::Todo)), expected);
}

#[test]
fn manual_sort_is_stable_on_order() {
    let tasks = vec![
        task("c", Status::Todo, 2),
        task("a", Status::Todo, 0),
        task("b", Status::Todo, 1),
        task("done", Status::Completed, 0),
    ];
    let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::Manual);
    assert_eq!(ids(view.section(Status::Todo)), vec!["a", "b", "c"]);
    assert_eq!(ids(view.section(Status::Completed)), vec!["done"]);
    assert!(view.section(Status::InProgress).is_empty());
}

#[test]
fn search_disables_board_drops_and_reports_no_results() {
    let tasks = vec![task("a", Status::Todo, 0)];
    let view = BoardView::derive(&tasks, &FilterCriteria::default().search("zzz"), SortOrder::Manual);
    assert!(!view.drops_enabled());
    assert!(view.no_results());

    let view = BoardView::derive(&tasks, &FilterCriteria::default(), SortOrder::Manual);
    assert!(view.drops_enabled());
    assert!(!view.no_results());
}

#[test]
fn pager_shows_five_then_loads_more() {
    let tasks: Vec<Task> = (0..12)
        .map(|order| task(&format!("t{order:02}"), Status::Todo, order))
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

    pager.reset();
    assert_eq!(pager.visible(Status::Todo), 5);
}
