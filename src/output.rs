//! What taskboard prints.
//!
//! `--json` wraps every result in one versioned envelope:
//! `{schema_version, command, status, data | error, warnings?, next_steps?}`.
//! Otherwise commands render a [`Screen`]: a title, aligned task fields,
//! free lines, status sections, then notices and suggested commands.

use serde::Serialize;

use crate::error::{Error, JsonError, Result};
use crate::task::{Status, Task};

pub const SCHEMA_VERSION: &str = "taskboard.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Rendered rows of one status section holding `total` tasks.
#[derive(Debug, Clone)]
struct Section {
    status: Status,
    total: usize,
    rows: Vec<String>,
}

/// Human rendering of one command result.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    title: String,
    fields: Vec<(String, String)>,
    lines: Vec<String>,
    sections: Vec<Section>,
    notices: Vec<String>,
    hints: Vec<String>,
}

impl Screen {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Labelled value shown under the title, e.g. `status  Todo`.
    pub fn field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// The common fields of a single task.
    pub fn task_fields(&mut self, task: &Task) {
        self.field("id", task.id.clone());
        self.field("status", task.status.to_string());
        self.field("category", task.category.to_string());
        if !task.due_date.is_empty() {
            self.field("due", task.due_date.clone());
        }
        self.field("order", task.order.to_string());
        if let Some(url) = &task.file_url {
            self.field("file", url.clone());
        }
    }

    pub fn line(&mut self, value: impl Into<String>) {
        self.lines.push(value.into());
    }

    /// One status section; `shown` may be a prefix of `total` tasks.
    pub fn section(&mut self, status: Status, total: usize, shown: &[&Task]) {
        self.sections.push(Section {
            status,
            total,
            rows: shown.iter().map(|task| task_line(task)).collect(),
        });
    }

    pub fn notice(&mut self, value: impl Into<String>) {
        self.notices.push(value.into());
    }

    /// A command worth running next.
    pub fn hint(&mut self, value: impl Into<String>) {
        self.hints.push(value.into());
    }

    pub fn render(&self) -> String {
        let mut out = vec![self.title.clone()];

        let width = self.fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in &self.fields {
            out.push(format!("  {key:<width$}  {value}"));
        }

        if !self.lines.is_empty() {
            out.push(String::new());
            out.extend(self.lines.iter().map(|line| format!("  {line}")));
        }

        for section in &self.sections {
            out.push(String::new());
            out.push(format!("{} ({})", section.status, section.total));
            if section.rows.is_empty() {
                out.push("  (empty)".to_string());
            }
            out.extend(section.rows.iter().map(|row| format!("  {row}")));
            let hidden = section.total.saturating_sub(section.rows.len());
            if hidden > 0 {
                out.push(format!("  ... {hidden} more"));
            }
        }

        if !self.notices.is_empty() || !self.hints.is_empty() {
            out.push(String::new());
        }
        out.extend(self.notices.iter().map(|notice| format!("! {notice}")));
        out.extend(self.hints.iter().map(|hint| format!("try: {hint}")));

        out.join("\n")
    }
}

#[derive(Serialize)]
struct Envelope<'a, B: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(flatten)]
    body: B,
    #[serde(skip_serializing_if = "no_items")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_items")]
    next_steps: &'a [String],
}

fn no_items(items: &&[String]) -> bool {
    items.is_empty()
}

#[derive(Serialize)]
struct DataBody<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorBody {
    error: JsonError,
}

fn print_envelope<B: Serialize>(
    command: &str,
    status: &'static str,
    body: B,
    warnings: &[String],
    next_steps: &[String],
) -> Result<()> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status,
        body,
        warnings,
        next_steps,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Print a successful result. In JSON mode the screen's notices and hints
/// become `warnings` and `next_steps`.
pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    screen: Option<&Screen>,
) -> Result<()> {
    if options.json {
        let (warnings, hints) = screen
            .map(|screen| (screen.notices.as_slice(), screen.hints.as_slice()))
            .unwrap_or_default();
        return print_envelope(command, "success", DataBody { data }, warnings, hints);
    }
    if options.quiet {
        return Ok(());
    }
    if let Some(screen) = screen {
        println!("{}", screen.render());
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hints = error_hints(err);
    if json {
        let body = ErrorBody {
            error: JsonError::from(err),
        };
        return print_envelope(command, "error", body, &[], &hints);
    }

    eprintln!("error: {err}");
    for hint in &hints {
        eprintln!("try: {hint}");
    }
    Ok(())
}

/// `[x] 01hzzzzzzz Buy milk (Personal) due 2025-01-01 +file`
pub fn task_line(task: &Task) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let mut line = format!(
        "[{check}] {} {} ({})",
        short_id(&task.id),
        task.title,
        task.category
    );
    if !task.due_date.is_empty() {
        line.push_str(" due ");
        line.push_str(&task.due_date);
    }
    if task.file_url.is_some() {
        line.push_str(" +file");
    }
    line
}

/// Leading characters of an id, enough to tell tasks apart on screen.
pub fn short_id(id: &str) -> &str {
    id.get(..10).unwrap_or(id)
}

/// First positional argument, used to label errors raised before clap
/// hands back a parsed command.
pub fn infer_command_name_from_args() -> String {
    std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with('-'))
        .unwrap_or_else(|| "taskboard".to_string())
}

fn error_hints(err: &Error) -> Vec<String> {
    let hint = match err {
        Error::NotSignedIn => "taskboard login --user <uid>",
        Error::NotFound(_) => "taskboard list",
        Error::InvalidConfig(_) | Error::TomlParse(_) => {
            "fix taskboard.toml in the data directory then retry"
        }
        Error::LockFailed(_) => "retry once other taskboard processes finish",
        _ => return Vec::new(),
    };
    vec![hint.to_string()]
}
