//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Handlers live in submodules grouped by what they touch.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::attachments::LocalObjectStore;
use crate::auth;
use crate::board::SortOrder;
use crate::cache::CacheSnapshot;
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::output::OutputOptions;
use crate::service::TaskService;
use crate::store::FileStore;
use crate::task::{Category, Status};

mod bulk;
mod list;
mod session;
mod task;

/// taskboard - personal task board
///
/// Tasks live in three sections (Todo, In Progress, Completed), each kept
/// in manual order. Every change is recorded in the task's activity log.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding tasks, attachments and the session
    #[arg(long, global = true, env = config::DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Act as this user id instead of the signed-in one
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and remember the identity for later commands
    Login {
        /// Display name shown in `whoami`
        #[arg(long)]
        name: Option<String>,

        /// Email address
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the remembered identity
    Logout,

    /// Show who commands act as
    Whoami,

    /// Create a task at the end of its section
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Todo, "In Progress" or Completed
        #[arg(short, long, default_value = "Todo")]
        status: Status,

        /// Work or Personal
        #[arg(short, long, default_value = "Work")]
        category: Category,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// File to upload and attach to the new task
        #[arg(long)]
        file: Option<PathBuf>,

        /// Stored file name (defaults to the file's own name)
        #[arg(long, requires = "file")]
        name: Option<String>,
    },

    /// Show tasks in sections
    List(ViewArgs),

    /// Show tasks as kanban columns
    Board(ViewArgs),

    /// Show one task with its activity log
    Show {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Change fields of a task
    Edit {
        /// Task id (a unique prefix is enough)
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<Category>,

        #[arg(long)]
        status: Option<Status>,

        /// Due date (YYYY-MM-DD); empty clears it
        #[arg(long)]
        due: Option<String>,
    },

    /// Set the status of a task
    Status {
        /// Task id (a unique prefix is enough)
        id: String,

        /// Todo, "In Progress" or Completed
        status: Status,
    },

    /// Tick a task's checkbox
    Done {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Untick a task's checkbox
    Undone {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Drag a task onto another section
    Move {
        /// Task id (a unique prefix is enough)
        id: String,

        /// Target section
        to: Status,

        /// Drop on the kanban board (origin column is not renumbered)
        #[arg(long)]
        board: bool,
    },

    /// Delete a task
    Rm {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Delete several tasks at once
    RmBulk {
        /// Task ids (unique prefixes are enough)
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Set the status of several tasks at once
    BulkStatus {
        /// Target status
        status: Status,

        /// Task ids (unique prefixes are enough)
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Upload a file and attach it to a task
    Attach {
        /// Task id (a unique prefix is enough)
        id: String,

        /// File to upload
        file: PathBuf,

        /// Stored file name (defaults to the file's own name)
        #[arg(long)]
        name: Option<String>,
    },
}

/// Filters shared by `list` and `board`
#[derive(clap::Args, Debug, Clone)]
pub struct ViewArgs {
    /// Case-insensitive title search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only this category
    #[arg(short, long)]
    pub category: Option<Category>,

    /// Only tasks due on this date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// manual, due_asc or due_desc (defaults to board.default_sort)
    #[arg(long)]
    pub sort: Option<SortOrder>,

    /// Pages to show per section
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Show every task
    #[arg(long)]
    pub all: bool,
}

/// Resolved settings shared by every handler.
pub(crate) struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub user: Option<String>,
    pub output: OutputOptions,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let data_dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => config::default_data_dir()?,
        };
        let config = Config::load_from_dir(&data_dir)?;
        Ok(Self {
            data_dir,
            config,
            user: cli.user.clone(),
            output: OutputOptions {
                json: cli.json,
                quiet: cli.quiet,
            },
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.config.session_path(&self.data_dir)
    }

    pub fn identity(&self) -> Result<auth::Identity> {
        auth::resolve_identity(self.user.as_deref(), &self.session_path())
    }

    /// Service over the configured store, nobody signed in yet.
    pub fn open(&self) -> TaskService<FileStore> {
        let store = FileStore::new(self.config.store_path(&self.data_dir))
            .with_lock_timeout(self.config.store.lock_timeout_ms);
        let objects = LocalObjectStore::new(self.config.attachments_dir(&self.data_dir));
        TaskService::new(store).with_object_store(Arc::new(objects))
    }

    /// Service signed in as the resolved identity, with its tasks loaded.
    pub async fn service(&self) -> Result<TaskService<FileStore>> {
        let identity = self.identity()?;
        let mut service = self.open();
        service.sign_in(identity).await?;
        Ok(service)
    }
}

/// Resolve a full id or unique id prefix against the loaded tasks.
pub(crate) fn resolve_task_id(snapshot: &CacheSnapshot, raw: &str) -> Result<String> {
    let wanted = raw.trim().to_ascii_lowercase();
    if wanted.is_empty() {
        return Err(Error::Validation("task id is required".to_string()));
    }
    if snapshot.contains(&wanted) {
        return Ok(wanted);
    }
    let mut matches = snapshot
        .tasks
        .iter()
        .filter(|task| task.id.starts_with(&wanted));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.id.clone()),
        (Some(_), Some(_)) => Err(Error::Validation(format!(
            "task id prefix '{raw}' is ambiguous"
        ))),
        (None, _) => Err(Error::NotFound(raw.to_string())),
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.dispatch())
    }

    async fn dispatch(self) -> Result<()> {
        let ctx = Context::load(&self)?;
        match self.command {
            Commands::Login { name, email } => session::run_login(&ctx, name, email).await,
            Commands::Logout => session::run_logout(&ctx),
            Commands::Whoami => session::run_whoami(&ctx),
            Commands::Add {
                title,
                description,
                status,
                category,
                due,
                file,
                name,
            } => {
                task::run_add(
                    &ctx,
                    task::AddOptions {
                        title,
                        description,
                        status,
                        category,
                        due,
                        file,
                        name,
                    },
                )
                .await
            }
            Commands::List(args) => list::run(&ctx, list::Layout::List, args).await,
            Commands::Board(args) => list::run(&ctx, list::Layout::Board, args).await,
            Commands::Show { id } => task::run_show(&ctx, &id).await,
            Commands::Edit {
                id,
                title,
                description,
                category,
                status,
                due,
            } => {
                task::run_edit(
                    &ctx,
                    task::EditOptions {
                        id,
                        title,
                        description,
                        category,
                        status,
                        due,
                    },
                )
                .await
            }
            Commands::Status { id, status } => task::run_status(&ctx, &id, status).await,
            Commands::Done { id } => task::run_toggle(&ctx, &id, true).await,
            Commands::Undone { id } => task::run_toggle(&ctx, &id, false).await,
            Commands::Move { id, to, board } => task::run_move(&ctx, &id, to, board).await,
            Commands::Rm { id } => task::run_rm(&ctx, &id).await,
            Commands::RmBulk { ids } => bulk::run_rm(&ctx, &ids).await,
            Commands::BulkStatus { status, ids } => bulk::run_status(&ctx, status, &ids).await,
            Commands::Attach { id, file, name } => task::run_attach(&ctx, &id, file, name).await,
        }
    }
}
