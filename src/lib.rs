//! taskboard - personal task board library
//!
//! This library provides the core of the taskboard CLI: task records kept
//! in a document store, a client-side cache of the signed-in user's tasks,
//! and the derived list/kanban views over it.
//!
//! # Core Concepts
//!
//! - **Partitions**: each status (Todo, In Progress, Completed) is a section
//!   with its own manual `order`
//! - **Activity**: every task carries an append-only log of what changed it
//! - **Moves**: entering a section appends at its end; list drops close the
//!   gap left behind
//! - **Snapshots**: the cache changes only through typed actions, each
//!   producing a new immutable snapshot
//!
//! # Module Organization
//!
//! - `attachments`: Object store for uploaded files
//! - `auth`: Signed-in identity and session listeners
//! - `board`: Filtering, sorting and paging of the three sections
//! - `cache`: Task cache snapshots and selection state
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `taskboard.toml`
//! - `error`: Error types and result aliases
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON output envelopes
//! - `reorder`: Status transitions and order bookkeeping
//! - `repository`: Task mutations as document store operations
//! - `service`: Façade tying repository, cache and session together
//! - `store`: Document store trait with memory and file backends
//! - `task`: Task records, drafts and edits

pub mod attachments;
pub mod auth;
pub mod board;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod reorder;
pub mod repository;
pub mod service;
pub mod store;
pub mod task;

pub use error::{Error, Result};
