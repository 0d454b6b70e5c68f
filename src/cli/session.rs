//! taskboard login/logout/whoami
//!
//! The remembered identity lives in the session file inside the data dir.

use std::path::PathBuf;

use crate::auth::{self, Identity, StaticProvider};
use crate::error::{Error, Result};
use crate::output::{emit_success, Screen};

use super::Context;

#[derive(serde::Serialize)]
struct LoginReport {
    identity: Identity,
    tasks: usize,
    session_file: PathBuf,
}

#[derive(serde::Serialize)]
struct LogoutReport {
    signed_out: bool,
}

#[derive(serde::Serialize)]
struct WhoamiReport {
    identity: Identity,
}

pub async fn run_login(ctx: &Context, name: Option<String>, email: Option<String>) -> Result<()> {
    let mut identity = match ctx.identity() {
        Ok(identity) => identity,
        Err(Error::NotSignedIn) => {
            return Err(Error::Validation(
                "pass --user <uid> (or set TASKBOARD_USER) to log in".to_string(),
            ))
        }
        Err(err) => return Err(err),
    };
    if let Some(name) = name {
        identity = identity.with_display_name(name);
    }
    if let Some(email) = email {
        identity = identity.with_email(email);
    }

    let provider = StaticProvider::new(identity);
    let mut service = ctx.open();
    let snapshot = service.sign_in_with(&provider).await?;
    let identity = service
        .session()
        .current()
        .cloned()
        .ok_or(Error::NotSignedIn)?;

    let session_file = ctx.session_path();
    auth::persist(&session_file, &identity)?;

    let report = LoginReport {
        identity: identity.clone(),
        tasks: snapshot.tasks.len(),
        session_file: session_file.clone(),
    };

    let mut screen = Screen::new(format!("taskboard login: {}", identity.label()));
    screen.field("uid", identity.uid.clone());
    screen.field("tasks", snapshot.tasks.len().to_string());
    screen.field("session", session_file.display().to_string());
    screen.hint("taskboard add \"<title>\"");

    emit_success(ctx.output, "login", &report, Some(&screen))
}

pub fn run_logout(ctx: &Context) -> Result<()> {
    let signed_out = auth::forget(&ctx.session_path())?;
    let report = LogoutReport { signed_out };

    let header = if signed_out {
        "taskboard logout: signed out"
    } else {
        "taskboard logout: nobody was signed in"
    };
    let screen = Screen::new(header);

    emit_success(ctx.output, "logout", &report, Some(&screen))
}

pub fn run_whoami(ctx: &Context) -> Result<()> {
    let identity = ctx.identity()?;

    let mut screen = Screen::new(format!("taskboard whoami: {}", identity.label()));
    screen.field("uid", identity.uid.clone());
    if let Some(email) = &identity.email {
        screen.field("email", email.clone());
    }

    let report = WhoamiReport { identity };
    emit_success(ctx.output, "whoami", &report, Some(&screen))
}
