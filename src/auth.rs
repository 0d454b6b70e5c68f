//! Signed-in identity and session lifecycle.
//!
//! Identity resolution order for the CLI:
//! 1) `--user` (explicit uid)
//! 2) `TASKBOARD_USER` environment variable
//! 3) Persisted session file written by `taskboard login`
//! 4) Otherwise not signed in

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::lock;

pub const USER_ENV: &str = "TASKBOARD_USER";

/// Who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// External sign-in flow.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self) -> Result<Identity>;

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}

/// Provider that signs in a fixed identity. Used by the CLI and tests.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    identity: Identity,
}

impl StaticProvider {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl AuthProvider for StaticProvider {
    async fn sign_in(&self) -> Result<Identity> {
        if self.identity.uid.trim().is_empty() {
            return Err(Error::Validation("user id cannot be empty".to_string()));
        }
        Ok(self.identity.clone())
    }
}

type Listener = Box<dyn Fn(Option<&Identity>) + Send + Sync>;

/// Handle returned by [`Session::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

/// Current identity plus change listeners.
#[derive(Default)]
pub struct Session {
    current: Option<Identity>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    pub fn uid(&self) -> Result<&str> {
        self.current
            .as_ref()
            .map(|identity| identity.uid.as_str())
            .ok_or(Error::NotSignedIn)
    }

    /// Register a listener called on every sign-in and sign-out.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(Option<&Identity>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(existing, _)| *existing != id);
    }

    pub async fn sign_in(&mut self, provider: &dyn AuthProvider) -> Result<Identity> {
        let identity = provider.sign_in().await?;
        self.set(identity.clone());
        Ok(identity)
    }

    pub async fn sign_out(&mut self, provider: &dyn AuthProvider) -> Result<()> {
        provider.sign_out().await?;
        self.clear();
        Ok(())
    }

    pub fn set(&mut self, identity: Identity) {
        debug!(uid = %identity.uid, "session signed in");
        self.current = Some(identity);
        self.notify();
    }

    pub fn clear(&mut self) {
        if self.current.take().is_some() {
            debug!("session signed out");
        }
        self.notify();
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(self.current.as_ref());
        }
    }
}

/// Resolve who the CLI acts as.
pub fn resolve_identity(cli_user: Option<&str>, session_file: &Path) -> Result<Identity> {
    if let Some(uid) = non_empty(cli_user) {
        return Ok(Identity::new(uid));
    }

    if let Ok(env_user) = std::env::var(USER_ENV) {
        if let Some(uid) = non_empty(Some(env_user.as_str())) {
            return Ok(Identity::new(uid));
        }
    }

    load_persisted(session_file)?.ok_or(Error::NotSignedIn)
}

/// Persist the identity for later CLI invocations.
pub fn persist(session_file: &Path, identity: &Identity) -> Result<()> {
    if non_empty(Some(identity.uid.as_str())).is_none() {
        return Err(Error::Validation("user id cannot be empty".to_string()));
    }
    let json = serde_json::to_string_pretty(identity)?;
    lock::write_atomic(session_file, json.as_bytes())
}

pub fn load_persisted(session_file: &Path) -> Result<Option<Identity>> {
    if !session_file.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(session_file)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let identity: Identity = serde_json::from_str(&raw)?;
    if identity.uid.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(identity))
}

/// Remove the persisted session. Returns whether one existed.
pub fn forget(session_file: &Path) -> Result<bool> {
    if !session_file.exists() {
        return Ok(false);
    }
    std::fs::remove_file(session_file)?;
    Ok(true)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn listeners_see_sign_in_and_out() {
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::default();
        let mut session = Session::new();
        let sink = Arc::clone(&seen);
        session.subscribe(move |identity| {
            sink.lock()
                .unwrap()
                .push(identity.map(|i| i.uid.clone()));
        });

        let provider = StaticProvider::new(Identity::new("u1"));
        session.sign_in(&provider).await.unwrap();
        assert_eq!(session.uid().unwrap(), "u1");
        session.sign_out(&provider).await.unwrap();
        assert!(matches!(session.uid(), Err(Error::NotSignedIn)));

        assert_eq!(*seen.lock().unwrap(), vec![Some("u1".to_string()), None]);
    }

    #[tokio::test]
    async fn unsubscribed_listener_is_silent() {
        let count = Arc::new(Mutex::new(0));
        let mut session = Session::new();
        let sink = Arc::clone(&count);
        let id = session.subscribe(move |_| *sink.lock().unwrap() += 1);
        session.unsubscribe(id);
        session.set(Identity::new("u1"));
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_identity_is_rejected() {
        let provider = StaticProvider::new(Identity::new("  "));
        let mut session = Session::new();
        assert!(session.sign_in(&provider).await.is_err());
        assert!(session.current().is_none());
    }

    #[test]
    fn persisted_identity_round_trips_wire_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let identity = Identity::new("u1")
            .with_display_name("Ada")
            .with_email("ada@example.com");
        persist(&path, &identity).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"displayName\""));
        assert!(raw.contains("\"photoURL\""));

        assert_eq!(load_persisted(&path).unwrap(), Some(identity));
        assert!(forget(&path).unwrap());
        assert!(load_persisted(&path).unwrap().is_none());
    }

    #[test]
    fn explicit_user_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        persist(&path, &Identity::new("stored")).unwrap();
        let identity = resolve_identity(Some("flag"), &path).unwrap();
        assert_eq!(identity.uid, "flag");
    }
}
