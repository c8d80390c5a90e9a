//! Signed-in operator identity.
//!
//! `Session` is the only owner of the credential. It is cloned into every
//! controller and HTTP adapter; `login` and `logout` are the only mutations,
//! and dependents learn about them through [`Session::subscribe`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::types::Role;

/// Operator identity returned by `POST /employees/login`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub token: String,
    pub legajo: u64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub email: String,
    pub rol: Role,
}

impl Identity {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido).trim().to_string()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("token", &"<redacted>")
            .field("legajo", &self.legajo)
            .field("rol", &self.rol)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// The backend rejected the credential (401/403)
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Role),
    SignedOut(LogoutReason),
}

struct SessionInner {
    identity: RwLock<Option<Identity>>,
    /// Where a remembered session is persisted between runs
    store: Option<PathBuf>,
    events: watch::Sender<SessionEvent>,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Signed-out session; `store` enables "remember me"
    pub fn new(store: Option<PathBuf>) -> Self {
        Self::with_identity(None, store)
    }

    fn with_identity(identity: Option<Identity>, store: Option<PathBuf>) -> Self {
        let initial = match &identity {
            Some(id) => SessionEvent::SignedIn(id.rol),
            None => SessionEvent::SignedOut(LogoutReason::UserRequested),
        };
        let (events, _) = watch::channel(initial);
        Self {
            inner: Arc::new(SessionInner {
                identity: RwLock::new(identity),
                store,
                events,
            }),
        }
    }

    /// Load a remembered session from `path`, if one was saved.
    /// A corrupt file is discarded rather than failing start-up.
    pub fn restore(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(Some(path.to_path_buf())));
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => {
                info!(legajo = identity.legajo, "Restored remembered session");
                Ok(Self::with_identity(
                    Some(identity),
                    Some(path.to_path_buf()),
                ))
            }
            Err(e) => {
                warn!("Discarding unreadable session file: {}", e);
                let _ = std::fs::remove_file(path);
                Ok(Self::new(Some(path.to_path_buf())))
            }
        }
    }

    pub fn login(&self, identity: Identity, remember: bool) -> Result<()> {
        let role = identity.rol;
        let legajo = identity.legajo;

        if let Some(store) = &self.inner.store {
            if remember {
                persist(store, &identity)?;
            } else if store.exists() {
                std::fs::remove_file(store).context("Failed to clear remembered session")?;
            }
        }

        *self
            .inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(identity);

        info!(legajo, role = %role, remember, "Signed in");
        self.inner.events.send_replace(SessionEvent::SignedIn(role));
        Ok(())
    }

    pub fn logout(&self, reason: LogoutReason) {
        let previous = self
            .inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(store) = &self.inner.store {
            if store.exists() {
                if let Err(e) = std::fs::remove_file(store) {
                    warn!("Failed to remove session file: {}", e);
                }
            }
        }

        if let Some(identity) = previous {
            info!(legajo = identity.legajo, ?reason, "Signed out");
        }
        self.inner.events.send_replace(SessionEvent::SignedOut(reason));
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|id| id.token.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|id| id.rol)
    }

    pub fn is_authenticated(&self) -> bool {
        self.role().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role())
            .field("store", &self.inner.store)
            .finish()
    }
}

fn persist(path: &Path, identity: &Identity) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create session directory")?;
    }
    let json = serde_json::to_string_pretty(identity).context("Failed to serialize session")?;
    std::fs::write(path, json).context("Failed to write session file")?;
    Ok(())
}
