// src/services/session_pool.rs

//! Authenticated sessions, one fixed role each.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use crate::error::{AppError, Result};
use crate::models::{Credential, Role, SessionState};
use crate::services::provider::ListingProvider;

/// One authenticated session.
///
/// Cookie state mutates on every call, so access is exclusive: a second
/// caller for the same session queues on the lock.
#[derive(Debug)]
pub struct Session {
    identity: String,
    role: Role,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(identity: impl Into<String>, role: Role, state: SessionState) -> Self {
        Self {
            identity: identity.into(),
            role,
            state: Mutex::new(state),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Take exclusive use of the session's transport state.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }
}

#[derive(Debug, Default)]
struct RoleSlot {
    sessions: Vec<Arc<Session>>,
    cursor: AtomicUsize,
}

impl RoleSlot {
    fn next(&self) -> Option<Arc<Session>> {
        if self.sessions.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        self.sessions.get(index).cloned()
    }
}

/// Sessions for a run, grouped by role and handed out round-robin.
#[derive(Debug)]
pub struct SessionPool {
    search: RoleSlot,
    detail: RoleSlot,
    skills: RoleSlot,
}

impl SessionPool {
    /// Authenticate every credential once, failing fast.
    ///
    /// Any credential that cannot establish a session, or a role with no
    /// credential at all, aborts construction with an authentication error.
    pub async fn connect(
        provider: &dyn ListingProvider,
        credentials: &[Credential],
    ) -> Result<Self> {
        let mut sessions = Vec::with_capacity(credentials.len());
        for credential in credentials {
            let state = provider
                .authenticate(credential)
                .await
                .map_err(|e| AppError::authentication(&credential.identity, e))?;
            log::info!(
                "Authenticated {} for role {}",
                credential.identity,
                credential.role
            );
            sessions.push(Session::new(&credential.identity, credential.role, state));
        }
        Self::from_sessions(sessions)
    }

    /// Build a pool from already established sessions.
    pub fn from_sessions(sessions: Vec<Session>) -> Result<Self> {
        let mut pool = Self {
            search: RoleSlot::default(),
            detail: RoleSlot::default(),
            skills: RoleSlot::default(),
        };
        for session in sessions {
            pool.slot_mut(session.role).sessions.push(Arc::new(session));
        }

        for role in [Role::Search, Role::Detail, Role::Skills] {
            if pool.slot(role).sessions.is_empty() {
                return Err(AppError::authentication(
                    format!("<{} role>", role),
                    "no credential configured",
                ));
            }
        }
        Ok(pool)
    }

    fn slot(&self, role: Role) -> &RoleSlot {
        match role {
            Role::Search => &self.search,
            Role::Detail => &self.detail,
            Role::Skills => &self.skills,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut RoleSlot {
        match role {
            Role::Search => &mut self.search,
            Role::Detail => &mut self.detail,
            Role::Skills => &mut self.skills,
        }
    }

    /// Next session for `role`. Construction guarantees one exists.
    pub fn acquire(&self, role: Role) -> Result<Arc<Session>> {
        self.slot(role)
            .next()
            .ok_or_else(|| AppError::config(format!("No session for role {}", role)))
    }

    /// Number of sessions serving a role.
    pub fn count(&self, role: Role) -> usize {
        self.slot(role).sessions.len()
    }

    /// Item-level worker bound: the number of non-search sessions.
    pub fn worker_limit(&self) -> usize {
        (self.count(Role::Detail) + self.count(Role::Skills)).max(1)
    }
}
