use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Authenticated actor a session speaks for. Stage decisions are stamped
/// with this identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorIdentity {
    pub name: String,
    pub role: String,
}

/// Session lifecycle. A session starts in `Init`, is activated once the
/// actor is authenticated, and ends in `Expired`; expiry is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Active,
    Expired,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not started")]
    NotStarted,
    #[error("session expired")]
    Expired,
}

type SessionListener = Box<dyn Fn(SessionState) + Send + Sync>;

/// Explicit session context injected into every component that needs actor
/// identity, instead of ambient mutable globals. Expiry is a state
/// transition broadcast to subscribers, not an imperative callback chain.
pub struct SessionContext {
    actor: ActorIdentity,
    deadline: Option<DateTime<Utc>>,
    state: Mutex<SessionState>,
    listeners: Mutex<Vec<SessionListener>>,
}

impl SessionContext {
    pub fn new(actor: ActorIdentity) -> Self {
        Self {
            actor,
            deadline: None,
            state: Mutex::new(SessionState::Init),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Session that expires on its own once the idle timeout elapses.
    pub fn with_timeout(actor: ActorIdentity, timeout: Duration) -> Self {
        Self {
            deadline: Some(Utc::now() + timeout),
            ..Self::new(actor)
        }
    }

    pub fn actor(&self) -> &ActorIdentity {
        &self.actor
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().expect("session mutex poisoned")
    }

    pub fn activate(&self) {
        self.transition(SessionState::Active);
    }

    pub fn expire(&self) {
        self.transition(SessionState::Expired);
    }

    /// Register for lifecycle transitions; subscribers are invoked on the
    /// thread performing the transition.
    pub fn subscribe(&self, listener: impl Fn(SessionState) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .expect("session mutex poisoned")
            .push(Box::new(listener));
    }

    /// Gate for every component that reads or mutates clearance state.
    /// A session past its deadline transitions to `Expired` here.
    pub fn ensure_active(&self) -> Result<(), SessionError> {
        if let Some(deadline) = self.deadline {
            if Utc::now() >= deadline && self.state() == SessionState::Active {
                self.expire();
            }
        }

        match self.state() {
            SessionState::Active => Ok(()),
            SessionState::Init => Err(SessionError::NotStarted),
            SessionState::Expired => Err(SessionError::Expired),
        }
    }

    fn transition(&self, next: SessionState) {
        {
            let mut state = self.state.lock().expect("session mutex poisoned");
            // Expiry is terminal.
            if *state == SessionState::Expired {
                return;
            }
            if *state == next {
                return;
            }
            *state = next;
        }

        for listener in self
            .listeners
            .lock()
            .expect("session mutex poisoned")
            .iter()
        {
            listener(next);
        }
    }
}
