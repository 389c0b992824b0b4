//! Wizard session store
//!
//! Holds the in-progress dialogue of each administrator.
//! Transport-agnostic: keyed by whatever identity the front-end uses.

use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::RwLock;

/// Current position in a wizard flow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Step {
    /// No flow in progress
    #[default]
    Idle,
    /// Add flow: waiting for the headline
    AwaitingTitle,
    /// Add flow: waiting for the body text
    AwaitingDescription,
    /// Add flow: waiting for the date label
    AwaitingDate,
    /// Delete flow: waiting for the item identifier
    AwaitingDeleteId,
}

impl Step {
    /// Returns true while the add flow is collecting input
    #[must_use]
    pub const fn is_add_flow(self) -> bool {
        matches!(
            self,
            Self::AwaitingTitle | Self::AwaitingDescription | Self::AwaitingDate
        )
    }
}

/// Partially built news item
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    /// Headline collected so far
    pub title: String,
    /// Body text collected so far
    pub description: String,
    /// Photos attached so far
    pub photo_file_ids: Vec<String>,
}

/// Per-administrator dialogue state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WizardSession {
    /// Current step
    pub step: Step,
    /// Draft being assembled by the add flow
    pub draft: Draft,
}

impl WizardSession {
    /// Fresh session positioned at `step`
    #[must_use]
    pub fn at(step: Step) -> Self {
        Self {
            step,
            draft: Draft::default(),
        }
    }
}

/// Map from identity to wizard session.
///
/// A missing entry means the identity is idle.
pub struct SessionStore<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> {
    sessions: RwLock<HashMap<Id, WizardSession>>,
}

impl<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> Default
    for SessionStore<Id>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> SessionStore<Id> {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot of the session, if any
    pub async fn get(&self, id: &Id) -> Option<WizardSession> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Current step, `Idle` when no session exists
    pub async fn step(&self, id: &Id) -> Step {
        self.get(id).await.map_or(Step::Idle, |s| s.step)
    }

    /// Insert or replace a session
    pub async fn put(&self, id: Id, session: WizardSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session);
    }

    /// Remove a session, returning it if one existed
    pub async fn clear(&self, id: &Id) -> Option<WizardSession> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id)
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no sessions are live
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
