//! Admin wizard
//!
//! Multi-step dialogue that collects a news item (title → description →
//! date) or an identifier to delete. The wizard only produces [`Reply`]
//! values; rendering and delivery belong to the chat front-end.

/// Per-identity session storage
pub mod session;

pub use session::{Draft, SessionStore, Step, WizardSession};

use crate::error::FeedError;
use crate::feed::{parse_news_id, FeedService};
use crate::storage::NewsItem;
use tracing::{error, info, warn};

/// Outcome of a wizard transition, rendered by the front-end
#[derive(Debug)]
pub enum Reply {
    /// Prompt for the headline
    AskTitle,
    /// Prompt for the body text
    AskDescription,
    /// Prompt for the date label
    AskDate,
    /// Prompt for the identifier to delete
    AskDeleteId,
    /// Item stored; echoes what was saved
    Added(NewsItem),
    /// Item removed
    Deleted(i64),
    /// No item with this identifier
    NotFound(i64),
    /// Delete input was not a positive integer
    InvalidId(String),
    /// Photo added to the draft, still waiting for input of `step`
    PhotoAttached {
        /// Photos attached so far
        count: usize,
        /// Step still awaiting input
        step: Step,
    },
    /// Flow aborted on request
    Cancelled,
    /// Cancel requested while idle
    NothingToCancel,
    /// Operation failed; session has been cleared
    Failed(FeedError),
    /// Input not relevant to the current state; nothing to say
    Ignored,
}

/// State machine driving the add-news and delete-news dialogues
pub struct AdminWizard {
    feed: FeedService,
    sessions: SessionStore<i64>,
}

impl AdminWizard {
    /// Create a wizard over the given feed
    #[must_use]
    pub fn new(feed: FeedService) -> Self {
        Self {
            feed,
            sessions: SessionStore::new(),
        }
    }

    /// Feed service used to commit drafts
    #[must_use]
    pub const fn feed(&self) -> &FeedService {
        &self.feed
    }

    /// Current step of `user`
    pub async fn step(&self, user: i64) -> Step {
        self.sessions.step(&user).await
    }

    /// Returns true while `user` is inside a flow
    pub async fn is_active(&self, user: i64) -> bool {
        self.step(user).await != Step::Idle
    }

    /// Snapshot of the draft being assembled, if any
    pub async fn draft(&self, user: i64) -> Option<Draft> {
        self.sessions.get(&user).await.map(|s| s.draft)
    }

    /// `Idle → AwaitingTitle`
    pub async fn begin_add(&self, user: i64) -> Reply {
        info!("User {user} started adding a news item.");
        self.sessions
            .put(user, WizardSession::at(Step::AwaitingTitle))
            .await;
        Reply::AskTitle
    }

    /// `Idle → AwaitingDeleteId`
    pub async fn begin_delete(&self, user: i64) -> Reply {
        info!("User {user} started deleting a news item.");
        self.sessions
            .put(user, WizardSession::at(Step::AwaitingDeleteId))
            .await;
        Reply::AskDeleteId
    }

    /// Abort any flow in progress
    pub async fn cancel(&self, user: i64) -> Reply {
        if self.sessions.clear(&user).await.is_some() {
            info!("User {user} cancelled the wizard.");
            Reply::Cancelled
        } else {
            Reply::NothingToCancel
        }
    }

    /// Drop any flow in progress without a reply.
    /// Returns true if a flow was interrupted.
    pub async fn reset(&self, user: i64) -> bool {
        let interrupted = self.sessions.clear(&user).await.is_some();
        if interrupted {
            info!("User {user} restarted; unfinished flow dropped.");
        }
        interrupted
    }

    /// Feed a text message into the current step
    pub async fn handle_text(&self, user: i64, text: &str) -> Reply {
        let Some(mut session) = self.sessions.get(&user).await else {
            return Reply::Ignored;
        };

        match session.step {
            Step::Idle => {
                self.sessions.clear(&user).await;
                Reply::Ignored
            }
            Step::AwaitingTitle => {
                // Validated on commit, not here
                session.draft.title = text.trim().to_string();
                session.step = Step::AwaitingDescription;
                self.sessions.put(user, session).await;
                Reply::AskDescription
            }
            Step::AwaitingDescription => {
                session.draft.description = text.trim().to_string();
                session.step = Step::AwaitingDate;
                self.sessions.put(user, session).await;
                Reply::AskDate
            }
            Step::AwaitingDate => {
                self.sessions.clear(&user).await;
                self.commit(user, session.draft, text).await
            }
            Step::AwaitingDeleteId => {
                self.sessions.clear(&user).await;
                self.delete(user, text).await
            }
        }
    }

    /// Attach a photo to the draft.
    ///
    /// A caption is then handled as the text for the current step.
    pub async fn attach_photo(&self, user: i64, file_id: &str, caption: Option<&str>) -> Reply {
        let Some(mut session) = self.sessions.get(&user).await else {
            return Reply::Ignored;
        };
        if !session.step.is_add_flow() {
            return Reply::Ignored;
        }

        session.draft.photo_file_ids.push(file_id.to_string());
        let count = session.draft.photo_file_ids.len();
        let step = session.step;
        self.sessions.put(user, session).await;
        info!("User {user} attached photo #{count} to the draft.");

        match caption.map(str::trim).filter(|c| !c.is_empty()) {
            Some(caption) => self.handle_text(user, caption).await,
            None => Reply::PhotoAttached { count, step },
        }
    }

    async fn commit(&self, user: i64, draft: Draft, date_text: &str) -> Reply {
        match self
            .feed
            .add(
                &draft.title,
                &draft.description,
                date_text,
                draft.photo_file_ids,
            )
            .await
        {
            Ok(item) => Reply::Added(item),
            Err(e) => {
                if e.is_user_error() {
                    warn!("User {user} draft rejected: {e}");
                } else {
                    error!("Failed to store news item for user {user}: {e}");
                }
                Reply::Failed(e)
            }
        }
    }

    async fn delete(&self, user: i64, raw_id: &str) -> Reply {
        let Ok(id) = parse_news_id(raw_id) else {
            return Reply::InvalidId(raw_id.trim().to_string());
        };
        match self.feed.delete_by_id(id).await {
            Ok(()) => Reply::Deleted(id),
            Err(FeedError::NotFound(_)) => Reply::NotFound(id),
            Err(e) => {
                error!("Failed to delete news item {id} for user {user}: {e}");
                Reply::Failed(e)
            }
        }
    }
}
