//! VoteSession aggregate.
//!
//! A vote session is a time-boxed poll over a set of candidate restaurants.
//! Candidate membership and votes live in their own tables and are managed
//! by the application components; the aggregate owns the lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    StateMachine, Timestamp, UserId, VoteSessionId, VoteSessionStatus,
};

use super::VotingError;

/// Maximum length for session title.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum length for session description.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Vote session aggregate.
///
/// # Invariants
///
/// - `title` is 1-500 characters after trimming
/// - `votes_per_user` is at least 1
/// - status only moves Draft -> Active -> Closed
/// - `started_at` is set once the session is Active, `ended_at` once Closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteSession {
    id: VoteSessionId,
    title: String,
    description: Option<String>,
    status: VoteSessionStatus,
    creator_id: UserId,
    votes_per_user: u32,
    auto_close_at: Option<Timestamp>,
    created_at: Timestamp,
    started_at: Option<Timestamp>,
    ended_at: Option<Timestamp>,
    updated_at: Timestamp,
}

/// Partial update of a session's editable details.
///
/// `None` keeps the current value. For optional fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDetailsUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub auto_close_at: Option<Option<Timestamp>>,
}

impl SessionDetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.auto_close_at.is_none()
    }
}

impl VoteSession {
    /// Create a new session in Draft.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a bad title or description, a zero vote budget,
    ///   or an auto-close time that is not in the future
    pub fn new(
        id: VoteSessionId,
        creator_id: UserId,
        title: String,
        description: Option<String>,
        votes_per_user: u32,
        auto_close_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<Self, VotingError> {
        let title = Self::validate_title(&title)?;
        let description = Self::validate_description(description)?;
        if votes_per_user == 0 {
            return Err(VotingError::validation(
                "votes_per_user",
                "At least one vote per user is required",
            ));
        }
        if let Some(at) = &auto_close_at {
            Self::validate_auto_close_at(at, &now)?;
        }

        Ok(Self {
            id,
            title,
            description,
            status: VoteSessionStatus::Draft,
            creator_id,
            votes_per_user,
            auto_close_at,
            created_at: now,
            started_at: None,
            ended_at: None,
            updated_at: now,
        })
    }

    /// Reconstitute a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: VoteSessionId,
        title: String,
        description: Option<String>,
        status: VoteSessionStatus,
        creator_id: UserId,
        votes_per_user: u32,
        auto_close_at: Option<Timestamp>,
        created_at: Timestamp,
        started_at: Option<Timestamp>,
        ended_at: Option<Timestamp>,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            title,
            description,
            status,
            creator_id,
            votes_per_user,
            auto_close_at,
            created_at,
            started_at,
            ended_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &VoteSessionId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> VoteSessionStatus {
        self.status
    }

    pub fn creator_id(&self) -> &UserId {
        &self.creator_id
    }

    pub fn votes_per_user(&self) -> u32 {
        self.votes_per_user
    }

    pub fn auto_close_at(&self) -> Option<&Timestamp> {
        self.auto_close_at.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn started_at(&self) -> Option<&Timestamp> {
        self.started_at.as_ref()
    }

    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Checks if the given user created this session.
    pub fn is_creator(&self, user_id: &UserId) -> bool {
        &self.creator_id == user_id
    }

    /// Validates that the user may manage this session.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if user is not the creator
    pub fn authorize(&self, user_id: &UserId) -> Result<(), VotingError> {
        if self.is_creator(user_id) {
            Ok(())
        } else {
            Err(VotingError::forbidden(
                "Only the session creator can manage this session",
            ))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// True when the session is Active and its deadline has been reached.
    pub fn is_expired(&self, now: &Timestamp) -> bool {
        self.status == VoteSessionStatus::Active
            && self.auto_close_at.map_or(false, |at| !at.is_after(now))
    }

    /// Candidate restaurants may only change while drafting.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless status is Draft
    pub fn ensure_draft(&self) -> Result<(), VotingError> {
        if self.status.allows_membership_changes() {
            Ok(())
        } else {
            Err(VotingError::invalid_state(format!(
                "Candidate restaurants can only be changed while the session is Draft (currently {})",
                self.status
            )))
        }
    }

    /// Votes are only accepted while Active.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless status is Active
    pub fn ensure_accepting_votes(&self) -> Result<(), VotingError> {
        if self.status.accepts_votes() {
            Ok(())
        } else {
            Err(VotingError::invalid_state(format!(
                "Session is not accepting votes (currently {})",
                self.status
            )))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Open the session for voting.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if requester is not the creator
    /// - `InvalidState` if not Draft, no candidates, or the deadline already passed
    pub fn start(
        &mut self,
        requester: &UserId,
        member_count: usize,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        self.authorize(requester)?;
        self.transition(VoteSessionStatus::Active)?;
        if member_count == 0 {
            return Err(VotingError::invalid_state(
                "Cannot start a session without candidate restaurants",
            ));
        }
        if let Some(at) = &self.auto_close_at {
            if !at.is_after(&now) {
                return Err(VotingError::invalid_state(
                    "Cannot start a session whose auto-close time has already passed",
                ));
            }
        }

        self.status = VoteSessionStatus::Active;
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Close the session on the creator's request.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if requester is not the creator
    /// - `InvalidState` if not Active
    pub fn end(&mut self, requester: &UserId, now: Timestamp) -> Result<(), VotingError> {
        self.authorize(requester)?;
        self.transition(VoteSessionStatus::Closed)?;
        self.close(now);
        Ok(())
    }

    /// Close the session if its deadline has been reached.
    ///
    /// Returns true if the session was closed by this call.
    pub fn close_if_expired(&mut self, now: Timestamp) -> bool {
        if !self.is_expired(&now) {
            return false;
        }
        self.close(now);
        true
    }

    /// Edit title, description or deadline.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if requester is not the creator
    /// - `InvalidState` if the session is Closed
    /// - `ValidationFailed` for invalid values
    pub fn update_details(
        &mut self,
        requester: &UserId,
        update: SessionDetailsUpdate,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        self.authorize(requester)?;
        if self.status.is_terminal() {
            return Err(VotingError::invalid_state("Cannot modify a closed session"));
        }

        let title = update.title.map(|t| Self::validate_title(&t)).transpose()?;
        let description = update
            .description
            .map(Self::validate_description)
            .transpose()?;
        if let Some(Some(at)) = &update.auto_close_at {
            Self::validate_auto_close_at(at, &now)?;
        }

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(auto_close_at) = update.auto_close_at {
            self.auto_close_at = auto_close_at;
        }
        self.updated_at = now;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn transition(&self, target: VoteSessionStatus) -> Result<(), VotingError> {
        self.status
            .transition_to(target)
            .map(|_| ())
            .map_err(|_| {
                VotingError::invalid_state(format!(
                    "Cannot move session from {} to {}",
                    self.status, target
                ))
            })
    }

    fn close(&mut self, now: Timestamp) {
        self.status = VoteSessionStatus::Closed;
        self.ended_at = Some(now);
        self.updated_at = now;
    }

    fn validate_title(title: &str) -> Result<String, VotingError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(VotingError::validation("title", "Title cannot be empty"));
        }
        if trimmed.chars().count() > MAX_TITLE_LENGTH {
            return Err(VotingError::validation(
                "title",
                format!("Title must be {} characters or less", MAX_TITLE_LENGTH),
            ));
        }
        Ok(trimmed.to_string())
    }

    fn validate_description(description: Option<String>) -> Result<Option<String>, VotingError> {
        match description {
            Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(VotingError::validation(
                "description",
                format!(
                    "Description must be {} characters or less",
                    MAX_DESCRIPTION_LENGTH
                ),
            )),
            Some(d) if d.trim().is_empty() => Ok(None),
            other => Ok(other),
        }
    }

    fn validate_auto_close_at(at: &Timestamp, now: &Timestamp) -> Result<(), VotingError> {
        if at.is_after(now) {
            Ok(())
        } else {
            Err(VotingError::validation(
                "auto_close_at",
                "Auto-close time must be in the future",
            ))
        }
    }
}
