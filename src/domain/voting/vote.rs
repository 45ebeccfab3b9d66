//! Individual weighted votes.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RestaurantId, Timestamp, UserId, VoteId, VoteSessionId};

use super::WeightSchedule;

/// An immutable, append-only record of one vote.
///
/// `sequence` is the 1-based position of this vote among the user's votes in
/// the session; `weight` is derived from it and never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    id: VoteId,
    session_id: VoteSessionId,
    user_id: UserId,
    restaurant_id: RestaurantId,
    sequence: u32,
    weight: f64,
    voted_at: Timestamp,
}

impl VoteRecord {
    /// Record the user's `sequence`-th vote, weighting it from the schedule.
    pub fn new(
        session_id: VoteSessionId,
        user_id: UserId,
        restaurant_id: RestaurantId,
        sequence: u32,
        schedule: &WeightSchedule,
        voted_at: Timestamp,
    ) -> Self {
        Self {
            id: VoteId::new(),
            session_id,
            user_id,
            restaurant_id,
            sequence,
            weight: schedule.weight_for(sequence),
            voted_at,
        }
    }

    /// Reconstitute a vote from persistence, keeping the stored weight.
    pub fn reconstitute(
        id: VoteId,
        session_id: VoteSessionId,
        user_id: UserId,
        restaurant_id: RestaurantId,
        sequence: u32,
        weight: f64,
        voted_at: Timestamp,
    ) -> Self {
        Self {
            id,
            session_id,
            user_id,
            restaurant_id,
            sequence,
            weight,
            voted_at,
        }
    }

    pub fn id(&self) -> &VoteId {
        &self.id
    }

    pub fn session_id(&self) -> &VoteSessionId {
        &self.session_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn restaurant_id(&self) -> &RestaurantId {
        &self.restaurant_id
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn voted_at(&self) -> &Timestamp {
        &self.voted_at
    }
}
