//! Tally Calculator - weighted totals, distinct voters and winner selection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::foundation::{RestaurantId, UserId, VoteSessionId, VoteSessionStatus};

use super::{RestaurantRef, VoteRecord};

/// Aggregated votes for one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantTally {
    pub restaurant_id: RestaurantId,
    /// Catalog name, absent if the restaurant can no longer be resolved.
    pub restaurant_name: Option<String>,
    pub restaurant_active: Option<bool>,
    pub weighted_votes: f64,
    pub distinct_voters: u32,
    pub vote_count: u32,
}

/// Results of a vote session, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResults {
    pub session_id: VoteSessionId,
    pub status: VoteSessionStatus,
    pub total_votes: f64,
    /// Ranked best first.
    pub tallies: Vec<RestaurantTally>,
}

impl SessionResults {
    /// The top-ranked restaurant, or none if no votes were cast.
    pub fn winner(&self) -> Option<&RestaurantTally> {
        self.tallies.first()
    }
}

/// Vote tally functions.
pub struct TallyCalculator;

impl TallyCalculator {
    /// Groups votes by restaurant and ranks the groups.
    ///
    /// # Ranking
    /// 1. weighted votes, descending
    /// 2. distinct voters, descending
    /// 3. restaurant id, ascending
    ///
    /// # Edge Cases
    /// - No votes: returns an empty Vec
    /// - Restaurant missing from `restaurants`: row kept with no name
    pub fn tally(
        votes: &[VoteRecord],
        restaurants: &HashMap<RestaurantId, RestaurantRef>,
    ) -> Vec<RestaurantTally> {
        let mut groups: BTreeMap<RestaurantId, (f64, BTreeSet<UserId>, u32)> = BTreeMap::new();
        for vote in votes {
            let entry = groups
                .entry(*vote.restaurant_id())
                .or_insert_with(|| (0.0, BTreeSet::new(), 0));
            entry.0 += vote.weight();
            entry.1.insert(*vote.user_id());
            entry.2 += 1;
        }

        let mut tallies: Vec<RestaurantTally> = groups
            .into_iter()
            .map(|(restaurant_id, (weighted_votes, voters, vote_count))| {
                let restaurant = restaurants.get(&restaurant_id);
                RestaurantTally {
                    restaurant_id,
                    restaurant_name: restaurant.map(|r| r.name.clone()),
                    restaurant_active: restaurant.map(|r| r.is_active),
                    weighted_votes,
                    distinct_voters: voters.len() as u32,
                    vote_count,
                }
            })
            .collect();

        tallies.sort_by(Self::rank);
        tallies
    }

    /// Builds the full results for a session.
    pub fn results(
        session_id: VoteSessionId,
        status: VoteSessionStatus,
        votes: &[VoteRecord],
        restaurants: &HashMap<RestaurantId, RestaurantRef>,
    ) -> SessionResults {
        let tallies = Self::tally(votes, restaurants);
        let total_votes = tallies.iter().map(|t| t.weighted_votes).sum();
        SessionResults {
            session_id,
            status,
            total_votes,
            tallies,
        }
    }

    fn rank(a: &RestaurantTally, b: &RestaurantTally) -> Ordering {
        b.weighted_votes
            .total_cmp(&a.weighted_votes)
            .then_with(|| b.distinct_voters.cmp(&a.distinct_voters))
            .then_with(|| a.restaurant_id.cmp(&b.restaurant_id))
    }
}
