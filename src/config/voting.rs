//! Voting rules configuration

use serde::Deserialize;

use crate::application::voting::VotingRules;
use crate::domain::voting::WeightSchedule;

use super::error::ValidationError;

/// Highest configurable `max_votes_per_user`.
pub const VOTE_BUDGET_LIMIT: u32 = 1000;

/// Tunable voting rules.
///
/// `weight_schedule` is read from a comma-separated list, e.g.
/// `LUNCH_VOTE__VOTING__WEIGHT_SCHEDULE=1.0,0.5,0.25`.
#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    /// Budget for sessions created without one
    #[serde(default = "default_votes_per_user")]
    pub default_votes_per_user: u32,

    /// Upper bound accepted when creating a session
    #[serde(default = "default_max_votes_per_user")]
    pub max_votes_per_user: u32,

    /// Weight of the n-th vote; the last entry repeats
    #[serde(default = "default_weight_schedule")]
    pub weight_schedule: Vec<f64>,

    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl VotingConfig {
    /// Validate voting configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_votes_per_user == 0
            || self.default_votes_per_user > self.max_votes_per_user
        {
            return Err(ValidationError::InvalidVoteBudget);
        }
        if self.max_votes_per_user > VOTE_BUDGET_LIMIT {
            return Err(ValidationError::VoteBudgetTooLarge);
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ValidationError::InvalidPageSize);
        }
        self.schedule()?;
        Ok(())
    }

    /// Rules handed to the voting components.
    pub fn rules(&self) -> Result<VotingRules, ValidationError> {
        self.validate()?;
        Ok(VotingRules {
            default_votes_per_user: self.default_votes_per_user,
            max_votes_per_user: self.max_votes_per_user,
            weight_schedule: self.schedule()?,
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        })
    }

    fn schedule(&self) -> Result<WeightSchedule, ValidationError> {
        WeightSchedule::new(self.weight_schedule.clone())
            .map_err(|e| ValidationError::InvalidWeightSchedule(e.to_string()))
    }
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            default_votes_per_user: default_votes_per_user(),
            max_votes_per_user: default_max_votes_per_user(),
            weight_schedule: default_weight_schedule(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_votes_per_user() -> u32 {
    3
}

fn default_max_votes_per_user() -> u32 {
    10
}

fn default_weight_schedule() -> Vec<f64> {
    WeightSchedule::DEFAULT_WEIGHTS.to_vec()
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_default_rules() {
        let rules = VotingConfig::default().rules().unwrap();
        assert_eq!(rules, VotingRules::default());
    }

    #[test]
    fn default_budget_above_max_is_rejected() {
        let config = VotingConfig {
            default_votes_per_user: 12,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidVoteBudget));
    }

    #[test]
    fn max_budget_is_bounded() {
        let at_limit = VotingConfig {
            max_votes_per_user: VOTE_BUDGET_LIMIT,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let huge = VotingConfig {
            max_votes_per_user: u32::MAX,
            ..Default::default()
        };
        assert_eq!(huge.validate(), Err(ValidationError::VoteBudgetTooLarge));
    }

    #[test]
    fn increasing_schedule_is_rejected() {
        let config = VotingConfig {
            weight_schedule: vec![0.5, 1.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidWeightSchedule(_))
        ));
    }

    #[test]
    fn page_size_must_fit_maximum() {
        let config = VotingConfig {
            default_page_size: 200,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPageSize));
    }
}
