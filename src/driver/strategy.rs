use crate::runs::Run;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// What the simulated automation does once its first delay elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedOutcome {
    /// Pause for human review
    RaiseCheckpoint,
    /// Submit straight away
    Complete,
}

/// Chooses the simulated outcome for a newly started run
pub trait OutcomeStrategy: Send + Sync + fmt::Debug {
    fn choose(&self, run: &Run) -> SimulatedOutcome;

    /// Payload attached to a raised checkpoint
    fn checkpoint_data(&self, run: &Run) -> serde_json::Value {
        json!({
            "reason": "human_review",
            "step": "review_before_submit",
            "serviceSlug": run.service_slug,
        })
    }
}

/// Raise a checkpoint with a fixed probability, complete otherwise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomOutcome {
    checkpoint_probability: f64,
}

impl RandomOutcome {
    pub fn new(checkpoint_probability: f64) -> Self {
        let checkpoint_probability = if checkpoint_probability.is_finite() {
            checkpoint_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            checkpoint_probability,
        }
    }

    pub fn checkpoint_probability(&self) -> f64 {
        self.checkpoint_probability
    }
}

impl OutcomeStrategy for RandomOutcome {
    fn choose(&self, _run: &Run) -> SimulatedOutcome {
        if rand::rng().random_bool(self.checkpoint_probability) {
            SimulatedOutcome::RaiseCheckpoint
        } else {
            SimulatedOutcome::Complete
        }
    }
}

/// Always pick the same outcome, for tests and scripted demos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOutcome(pub SimulatedOutcome);

impl OutcomeStrategy for FixedOutcome {
    fn choose(&self, _run: &Run) -> SimulatedOutcome {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::{NewRun, RunStore};

    fn sample_run() -> Run {
        RunStore::new().create_run(NewRun::new(json!({}), "trace").with_service("passport-renewal", "v2"))
    }

    #[test]
    fn test_probability_is_clamped() {
        assert_eq!(RandomOutcome::new(1.7).checkpoint_probability(), 1.0);
        assert_eq!(RandomOutcome::new(-0.2).checkpoint_probability(), 0.0);
        assert_eq!(RandomOutcome::new(f64::NAN).checkpoint_probability(), 0.0);
    }

    #[test]
    fn test_extreme_probabilities_are_deterministic() {
        let run = sample_run();

        for _ in 0..50 {
            assert_eq!(RandomOutcome::new(1.0).choose(&run), SimulatedOutcome::RaiseCheckpoint);
            assert_eq!(RandomOutcome::new(0.0).choose(&run), SimulatedOutcome::Complete);
        }
    }

    #[test]
    fn test_default_checkpoint_data_names_service() {
        let run = sample_run();
        let data = FixedOutcome(SimulatedOutcome::RaiseCheckpoint).checkpoint_data(&run);

        assert_eq!(data["serviceSlug"], "passport-renewal");
        assert_eq!(data["reason"], "human_review");
    }
}
