//! Flow step and verdict types shared between events and service models

use serde::{Deserialize, Serialize};

/// Review & reward flow step
///
/// Exactly one step is active per session. Initial step is `Acquisition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStep {
    /// Campaign call-to-action, reward overview
    Acquisition,
    /// Waiting for a screenshot upload
    Verification,
    /// Screenshot accepted, classification in flight
    Processing,
    /// Classification failed to find a 5-star review
    Feedback,
    /// Classification passed, redemption codes revealed
    Reward,
}

impl FlowStep {
    /// Stable lowercase name used in logs and the UI
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Acquisition => "acquisition",
            FlowStep::Verification => "verification",
            FlowStep::Processing => "processing",
            FlowStep::Feedback => "feedback",
            FlowStep::Reward => "reward",
        }
    }
}

impl std::fmt::Display for FlowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Screenshot qualifies for the reward
    Pass,
    /// Screenshot does not qualify
    Fail,
}

impl Verdict {
    pub fn qualifies(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_serializes_lowercase() {
        let json = serde_json::to_string(&FlowStep::Verification).unwrap();
        assert_eq!(json, "\"verification\"");
        let back: FlowStep = serde_json::from_str("\"reward\"").unwrap();
        assert_eq!(back, FlowStep::Reward);
    }
}
