use crate::state::StateDelta;
use serde::{Deserialize, Serialize};

/// Decision taken by a controller at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Continue,
    Stop,
}

impl Verdict {
    pub fn is_stop(self) -> bool {
        matches!(self, Verdict::Stop)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Continue => write!(f, "continue"),
            Verdict::Stop => write!(f, "stop"),
        }
    }
}

/// Result of one controller evaluation.
///
/// The controller never touches the state itself: whoever drives the loop
/// merges `state_delta` before the next round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub author: String,
    pub verdict: Verdict,
    pub state_delta: StateDelta,
    /// What the controller reports for this round, e.g. a critique of the draft.
    pub message: String,
}

impl Evaluation {
    pub fn stop(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            verdict: Verdict::Stop,
            state_delta: StateDelta::new(),
            message: message.into(),
        }
    }

    pub fn proceed(
        author: impl Into<String>,
        message: impl Into<String>,
        state_delta: StateDelta,
    ) -> Self {
        Self { author: author.into(), verdict: Verdict::Continue, state_delta, message: message.into() }
    }

    /// A stop always escalates out of the enclosing loop.
    pub fn escalate(&self) -> bool {
        self.verdict.is_stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stop_has_empty_delta_and_escalates() {
        let eval = Evaluation::stop("checker", "stop");
        assert!(eval.state_delta.is_empty());
        assert!(eval.escalate());
    }

    #[test]
    fn test_proceed_carries_delta() {
        let mut delta = StateDelta::new();
        delta.insert("iteration".to_string(), json!(1));
        let eval = Evaluation::proceed("critic", "Quality 0/100.", delta.clone());
        assert_eq!(eval.verdict, Verdict::Continue);
        assert_eq!(eval.state_delta, delta);
        assert!(!eval.escalate());
    }

    #[test]
    fn test_verdict_serde() {
        assert_eq!(serde_json::to_value(Verdict::Stop).unwrap(), json!("stop"));
        assert_eq!(Verdict::Continue.to_string(), "continue");
    }
}
