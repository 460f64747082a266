//! Operator approval.
//!
//! The workflow never reads a terminal directly. Every confirmation goes
//! through a [`Prompt`], so a CLI can ask on stdin, automation can approve
//! up front, and tests can script the answers.

use std::collections::VecDeque;
use std::io::Write;

use tracing::warn;

use crate::model::RiskLevel;

/// Answer to a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    /// Go ahead.
    Approved,
    /// Do not proceed. A normal outcome, not an error.
    Declined,
}

impl Approval {
    /// Returns true if approved.
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Source of operator decisions.
pub trait Prompt: Send {
    /// Asks a yes/no question.
    fn confirm(&mut self, question: &str) -> Approval;

    /// Shows context to the operator before a question.
    fn notify(&mut self, _message: &str) {}
}

/// Asks on stderr and reads the answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl StdinPrompt {
    /// Returns true for `yes` or `y`, in any case.
    #[must_use]
    pub fn is_affirmative(input: &str) -> bool {
        let input = input.trim();
        input.eq_ignore_ascii_case("yes") || input.eq_ignore_ascii_case("y")
    }
}

impl Prompt for StdinPrompt {
    fn confirm(&mut self, question: &str) -> Approval {
        eprint!("\n{question} (yes/no): ");
        if let Err(e) = std::io::stderr().flush() {
            warn!("Failed to flush prompt: {e}");
        }

        let mut input = String::new();
        match std::io::stdin().read_line(&mut input) {
            Ok(_) if Self::is_affirmative(&input) => Approval::Approved,
            Ok(_) => Approval::Declined,
            Err(e) => {
                warn!("Failed to read answer, treating as no: {e}");
                Approval::Declined
            }
        }
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// Approves everything without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl Prompt for AutoApprove {
    fn confirm(&mut self, _question: &str) -> Approval {
        Approval::Approved
    }
}

/// Replays a fixed list of answers; declines once they run out.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompt {
    answers: VecDeque<Approval>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    /// Creates a prompt that answers in order.
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = Approval>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Questions asked so far.
    #[must_use]
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, question: &str) -> Approval {
        self.asked.push(question.to_string());
        self.answers.pop_front().unwrap_or(Approval::Declined)
    }
}

/// Limits on what may be deployed without a per-item human decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// Highest risk approved automatically; `None` means no limit.
    pub max_risk: Option<RiskLevel>,
}

impl ApprovalPolicy {
    /// A policy with no risk limit.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self { max_risk: None }
    }

    /// A policy approving up to `max_risk`.
    #[must_use]
    pub const fn up_to(max_risk: RiskLevel) -> Self {
        Self {
            max_risk: Some(max_risk),
        }
    }

    /// Returns true if an update at `risk` may be deployed automatically.
    #[must_use]
    pub fn permits(&self, risk: RiskLevel) -> bool {
        self.max_risk.is_none_or(|max| risk <= max)
    }
}
