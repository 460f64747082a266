//! Update workflow.
//!
//! This module provides:
//! - `UpdateWorkflow`, which detects, reviews, deploys and reports updates
//! - Operator approval through the `Prompt` capability
//! - Deployment reports

mod engine;
mod prompt;
mod report;

pub use engine::{TEMPLATE_UNAVAILABLE, UpdateWorkflow, WorkflowState};
pub use prompt::{Approval, ApprovalPolicy, AutoApprove, Prompt, ScriptedPrompt, StdinPrompt};
pub use report::DeploymentReport;
