//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.

pub mod lint_service;

pub use lint_service::{LintRequest, LintService};
