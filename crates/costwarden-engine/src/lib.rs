//! Rule evaluation and idle detection engines.
//!
//! [`idle::IdleDetectionEngine`] classifies qualifying resources as idle
//! through a pluggable [`strategy::IdleStrategy`] and raises alerts for
//! idle findings. [`rules::RuleEvaluationEngine`] evaluates user-authored
//! governance rules against live metrics. Both persist through repository
//! collaborators and submit alerts to a shared
//! [`costwarden_alert::dispatcher::AlertDispatcher`]. Per-resource
//! failures are isolated: the worst case of any single failure is that one
//! resource or rule is skipped for the cycle.

pub mod config;
pub mod idle;
pub mod policy;
pub mod rules;
pub mod strategy;
