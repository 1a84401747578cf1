//! pfcheck - static packet-filter rule evaluator
//!
//! Evaluates packet descriptors against an ordered list of allow/deny rules
//! (protocol, port, address or CIDR network) using first-match semantics, and
//! keeps the rule list in a JSON file.
//!
//! # Architecture
//!
//! - [`core`] - Rule model, first-match evaluation and rule storage
//! - [`command`] - List/add/delete/check/self-test operations used by the CLI
//! - [`validators`] - Input validation for rule fields
//! - [`config`] - Default policy and file locations
//! - [`audit`] - Audit log of rule set changes
//! - [`utils`] - XDG directory helpers

#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]

pub mod audit;
pub mod command;
pub mod config;
pub mod core;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use crate::core::error::{Error, Result};
pub use crate::core::firewall::{Action, Packet, Protocol, Rule};
pub use crate::core::matcher::{Matcher, Verdict, matches, resolve};
pub use crate::core::store::{FileRuleStore, MemoryRuleStore, RuleStore};
