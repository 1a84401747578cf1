//! Core packet-filter functionality
//!
//! - [`firewall`]: Rule, packet and action data structures
//! - [`matcher`]: First-match rule evaluation
//! - [`store`]: Rule persistence backends
//! - [`error`]: Error types for rule operations

pub mod error;
pub mod firewall;
pub mod matcher;
pub mod store;

#[cfg(test)]
pub mod test_helpers;
