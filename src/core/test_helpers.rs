//! Shared test utilities for core module tests
//!
//! This module is only compiled in test mode.

use crate::core::firewall::{Action, Packet, Protocol, Rule};

/// Creates a rule without going through validation.
pub fn rule(action: Action, ip: &str, port: u16, protocol: Protocol) -> Rule {
    Rule {
        action,
        ip: ip.to_string(),
        port,
        protocol,
    }
}

/// Creates a packet from an address literal.
pub fn packet(ip: &str, port: u16, protocol: &str) -> Packet {
    Packet::new(ip.parse().expect("test packet address"), port, protocol)
}

/// The canonical two-rule set: allow web traffic from the LAN, deny SSH from anywhere.
pub fn sample_rules() -> Vec<Rule> {
    vec![
        rule(Action::Allow, "192.168.1.0/24", 80, Protocol::Tcp),
        rule(Action::Deny, "0.0.0.0/0", 22, Protocol::Tcp),
    ]
}
