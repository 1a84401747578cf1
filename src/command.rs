//! Rule set commands behind the CLI
//!
//! [`RuleCommands`] ties a [`RuleStore`] to a [`Matcher`] and implements the
//! user-facing operations: list, add, delete, check and the built-in self-test.
//! Mutations always require a clean load so a corrupt rule file is never
//! overwritten; read-only commands may degrade a corrupt file to an empty rule
//! set unless strict loading is enabled.

use crate::audit::{AuditEvent, AuditLog, EventType};
use crate::core::error::{Error, Result};
use crate::core::firewall::{Packet, Rule};
use crate::core::matcher::{Matcher, Verdict};
use crate::core::store::RuleStore;
use crate::validators;
use std::net::IpAddr;

/// Sample packets evaluated by the self-test: (address, port, protocol)
pub const SAMPLE_PACKETS: [(&str, u16, &str); 3] = [
    ("192.168.1.10", 80, "TCP"),
    ("110.0.0.5", 22, "TCP"),
    ("8.8.8.8", 53, "UDP"),
];

/// Builds a packet descriptor from command-line text.
pub fn parse_packet(ip: &str, port: &str, protocol: &str) -> Result<Packet> {
    let addr: IpAddr = ip
        .trim()
        .parse()
        .map_err(|_| Error::validation("ip", format!("'{}' is not an IP address", ip.trim())))?;
    let port = validators::parse_port(port).map_err(|m| Error::validation("port", m))?;
    let protocol = protocol.trim();
    if protocol.is_empty() {
        return Err(Error::validation("protocol", "protocol cannot be empty"));
    }
    Ok(Packet::new(addr, port, protocol))
}

/// Parses a 0-based rule index from command-line text.
pub fn parse_index(input: &str) -> Result<usize> {
    let trimmed = input.trim();
    trimmed
        .parse()
        .map_err(|_| Error::validation("index", format!("'{trimmed}' is not a rule index")))
}

/// Returns the self-test packets.
pub fn sample_packets() -> Vec<Packet> {
    SAMPLE_PACKETS
        .iter()
        .filter_map(|(ip, port, protocol)| {
            ip.parse().ok().map(|addr| Packet::new(addr, *port, *protocol))
        })
        .collect()
}

pub struct RuleCommands<'a> {
    store: &'a mut dyn RuleStore,
    matcher: Matcher,
    strict_load: bool,
    audit: Option<AuditLog>,
}

impl<'a> RuleCommands<'a> {
    pub fn new(store: &'a mut dyn RuleStore, matcher: Matcher) -> Self {
        Self {
            store,
            matcher,
            strict_load: false,
            audit: None,
        }
    }

    /// Surface rule file format errors from read-only commands
    pub fn strict(mut self, strict_load: bool) -> Self {
        self.strict_load = strict_load;
        self
    }

    pub fn with_audit(mut self, audit: Option<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Loads rules for a read-only command.
    fn load_for_read(&self) -> Result<Vec<Rule>> {
        match self.store.load() {
            Err(e @ (Error::Format { .. } | Error::TooManyRules { .. })) if !self.strict_load => {
                tracing::warn!("{}; evaluating with an empty rule set", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn audit(&self, event_type: EventType, details: serde_json::Value, error: Option<String>) {
        if let Some(audit) = &self.audit {
            audit.record(&AuditEvent::new(
                event_type,
                error.is_none(),
                details,
                error,
            ));
        }
    }

    /// All rules in stored order.
    pub fn list(&self) -> Result<Vec<Rule>> {
        self.load_for_read()
    }

    /// Validates the fields, then appends the rule. Returns its index.
    pub fn add(&mut self, action: &str, ip: &str, port: &str, protocol: &str) -> Result<usize> {
        let action = validators::parse_action(action).map_err(|m| Error::validation("action", m))?;
        let ip = validators::validate_ip_or_cidr(ip).map_err(|m| Error::validation("ip", m))?;
        let port = validators::parse_port(port).map_err(|m| Error::validation("port", m))?;
        let protocol =
            validators::parse_protocol(protocol).map_err(|m| Error::validation("protocol", m))?;

        if let Some(note) = validators::check_well_known_port(port) {
            tracing::debug!("{}", note);
        }

        let rule = Rule::new(action, &ip, port, protocol)?;
        let description = rule.to_string();
        let result = self.store.append(rule);

        let details = serde_json::json!({
            "rule": description,
            "index": result.as_ref().ok(),
        });
        let error = result.as_ref().err().map(ToString::to_string);
        self.audit(EventType::AddRule, details, error);

        let index = result?;
        tracing::info!("Added rule #{}: {}", index, description);
        Ok(index)
    }

    /// Removes the rule at `index`.
    pub fn delete(&mut self, index: usize) -> Result<Rule> {
        let result = self.store.remove_at(index);

        let details = serde_json::json!({
            "index": index,
            "rule": result.as_ref().ok().map(ToString::to_string),
        });
        let error = result.as_ref().err().map(ToString::to_string);
        self.audit(EventType::DeleteRule, details, error);

        let removed = result?;
        tracing::info!("Deleted rule #{}: {}", index, removed);
        Ok(removed)
    }

    /// Evaluates a single packet.
    pub fn check(&self, packet: &Packet) -> Result<Verdict> {
        let rules = self.load_for_read()?;
        Ok(self.matcher.evaluate(packet, &rules))
    }

    /// Evaluates the built-in sample packets.
    pub fn self_test(&self) -> Result<Vec<(Packet, Verdict)>> {
        let rules = self.load_for_read()?;
        Ok(sample_packets()
            .into_iter()
            .map(|packet| {
                let verdict = self.matcher.evaluate(&packet, &rules);
                (packet, verdict)
            })
            .collect())
    }
}
