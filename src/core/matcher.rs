//! First-match rule evaluation
//!
//! Rules are scanned in stored order and the first rule whose protocol, port
//! and address all match decides the packet's fate. When nothing matches, the
//! configured default action applies.
//!
//! A rule whose `ip` field fails to parse never matches; evaluation carries on
//! with the next rule.

use crate::core::firewall::{Action, Packet, Rule};

/// Outcome of evaluating a packet against a rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub action: Action,
    /// Position of the deciding rule, `None` when the default action applied
    pub rule_index: Option<usize>,
}

impl Verdict {
    pub fn is_default(&self) -> bool {
        self.rule_index.is_none()
    }
}

/// Returns true if `packet` satisfies every predicate of `rule`.
pub fn matches(packet: &Packet, rule: &Rule) -> bool {
    if !packet.protocol.eq_ignore_ascii_case(rule.protocol.as_str()) {
        return false;
    }

    if packet.port != rule.port {
        return false;
    }

    match rule.target() {
        Ok(target) => target.contains(packet.ip),
        Err(e) => {
            tracing::debug!("Skipping rule '{}': {}", rule, e);
            false
        }
    }
}

/// Evaluates `packet` against `rules` in order.
pub fn evaluate(packet: &Packet, rules: &[Rule], default_action: Action) -> Verdict {
    rules
        .iter()
        .position(|rule| matches(packet, rule))
        .map_or(
            Verdict {
                action: default_action,
                rule_index: None,
            },
            |index| Verdict {
                action: rules[index].action,
                rule_index: Some(index),
            },
        )
}

/// Returns the action of the first matching rule, or `default_action`.
pub fn resolve(packet: &Packet, rules: &[Rule], default_action: Action) -> Action {
    evaluate(packet, rules, default_action).action
}

/// Rule evaluator bound to a default policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Matcher {
    pub default_action: Action,
}

impl Matcher {
    pub fn new(default_action: Action) -> Self {
        Self { default_action }
    }

    pub fn evaluate(&self, packet: &Packet, rules: &[Rule]) -> Verdict {
        evaluate(packet, rules, self.default_action)
    }

    pub fn resolve(&self, packet: &Packet, rules: &[Rule]) -> Action {
        resolve(packet, rules, self.default_action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::firewall::Protocol;
    use crate::core::test_helpers::{packet, rule, sample_rules};

    #[test]
    fn test_sample_scenario() {
        let rules = sample_rules();

        assert_eq!(
            resolve(&packet("192.168.1.10", 80, "TCP"), &rules, Action::Deny),
            Action::Allow
        );
        assert_eq!(
            resolve(&packet("10.0.0.5", 22, "TCP"), &rules, Action::Allow),
            Action::Deny
        );
        assert_eq!(
            resolve(&packet("8.8.8.8", 53, "UDP"), &rules, Action::Deny),
            Action::Deny
        );
        assert_eq!(
            resolve(&packet("8.8.8.8", 53, "UDP"), &rules, Action::Allow),
            Action::Allow
        );
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            rule(Action::Deny, "10.0.0.0/8", 443, Protocol::Tcp),
            rule(Action::Allow, "10.1.2.3", 443, Protocol::Tcp),
        ];
        let verdict = evaluate(&packet("10.1.2.3", 443, "tcp"), &rules, Action::Allow);
        assert_eq!(verdict.action, Action::Deny);
        assert_eq!(verdict.rule_index, Some(0));
    }

    #[test]
    fn test_empty_rules_use_default() {
        let verdict = Matcher::new(Action::Allow).evaluate(&packet("1.1.1.1", 80, "TCP"), &[]);
        assert_eq!(verdict.action, Action::Allow);
        assert!(verdict.is_default());
    }

    #[test]
    fn test_protocol_case_insensitive() {
        let r = rule(Action::Allow, "1.2.3.4", 53, Protocol::Udp);
        assert!(matches(&packet("1.2.3.4", 53, "udp"), &r));
        assert!(matches(&packet("1.2.3.4", 53, "Udp"), &r));
        assert!(!matches(&packet("1.2.3.4", 53, "TCP"), &r));
        assert!(!matches(&packet("1.2.3.4", 53, "ICMP"), &r));
    }

    #[test]
    fn test_port_must_match_exactly() {
        let r = rule(Action::Allow, "1.2.3.4", 80, Protocol::Tcp);
        assert!(!matches(&packet("1.2.3.4", 8080, "TCP"), &r));
        assert!(!matches(&packet("1.2.3.4", 0, "TCP"), &r));
    }

    #[test]
    fn test_exact_address_rule() {
        let r = rule(Action::Allow, "192.168.1.10", 80, Protocol::Tcp);
        assert!(matches(&packet("192.168.1.10", 80, "TCP"), &r));
        assert!(!matches(&packet("192.168.1.11", 80, "TCP"), &r));
    }

    #[test]
    fn test_cidr_bounds_are_inclusive() {
        let r = rule(Action::Allow, "192.168.1.0/24", 80, Protocol::Tcp);
        assert!(matches(&packet("192.168.1.0", 80, "TCP"), &r));
        assert!(matches(&packet("192.168.1.255", 80, "TCP"), &r));
        assert!(!matches(&packet("192.168.0.255", 80, "TCP"), &r));
        assert!(!matches(&packet("192.168.2.0", 80, "TCP"), &r));
    }

    #[test]
    fn test_cidr_ignores_host_bits() {
        let r = rule(Action::Deny, "172.16.5.9/12", 22, Protocol::Tcp);
        assert!(matches(&packet("172.31.255.1", 22, "TCP"), &r));
        assert!(!matches(&packet("172.32.0.1", 22, "TCP"), &r));
    }

    #[test]
    fn test_unparsable_rule_ip_is_skipped() {
        let broken = Rule {
            action: Action::Deny,
            ip: "10.0.0.0/99".to_string(),
            port: 22,
            protocol: Protocol::Tcp,
        };
        let garbage = Rule {
            ip: "localhost".to_string(),
            ..broken.clone()
        };
        let fallback = rule(Action::Allow, "0.0.0.0/0", 22, Protocol::Tcp);

        let p = packet("10.0.0.1", 22, "TCP");
        assert!(!matches(&p, &broken));
        assert!(!matches(&p, &garbage));

        let verdict = evaluate(&p, &[broken, garbage, fallback], Action::Deny);
        assert_eq!(verdict.action, Action::Allow);
        assert_eq!(verdict.rule_index, Some(2));
    }

    #[test]
    fn test_padded_rule_ip_from_disk_never_matches() {
        let padded: Rule = serde_json::from_str(
            r#"{"action":"ALLOW","ip":" 10.0.0.1","port":80,"protocol":"TCP"}"#,
        )
        .unwrap();
        let p = packet("10.0.0.1", 80, "TCP");
        assert!(!matches(&p, &padded));
        assert_eq!(resolve(&p, &[padded], Action::Deny), Action::Deny);
    }

    #[test]
    fn test_address_family_mismatch() {
        let r = rule(Action::Allow, "0.0.0.0/0", 80, Protocol::Tcp);
        assert!(!matches(&packet("::1", 80, "TCP"), &r));

        let v6 = rule(Action::Allow, "::/0", 80, Protocol::Tcp);
        assert!(matches(&packet("2001:db8::1", 80, "TCP"), &v6));
        assert!(!matches(&packet("10.0.0.1", 80, "TCP"), &v6));
    }
}
