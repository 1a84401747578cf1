//! Filter rule and packet data structures
//!
//! A [`Rule`] is a fixed-shape record: an [`Action`], an address or CIDR
//! network, a port and a [`Protocol`]. Rules live in an ordered list where
//! position decides precedence (first match wins).
//!
//! The `ip` field keeps the text the user wrote so that a saved rule file
//! reads back byte-for-byte; [`Rule::target`] parses it on demand.
//!
//! # Limits
//!
//! Rule files are limited to [`MAX_RULES`] rules to prevent memory exhaustion.
//!
//! # Example
//!
//! ```
//! use pfcheck::core::firewall::{Action, Protocol, Rule};
//!
//! let rule = Rule::new(Action::Allow, "192.168.1.0/24", 80, Protocol::Tcp).unwrap();
//! assert_eq!(rule.to_string(), "ALLOW 192.168.1.0/24 port 80 TCP");
//! ```

use crate::core::error::{Error, Result};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Maximum number of rules allowed in a single rule file
pub const MAX_RULES: usize = 1000;

/// Transport protocol a rule applies to
///
/// Parsed case-insensitively (`"tcp"`, `"TCP"`, `"Tcp"`), persisted upper-case.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(into = "&'static str", try_from = "String")]
#[strum(ascii_case_insensitive)]
pub enum Protocol {
    /// Transmission Control Protocol
    #[strum(serialize = "TCP")]
    Tcp,
    /// User Datagram Protocol
    #[strum(serialize = "UDP")]
    Udp,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl TryFrom<String> for Protocol {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|_| format!("unknown protocol '{value}' (expected TCP or UDP)"))
    }
}

/// Rule action
///
/// Controls what happens when a packet matches a rule, and doubles as the
/// default policy when nothing matches.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(into = "&'static str", try_from = "String")]
#[strum(ascii_case_insensitive)]
pub enum Action {
    /// Let the packet through
    #[strum(serialize = "ALLOW")]
    Allow,
    /// Block the packet
    #[default]
    #[strum(serialize = "DENY")]
    Deny,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Allow => "ALLOW",
            Action::Deny => "DENY",
        }
    }
}

impl TryFrom<String> for Action {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|_| format!("unknown action '{value}' (expected ALLOW or DENY)"))
    }
}

/// Parsed form of a rule's `ip` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single address, matched by equality
    Host(IpAddr),
    /// A CIDR network, matched by containment. Host bits are ignored.
    Network(IpNetwork),
}

impl Target {
    /// Parses an address or CIDR network.
    ///
    /// Anything containing `/` is treated as a network. `IpNetwork` keeps the
    /// host bits but masks them during containment tests, so `10.1.2.3/8`
    /// behaves like `10.0.0.0/8`. Surrounding whitespace is rejected.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        if text.contains('/') {
            text.parse::<IpNetwork>()
                .map(Target::Network)
                .map_err(|e| format!("'{text}' is not a valid CIDR network ({e})"))
        } else {
            text.parse::<IpAddr>()
                .map(Target::Host)
                .map_err(|_| format!("'{text}' is not a valid IP address"))
        }
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        match self {
            Target::Host(host) => *host == addr,
            Target::Network(net) => net.contains(addr),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub action: Action,
    /// Address or CIDR network, kept as written
    pub ip: String,
    pub port: u16,
    pub protocol: Protocol,
}

impl Rule {
    /// Creates a rule, rejecting an `ip` that is neither an address nor a network.
    ///
    /// Surrounding whitespace in user input is trimmed before validation.
    pub fn new(action: Action, ip: &str, port: u16, protocol: Protocol) -> Result<Self> {
        let ip = ip.trim();
        Target::parse(ip).map_err(|message| Error::validation("ip", message))?;
        Ok(Self {
            action,
            ip: ip.to_string(),
            port,
            protocol,
        })
    }

    /// Parses the `ip` field.
    ///
    /// Rules read from disk are not re-validated, so this can fail for
    /// hand-edited files.
    pub fn target(&self) -> std::result::Result<Target, String> {
        Target::parse(&self.ip)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} port {} {}",
            self.action, self.ip, self.port, self.protocol
        )
    }
}

/// A packet descriptor presented for evaluation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub ip: IpAddr,
    pub port: u16,
    /// Free-form protocol name; anything other than TCP/UDP matches no rule
    pub protocol: String,
}

impl Packet {
    pub fn new(ip: IpAddr, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            ip,
            port,
            protocol: protocol.into(),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(v4) => write!(f, "{v4}:{}/{}", self.port, self.protocol),
            IpAddr::V6(v6) => write!(f, "[{v6}]:{}/{}", self.port, self.protocol),
        }
    }
}
