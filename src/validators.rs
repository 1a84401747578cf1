//! Input validation for rule fields supplied on the command line
//!
//! Validators return `Result<_, String>` with a short message; callers lift
//! the message into [`crate::Error::Validation`] along with the field name.

use crate::core::firewall::{Action, Protocol, Target};

/// Validates an address or CIDR network and returns it trimmed.
///
/// # Examples
///
/// ```
/// use pfcheck::validators::validate_ip_or_cidr;
///
/// assert_eq!(validate_ip_or_cidr(" 10.0.0.0/8 ").unwrap(), "10.0.0.0/8");
/// assert!(validate_ip_or_cidr("10.0.0.0/40").is_err());
/// ```
///
/// # Errors
///
/// Returns `Err` if the input is empty or is neither an address nor a network.
pub fn validate_ip_or_cidr(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("IP address cannot be empty".to_string());
    }
    Target::parse(trimmed)?;
    Ok(trimmed.to_string())
}

/// Validates a port number.
///
/// Takes a wide integer so out-of-range input is reported rather than wrapped.
///
/// # Errors
///
/// Returns `Err` if port is outside 0-65535.
pub fn validate_port(port: i64) -> Result<u16, String> {
    u16::try_from(port).map_err(|_| format!("Port {port} out of range (0-65535)"))
}

/// Parses and validates a port given as text.
///
/// # Errors
///
/// Returns `Err` if the text is not an integer or is out of range.
pub fn parse_port(input: &str) -> Result<u16, String> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a port number", input.trim()))?;
    validate_port(value)
}

/// Parses a rule action (case-insensitive).
///
/// # Errors
///
/// Returns `Err` for anything other than ALLOW or DENY.
pub fn parse_action(input: &str) -> Result<Action, String> {
    Action::try_from(input.trim().to_string())
}

/// Parses a rule protocol (case-insensitive).
///
/// # Errors
///
/// Returns `Err` for anything other than TCP or UDP.
pub fn parse_protocol(input: &str) -> Result<Protocol, String> {
    Protocol::try_from(input.trim().to_string())
}

/// Checks if a port is well-known and returns informational message.
///
/// This is informational only and does not block saving.
pub fn check_well_known_port(port: u16) -> Option<String> {
    if port <= 1024 {
        let name = match port {
            0 => return Some("Port 0 is reserved and rarely seen in real traffic".to_string()),
            22 => "SSH",
            80 => "HTTP",
            443 => "HTTPS",
            53 => "DNS",
            25 => "SMTP",
            21 => "FTP",
            _ => return Some(format!("Privileged port {port}")),
        };
        Some(format!("Port {port}: {name}"))
    } else {
        None
    }
}
