//! pfcheck - static packet-filter rule evaluator
//!
//! # Usage
//!
//! ```bash
//! pfcheck list                              # Show rules with their index
//! pfcheck add ALLOW 192.168.1.0/24 80 TCP   # Append a rule
//! pfcheck delete 0                          # Remove rule #0
//! pfcheck check 192.168.1.10 80 TCP         # Evaluate one packet
//! pfcheck test                              # Evaluate the built-in sample packets
//! pfcheck --default-action allow test       # Override the default policy
//! ```

use clap::{ArgAction, Parser, Subcommand};
use pfcheck::audit::AuditLog;
use pfcheck::command::{RuleCommands, parse_index, parse_packet};
use pfcheck::config::{self, AppConfig};
use pfcheck::core::matcher::Verdict;
use pfcheck::{Action, Error, FileRuleStore, Matcher, Result, validators};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pfcheck", version)]
#[command(about = "Static packet-filter rule evaluator", long_about = None)]
struct Cli {
    /// Rule file (default: ~/.local/share/pfcheck/rules.json)
    #[arg(short, long, global = true, value_name = "PATH")]
    rules: Option<PathBuf>,

    /// Config file (default: ~/.local/share/pfcheck/config.json)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Action for packets no rule matches (allow or deny)
    #[arg(long, global = true, value_name = "ACTION", value_parser = validators::parse_action)]
    default_action: Option<Action>,

    /// Fail instead of treating a corrupt rule file as empty
    #[arg(long, global = true)]
    strict: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all rules with their index
    List,
    /// Append a rule
    Add {
        /// ALLOW or DENY
        action: String,
        /// Address (10.0.0.1) or CIDR network (10.0.0.0/8)
        ip: String,
        /// Port number (0-65535)
        #[arg(allow_hyphen_values = true)]
        port: String,
        /// TCP or UDP
        protocol: String,
    },
    /// Delete the rule at INDEX
    Delete {
        #[arg(allow_hyphen_values = true)]
        index: String,
    },
    /// Evaluate a single packet
    Check {
        /// Source address of the packet
        ip: String,
        #[arg(allow_hyphen_values = true)]
        port: String,
        protocol: String,
    },
    /// Evaluate the built-in sample packets
    Test,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };
    if let Some(rules) = &cli.rules {
        config.rules_file = Some(rules.clone());
    }
    if let Some(action) = cli.default_action {
        config.default_action = action;
    }
    if cli.strict {
        config.strict_load = true;
    }
    config
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli);
    tracing::debug!("Using rule file {}", config.rules_path().display());

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("{}", render_error(&e));
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Exit status for a failed command: 2 for bad input, 1 for everything else.
fn exit_status(err: &Error) -> u8 {
    if err.is_user_error() { 2 } else { 1 }
}

/// Diagnostic printed to stderr: the message followed by any suggestions.
fn render_error(err: &Error) -> String {
    let translation = err.translate();
    let mut out = format!("Error: {}\n", translation.user_message);
    for suggestion in &translation.suggestions {
        out.push_str(&format!("  • {suggestion}\n"));
    }
    out
}

fn open_audit(config: &AppConfig) -> Option<AuditLog> {
    if !config.audit_log {
        return None;
    }
    AuditLog::open_default()
        .map_err(|e| tracing::warn!("Audit log unavailable: {}", e))
        .ok()
}

fn describe(verdict: &Verdict) -> String {
    match verdict.rule_index {
        Some(index) => format!("{} (rule #{index})", verdict.action),
        None => format!("{} (default policy)", verdict.action),
    }
}

fn run(command: Commands, config: &AppConfig) -> Result<()> {
    let mut store = FileRuleStore::new(config.rules_path());
    let matcher = Matcher::new(config.default_action);
    let strict = config.strict_load;

    match command {
        Commands::List => {
            let rules = RuleCommands::new(&mut store, matcher).strict(strict).list()?;
            if rules.is_empty() {
                println!("No rules defined.");
            } else {
                println!("Rules (first match wins):");
                for (index, rule) in rules.iter().enumerate() {
                    println!("  [{index}] {rule}");
                }
            }
            println!("Default action: {}", matcher.default_action);
        }
        Commands::Add {
            action,
            ip,
            port,
            protocol,
        } => {
            let index = RuleCommands::new(&mut store, matcher)
                .with_audit(open_audit(config))
                .add(&action, &ip, &port, &protocol)?;
            println!("✓ Rule added at index {index}.");
        }
        Commands::Delete { index } => {
            let index = parse_index(&index)?;
            let removed = RuleCommands::new(&mut store, matcher)
                .with_audit(open_audit(config))
                .delete(index)?;
            println!("✓ Deleted rule [{index}] {removed}.");
        }
        Commands::Check { ip, port, protocol } => {
            let packet = parse_packet(&ip, &port, &protocol)?;
            let verdict = RuleCommands::new(&mut store, matcher)
                .strict(strict)
                .check(&packet)?;
            println!("Packet: {packet} - Action: {}", describe(&verdict));
        }
        Commands::Test => {
            let results = RuleCommands::new(&mut store, matcher)
                .strict(strict)
                .self_test()?;
            for (packet, verdict) in results {
                println!("Packet: {packet} - Action: {}", verdict.action);
            }
        }
    }
    Ok(())
}
