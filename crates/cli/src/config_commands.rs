use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use larkbot_config::{
    Severity,
    validate::{self, ValidationResult},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration, with secrets redacted.
    Show,
}

pub fn handle_config(path: Option<&Path>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(path, verbose),
        ConfigAction::Show => {
            println!("{:#?}", crate::load_config(path)?);
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    for line in report_lines(&result, verbose) {
        eprintln!("{line}");
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn report_lines(result: &ValidationResult, verbose: bool) -> Vec<String> {
    let mut lines: Vec<String> = result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .map(|d| {
            let (color, label) = match d.severity {
                Severity::Error => (RED, "error"),
                Severity::Warning => (YELLOW, "warning"),
                Severity::Info => (CYAN, "info"),
            };
            if d.path.is_empty() {
                format!("  {BOLD}{color}{label}{RESET} {}", d.message)
            } else {
                format!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message)
            }
        })
        .collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, larkbot_config::validate::validate_toml_str};

    const CLEAN: &str = "[bot]\nname = \"helper\"\n[openai]\napi_key = \"sk-test\"\n";

    #[test]
    fn info_diagnostics_are_hidden_unless_verbose() {
        let raw = format!("{CLEAN}[sessions]\nidle_ttl_secs = 0\n");
        let result = validate_toml_str(&raw);
        assert_eq!(result.count(Severity::Info), 1);
        assert!(report_lines(&result, false).is_empty());

        let verbose = report_lines(&result, true);
        assert_eq!(verbose.len(), 2);
        assert!(verbose[0].contains("sessions.idle_ttl_secs"));
    }

    #[test]
    fn warnings_are_always_shown() {
        let result = validate_toml_str("[bot]\nname = \"helper\"\n");
        let lines = report_lines(&result, false);
        assert!(lines[0].contains("warning"));
        assert!(lines[0].contains("openai.api_key"));
    }

    #[test]
    fn clean_config_reports_nothing() {
        let result = validate_toml_str(CLEAN);
        assert!(report_lines(&result, true).is_empty());
    }
}
