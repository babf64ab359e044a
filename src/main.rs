//! sysprobe - print a one-shot system information report

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sysprobe::config::{get_config_path, Config, OutputFormat};
use sysprobe::hardware::{capture_snapshot, FieldValue, SnapshotField};
use sysprobe::ReportFormatter;

/// sysprobe - memory, CPU, OS and graphics identity at a glance
#[derive(Parser)]
#[command(name = "sysprobe")]
#[command(version)]
#[command(about = "Capture a one-shot system information report")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a snapshot and print the report (default)
    Report {
        /// Print the snapshot as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Text shown for fields that could not be read (text output only;
        /// overrides `format = "json"` from the config)
        #[arg(long, conflicts_with = "json")]
        placeholder: Option<String>,
    },

    /// List report fields and whether each could be read on this machine
    Fields,

    /// Show configuration path and effective settings
    Config {
        /// Write the default config file if none exists
        #[arg(long, default_value_t = false)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, load_error) = Config::load_or_default();
    if let Some(err) = load_error {
        // Tracing is not up yet, so say it directly
        eprintln!(
            "{} {:#}\n{}",
            "Warning:".bright_yellow().bold(),
            err,
            "Using default settings.".dimmed()
        );
    }
    init_tracing(&config);

    match cli.command {
        Some(Commands::Report { json, placeholder }) => run_report(&config, json, placeholder)?,
        None => run_report(&config, false, None)?,
        Some(Commands::Fields) => run_fields(),
        Some(Commands::Config { init }) => run_config(config, init)?,
    }

    Ok(())
}

/// Logs go to stderr so the report on stdout stays clean
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_report(config: &Config, json: bool, placeholder: Option<String>) -> Result<()> {
    let snapshot = capture_snapshot();

    if wants_json(json, placeholder.is_some(), config.report.format) {
        let output =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{}", output);
        return Ok(());
    }

    let formatter = match placeholder {
        Some(placeholder) => ReportFormatter::new(&placeholder),
        None => config.formatter(),
    };
    debug!(placeholder = formatter.placeholder(), "rendering text report");
    print!("{}", formatter.render(&snapshot));

    Ok(())
}

/// `--json` wins; an explicit placeholder asks for text over the config format
fn wants_json(json: bool, has_placeholder: bool, format: OutputFormat) -> bool {
    json || (!has_placeholder && format == OutputFormat::Json)
}

fn run_fields() {
    let snapshot = capture_snapshot();

    for field in SnapshotField::ALL {
        match snapshot.get(field) {
            FieldValue::Unavailable(reason) => println!(
                "{:<14} {} ({})",
                field.label(),
                "unavailable".bright_yellow(),
                reason.to_string().dimmed()
            ),
            _ => println!("{:<14} {}", field.label(), "available".bright_green()),
        }
    }

    let availability = snapshot.availability();
    println!(
        "\n{} of {} fields available",
        availability.available_count.to_string().bold(),
        SnapshotField::ALL.len()
    );
}

fn run_config(config: Config, init: bool) -> Result<()> {
    let config = if init { Config::init()? } else { config };

    println!("{} {}", "Config file:".bright_cyan(), get_config_path()?);
    println!();
    println!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_conflicts_with_json() {
        let result = Cli::try_parse_from(["sysprobe", "report", "--json", "--placeholder", "?"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_placeholder_alone_parses() {
        let cli = Cli::try_parse_from(["sysprobe", "report", "--placeholder", "?"]).unwrap();
        match cli.command {
            Some(Commands::Report { json, placeholder }) => {
                assert!(!json);
                assert_eq!(placeholder.as_deref(), Some("?"));
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_placeholder_selects_text_over_config_json() {
        assert!(!wants_json(false, true, OutputFormat::Json));
        assert!(wants_json(false, false, OutputFormat::Json));
        assert!(wants_json(true, false, OutputFormat::Text));
        assert!(!wants_json(false, false, OutputFormat::Text));
    }
}
