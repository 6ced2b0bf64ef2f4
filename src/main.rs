use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dotcov::cli::{cmd_coverage, cmd_detect, cmd_parse, cmd_tests, Style};
use dotcov::config::Settings;

/// dotcov: import .NET test results and coverage reports.
#[derive(Parser)]
#[command(name = "dotcov", version, about)]
struct Cli {
    /// Settings file (default: ./dotcov.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory that relative report paths are resolved against.
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Output style.
    #[arg(long, global = true, value_enum, default_value = "text")]
    style: Style,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate coverage reports and compute per-file coverage measures.
    Coverage {
        /// Root of the project whose source files are tracked.
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Content-language tag of the files to import (cs, vbnet, fs).
        #[arg(long)]
        language: Option<String>,

        /// Import under the integration-test metrics.
        #[arg(long)]
        integration_tests: bool,

        /// OpenCover report path expression (repeatable).
        #[arg(long)]
        opencover: Vec<String>,

        /// NCover3 report path expression (repeatable).
        #[arg(long)]
        ncover3: Vec<String>,

        /// Visual Studio coverage XML report path expression (repeatable).
        #[arg(long)]
        vscoveragexml: Vec<String>,
    },

    /// Aggregate test results reports into test-run statistics.
    Tests {
        /// Visual Studio TRX report path expression (repeatable).
        #[arg(long)]
        trx: Vec<String>,

        /// NUnit report path expression (repeatable).
        #[arg(long)]
        nunit: Vec<String>,

        /// xUnit report path expression (repeatable).
        #[arg(long)]
        xunit: Vec<String>,
    },

    /// Parse a single report and print what it contains.
    Parse {
        /// Report file.
        file: PathBuf,

        /// Override format detection (trx, nunit, xunit, opencover, ncover3, vscoveragexml).
        #[arg(long)]
        format: Option<String>,
    },

    /// Print the detected format of each report.
    Detect {
        /// Report files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => {
            let default = PathBuf::from("dotcov.toml");
            if default.is_file() {
                Settings::load(&default).context("Failed to load dotcov.toml")?
            } else {
                Settings::default()
            }
        }
    };
    if let Some(base_dir) = &cli.base_dir {
        settings.base_dir = base_dir.clone();
    }
    Ok(settings)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let mut settings = load_settings(&cli)?;

    let output = match cli.command {
        Commands::Coverage {
            project,
            language,
            integration_tests,
            opencover,
            ncover3,
            vscoveragexml,
        } => {
            if let Some(language) = language {
                settings.language = language;
            }
            settings.integration_tests |= integration_tests;
            settings.coverage.opencover.extend(opencover);
            settings.coverage.ncover3.extend(ncover3);
            settings.coverage.visual_studio.extend(vscoveragexml);
            cmd_coverage(&settings, &project, cli.style)?
        }
        Commands::Tests { trx, nunit, xunit } => {
            settings.tests.visual_studio.extend(trx);
            settings.tests.nunit.extend(nunit);
            settings.tests.xunit.extend(xunit);
            cmd_tests(&settings, cli.style)?
        }
        Commands::Parse { file, format } => cmd_parse(&file, format.as_deref(), cli.style)?,
        Commands::Detect { files } => cmd_detect(&files)?,
    };

    print!("{output}");
    Ok(())
}
