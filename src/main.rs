use anyhow::{Context, bail};
use api_client::error::ApiError;
use api_client::{ProPublicaClient, RegistryClient, RequestGeneration};
use clap::{Parser, Subcommand};
use configuration::{LoggingConfig, OutputFormat, load_config};
use core_types::FilingField;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod rating;
mod render;

use render::{AnalysisView, DEFAULT_GROWTH_FIELDS};

/// The main entry point for the Nonprofit Lens application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment overrides may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    // Held for the life of the process so buffered file logs are flushed on exit.
    let _guard = init_tracing(&config.logging)?;

    let format = cli.format.unwrap_or(config.display.format);
    let client = ProPublicaClient::new(&config.registry).context("Failed to build the registry client")?;
    tracing::debug!(base_url = %config.registry.base_url, ?format, "Registry client ready.");

    // Execute the appropriate command
    match cli.command {
        Commands::Search { terms } => handle_search(&client, &terms.join(" "), format).await,
        Commands::Show { ein, growth } => handle_show(&client, &ein, &growth, format).await,
        Commands::Interactive => handle_interactive(Arc::new(client), format).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Look up US nonprofits and assess their financial health from tax filings.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of ./config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format; overrides the configured default.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the registry by name, keyword or city.
    Search {
        /// Search terms (e.g., "red cross").
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
    },
    /// Show one organization with its financial-health metrics.
    Show {
        /// Employer Identification Number, with or without the dash.
        ein: String,

        /// Filing field to report year-over-year growth for, by name or registry
        /// key (e.g., "total_revenue", "totcntrbgfts"). Repeatable; defaults to
        /// revenue, expenses and assets.
        #[arg(long, value_name = "FIELD")]
        growth: Vec<FilingField>,
    },
    /// Read search terms from stdin, one per line.
    Interactive,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber: stderr always, plus a daily file when a
/// log directory is configured. `RUST_LOG` takes precedence over the config.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("Invalid log level `{}`", logging.level))?,
    };

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "nonprofit-lens.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(guard)
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_search(
    client: &dyn RegistryClient,
    term: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let spinner = spinner(format!("Searching for \"{}\"...", term.trim()), format);
    let results = client.search_organizations(term).await;
    spinner.finish_and_clear();

    let results = results.context("Search failed")?;
    render::print_search(&results, format)
}

async fn handle_show(
    client: &dyn RegistryClient,
    ein: &str,
    growth: &[FilingField],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let spinner = spinner(format!("Fetching organization {ein}..."), format);
    let organization = client.get_organization_detail(ein).await;
    spinner.finish_and_clear();

    let organization = match organization {
        Ok(organization) => organization,
        Err(ApiError::NotFound(ein)) => bail!("No such organization: {ein}"),
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Could not load organization {ein}; it may still be viewable at {}",
                    render::profile_url(ein)
                )
            });
        }
    };

    let growth_fields = if growth.is_empty() { &DEFAULT_GROWTH_FIELDS[..] } else { growth };
    let view = AnalysisView::build(&organization, growth_fields);
    render::print_analysis(&view, format)
}

/// Runs one search per input line. A new line aborts the search still in
/// flight, and a result whose ticket has been superseded is never printed.
async fn handle_interactive(client: Arc<dyn RegistryClient>, format: OutputFormat) -> anyhow::Result<()> {
    let generation = Arc::new(RequestGeneration::new());
    let mut in_flight: Option<JoinHandle<()>> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("Enter search terms, one per line (\"quit\" to exit).");
    while let Some(line) = lines.next_line().await? {
        let term = line.trim();
        if term.is_empty() {
            continue;
        }
        if term.eq_ignore_ascii_case("quit") || term.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Some(previous) = in_flight.take() {
            previous.abort();
        }

        let ticket = generation.issue();
        let client = Arc::clone(&client);
        let generation = Arc::clone(&generation);
        let term = term.to_string();

        in_flight = Some(tokio::spawn(async move {
            let results = client.search_organizations(&term).await;
            if !generation.is_current(ticket) {
                tracing::debug!(term, "Dropping superseded search result.");
                return;
            }
            let outcome = results
                .map_err(anyhow::Error::from)
                .and_then(|results| render::print_search(&results, format));
            if let Err(e) = outcome {
                eprintln!("Search for \"{term}\" failed: {e:#}");
            }
        }));
    }

    // Let the last search finish before exiting.
    if let Some(last) = in_flight {
        if let Err(e) = last.await {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "Search task failed.");
            }
        }
    }
    Ok(())
}

/// A spinner on stderr; hidden for JSON output so stdout stays machine-readable.
fn spinner(message: String, format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_fields_accept_names_and_registry_keys() {
        let cli = Cli::try_parse_from([
            "nonprofit-lens",
            "show",
            "12-3456789",
            "--growth",
            "total_revenue",
            "--growth",
            "totcntrbgfts",
        ])
        .unwrap();

        match cli.command {
            Commands::Show { ein, growth } => {
                assert_eq!(ein, "12-3456789");
                assert_eq!(growth, vec![FilingField::TotalRevenue, FilingField::Contributions]);
            }
            _ => panic!("expected the show command"),
        }
    }

    #[test]
    fn unknown_growth_field_is_rejected() {
        let error = Cli::try_parse_from(["nonprofit-lens", "show", "123456789", "--growth", "bogus"])
            .err()
            .expect("unknown field should fail to parse");
        assert!(error.to_string().contains("Unknown filing field: bogus"));
    }
}
