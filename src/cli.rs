use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use log::{debug, info};

use crate::cli_helpers::{range_label, selection_from_args};
use crate::client::ReportingClient;
use crate::config::{load_config, resolve_config_path, Config};
use crate::directory::{Directories, EndpointCatalog};
use crate::locale::Locale;
use crate::query::{QueryController, QueryError, ResultBundle, Selection};
use crate::render::{render_bundle, RenderedEndpoint, Summary, NO_DATA};

#[derive(Parser)]
#[command(name = "usage-report", version)]
#[command(about = "Account usage reports from the remote reporting API")]
pub struct Cli {
    #[command(flatten)]
    pub service: ServiceArgs,
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted before or after any subcommand.
#[derive(Args)]
pub struct ServiceArgs {
    /// Path to the TOML config (or set USAGE_REPORT_CONFIG)
    #[arg(long = "config", global = true)]
    config_path: Option<PathBuf>,
    /// Root URL of the reporting services (or set USAGE_REPORT_BASE_URL)
    #[arg(long = "base-url", global = true)]
    base_url: Option<String>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List customers with their account tags and zones
    Accounts,
    /// List the endpoints that can be queried
    Endpoints,
    /// Run a usage query and render the results
    Query {
        /// Customer name as listed by `accounts`
        #[arg(long = "customer", short = 'c')]
        customer: Option<String>,
        /// First day of the range (YYYY-MM-DD)
        #[arg(long = "start")]
        start: Option<NaiveDate>,
        /// Last day of the range, inclusive (YYYY-MM-DD)
        #[arg(long = "end")]
        end: Option<NaiveDate>,
        /// Endpoint identifier; repeat or comma-separate for several
        #[arg(long = "endpoint", short = 'e')]
        endpoints: Vec<String>,
        /// Query every endpoint in the catalog
        #[arg(long = "all")]
        all: bool,
        /// Print the result bundle as JSON instead of a table
        #[arg(long = "raw")]
        raw: bool,
        /// Message language (en, ko)
        #[arg(long = "lang", default_value_t = Locale::En)]
        lang: Locale,
    },
}

fn configure_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    let _ = builder.try_init();
}

fn load_service_config(service: &ServiceArgs) -> Result<Config> {
    let path = resolve_config_path(service.config_path.as_deref());
    debug!("Using config {}", path.display());
    let config = load_config(&path)?.with_base_url(service.base_url.clone());
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let service = cli.service;
    configure_logging(service.verbose);
    match cli.command {
        Commands::Accounts => {
            let client = ReportingClient::new(&load_service_config(&service)?)?;
            let directories = runtime()?.block_on(client.load_directories())?;
            println!("\nAccounts\n{}", accounts_table(&directories));
        }
        Commands::Endpoints => {
            let client = ReportingClient::new(&load_service_config(&service)?)?;
            let catalog = runtime()?.block_on(client.fetch_endpoints())?;
            println!("\nEndpoints\n{}", endpoints_table(&catalog));
        }
        Commands::Query {
            customer,
            start,
            end,
            endpoints,
            all,
            raw,
            lang,
        } => {
            let selection = selection_from_args(customer, endpoints, all, start, end);
            // Reject incomplete input before any directory fetch.
            selection
                .check_required()
                .map_err(|err| anyhow!(err.message(lang)))?;

            let client = ReportingClient::new(&load_service_config(&service)?)?;
            let controller = QueryController::new(client);
            let (directories, bundle) = runtime()?
                .block_on(fetch_report(&controller, &selection, lang))
                .map_err(|err| {
                    debug!("Query failed: {err:#}");
                    match err.downcast_ref::<QueryError>() {
                        Some(query_err) => anyhow!(query_err.user_message(lang)),
                        None => anyhow!(lang.request_failed()),
                    }
                })?;

            if raw {
                println!("{}", serde_json::to_string_pretty(&bundle.to_json())?);
            } else {
                summarize(&selection, &directories, &bundle);
            }
        }
    }
    Ok(())
}

async fn fetch_report(
    controller: &QueryController,
    selection: &Selection,
    lang: Locale,
) -> Result<(Directories, ResultBundle)> {
    let directories = controller.client().load_directories().await?;
    info!("{}", lang.loading());
    debug!("Query service {}", controller.client().query_url());
    let bundle = controller.submit(selection, &directories).await?;
    Ok((directories, bundle))
}

fn summarize(selection: &Selection, directories: &Directories, bundle: &ResultBundle) {
    let customer = selection.customer.as_deref().unwrap_or_default();
    if let (Some(start), Some(end)) = (selection.start, selection.end) {
        println!("\nUsage for {customer}, {}", range_label(start, end));
    }
    if bundle.is_empty() {
        println!("No results returned for the selected endpoints.");
        return;
    }
    let rendered = render_bundle(bundle, &directories.catalog);
    println!("{}", results_table(&rendered));
}

fn themed_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| {
            Cell::new(*label)
                .add_attribute(Attribute::Bold)
                .fg(Color::Cyan)
        })
        .collect()
}

fn label_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn value_cell<T: std::fmt::Display>(value: T) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

fn accounts_table(directories: &Directories) -> Table {
    let mut table = themed_table();
    table.set_header(header_cells(&["Customer", "Account tag", "Zones"]));
    for (customer, tag) in directories.accounts.iter() {
        let zones = directories.zones.zone_ids(customer);
        table.add_row(vec![
            label_cell(customer),
            Cell::new(tag).fg(Color::Magenta),
            value_cell(zones.len()),
        ]);
    }
    table
}

fn endpoints_table(catalog: &EndpointCatalog) -> Table {
    let mut table = themed_table();
    table.set_header(header_cells(&["Identifier", "Label"]));
    for entry in catalog.entries() {
        let id_cell = if entry.is_select_all() {
            Cell::new(&entry.id).fg(Color::Yellow)
        } else {
            Cell::new(&entry.id).fg(Color::Magenta)
        };
        table.add_row(vec![id_cell, Cell::new(&entry.label)]);
    }
    table
}

fn results_table(rendered: &[RenderedEndpoint]) -> Table {
    let mut table = themed_table();
    table.set_header(header_cells(&["Endpoint", "Metric", "Value"]));
    for endpoint in rendered {
        let name = label_cell(&endpoint.label);
        match &endpoint.summary {
            Summary::Metrics(lines) => {
                for (idx, line) in lines.iter().enumerate() {
                    let name = if idx == 0 {
                        name.clone()
                    } else {
                        Cell::new("")
                    };
                    table.add_row(vec![name, Cell::new(line.label), value_cell(&line.value)]);
                }
            }
            Summary::NoData => {
                table.add_row(vec![
                    name,
                    Cell::new("--"),
                    value_cell(NO_DATA).fg(Color::Yellow),
                ]);
            }
            Summary::ServiceError(message) => {
                table.add_row(vec![
                    name,
                    Cell::new("Error").fg(Color::Red),
                    Cell::new(message).fg(Color::Red),
                ]);
            }
            Summary::Raw(dump) => {
                table.add_row(vec![name, Cell::new(&endpoint.id), Cell::new(dump)]);
            }
        }
    }
    table
}
