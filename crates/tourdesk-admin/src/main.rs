//! Tourdesk admin console
//!
//! Command line front end for the travel-tour platform's admin backend:
//! list, export, delete and moderate records, and show dashboard statistics.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tourdesk_admin::controller::ListController;
use tourdesk_admin::view::{self, Row};
use tourdesk_admin::{PageSchema, export, pages};
use tourdesk_client::{AdminApi, HttpAdminApi, Session};
use tourdesk_core::filter::FilterValue;
use tourdesk_core::{Config, Error, Operation, Resource, Result, StatsPeriod};
use tracing::{info, warn};

/// Command line interface for the tourdesk admin console
#[derive(Parser)]
#[command(
    name = "tourdesk",
    version = env!("CARGO_PKG_VERSION"),
    about = "Admin console for the travel-tour platform",
    long_about = "Manage locations, tours and users of the travel-tour platform from the command line: list and export records, delete them in bulk, moderate pending tours and show dashboard statistics."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Bearer token (overrides config)
    #[arg(long, env = "TOURDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    log_format: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// List records of a resource
    List {
        /// Resource to list (locations, tours, users, tags)
        #[arg(value_name = "RESOURCE")]
        resource: Resource,

        /// Filter as key=value; repeatable
        #[arg(short, long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, FilterValue)>,

        /// Also write the list to a CSV file in the export directory
        #[arg(long)]
        export: bool,
    },

    /// Show one record as JSON
    Get {
        /// Resource the record belongs to
        #[arg(value_name = "RESOURCE")]
        resource: Resource,

        /// Record id
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete records
    Delete {
        /// Resource the records belong to
        #[arg(value_name = "RESOURCE")]
        resource: Resource,

        /// Record ids
        #[arg(value_name = "ID", required = true)]
        ids: Vec<String>,
    },

    /// Approve a pending tour
    Approve {
        /// Tour id
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Reject a pending tour
    Reject {
        /// Tour id
        #[arg(value_name = "ID")]
        id: String,
    },

    /// List reference tags
    Tags,

    /// Show dashboard statistics
    Stats {
        /// Period (week, month, year)
        #[arg(short, long)]
        period: Option<StatsPeriod>,
    },

    /// Inspect configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// Parse a `key=value` filter; `true`/`false` become flags
fn parse_filter(raw: &str) -> std::result::Result<(String, FilterValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing filter key in `{raw}`"));
    }

    let value = match value.trim() {
        "true" => FilterValue::Flag(true),
        "false" => FilterValue::Flag(false),
        text => FilterValue::from(text),
    };
    Ok((key.to_string(), value))
}

/// Main entry point for the admin console
///
/// # Errors
///
/// Returns error if configuration is invalid or a command fails
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from(cli.config.as_deref())?;
    if let Some(level) = cli.log_level.clone() {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format.clone() {
        config.logging.format = format;
    }
    if let Some(base_url) = cli.base_url.clone() {
        config.api.base_url = base_url;
    }
    if let Some(token) = cli.token.clone() {
        config.api.token = Some(token);
    }
    config.check()?;

    tourdesk_core::init_logging(&config.logging)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        "Tourdesk admin console starting"
    );

    if let Commands::Config { show } = cli.command {
        return handle_config_command(&config, show);
    }

    let session = config
        .api
        .token
        .as_deref()
        .map_or_else(Session::anonymous, Session::with_token);
    if !session.is_authenticated() {
        warn!("No API token configured; requests will be sent without authorization");
    }
    let api: Arc<dyn AdminApi> = Arc::new(HttpAdminApi::from_config(&config.api, session)?);

    match cli.command {
        Commands::List {
            resource,
            filters,
            export,
        } => list_records(&config, api, resource, filters, export).await,
        Commands::Get { resource, id } => show_record(api.as_ref(), resource, &id).await,
        Commands::Delete { resource, ids } => delete_records(&config, api, resource, &ids).await,
        Commands::Approve { id } => moderate_tour(&config, api, &id, true).await,
        Commands::Reject { id } => moderate_tour(&config, api, &id, false).await,
        Commands::Tags => show_tags(api.as_ref()).await,
        Commands::Stats { period } => show_stats(api.as_ref(), period).await,
        Commands::Config { show } => handle_config_command(&config, show),
    }
}

/// Schema for a list page, or an error naming the resource
fn page_for(resource: Resource) -> Result<&'static PageSchema> {
    pages::for_resource(resource).ok_or(Error::Unsupported {
        resource,
        operation: Operation::List,
    })
}

/// Mounted controller for `resource`
async fn mounted_controller(
    config: &Config,
    api: Arc<dyn AdminApi>,
    schema: &'static PageSchema,
    filters: Vec<(String, FilterValue)>,
) -> Result<ListController> {
    let controller = ListController::with_debounce(api, schema, config.list.debounce());
    for (key, value) in filters {
        controller.set_filter(&key, value);
    }
    controller.mount().await?;
    Ok(controller)
}

/// Print rows as an aligned table
fn print_rows(schema: &PageSchema, rows: &[Row]) {
    let mut widths: Vec<usize> = schema.columns.iter().map(|c| c.label.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = schema
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, &width)| format!("{:<width$}", column.label))
        .collect();
    println!("{:<12}  {}", "ID", header.join("  "));

    for row in rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        let badges: Vec<&str> = row.badges.iter().map(|b| b.label.as_str()).collect();
        println!(
            "{:<12}  {}  [{}]",
            row.id.as_deref().unwrap_or("-"),
            cells.join("  "),
            badges.join(", ")
        );
    }
}

/// List records, optionally exporting them
///
/// # Errors
///
/// Returns error if the list cannot be loaded or the export fails
async fn list_records(
    config: &Config,
    api: Arc<dyn AdminApi>,
    resource: Resource,
    filters: Vec<(String, FilterValue)>,
    write_csv: bool,
) -> Result<()> {
    if resource == Resource::Tags {
        return show_tags(api.as_ref()).await;
    }

    let schema = page_for(resource)?;
    let controller = mounted_controller(config, api, schema, filters).await?;
    let rows = controller.rows();

    println!("{} ({})", schema.title, rows.len());
    print_rows(schema, &rows);

    if write_csv {
        let today = chrono::Local::now().date_naive();
        let csv = export::export_csv(resource, &controller.records(), today)?;
        let path = csv.write_to(&config.export.directory)?;
        println!("Exported {} rows to {}", csv.rows, path.display());
    }

    controller.unmount();
    Ok(())
}

/// Print one record as JSON
///
/// # Errors
///
/// Returns error if the record cannot be fetched
async fn show_record(api: &dyn AdminApi, resource: Resource, id: &str) -> Result<()> {
    let record = api.get_by_id(resource, id).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Delete records through the bulk workflow
///
/// # Errors
///
/// Returns error if the list cannot be loaded, an id is not loaded, or any
/// delete fails
async fn delete_records(
    config: &Config,
    api: Arc<dyn AdminApi>,
    resource: Resource,
    ids: &[String],
) -> Result<()> {
    let schema = page_for(resource)?;
    let controller = mounted_controller(config, api, schema, Vec::new()).await?;

    let missing: Vec<&str> = ids
        .iter()
        .filter(|id| !controller.select(id) && !controller.selection().contains(id))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        controller.unmount();
        return Err(Error::NotFound {
            resource: format!("{} {}", resource.singular(), missing.join(", ")),
        });
    }

    let outcome = controller.delete_selected().await?;
    controller.unmount();

    println!("{}", outcome.summary(resource));
    for (id, message) in &outcome.failed {
        println!("  {id}: {message}");
    }

    if outcome.is_complete() {
        Ok(())
    } else {
        Err(Error::api(None, outcome.summary(resource)))
    }
}

/// Approve or reject a tour
///
/// # Errors
///
/// Returns error if the tour is not pending, is blocked, or the update fails
async fn moderate_tour(
    config: &Config,
    api: Arc<dyn AdminApi>,
    id: &str,
    approve: bool,
) -> Result<()> {
    let controller = mounted_controller(config, api, &pages::TOURS, Vec::new()).await?;
    let result = if approve {
        controller.approve(id).await
    } else {
        controller.reject(id).await
    };
    controller.unmount();

    let record = result?;
    println!(
        "Tour {id} is now {}",
        record.text("status").unwrap_or(if approve { "approved" } else { "rejected" })
    );
    Ok(())
}

/// Print reference tags
///
/// # Errors
///
/// Returns error if the tags cannot be fetched
async fn show_tags(api: &dyn AdminApi) -> Result<()> {
    let tags = api.tags().await?;
    println!("Tags ({})", tags.len());
    for tag in tags {
        match tag.kind {
            Some(kind) => println!("{:<12}  {}  ({kind})", tag.id, tag.name),
            None => println!("{:<12}  {}", tag.id, tag.name),
        }
    }
    Ok(())
}

/// Print dashboard statistics
///
/// # Errors
///
/// Returns error if the statistics cannot be fetched
async fn show_stats(api: &dyn AdminApi, period: Option<StatsPeriod>) -> Result<()> {
    let stats = api.stats(period).await?;
    let cards = view::stat_cards(&stats);
    let width = cards.iter().map(|c| c.label.len()).max().unwrap_or(0);
    for card in cards {
        println!("{:<width$}  {}", card.label, card.value);
    }
    Ok(())
}

/// Handle configuration commands
///
/// # Errors
///
/// Returns error if configuration cannot be serialized
fn handle_config_command(config: &Config, show: bool) -> Result<()> {
    if show {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("Configuration is valid");
    }
    Ok(())
}
