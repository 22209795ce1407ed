//! Debug CLI for exercising the catalog, detail and installed screens without
//! the TUI
//!
//! Usage:
//!   cargo run --bin heroapps-cli -- <command> [args]
//!
//! Commands:
//!   page [--page N] [--sort rating-desc] [--search TEXT]   Fetch one catalog page
//!   show <id>                                              Show an app and its install state
//!   install <id>                                           Add an app to the installed list
//!   uninstall <id>                                         Remove an app from the installed list
//!   installed [--sort asc|desc]                            List installed apps
//!   ids                                                    Print the raw persisted id list

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use color_eyre::Result;

use heroapps::catalog::CatalogQuery;
use heroapps::client::{CatalogApi, HttpCatalog};
use heroapps::config::Config;
use heroapps::details::{DetailState, DetailView, InstallOutcome};
use heroapps::installed::InstalledState;
use heroapps::store::{InstalledStore, JsonFileStore, MemoryStore};
use heroapps::types::*;

#[derive(Debug, Parser)]
#[command(name = "heroapps-cli", version, about = "Debug CLI for heroapps")]
struct Cli {
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a throwaway in-memory installed list
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch one catalog page
    Page {
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Compound sort value such as `rating-desc`
        #[arg(long)]
        sort: Option<SortOption>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show an app and whether it is installed
    Show { id: String },
    /// Add an app to the installed list
    Install { id: String },
    /// Remove an app from the installed list
    Uninstall { id: String },
    /// List installed apps
    Installed {
        /// Sort by size: asc or desc
        #[arg(long)]
        sort: Option<SortOrder>,
    },
    /// Print the raw persisted id list
    Ids,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = Some(data_dir);
    }

    let store: Box<dyn InstalledStore> = if cli.memory {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::new(&config.resolved_data_dir()))
    };
    let api = HttpCatalog::new(&config)?;

    match cli.command {
        Command::Page { page, sort, search } => cmd_page(&api, page, sort, search)?,
        Command::Show { id } => cmd_show(&api, store.as_ref(), &id)?,
        Command::Install { id } => cmd_install(&api, store.as_ref(), &id)?,
        Command::Uninstall { id } => cmd_uninstall(&api, store.as_ref(), &id)?,
        Command::Installed { sort } => cmd_installed(&api, store.as_ref(), sort)?,
        Command::Ids => {
            for id in store.load_ids() {
                println!("{id}");
            }
        }
    }

    Ok(())
}

fn print_app_line(app: &AppRecord) {
    println!(
        "  {:<12} {:<30} {:>10} {:>8} ★{:.1}",
        app.id,
        app.title,
        app.size_str(),
        app.downloads_str(),
        app.rating_avg
    );
}

fn cmd_page(api: &dyn CatalogApi, page: usize, sort: Option<SortOption>, search: String) -> Result<()> {
    let mut query = CatalogQuery { page, search, ..CatalogQuery::default() };
    if let Some(sort) = sort {
        query.sort = sort.field;
        query.order = sort.order;
    }

    let result = api.fetch_page(&query)?;
    let total_pages = result.total.div_ceil(PAGE_SIZE);
    println!(
        "=== ({}) Apps Found │ page {}/{} │ sort={} ===",
        result.total,
        page + 1,
        total_pages.max(1),
        query.sort_option()
    );
    if result.apps.is_empty() {
        println!("  No apps found");
    }
    for app in &result.apps {
        print_app_line(app);
    }
    Ok(())
}

fn cmd_show(api: &dyn CatalogApi, store: &dyn InstalledStore, id: &str) -> Result<()> {
    let detail = DetailState::open(id, api.fetch_app(id)?, store);
    let DetailView::Found { app, ratings, .. } = detail.view() else {
        println!("App Is Not Found: {id}");
        return Ok(());
    };

    println!("=== {} ===", app.title);
    println!("Developed by: {}", app.company_name);
    println!("Downloads:    {}", app.downloads_str());
    println!("Rating:       {:.1} ({} reviews)", app.rating_avg, app.reviews_str());
    println!("Button:       [{}]", detail.install_label());
    println!();
    println!("Ratings (latest first):");
    for r in ratings {
        println!("  {:<10} {}", r.name, r.count);
    }
    println!();
    for paragraph in app.paragraphs() {
        println!("{paragraph}");
    }
    Ok(())
}

fn cmd_install(api: &dyn CatalogApi, store: &dyn InstalledStore, id: &str) -> Result<()> {
    let mut detail = DetailState::open(id, api.fetch_app(id)?, store);
    match detail.install(store)? {
        InstallOutcome::Installed { message } => println!("{message}"),
        InstallOutcome::AlreadyInstalled => println!("{id} is already installed"),
        InstallOutcome::NotFound => return Err(eyre!("no app with id '{id}'")),
    }
    Ok(())
}

fn cmd_uninstall(api: &dyn CatalogApi, store: &dyn InstalledStore, id: &str) -> Result<()> {
    let mut installed = InstalledState::open(api.fetch_all()?, store);
    match installed.uninstall(id, store)? {
        Some(message) => println!("{message}"),
        None => println!("{id} is not installed"),
    }
    Ok(())
}

fn cmd_installed(api: &dyn CatalogApi, store: &dyn InstalledStore, sort: Option<SortOrder>) -> Result<()> {
    let mut installed = InstalledState::open(api.fetch_all()?, store);
    if let Some(order) = sort {
        installed.sort_by_size(order);
    }

    println!("=== {} installed apps ===", installed.apps().len());
    for app in installed.apps() {
        print_app_line(app);
    }
    Ok(())
}
