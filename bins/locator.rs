use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use models::admin::{AdminTab, NewUser};
use service::auth::domain::LoginInput;
use service::errors::ServiceError;
use service::pagination::PageOutcome;
use service::runtime::LocatorContext;
use service::search::SearchForm;
use tracing::{error, info};
use uuid::Uuid;

/// Command-line client for the store locator backend
#[derive(Parser, Debug)]
#[command(name = "locator")]
#[command(version)]
#[command(about = "Search stores and manage the store locator backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and persist the session
    Login {
        email: String,
        /// Falls back to LOCATOR_PASSWORD
        #[arg(env = "LOCATOR_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Drop the stored session
    Logout,
    /// Report whether a session is stored
    Whoami,
    /// Search stores near a ZIP code or address
    Search {
        location: String,
        /// Radius in miles
        #[arg(short, long)]
        radius: Option<String>,
        /// Store type filter
        #[arg(short = 't', long = "type")]
        store_type: Option<String>,
        /// Required service; repeat for several
        #[arg(short, long = "service")]
        services: Vec<String>,
        /// Only stores open right now
        #[arg(long)]
        open_now: bool,
        /// First page to show (must be positive)
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
        /// Number of consecutive pages to print
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },
    /// Admin user and store management
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List users or stores
    List {
        #[arg(value_parser = ["users", "stores"])]
        tab: String,
        #[arg(default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
    /// Create a user account
    AddUser { email: String, password: String, role_id: i64 },
    /// Delete a user by id
    DeleteUser { id: i64 },
    /// Delete a store by store id
    DeleteStore { store_id: String },
    /// Bulk import stores from a CSV file
    Import { path: PathBuf },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Logout => "logout",
            Command::Whoami => "whoami",
            Command::Search { .. } => "search",
            Command::Admin { .. } => "admin",
        }
    }
}

fn init_logging() {
    // load .env first so RUST_LOG and LOCATOR_API_URL apply
    dotenv().ok();
    if std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false) {
        common::utils::logging::init_logging_json();
    } else {
        common::utils::logging::init_logging_default();
    }
    info!(service = "locator", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let run_id = Uuid::new_v4();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "locator", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(service = "locator", event = "start", %run_id, command = cli.command.name(), "locator starting");
    let result = rt.block_on(run(cli.command));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ServiceError>() {
                Some(se) if se.is_session_expired() => {
                    eprintln!("{} Run `locator login` to continue.", se.user_message());
                }
                Some(se) => eprintln!("{}", se.user_message()),
                None => eprintln!("{e:#}"),
            }
            error!(service = "locator", event = "run_failed", %run_id, error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let cfg = configs::AppConfig::load_and_validate()?;
    let ctx = LocatorContext::from_config(&cfg).await?;

    match command {
        Command::Login { email, password } => login(&ctx, email, password).await,
        Command::Logout => {
            ctx.session.logout();
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            println!("{}", if ctx.session.is_authenticated() { "signed in" } else { "signed out" });
            Ok(())
        }
        Command::Search { location, radius, store_type, services, open_now, page, pages } => {
            let mut form = SearchForm::new(ctx.page_limit);
            form.set_location(location);
            if let Some(radius) = radius {
                form.set_radius(radius);
            }
            if let Some(store_type) = store_type {
                form.set_store_type(store_type);
            }
            for service in &services {
                form.toggle_service(service);
            }
            form.set_open_now(open_now);
            form.set_page(page);
            search(&ctx, form, pages).await
        }
        Command::Admin { command } => admin(&ctx, command).await,
    }
}

async fn login(ctx: &LocatorContext, email: String, password: Option<String>) -> anyhow::Result<()> {
    let password = password.ok_or_else(|| anyhow!("no password given and LOCATOR_PASSWORD is unset"))?;
    ctx.session.login(LoginInput::new(email.as_str(), password)).await?;
    println!("signed in as {email}");
    Ok(())
}

async fn search(ctx: &LocatorContext, form: SearchForm, pages: u32) -> anyhow::Result<()> {
    let query = form.to_query(&ctx.validator).map_err(ServiceError::from)?;
    let mut outcome = Some(ctx.results.fetch_page(query).await?);
    for fetched in 0..pages {
        match outcome {
            Some(PageOutcome::Page(ref page)) => {
                if let (true, Some((lat, lng))) = (page.is_first_page(), page.focus()) {
                    info!(event = "recenter", lat, lng, "first page; recentering on top result");
                }
                println!(
                    "page {}/{} ({} stores)",
                    page.pagination.page, page.pagination.total_pages, page.pagination.total
                );
                for item in &page.items {
                    let distance = item.store.distance_miles.map(|d| format!("{d:.1} mi")).unwrap_or_default();
                    println!("  [{}] {} {} {}", item.open_status, item.store.store_id, item.store.name, distance);
                }
            }
            Some(PageOutcome::Empty { .. }) => {
                println!("no stores found");
                return Ok(());
            }
            Some(PageOutcome::Stale { .. }) | None => return Ok(()),
        }
        if fetched + 1 < pages {
            outcome = ctx.results.next_page().await?;
        }
    }
    Ok(())
}

async fn admin(ctx: &LocatorContext, command: AdminCommand) -> anyhow::Result<()> {
    match command {
        AdminCommand::List { tab, page } => {
            let tab = if tab == "users" { AdminTab::Users } else { AdminTab::Stores };
            let listing = ctx.admin.list(tab, page).await?;
            println!("{}", serde_json::to_string_pretty(&listing.records)?);
            if let Some(p) = listing.pagination {
                println!("page {}/{} ({} {tab})", p.page, p.total_pages, p.total);
            }
        }
        AdminCommand::AddUser { email, password, role_id } => {
            let user = ctx.admin.create_user(NewUser::new(email, password, role_id)).await?;
            println!("created user {} ({})", user.id, user.email);
        }
        AdminCommand::DeleteUser { id } => {
            ctx.admin.delete_user(id).await?;
            println!("deleted user {id}");
        }
        AdminCommand::DeleteStore { store_id } => {
            ctx.admin.delete_store(&store_id).await?;
            println!("deleted store {store_id}");
        }
        AdminCommand::Import { path } => {
            let bytes = tokio::fs::read(&path).await.with_context(|| format!("reading {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "stores.csv".to_string());
            let stats = ctx.admin.import_stores(&file_name, bytes).await?;
            println!("imported: {} created, {} updated, {} errors", stats.created, stats.updated, stats.errors);
        }
    }
    Ok(())
}
