//! gameshelf server
//!
//! Serves the GameShelf HTTP API and manages its local configuration.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;

use gameshelf_catalog::{ApiKeySource, RawgClient};
use gameshelf_lib::{LibraryService, Settings, Store, settings_path};
use gameshelf_server::{AppState, JwtKeys, StartupError, router};

#[derive(Parser)]
#[command(name = "gameshelf")]
#[command(about = "Personal video game library server", long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:3001
    #[arg(short, long, global = true)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings (secrets masked)
    Show,

    /// Print the settings and credentials file locations
    Path,

    /// Store the RAWG API key in the credentials file
    SetRawgKey {
        /// The API key from rawg.io
        key: String,
    },
}

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    let result = match cli.command {
        None | Some(Commands::Serve) => run_server(&cli),
        Some(Commands::Config { ref action }) => run_config(&cli, action),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Settings file, then environment, then command-line flags.
fn effective_settings(cli: &Cli) -> Result<Settings, StartupError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_env();
    if let Some(bind) = &cli.bind {
        settings.server.bind = bind.clone();
    }
    if let Some(path) = &cli.database {
        settings.database.path = path.clone();
    }
    Ok(settings)
}

fn run_config(cli: &Cli, action: &ConfigAction) -> Result<(), StartupError> {
    match action {
        ConfigAction::Show => {
            let settings = effective_settings(cli)?;
            print!("{}", settings.to_display_string());
            match gameshelf_catalog::api_key_source() {
                ApiKeySource::Missing => println!("# RAWG API key: not configured"),
                source => println!("# RAWG API key: {}", source),
            }
        }
        ConfigAction::Path => {
            let settings = cli.config.clone().unwrap_or_else(settings_path);
            println!("settings:    {}", settings.display());
            match gameshelf_catalog::credentials_path() {
                Some(path) => println!("credentials: {}", path.display()),
                None => println!("credentials: <no config directory>"),
            }
        }
        ConfigAction::SetRawgKey { key } => {
            let path = gameshelf_catalog::save_api_key(key.trim())?;
            println!("Saved RAWG API key to {}", path.display());
        }
    }
    Ok(())
}

fn run_server(cli: &Cli) -> Result<(), StartupError> {
    let settings = effective_settings(cli)?;
    settings.validate()?;

    let api_key = gameshelf_catalog::load_api_key()?;
    let catalog = RawgClient::with_options(
        api_key,
        settings.catalog.base_url.clone(),
        settings.catalog_timeout(),
    )?;
    log::info!(
        "Catalog: {} (timeout {}s, key from {})",
        catalog.base_url(),
        settings.catalog.timeout_secs,
        gameshelf_catalog::api_key_source()
    );

    let store = Store::open(&settings.database.path)?;
    log::info!("Database: {}", settings.database.path.display());

    let service =
        LibraryService::new(store, catalog).with_default_page_size(settings.catalog.page_size);
    let keys = JwtKeys::new(
        settings.jwt_secret()?.as_bytes(),
        settings.auth.token_ttl_hours,
    );
    let app = router(
        AppState::new(service, keys),
        &settings.server.allowed_origins,
    );
    log::info!("CORS origins: {:?}", settings.server.allowed_origins);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
        log::info!("Listening on http://{}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        log::info!("Server stopped");
        Ok::<(), StartupError>(())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
