use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use trellis::auth::{ShareTokenSigner, TokenGenerator};
use trellis::config::ServerConfig;
use trellis::server::{AppState, create_router};
use trellis::store::{SqliteStore, Store};
use trellis::types::Token;

fn create_admin_token(generator: &TokenGenerator) -> anyhow::Result<(Token, String)> {
    let (raw_token, lookup, hash) = generator.generate()?;
    let token = Token {
        id: Uuid::new_v4().to_string(),
        token_hash: hash,
        token_lookup: lookup,
        is_admin: true,
        user_id: None,
        created_at: Utc::now(),
        expires_at: None,
        last_used_at: None,
    };
    Ok((token, raw_token))
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[cfg(not(unix))]
fn set_restrictive_permissions(_path: &Path) {}

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "A project sharing server with hierarchical permissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags given on the command line take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to [default: 8080]
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and secrets [default: ./data]
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Public base URL for external access (e.g., "https://tasks.example.com").
        /// Used for building share links.
        #[arg(long)]
        public_base_url: Option<String>,

        /// Lifetime of link-share tokens in seconds [default: 259200]
        #[arg(long)]
        share_token_ttl_secs: Option<i64>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database, admin token and share secret)
    Init {
        /// Data directory for the database and secrets
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

fn run_init(data_dir: PathBuf) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir,
        ..Default::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = config.admin_token_path();

    if store.read(|db| db.has_admin_token())? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let generator = TokenGenerator::new();
    let (token, raw_token) = create_admin_token(&generator)?;

    store.read(|db| db.create_token(&token))?;
    fs::write(&token_file, &raw_token)?;
    set_restrictive_permissions(&token_file);

    let secret_file = config.secret_path();
    if !secret_file.exists() {
        fs::write(&secret_file, ShareTokenSigner::generate_secret())?;
        set_restrictive_permissions(&secret_file);
    }

    println!();
    println!("========================================");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("Share token secret written to: {}", secret_file.display());
    println!("========================================");
    println!();

    Ok(())
}

struct ServeArgs {
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    public_base_url: Option<String>,
    share_token_ttl_secs: Option<i64>,
}

fn load_config(args: ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if args.public_base_url.is_some() {
        config.public_base_url = args.public_base_url;
    }
    if let Some(ttl) = args.share_token_ttl_secs {
        config.share_token_ttl_secs = ttl;
    }

    config.validate()?;
    Ok(config)
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(args)?;

    let token_file = config.admin_token_path();
    let secret_file = config.secret_path();
    if !token_file.exists() || !secret_file.exists() {
        bail!(
            "Server not initialized. Run 'trellis admin init' first to create the database, admin token and share secret."
        );
    }

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    if !store.read(|db| db.has_admin_token())? {
        bail!(
            "Server not initialized. Run 'trellis admin init' first to create the database, admin token and share secret."
        );
    }

    let secret = fs::read_to_string(&secret_file)?;
    let signer = ShareTokenSigner::from_hex(&secret, config.share_token_ttl_secs)?;

    info!("Admin token available at {}", token_file.display());

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(Arc::new(store), config, Arc::new(signer)));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("trellis=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => {
                run_init(data_dir)?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            public_base_url,
            share_token_ttl_secs,
        } => {
            run_serve(ServeArgs {
                config,
                host,
                port,
                data_dir,
                public_base_url,
                share_token_ttl_secs,
            })
            .await?;
        }
    }

    Ok(())
}
