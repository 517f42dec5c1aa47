//! Registry server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), overlays
//! `REGISTRE_*` environment variables, opens the SQLite store and the
//! document directory, and serves the JSON API under `/api`.
//!
//! # First administrator
//!
//! ```
//! cargo run -p registre-server -- --bootstrap-admin admin@example.org
//! ```
//!
//! prompts for a password on stdin and registers an admin account.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use registre_api::password::hash_password;
use registre_core::{
  actor::{NewActor, Role},
  service::Registry,
};
use registre_server::{AppState, ServerConfig};
use registre_store_fs::FsBlobStore;
use registre_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Birth-declaration registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Register an administrator with this e-mail (password read from stdin)
  /// and exit.
  #[arg(long, value_name = "EMAIL")]
  bootstrap_admin: Option<String>,

  /// Display name for `--bootstrap-admin`.
  #[arg(long, default_value = "Administrateur")]
  admin_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "registre.db")?
    .set_default("blob_dir", "documents")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("REGISTRE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let blob_dir = expand_tilde(&server_cfg.blob_dir);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tokio::fs::create_dir_all(&blob_dir)
    .await
    .with_context(|| format!("failed to create document directory {blob_dir:?}"))?;

  let registry = Registry::new(Arc::new(store), Arc::new(FsBlobStore::new(blob_dir)));

  if let Some(email) = cli.bootstrap_admin {
    let password = read_password()?;
    let password_hash =
      hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    let record = registry
      .register_actor(NewActor {
        name: cli.admin_name,
        email,
        role: Role::Admin,
        mairie_id: None,
        hopital_id: None,
        password_hash,
      })
      .await
      .context("failed to register administrator")?;
    tracing::info!(actor_id = %record.actor_id, email = %record.email, "administrator registered");
    return Ok(());
  }

  let state = AppState {
    registry: Arc::new(registry),
  };
  let app = registre_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// One line from stdin, without its line ending.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
