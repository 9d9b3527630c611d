//! reunite-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus any
//! `REUNITE_*` environment overrides, opens the SQLite ledger, and serves the
//! HTTP API.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for a `[[users]]` entry:
//!
//! ```
//! cargo run -p reunite-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use reunite_server::{
  AppState,
  auth::UserDirectory,
  config::{ServerConfig, resolve_vault_key},
  evidence::DiskEvidenceStore,
};
use reunite_store_sqlite::SqliteStore;
use reunite_vault::Vault;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Reunite missing-person ledger server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("REUNITE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let key = resolve_vault_key(&server_cfg).context("refusing to start")?;
  let vault = Vault::new(&key);
  let development_key = vault.uses_development_key();

  let store_path = expand_tilde(&server_cfg.store_path);
  let evidence_dir = expand_tilde(&server_cfg.evidence_dir);

  let store = SqliteStore::open(&store_path, vault)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_timeout(server_cfg.storage_timeout());

  tokio::fs::create_dir_all(&evidence_dir)
    .await
    .with_context(|| format!("failed to create evidence directory {evidence_dir:?}"))?;

  let users = UserDirectory::new(server_cfg.users.clone()).context("invalid [[users]]")?;
  if users.is_empty() {
    warn!("no users configured; only the public report endpoints will accept requests");
  }

  let state = AppState {
    store:    Arc::new(store),
    evidence: Arc::new(DiskEvidenceStore::new(evidence_dir)),
    users:    Arc::new(users),
  };

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  info!(
    environment = ?server_cfg.environment,
    development_key,
    users = state.users.len(),
    evidence = %state.evidence.root().display(),
    "listening on http://{address}"
  );
  let app = reunite_server::router(state);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
