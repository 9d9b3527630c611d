//! Runtime configuration, deserialised from `config.toml` and `REUNITE_*`
//! environment variables.

use std::{path::PathBuf, time::Duration};

use reunite_core::actor::Role;
use reunite_vault::{DEVELOPMENT_KEY, VaultKey};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Deployment mode. Production refuses to run on the built-in key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Development,
  Production,
}

/// One account accepted by the basic-auth identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
  pub id:            i64,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub role:          Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  pub evidence_dir:       PathBuf,
  #[serde(default)]
  pub environment:        Environment,
  /// Secret the vault key is derived from.
  #[serde(default)]
  pub encryption_key:     Option<String>,
  #[serde(default = "default_storage_timeout_ms")]
  pub storage_timeout_ms: u64,
  #[serde(default)]
  pub users:              Vec<UserConfig>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 5000 }

fn default_storage_timeout_ms() -> u64 { 5000 }

impl ServerConfig {
  pub fn storage_timeout(&self) -> Duration {
    Duration::from_millis(self.storage_timeout_ms)
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("encryption_key must be set when environment = production")]
  MissingProductionKey,

  #[error("the built-in development key cannot be used in production")]
  DevelopmentKeyInProduction,

  #[error("username {0:?} is configured more than once")]
  DuplicateUser(String),
}

/// Pick the vault key for `config`.
///
/// Development without a configured secret falls back to the built-in key;
/// production never does.
pub fn resolve_vault_key(config: &ServerConfig) -> Result<VaultKey, ConfigError> {
  let secret = config
    .encryption_key
    .as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty());

  match (config.environment, secret) {
    (Environment::Production, None) => Err(ConfigError::MissingProductionKey),
    (Environment::Production, Some(DEVELOPMENT_KEY)) => {
      Err(ConfigError::DevelopmentKeyInProduction)
    }
    (Environment::Development, None) => {
      warn!("no encryption_key configured; using the built-in development key");
      Ok(VaultKey::development())
    }
    (_, Some(secret)) => {
      let key = VaultKey::from_secret(secret);
      if key.is_development() {
        warn!("encryption_key is the built-in development key");
      }
      Ok(key)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(environment: Environment, key: Option<&str>) -> ServerConfig {
    ServerConfig {
      host: default_host(),
      port: default_port(),
      store_path: ":memory:".into(),
      evidence_dir: "uploads".into(),
      environment,
      encryption_key: key.map(str::to_owned),
      storage_timeout_ms: default_storage_timeout_ms(),
      users: Vec::new(),
    }
  }

  #[test]
  fn production_requires_a_real_key() {
    assert_eq!(
      resolve_vault_key(&config(Environment::Production, None)).unwrap_err(),
      ConfigError::MissingProductionKey
    );
    assert_eq!(
      resolve_vault_key(&config(Environment::Production, Some("  "))).unwrap_err(),
      ConfigError::MissingProductionKey
    );
    assert_eq!(
      resolve_vault_key(&config(Environment::Production, Some(DEVELOPMENT_KEY)))
        .unwrap_err(),
      ConfigError::DevelopmentKeyInProduction
    );

    let key = resolve_vault_key(&config(Environment::Production, Some("s3cret"))).unwrap();
    assert!(!key.is_development());
  }

  #[test]
  fn development_falls_back_to_builtin_key() {
    let key = resolve_vault_key(&config(Environment::Development, None)).unwrap();
    assert!(key.is_development());
  }

  #[test]
  fn deserialises_with_defaults() {
    let settings = ::config::Config::builder()
      .add_source(::config::File::from_str(
        r#"
          store_path   = "~/reunite.db"
          evidence_dir = "/var/lib/reunite/uploads"

          [[users]]
          id            = 1
          username      = "asha"
          password_hash = "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA"
          role          = "reviewer"
        "#,
        ::config::FileFormat::Toml,
      ))
      .build()
      .unwrap();
    let parsed: ServerConfig = settings.try_deserialize().unwrap();

    assert_eq!(parsed.port, 5000);
    assert_eq!(parsed.environment, Environment::Development);
    assert_eq!(parsed.storage_timeout(), Duration::from_secs(5));
    assert_eq!(parsed.users.len(), 1);
    assert_eq!(parsed.users[0].role, Role::Reviewer);
  }
}
