//! Reversible encryption for the one sensitive field a case carries.
//!
//! Tokens are AES-256-GCM ciphertexts with a fresh random 96-bit nonce,
//! encoded as standard base64 of `nonce || ciphertext || tag`. The key is a
//! value handed to [`Vault::new`]; there is no process-global key.

pub mod error;

use std::fmt;

use aes_gcm::{
  Aes256Gcm, Key, Nonce,
  aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// The built-in key secret. Anything encrypted with it is readable by anyone
/// holding this source; the server refuses to use it in production.
pub const DEVELOPMENT_KEY: &str = "reunite-development-key-do-not-use-in-production";

// ─── Key ─────────────────────────────────────────────────────────────────────

/// 256-bit key material, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
  bytes:       [u8; KEY_LEN],
  #[zeroize(skip)]
  development: bool,
}

impl VaultKey {
  /// Derive a key from a configured secret string with SHA-256.
  pub fn from_secret(secret: &str) -> Self {
    let digest = Sha256::digest(secret.as_bytes());
    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(&digest);
    Self { bytes, development: secret == DEVELOPMENT_KEY }
  }

  /// The key derived from [`DEVELOPMENT_KEY`].
  pub fn development() -> Self { Self::from_secret(DEVELOPMENT_KEY) }

  /// Use raw key bytes directly.
  pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
    Self { bytes, development: false }
  }

  /// A random key; only useful for tests and throwaway stores.
  pub fn generate() -> Self {
    let mut bytes = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    Self::from_bytes(bytes)
  }

  pub fn is_development(&self) -> bool { self.development }
}

impl fmt::Debug for VaultKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("VaultKey")
      .field("bytes", &"<redacted>")
      .field("development", &self.development)
      .finish()
  }
}

// ─── Vault ───────────────────────────────────────────────────────────────────

/// Encrypts and decrypts sensitive strings under one key.
#[derive(Clone)]
pub struct Vault {
  cipher:      Aes256Gcm,
  development: bool,
}

impl Vault {
  pub fn new(key: &VaultKey) -> Self {
    Self {
      cipher:      Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.bytes)),
      development: key.development,
    }
  }

  /// Whether this vault runs on the insecure built-in key.
  pub fn uses_development_key(&self) -> bool { self.development }

  /// Encrypt `plaintext` into a self-contained token.
  pub fn encrypt(&self, plaintext: &str) -> Result<String> {
    if plaintext.is_empty() {
      return Err(Error::EmptyPlaintext);
    }

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = self
      .cipher
      .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
      .map_err(|e| Error::Encryption(e.to_string()))?;

    let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    token.extend_from_slice(&nonce);
    token.extend_from_slice(&ciphertext);
    Ok(B64.encode(token))
  }

  /// Recover the plaintext from a token produced by [`Vault::encrypt`] under
  /// the same key.
  pub fn decrypt(&self, token: &str) -> Result<String> {
    let raw = B64
      .decode(token.trim())
      .map_err(|_| Error::Decryption("token is not valid base64".into()))?;

    if raw.len() < NONCE_LEN + TAG_LEN {
      return Err(Error::Decryption("token is too short".into()));
    }
    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);

    let mut plaintext = self
      .cipher
      .decrypt(Nonce::from_slice(nonce), ciphertext)
      .map_err(|_| Error::Decryption("authentication failed".into()))?;

    match String::from_utf8(plaintext.clone()) {
      Ok(text) => {
        plaintext.zeroize();
        Ok(text)
      }
      Err(_) => {
        plaintext.zeroize();
        Err(Error::Decryption("plaintext is not valid UTF-8".into()))
      }
    }
  }
}

impl fmt::Debug for Vault {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Vault")
      .field("development", &self.development)
      .finish_non_exhaustive()
  }
}
