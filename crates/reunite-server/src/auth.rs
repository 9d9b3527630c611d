//! HTTP Basic-auth identity provider.
//!
//! Credentials are checked against the configured users' argon2 hashes and
//! resolved to an [`Actor`]. Role checks happen in the handlers.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use reunite_core::{actor::Actor, store::LedgerStore};

use crate::{
  AppState,
  config::{ConfigError, UserConfig},
  error::ApiError,
};

/// The configured accounts, keyed by username.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
  users: HashMap<String, UserConfig>,
}

impl UserDirectory {
  pub fn new(users: Vec<UserConfig>) -> Result<Self, ConfigError> {
    let mut map = HashMap::with_capacity(users.len());
    for user in users {
      if map.contains_key(&user.username) {
        return Err(ConfigError::DuplicateUser(user.username));
      }
      map.insert(user.username.clone(), user);
    }
    Ok(Self { users: map })
  }

  pub fn len(&self) -> usize { self.users.len() }

  pub fn is_empty(&self) -> bool { self.users.is_empty() }

  /// Verify the `Authorization: Basic` header and return the actor.
  pub fn verify(&self, headers: &HeaderMap) -> Result<Actor, ApiError> {
    let header_val = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let encoded = header_val
      .strip_prefix("Basic ")
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

    let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
    let Some(user) = self.users.get(username) else {
      // Unknown usernames still pay for one argon2 verification, so response
      // timing matches a wrong password.
      if let Some(decoy) = self.users.values().next() {
        let _ = password_matches(&decoy.password_hash, password);
      }
      return Err(ApiError::Unauthorized);
    };

    if !password_matches(&user.password_hash, password) {
      return Err(ApiError::Unauthorized);
    }

    Ok(Actor {
      id:       user.id,
      username: user.username.clone(),
      role:     user.role,
    })
  }
}

fn password_matches(phc: &str, password: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|hash| {
    Argon2::default().verify_password(password.as_bytes(), &hash).is_ok()
  })
}

/// The verified actor behind a request.
pub struct Authenticated(pub Actor);

impl Authenticated {
  /// Admins and reviewers.
  pub fn reviewer(self) -> Result<Actor, ApiError> {
    if self.0.role.can_review() {
      Ok(self.0)
    } else {
      Err(ApiError::Forbidden("requires the admin or reviewer role"))
    }
  }

  /// Admins and the scorer.
  pub fn scorer(self) -> Result<Actor, ApiError> {
    if self.0.role.can_score() {
      Ok(self.0)
    } else {
      Err(ApiError::Forbidden("requires the admin or scorer role"))
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: LedgerStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let actor = state.users.verify(&parts.headers)?;
    tracing::debug!(username = %actor.username, role = ?actor.role, "authenticated");
    Ok(Authenticated(actor))
  }
}

#[cfg(test)]
mod tests {
  use argon2::{Algorithm, Params, PasswordHasher, Version, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;
  use reunite_core::actor::Role;

  use super::*;

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(1024, 1, 1, None).unwrap();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn directory() -> UserDirectory {
    UserDirectory::new(vec![UserConfig {
      id:            3,
      username:      "asha".into(),
      password_hash: hash("secret"),
      role:          Role::Reviewer,
    }])
    .unwrap()
  }

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("Basic {}", B64.encode(format!("{user}:{pass}")));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
    headers
  }

  #[test]
  fn correct_credentials_yield_actor() {
    let actor = directory().verify(&basic("asha", "secret")).unwrap();
    assert_eq!(actor.id, 3);
    assert_eq!(actor.role, Role::Reviewer);
  }

  #[test]
  fn bad_credentials_are_unauthorized() {
    let dir = directory();
    assert!(matches!(dir.verify(&basic("asha", "wrong")), Err(ApiError::Unauthorized)));
    assert!(matches!(dir.verify(&basic("nobody", "secret")), Err(ApiError::Unauthorized)));
    assert!(matches!(dir.verify(&HeaderMap::new()), Err(ApiError::Unauthorized)));

    let mut garbage = HeaderMap::new();
    garbage.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
    assert!(matches!(dir.verify(&garbage), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn unknown_user_with_a_configured_password_is_rejected() {
    let dir = UserDirectory::new(vec![
      UserConfig {
        id:            1,
        username:      "asha".into(),
        password_hash: hash("secret"),
        role:          Role::Admin,
      },
      UserConfig {
        id:            2,
        username:      "ravi".into(),
        password_hash: hash("other"),
        role:          Role::Scorer,
      },
    ])
    .unwrap();

    for password in ["secret", "other", ""] {
      assert!(matches!(dir.verify(&basic("ghost", password)), Err(ApiError::Unauthorized)));
    }
    assert!(matches!(dir.verify(&basic("ravi", "secret")), Err(ApiError::Unauthorized)));
    assert_eq!(dir.verify(&basic("ravi", "other")).unwrap().id, 2);
  }

  #[test]
  fn role_gates() {
    let reviewer = Actor { id: 1, username: "r".into(), role: Role::Reviewer };
    let scorer = Actor { id: 2, username: "s".into(), role: Role::Scorer };
    let admin = Actor { id: 3, username: "a".into(), role: Role::Admin };

    assert!(Authenticated(reviewer.clone()).reviewer().is_ok());
    assert!(matches!(Authenticated(reviewer).scorer(), Err(ApiError::Forbidden(_))));
    assert!(Authenticated(scorer.clone()).scorer().is_ok());
    assert!(matches!(Authenticated(scorer).reviewer(), Err(ApiError::Forbidden(_))));
    assert!(Authenticated(admin.clone()).reviewer().is_ok());
    assert!(Authenticated(admin).scorer().is_ok());
  }

  #[test]
  fn duplicate_usernames_are_rejected() {
    let user = UserConfig {
      id:            1,
      username:      "asha".into(),
      password_hash: String::new(),
      role:          Role::Admin,
    };
    let err = UserDirectory::new(vec![user.clone(), user]).unwrap_err();
    assert_eq!(err, ConfigError::DuplicateUser("asha".into()));
  }
}
