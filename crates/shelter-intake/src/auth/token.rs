use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{AccessToken, AuthError, AuthService, Role, UserIdentity};
use crate::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
}

struct Account {
    role: Role,
    password_digest: Vec<u8>,
}

/// In-memory account book issuing HS256 bearer tokens.
pub struct TokenAuthService {
    accounts: RwLock<HashMap<String, Account>>,
    pepper: Vec<u8>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl TokenAuthService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            accounts: RwLock::new(HashMap::new()),
            pepper: secret.to_vec(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_minutes: config.token_ttl_minutes,
        }
    }

    pub fn add_account(&self, email: &str, password: &str, role: Role) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let mut guard = self.accounts.write().expect("account lock poisoned");
        if guard.contains_key(&email) {
            return Err(AuthError::DuplicateAccount(email));
        }
        let password_digest = self.digest(&email, password);
        guard.insert(
            email,
            Account {
                role,
                password_digest,
            },
        );
        Ok(())
    }

    fn digest(&self, email: &str, password: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(&self.pepper);
        hasher.update([0u8]);
        hasher.update(email.as_bytes());
        hasher.update([0u8]);
        hasher.update(password.as_bytes());
        hasher.finalize().to_vec()
    }
}

impl AuthService for TokenAuthService {
    fn login(&self, email: &str, password: &str) -> Result<AccessToken, AuthError> {
        let email = normalize_email(email);
        let role = {
            let guard = self.accounts.read().expect("account lock poisoned");
            let account = guard.get(&email).ok_or(AuthError::InvalidCredentials)?;
            if account.password_digest != self.digest(&email, password) {
                return Err(AuthError::InvalidCredentials);
            }
            account.role
        };

        let now = Utc::now();
        let expires_at = Duration::try_minutes(self.ttl_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::TokenIssue("token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: email,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let access_token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| AuthError::TokenIssue(err.to_string()))?;

        Ok(AccessToken {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    fn resolve(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

        // Role is read from the account book, not the claims.
        let guard = self.accounts.read().expect("account lock poisoned");
        let account = guard
            .get(&data.claims.sub)
            .ok_or(AuthError::InvalidToken)?;

        Ok(UserIdentity {
            email: data.claims.sub,
            role: account.role,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
