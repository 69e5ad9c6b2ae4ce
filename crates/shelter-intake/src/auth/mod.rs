//! Credential boundary and the role guard shared by every admin-only operation.

pub mod guard;
pub mod router;
pub mod token;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub use guard::{bearer_token, require_role, RoleGuard};
pub use router::auth_router;
pub use token::TokenAuthService;

/// Authorization axis for every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Admins may do everything staff may do.
    pub const fn satisfies(self, required: Role) -> bool {
        matches!(
            (self, required),
            (Role::Admin, _) | (Role::Staff, Role::Staff)
        )
    }
}

/// Identity resolved from a bearer credential. Never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// Issues and resolves bearer credentials.
pub trait AuthService: Send + Sync {
    fn login(&self, email: &str, password: &str) -> Result<AccessToken, AuthError>;
    fn resolve(&self, token: &str) -> Result<UserIdentity, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("account {0} already exists")]
    DuplicateAccount(String),
    #[error("unable to issue token: {0}")]
    TokenIssue(String),
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        tracing::debug!(reason = %value, "authentication rejected");
        ServiceError::Authorization
    }
}

/// The only authorization check in the crate. Missing identities and insufficient roles
/// fail identically.
pub fn authorize(
    identity: Option<&UserIdentity>,
    required: Role,
) -> Result<&UserIdentity, ServiceError> {
    match identity {
        Some(identity) if identity.role.satisfies(required) => Ok(identity),
        _ => Err(ServiceError::Authorization),
    }
}
