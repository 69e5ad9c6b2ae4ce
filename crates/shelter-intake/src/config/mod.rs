use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEV_JWT_SECRET: &str = "dev-only-secret";
const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub paging: PagingConfig,
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match env::var("APP_JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSecret)
            }
            _ => DEV_JWT_SECRET.to_string(),
        };
        let token_ttl_minutes = read_number("APP_TOKEN_TTL_MINUTES", 60 * 24)?;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
            return Err(ConfigError::InvalidTokenTtl);
        }

        let paging = PagingConfig {
            default_page_size: read_number("APP_DEFAULT_PAGE_SIZE", 20)?,
            max_page_size: read_number("APP_MAX_PAGE_SIZE", 100)?,
        };
        paging.validate()?;

        let bootstrap = BootstrapConfig {
            admin: read_credentials("APP_ADMIN_EMAIL", "APP_ADMIN_PASSWORD"),
            staff: read_credentials("APP_STAFF_EMAIL", "APP_STAFF_PASSWORD"),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_minutes,
            },
            paging,
            bootstrap,
        })
    }
}

fn read_number<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

fn read_credentials(email_var: &str, password_var: &str) -> Option<Credentials> {
    let email = env::var(email_var).ok().filter(|value| !value.trim().is_empty())?;
    let password = env::var(password_var).ok().filter(|value| !value.is_empty())?;
    Some(Credentials { email, password })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Bearer token signing settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

/// Bounds applied to paged intake searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl PagingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0
            || self.default_page_size == 0
            || self.default_page_size > self.max_page_size
        {
            return Err(ConfigError::InvalidPaging);
        }
        Ok(())
    }
}

/// Accounts seeded into the in-memory auth service at startup.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    pub admin: Option<Credentials>,
    pub staff: Option<Credentials>,
}

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
    MissingSecret,
    InvalidPaging,
    InvalidTokenTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => write!(f, "{var} must be a valid number"),
            ConfigError::MissingSecret => {
                write!(f, "APP_JWT_SECRET must be set when APP_ENV is production")
            }
            ConfigError::InvalidPaging => write!(
                f,
                "APP_DEFAULT_PAGE_SIZE must be positive and no larger than APP_MAX_PAGE_SIZE"
            ),
            ConfigError::InvalidTokenTtl => write!(
                f,
                "APP_TOKEN_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_JWT_SECRET",
            "APP_TOKEN_TTL_MINUTES",
            "APP_DEFAULT_PAGE_SIZE",
            "APP_MAX_PAGE_SIZE",
            "APP_ADMIN_EMAIL",
            "APP_ADMIN_PASSWORD",
            "APP_STAFF_EMAIL",
            "APP_STAFF_PASSWORD",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.auth.token_ttl_minutes, 1440);
        assert_eq!(config.paging, PagingConfig::default());
        assert!(config.bootstrap.admin.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn production_requires_jwt_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        assert!(matches!(AppConfig::load(), Err(ConfigError::MissingSecret)));

        env::set_var("APP_JWT_SECRET", "s3cret");
        let config = AppConfig::load().expect("config loads with secret");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        reset_env();
    }

    #[test]
    fn rejects_default_page_size_above_maximum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DEFAULT_PAGE_SIZE", "50");
        env::set_var("APP_MAX_PAGE_SIZE", "10");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidPaging)));

        env::set_var("APP_MAX_PAGE_SIZE", "lots");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                var: "APP_MAX_PAGE_SIZE"
            })
        ));
        reset_env();
    }

    #[test]
    fn rejects_token_ttl_outside_one_minute_to_one_year() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        for raw in ["0", "-5", "525601", "9223372036854775807"] {
            env::set_var("APP_TOKEN_TTL_MINUTES", raw);
            assert!(
                matches!(AppConfig::load(), Err(ConfigError::InvalidTokenTtl)),
                "{raw} should be rejected"
            );
        }

        env::set_var("APP_TOKEN_TTL_MINUTES", "525600");
        let config = AppConfig::load().expect("one year is allowed");
        assert_eq!(config.auth.token_ttl_minutes, 525_600);
        reset_env();
    }

    #[test]
    fn bootstrap_credentials_require_both_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ADMIN_EMAIL", "admin@example.org");
        let config = AppConfig::load().expect("config loads");
        assert!(config.bootstrap.admin.is_none());

        env::set_var("APP_ADMIN_PASSWORD", "correct horse");
        let config = AppConfig::load().expect("config loads");
        let admin = config.bootstrap.admin.expect("admin seeded");
        assert_eq!(admin.email, "admin@example.org");
        assert!(!format!("{admin:?}").contains("correct horse"));
        reset_env();
    }
}
