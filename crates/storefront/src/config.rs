//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LUXE_TOKEN_SECRET` - Bearer token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `LUXE_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string.
//!   When unset the storefront runs on in-memory repositories.
//! - `LUXE_HOST` - Bind address (default: 127.0.0.1)
//! - `LUXE_PORT` - Listen port (default: 5000)
//! - `LUXE_TOKEN_TTL_HOURS` - Token lifetime in hours, 1 to 87600 (default: 168)
//! - `LUXE_TAX_RATE` - Tax fraction quoted by the cart summary (default: 0.08)
//! - `LUXE_SEED_DEMO` - Seed the demo catalog at startup (default: false)
//! - `LUXE_AUTH_RATE_LIMIT` - Rate limit `/api/auth/*` per IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Upper bound for `LUXE_TOKEN_TTL_HOURS` (ten years).
const MAX_TOKEN_TTL_HOURS: u32 = 87_600;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password).
    /// `None` selects the in-memory repositories.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token signing secret
    pub token_secret: SecretString,
    /// Bearer token lifetime in hours
    pub token_ttl_hours: u32,
    /// Tax fraction applied to the cart subtotal (e.g. 0.08)
    pub tax_rate: Decimal,
    /// Seed the demo catalog into an empty in-memory store on startup
    pub seed_demo: bool,
    /// Rate limit the auth endpoints per client IP
    pub auth_rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("tax_rate", &self.tax_rate)
            .field("seed_demo", &self.seed_demo)
            .field("auth_rate_limit", &self.auth_rate_limit)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("LUXE_DATABASE_URL");
        let host: IpAddr = parse_env_or_default("LUXE_HOST", "127.0.0.1")?;
        let port: u16 = parse_env_or_default("LUXE_PORT", "5000")?;
        let token_secret = get_validated_secret("LUXE_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "LUXE_TOKEN_SECRET")?;
        let token_ttl_hours: u32 = parse_env_or_default("LUXE_TOKEN_TTL_HOURS", "168")?;
        validate_token_ttl(token_ttl_hours)?;
        let tax_rate: Decimal = parse_env_or_default("LUXE_TAX_RATE", "0.08")?;
        validate_tax_rate(tax_rate)?;

        Ok(Self {
            database_url,
            host,
            port,
            token_secret,
            token_ttl_hours,
            tax_rate,
            seed_demo: parse_env_or_default("LUXE_SEED_DEMO", "false")?,
            auth_rate_limit: parse_env_or_default("LUXE_AUTH_RATE_LIMIT", "true")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for tests and local tooling: in-memory store, no
    /// Sentry, no rate limiting.
    #[must_use]
    pub fn for_testing(token_secret: SecretString) -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            token_secret,
            token_ttl_hours: 168,
            tax_rate: Decimal::new(8, 2),
            seed_demo: false,
            auth_rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// The tax rate is a fraction in `[0, 1]`.
/// Validate the token lifetime: at least an hour, at most ten years.
fn validate_token_ttl(hours: u32) -> Result<(), ConfigError> {
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        return Err(ConfigError::InvalidEnvVar(
            "LUXE_TOKEN_TTL_HOURS".to_string(),
            format!("must be between 1 and {MAX_TOKEN_TTL_HOURS} (got {hours})"),
        ));
    }
    Ok(())
}

fn validate_tax_rate(rate: Decimal) -> Result<(), ConfigError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "LUXE_TAX_RATE".to_string(),
            format!("must be between 0 and 1 (got {rate})"),
        ));
    }
    Ok(())
}

/// Validate that a token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-signing-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_token_secret_length() {
        let short = SecretString::from("short");
        assert!(validate_token_secret(&short, "LUXE_TOKEN_SECRET").is_err());

        let long = SecretString::from("a".repeat(32));
        assert!(validate_token_secret(&long, "LUXE_TOKEN_SECRET").is_ok());
    }

    #[test]
    fn test_parse_value() {
        assert!(parse_value::<bool>("LUXE_SEED_DEMO", "true").unwrap());
        assert_eq!(parse_value::<u16>("LUXE_PORT", " 8080 ").unwrap(), 8080);
        assert!(matches!(
            parse_value::<u16>("LUXE_PORT", "eighty"),
            Err(ConfigError::InvalidEnvVar(ref key, _)) if key == "LUXE_PORT"
        ));
        assert_eq!(
            parse_value::<Decimal>("LUXE_TAX_RATE", "0.08").unwrap(),
            Decimal::new(8, 2)
        );
    }

    #[test]
    fn test_validate_token_ttl() {
        assert!(validate_token_ttl(1).is_ok());
        assert!(validate_token_ttl(168).is_ok());
        assert!(validate_token_ttl(MAX_TOKEN_TTL_HOURS).is_ok());
        assert!(validate_token_ttl(0).is_err());
        assert!(matches!(
            validate_token_ttl(4_000_000_000),
            Err(ConfigError::InvalidEnvVar(ref var, _)) if var == "LUXE_TOKEN_TTL_HOURS"
        ));
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(Decimal::ZERO).is_ok());
        assert!(validate_tax_rate(Decimal::new(8, 2)).is_ok());
        assert!(validate_tax_rate(Decimal::new(-1, 2)).is_err());
        assert!(validate_tax_rate(Decimal::new(15, 1)).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let mut config = StorefrontConfig::for_testing(SecretString::from("x".repeat(32)));
        config.port = 5000;

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config =
            StorefrontConfig::for_testing(SecretString::from("super_signing_value_1234567890ab"));
        config.database_url = Some(SecretString::from("postgres://luxe:hunter2@db/luxe"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("127.0.0.1"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_signing_value"));
        assert!(!debug_output.contains("hunter2"));
    }
}
