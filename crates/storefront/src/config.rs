//! Storefront configuration.
//!
//! The service endpoints are fixed constants; every value can be overridden from
//! the environment (or a `.env` file) for staging and local testing.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PUPUSAS_CONTENT_ENDPOINT` - GraphQL content API endpoint
//! - `PUPUSAS_CONTENT_TOKEN` - Bearer token for the content API
//! - `PUPUSAS_PAYMENT_ENDPOINT` - Payment function endpoint
//! - `PUPUSAS_PAYMENT_TOKEN` - Card token sent with payment requests (default: test card)
//! - `PUPUSAS_RESET_DELAY_MS` - Delay before the cart UI returns to idle (default: 5000)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// GraphQL content API endpoint.
pub const CONTENT_ENDPOINT: &str =
    "https://api-us-west-2.graphcms.com/v2/ck9ewri0n0ao001zbcneq5dkk/master";

/// Serverless payment function endpoint.
pub const PAYMENT_ENDPOINT: &str = "https://www.pupusas2go.com/.netlify/functions/index";

/// Test card token accepted by the payment provider in test mode.
pub const TEST_CARD_TOKEN: &str = "tok_visa";

/// Delay before a finished checkout returns the cart UI to idle.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(5);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Content API configuration
    pub content: ContentConfig,
    /// Payment function configuration
    pub payment: PaymentConfig,
    /// Delay before success/failure status resets to idle
    pub reset_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// GraphQL content API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ContentConfig {
    pub endpoint: String,
    pub auth_token: Option<SecretString>,
}

impl std::fmt::Debug for ContentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentConfig")
            .field("endpoint", &self.endpoint)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Payment function configuration.
///
/// Implements `Debug` manually to redact the card token.
#[derive(Clone)]
pub struct PaymentConfig {
    pub endpoint: String,
    pub card_token: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("endpoint", &self.endpoint)
            .field("card_token", &"[REDACTED]")
            .finish()
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            content: ContentConfig {
                endpoint: CONTENT_ENDPOINT.to_string(),
                auth_token: None,
            },
            payment: PaymentConfig {
                endpoint: PAYMENT_ENDPOINT.to_string(),
                card_token: SecretString::from(TEST_CARD_TOKEN),
            },
            reset_delay: DEFAULT_RESET_DELAY,
            sentry_dsn: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration, applying environment overrides to the defaults.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let content = ContentConfig {
            endpoint: get_url_or(
                "PUPUSAS_CONTENT_ENDPOINT",
                defaults.content.endpoint,
            )?,
            auth_token: get_optional_env("PUPUSAS_CONTENT_TOKEN").map(SecretString::from),
        };

        let payment = PaymentConfig {
            endpoint: get_url_or(
                "PUPUSAS_PAYMENT_ENDPOINT",
                defaults.payment.endpoint,
            )?,
            card_token: get_optional_env("PUPUSAS_PAYMENT_TOKEN")
                .map_or(defaults.payment.card_token, SecretString::from),
        };

        let reset_delay = match get_optional_env("PUPUSAS_RESET_DELAY_MS") {
            Some(raw) => parse_delay_ms("PUPUSAS_RESET_DELAY_MS", &raw)?,
            None => defaults.reset_delay,
        };

        Ok(Self {
            content,
            payment,
            reset_delay,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get a validated URL from the environment, or the default when unset.
fn get_url_or(key: &str, default: String) -> Result<String, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| {
        parse_url(key, &raw).map(String::from)
    })
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn parse_delay_ms(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
