//! API server configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use molar_core::auth::jwt::{
    DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL, TokenCodec, generate_secret,
};
use thiserror::Error;
use tracing::warn;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in production")]
    MissingSecret,

    #[error("unknown environment '{0}' (expected development, test or production)")]
    UnknownEnvironment(String),

    #[error("invalid duration '{value}': {source}")]
    InvalidDuration {
        value: String,
        source: humantime::DurationError,
    },

    #[error("token lifetime must be positive")]
    ZeroDuration,

    #[error("token codec: {0}")]
    Codec(#[from] molar_core::auth::AuthError),
}

/// Deployment environment. Only `Development` enables the identity bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Whether requests without a bearer token may run as the fixed
    /// development identity.
    pub fn allows_identity_bypass(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Parse a lifetime such as `15m`, `1h` or `7d`.
pub fn parse_ttl(value: &str) -> Result<Duration, ConfigError> {
    let ttl = humantime::parse_duration(value.trim()).map_err(|source| {
        ConfigError::InvalidDuration {
            value: value.to_string(),
            source,
        }
    })?;
    if ttl.is_zero() {
        return Err(ConfigError::ZeroDuration);
    }
    Ok(ttl)
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    pub environment: Environment,
    /// JWT signing secret.
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("environment", &self.environment)
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Validate raw settings.
    ///
    /// Lifetimes must yield an expiry the token codec can represent. A missing
    /// or empty secret is fatal in production. Elsewhere a random
    /// secret is generated, so tokens do not survive a restart.
    pub fn new(
        environment: Environment,
        jwt_secret: Option<String>,
        access_token_ttl: &str,
        refresh_token_ttl: &str,
    ) -> Result<Self, ConfigError> {
        let jwt_secret = match jwt_secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None if environment == Environment::Production => {
                return Err(ConfigError::MissingSecret);
            }
            None => {
                warn!(%environment, "JWT_SECRET not set, using an ephemeral secret");
                generate_secret()
            }
        };
        let config = Self {
            environment,
            jwt_secret,
            access_token_ttl: parse_ttl(access_token_ttl)?,
            refresh_token_ttl: parse_ttl(refresh_token_ttl)?,
        };
        config.token_codec()?;
        Ok(config)
    }

    /// Settings for tests: fixed secret and default lifetimes.
    pub fn for_environment(environment: Environment, jwt_secret: &str) -> Self {
        Self {
            environment,
            jwt_secret: jwt_secret.to_string(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
        }
    }

    /// Build the token codec these settings describe.
    pub fn token_codec(&self) -> Result<TokenCodec, ConfigError> {
        Ok(TokenCodec::new(
            self.jwt_secret.as_bytes(),
            self.access_token_ttl,
            self.refresh_token_ttl,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_environments() {
        assert_eq!(
            "development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!(
            "PRODUCTION".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn only_development_allows_bypass() {
        assert!(Environment::Development.allows_identity_bypass());
        assert!(!Environment::Test.allows_identity_bypass());
        assert!(!Environment::Production.allows_identity_bypass());
    }

    #[test]
    fn parses_token_lifetimes() {
        assert_eq!(parse_ttl("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(parse_ttl("15m").unwrap(), Duration::from_secs(900));
        assert!(parse_ttl("soon").is_err());
        assert!(matches!(parse_ttl("0s"), Err(ConfigError::ZeroDuration)));
    }

    #[test]
    fn production_requires_secret() {
        let err = ApiConfig::new(Environment::Production, None, "1h", "7d").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret));
        let err =
            ApiConfig::new(Environment::Production, Some("  ".into()), "1h", "7d").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret));
    }

    #[test]
    fn lifetime_beyond_the_calendar_is_rejected() {
        let err = ApiConfig::new(
            Environment::Production,
            Some("secret".into()),
            "1000000years",
            "7d",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Codec(_)));
    }

    #[test]
    fn development_generates_secret() {
        let config = ApiConfig::new(Environment::Development, None, "1h", "7d").unwrap();
        assert_eq!(config.jwt_secret.len(), 64);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ApiConfig::for_environment(Environment::Test, "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
