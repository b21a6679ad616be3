//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_LDAP_BASE_DN,
    DEFAULT_LDAP_MANAGER_FILTER, DEFAULT_LDAP_URL, DEFAULT_LDAP_USERS_OU, DEFAULT_REDIS_URL,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_USE_LDAP, MIN_JWT_SECRET_LENGTH,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    /// Mirror accounts into the directory and authenticate against it.
    pub use_ldap: bool,
    pub ldap: LdapSettings,
}

/// Directory connection settings, only read when `use_ldap` is set.
#[derive(Clone)]
pub struct LdapSettings {
    pub url: String,
    pub bind_dn: String,
    bind_password: String,
    pub base_dn: String,
    /// Unit receiving accounts created without an explicit one
    pub users_ou: String,
    pub manager_filter: String,
    pub tls_verify: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("use_ldap", &self.use_ldap)
            .field("ldap", &self.ldap)
            .finish()
    }
}

impl std::fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSettings")
            .field("url", &self.url)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"[REDACTED]")
            .field("base_dn", &self.base_dn)
            .field("users_ou", &self.users_ou)
            .field("manager_filter", &self.manager_filter)
            .field("tls_verify", &self.tls_verify)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                // Development mode: use default but warn
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        Self::new(jwt_secret)
            .with_database_url(
                env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            )
            .with_redis_url(env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()))
            .with_server(
                env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                env::var("SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
            )
            .with_jwt_expiration_hours(
                env::var("JWT_EXPIRATION_HOURS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            )
            .with_ldap(
                env::var("USE_LDAP")
                    .map(|v| as_bool(&v))
                    .unwrap_or(DEFAULT_USE_LDAP),
                LdapSettings::from_env(),
            )
    }

    /// Build a configuration with development defaults around a JWT secret.
    ///
    /// # Panics
    /// Panics if the secret is shorter than the required minimum.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret,
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            use_ldap: DEFAULT_USE_LDAP,
            ldap: LdapSettings::default(),
        }
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.server_host = host.into();
        self.server_port = port;
        self
    }

    pub fn with_jwt_expiration_hours(mut self, hours: i64) -> Self {
        self.jwt_expiration_hours = hours;
        self
    }

    pub fn with_ldap(mut self, enabled: bool, ldap: LdapSettings) -> Self {
        self.use_ldap = enabled;
        self.ldap = ldap;
        self
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl LdapSettings {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env::var("LDAP_URL").unwrap_or(defaults.url),
            bind_dn: env::var("LDAP_BIND_DN").unwrap_or(defaults.bind_dn),
            bind_password: env::var("LDAP_BIND_PASSWORD").unwrap_or(defaults.bind_password),
            base_dn: env::var("LDAP_BASE_DN").unwrap_or(defaults.base_dn),
            users_ou: env::var("LDAP_USERS_OU").unwrap_or(defaults.users_ou),
            manager_filter: env::var("LDAP_MANAGER_FILTER").unwrap_or(defaults.manager_filter),
            tls_verify: env::var("LDAP_TLS_VERIFY")
                .map(|v| as_bool(&v))
                .unwrap_or(defaults.tls_verify),
        }
    }

    /// Password used by the service account bind.
    pub fn bind_password(&self) -> &str {
        &self.bind_password
    }
}

impl Default for LdapSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_LDAP_URL.to_string(),
            bind_dn: format!("cn=admin,{}", DEFAULT_LDAP_BASE_DN),
            bind_password: String::new(),
            base_dn: DEFAULT_LDAP_BASE_DN.to_string(),
            users_ou: DEFAULT_LDAP_USERS_OU.to_string(),
            manager_filter: DEFAULT_LDAP_MANAGER_FILTER.to_string(),
            tls_verify: true,
        }
    }
}

/// Interpret a settings value as a boolean the way paste.deploy style
/// settings do: `true`, `yes`, `on`, `y`, `t` and `1` are truthy.
pub fn as_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "y" | "t" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_bool_truthy_values() {
        for value in ["true", "True", " yes ", "on", "y", "t", "1"] {
            assert!(as_bool(value), "{value} should be truthy");
        }
    }

    #[test]
    fn test_as_bool_falsy_values() {
        for value in ["false", "no", "off", "0", "", "maybe"] {
            assert!(!as_bool(value), "{value} should be falsy");
        }
    }

    #[test]
    fn test_ldap_disabled_by_default() {
        let config = Config::new("test-secret-key-for-testing-only-32chars");
        assert!(!config.use_ldap);
    }

    #[test]
    #[should_panic]
    fn test_short_secret_rejected() {
        Config::new("short");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::new("test-secret-key-for-testing-only-32chars");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("test-secret-key"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
