//! PostgreSQL connection configuration.

use std::time::Duration;

use percent_encoding::percent_decode_str;

use crate::error::{PgError, PgResult};

const DEFAULT_APPLICATION_NAME: &str = "ratchet";

/// PostgreSQL connection configuration.
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// Host.
    pub host: String,
    /// Port (default: 5432).
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Username.
    pub user: String,
    /// Password.
    pub password: Option<String>,
    /// SSL mode.
    pub ssl_mode: SslMode,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Application name (shown in pg_stat_activity).
    pub application_name: String,
}

/// SSL mode for connections.
///
/// The driver is built without TLS, so only modes that permit a plaintext
/// connection are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Disable SSL.
    Disable,
    /// Prefer SSL but allow non-SSL.
    #[default]
    Prefer,
}

impl PgConfig {
    /// Create a new configuration from a database URL.
    pub fn from_url(url: &str) -> PgResult<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| PgError::config(format!("invalid database URL: {}", e)))?;

        if parsed.scheme() != "postgresql" && parsed.scheme() != "postgres" {
            return Err(PgError::config(format!(
                "invalid scheme: expected 'postgresql' or 'postgres', got '{}'",
                parsed.scheme()
            )));
        }

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => "localhost".to_string(),
        };

        let port = parsed.port().unwrap_or(5432);

        let database = decode(parsed.path().trim_start_matches('/'), "database name")?;

        if database.is_empty() {
            return Err(PgError::config("missing database name in URL"));
        }

        let user = if parsed.username().is_empty() {
            "postgres".to_string()
        } else {
            decode(parsed.username(), "user")?
        };

        let password = parsed
            .password()
            .map(|p| decode(p, "password"))
            .transpose()?;

        let mut ssl_mode = SslMode::Prefer;
        let mut connect_timeout = Duration::from_secs(30);
        let mut application_name = DEFAULT_APPLICATION_NAME.to_string();

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "sslmode" => {
                    ssl_mode = match value.as_ref() {
                        "disable" => SslMode::Disable,
                        "prefer" => SslMode::Prefer,
                        other => {
                            return Err(PgError::config(format!(
                                "unsupported sslmode '{}': this build connects without TLS",
                                other
                            )));
                        }
                    };
                }
                "connect_timeout" => {
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| PgError::config("invalid connect_timeout"))?;
                    connect_timeout = Duration::from_secs(secs);
                }
                "application_name" => {
                    application_name = value.into_owned();
                }
                other => {
                    return Err(PgError::config(format!(
                        "unsupported connection parameter: {}",
                        other
                    )));
                }
            }
        }

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
            ssl_mode,
            connect_timeout,
            application_name,
        })
    }

    /// Convert to tokio-postgres config.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config.host(&self.host);
        config.port(self.port);
        config.dbname(&self.database);
        config.user(&self.user);

        if let Some(ref password) = self.password {
            config.password(password);
        }

        config.application_name(&self.application_name);
        config.connect_timeout(self.connect_timeout);
        config.ssl_mode(match self.ssl_mode {
            SslMode::Disable => tokio_postgres::config::SslMode::Disable,
            SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
        });

        config
    }

    /// `user@host:port/database`, for log lines and error messages.
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// Undo URL percent-encoding in one component.
fn decode(component: &str, what: &str) -> PgResult<String> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| PgError::config(format!("{} in URL is not valid UTF-8", what)))
}
