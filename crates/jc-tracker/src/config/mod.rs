use crate::workflows::quip::{DEFAULT_MIN_COLUMNS, DEFAULT_TABLE_PREFIX};
use crate::workflows::tracker::PeriodKey;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub source: SourceConfig,
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

        let documents_dir = env::var("JC_DOCUMENTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./documents"));
        let table_prefix =
            env::var("JC_TABLE_PREFIX").unwrap_or_else(|_| DEFAULT_TABLE_PREFIX.to_string());
        let min_columns = match env::var("JC_MIN_COLUMNS") {
            Ok(raw) => parse_min_columns(&raw)?,
            Err(_) => DEFAULT_MIN_COLUMNS,
        };
        let periods = match env::var("JC_PERIODS") {
            Ok(raw) => parse_periods(&raw)?,
            Err(_) => PeriodSource::standard(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            source: SourceConfig {
                documents_dir,
                table_prefix,
                min_columns,
                periods,
            },
        })
    }
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where quarterly documents live and how their tables are recognized.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub documents_dir: PathBuf,
    pub table_prefix: String,
    pub min_columns: usize,
    pub periods: Vec<PeriodSource>,
}

impl SourceConfig {
    pub fn period_keys(&self) -> Vec<PeriodKey> {
        self.periods.iter().map(|period| period.key.clone()).collect()
    }

    pub fn display_name(&self, key: &PeriodKey) -> Option<&str> {
        self.periods
            .iter()
            .find(|period| &period.key == key)
            .map(|period| period.name.as_str())
    }
}

/// One selectable quarter and the name shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSource {
    pub key: PeriodKey,
    pub name: String,
}

impl PeriodSource {
    pub fn standard() -> Vec<Self> {
        const STANDARD: &[(&str, &str)] = &[
            ("2025_Q1", "JC Q1 2025"),
            ("2025_Q2", "JC Q2 2025"),
            ("2025_Q3", "JC Q3 2025"),
            ("2025_Q4", "JC Q4 2025"),
            ("2026_Q1", "JC Q1 2026"),
            ("2026_Q2", "JC Q2 2026"),
            ("2026_Q3", "JC Q3 2026"),
            ("2026_Q4", "JC Q4 2026"),
        ];

        STANDARD
            .iter()
            .map(|(key, name)| Self {
                key: PeriodKey::new(*key),
                name: (*name).to_string(),
            })
            .collect()
    }
}

fn parse_min_columns(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidMinColumns),
    }
}

// `2025_Q1=JC Q1 2025,2025_Q2`; a bare key is its own display name.
fn parse_periods(raw: &str) -> Result<Vec<PeriodSource>, ConfigError> {
    let mut periods = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (key, name) = match entry.split_once('=') {
            Some((key, name)) => (key.trim(), name.trim()),
            None => (entry, entry),
        };
        if key.is_empty() {
            return Err(ConfigError::InvalidPeriods {
                entry: entry.to_string(),
            });
        }
        let name = if name.is_empty() { key } else { name };
        periods.push(PeriodSource {
            key: PeriodKey::new(key),
            name: name.to_string(),
        });
    }

    if periods.is_empty() {
        return Err(ConfigError::InvalidPeriods {
            entry: raw.to_string(),
        });
    }
    Ok(periods)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMinColumns,
    InvalidPeriods { entry: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMinColumns => {
                write!(f, "JC_MIN_COLUMNS must be a positive integer")
            }
            ConfigError::InvalidPeriods { entry } => {
                write!(f, "JC_PERIODS entry '{entry}' must look like KEY=Display Name")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidMinColumns
            | ConfigError::InvalidPeriods { .. } => None,
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
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("JC_DOCUMENTS_DIR");
        env::remove_var("JC_TABLE_PREFIX");
        env::remove_var("JC_MIN_COLUMNS");
        env::remove_var("JC_PERIODS");
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
        assert_eq!(config.source.table_prefix, "WK");
        assert_eq!(config.source.min_columns, 19);
        assert_eq!(config.source.periods.len(), 8);
        assert_eq!(
            config.source.display_name(&PeriodKey::new("2026_Q1")),
            Some("JC Q1 2026")
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_zero_min_columns() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("JC_MIN_COLUMNS", "0");
        let error = AppConfig::load().expect_err("zero width rejected");
        assert!(matches!(error, ConfigError::InvalidMinColumns));
        reset_env();
    }

    #[test]
    fn parses_custom_period_list() {
        let periods = parse_periods("2027_Q1=JC Q1 2027, 2027_Q2").expect("periods parse");
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].name, "JC Q1 2027");
        assert_eq!(periods[1].key, PeriodKey::new("2027_Q2"));
        assert_eq!(periods[1].name, "2027_Q2");

        assert!(parse_periods(" , ").is_err());
        assert!(parse_periods("=Nameless").is_err());
    }
}
