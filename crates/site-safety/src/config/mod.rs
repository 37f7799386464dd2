use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIGTIME_URL: &str = "https://iq.bigtime.net/BigtimeData/api/v2";
const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

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
    pub workflow: WorkflowConfig,
    pub integrations: IntegrationsConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            workflow: WorkflowConfig::from_env()?,
            integrations: IntegrationsConfig::from_env()?,
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

/// Business defaults applied by the inspection and summary workflows.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    /// Days between finalization and the due date of generated corrective actions.
    pub action_due_days: i64,
    /// Responsible party recorded on generated actions until someone is assigned.
    pub responsible_placeholder: String,
    /// Upper bound for any single email, storage, or time-tracking call.
    pub adapter_timeout: Duration,
    /// Document-storage folder used when a project has no folder of its own.
    pub catch_all_folder: String,
    /// Width of the "due soon" bucket in the weekly summary.
    pub summary_due_soon_days: i64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            action_due_days: 14,
            responsible_placeholder: "TBD".to_string(),
            adapter_timeout: Duration::from_secs(30),
            catch_all_folder: "catch-all-uploads".to_string(),
            summary_due_soon_days: 7,
        }
    }
}

impl WorkflowConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            action_due_days: parse_var("ACTION_DUE_DAYS", defaults.action_due_days)?,
            responsible_placeholder: env::var("ACTION_RESPONSIBLE_PLACEHOLDER")
                .unwrap_or(defaults.responsible_placeholder),
            adapter_timeout: Duration::from_secs(parse_var(
                "ADAPTER_TIMEOUT_SECS",
                defaults.adapter_timeout.as_secs(),
            )?),
            catch_all_folder: env::var("SHAREPOINT_CATCH_ALL_FOLDER")
                .unwrap_or(defaults.catch_all_folder),
            summary_due_soon_days: parse_var(
                "SUMMARY_DUE_SOON_DAYS",
                defaults.summary_due_soon_days,
            )?,
        })
    }
}

/// Which concrete adapter backs each external capability. Decided once at startup.
#[derive(Debug, Clone, Default)]
pub struct IntegrationsConfig {
    pub email: EmailBackend,
    pub storage: StorageBackend,
    pub time_tracking: TimeTrackingBackend,
}

impl IntegrationsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = match non_empty_var("SMTP_HOST") {
            Some(host) => EmailBackend::Smtp(SmtpSettings {
                host,
                port: parse_var("SMTP_PORT", 587)?,
                username: non_empty_var("SMTP_USERNAME"),
                password: non_empty_var("SMTP_PASSWORD"),
                from: env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "inspections@localhost".to_string()),
            }),
            None => EmailBackend::Stub,
        };

        let storage = match (
            non_empty_var("SHAREPOINT_DRIVE_ID"),
            non_empty_var("SHAREPOINT_ACCESS_TOKEN"),
        ) {
            (Some(drive_id), Some(access_token)) => StorageBackend::SharePoint(SharePointSettings {
                graph_url: env::var("SHAREPOINT_GRAPH_URL")
                    .unwrap_or_else(|_| DEFAULT_GRAPH_URL.to_string()),
                drive_id,
                access_token,
            }),
            _ => StorageBackend::Stub,
        };

        let time_tracking = match (
            non_empty_var("BIGTIME_API_TOKEN"),
            non_empty_var("BIGTIME_FIRM_ID"),
        ) {
            (Some(api_token), Some(firm_id)) => TimeTrackingBackend::BigTime(BigTimeSettings {
                base_url: env::var("BIGTIME_API_URL")
                    .unwrap_or_else(|_| DEFAULT_BIGTIME_URL.to_string()),
                firm_id,
                api_token,
            }),
            _ => TimeTrackingBackend::Stub,
        };

        Ok(Self {
            email,
            storage,
            time_tracking,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub enum EmailBackend {
    #[default]
    Stub,
    Smtp(SmtpSettings),
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Default)]
pub enum StorageBackend {
    #[default]
    Stub,
    SharePoint(SharePointSettings),
}

#[derive(Debug, Clone)]
pub struct SharePointSettings {
    pub graph_url: String,
    pub drive_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Default)]
pub enum TimeTrackingBackend {
    #[default]
    Stub,
    BigTime(BigTimeSettings),
}

#[derive(Debug, Clone)]
pub struct BigTimeSettings {
    pub base_url: String,
    pub firm_id: String,
    pub api_token: String,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        None => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be an integer (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
