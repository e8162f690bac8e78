//! Configuration file parsing and management.
//!
//! Settings come from four layers, lowest precedence first: built-in
//! defaults, a TOML file, environment variables, command-line flags. The
//! merged result is an [`ExporterConfig`]; a missing API token is fatal.

use crate::error::ExpiryError;
use crate::pipeline::{ExpiryPipeline, DEFAULT_PACING_INTERVAL, MIN_PACING_INTERVAL};
use crate::protocols::whois::{DEFAULT_WHOIS_PROGRAM, DEFAULT_WHOIS_TIMEOUT};
use crate::protocols::zones::DEFAULT_ZONES_URL;
use crate::protocols::{WhoisClient, ZoneClient};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1";
pub const DEFAULT_LISTEN_PORT: u16 = 9988;
pub const DEFAULT_ZONES_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration loaded from TOML files.
///
/// ```toml
/// [server]
/// listen_addr = "0.0.0.0"
/// listen_port = 9988
///
/// [zones]
/// api_token = "..."
///
/// [whois]
/// command = "whois"
/// args = ["-h", "whois.tcinet.ru"]
/// timeout = "10s"
/// pacing = "1s"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Listener settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Zone-listing API settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<ZonesConfig>,

    /// WHOIS executor and pacing settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<WhoisConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_addr: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ZonesConfig {
    /// Full URL of the zone-listing endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Bearer token for the zone-listing API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// HTTP timeout (as string, e.g. "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WhoisConfig {
    /// Program to run for lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Arguments placed before the domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Per-lookup timeout (e.g. "10s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Pause between consecutive lookups (e.g. "1s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pacing: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ExpiryError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExpiryError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ExpiryError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ExpiryError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// The XDG file is loaded first; a file in the working directory
    /// overrides it.
    pub fn discover_and_load(&self) -> Result<FileConfig, ExpiryError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        // 1. XDG config (lowest precedence)
        if let Some(xdg_path) = self.get_xdg_config_path() {
            let config = self.load_file(&xdg_path)?;
            merged_config = self.merge_configs(merged_config, config);
            loaded_files.push(xdg_path);
        }

        // 2. Local config (highest precedence)
        if let Some(local_path) = self.get_local_config_path() {
            let config = self.load_file(&local_path)?;
            merged_config = self.merge_configs(merged_config, config);
            loaded_files.push(local_path);
        }

        if self.verbose {
            for path in &loaded_files {
                info!(path = %path.display(), "loaded configuration file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./domain-expiry.toml", "./.domain-expiry.toml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-expiry").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            server: match (lower.server, higher.server) {
                (Some(lower_server), Some(higher_server)) => Some(ServerConfig {
                    listen_addr: higher_server.listen_addr.or(lower_server.listen_addr),
                    listen_port: higher_server.listen_port.or(lower_server.listen_port),
                }),
                (lower_server, higher_server) => higher_server.or(lower_server),
            },
            zones: match (lower.zones, higher.zones) {
                (Some(lower_zones), Some(higher_zones)) => Some(ZonesConfig {
                    url: higher_zones.url.or(lower_zones.url),
                    api_token: higher_zones.api_token.or(lower_zones.api_token),
                    timeout: higher_zones.timeout.or(lower_zones.timeout),
                }),
                (lower_zones, higher_zones) => higher_zones.or(lower_zones),
            },
            whois: match (lower.whois, higher.whois) {
                (Some(lower_whois), Some(higher_whois)) => Some(WhoisConfig {
                    command: higher_whois.command.or(lower_whois.command),
                    args: higher_whois.args.or(lower_whois.args),
                    timeout: higher_whois.timeout.or(lower_whois.timeout),
                    pacing: higher_whois.pacing.or(lower_whois.pacing),
                }),
                (lower_whois, higher_whois) => higher_whois.or(lower_whois),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ExpiryError> {
        if let Some(server) = &config.server {
            if server.listen_port == Some(0) {
                return Err(ExpiryError::config("listen_port must be between 1 and 65535"));
            }
        }

        if let Some(zones) = &config.zones {
            if let Some(timeout) = &zones.timeout {
                check_positive_duration("zones.timeout", timeout)?;
            }
        }

        if let Some(whois) = &config.whois {
            if let Some(command) = &whois.command {
                if command.trim().is_empty() {
                    return Err(ExpiryError::config("whois.command cannot be empty"));
                }
            }
            if let Some(timeout) = &whois.timeout {
                check_positive_duration("whois.timeout", timeout)?;
            }
            if let Some(pacing) = &whois.pacing {
                check_pacing_interval(check_duration_field("whois.pacing", pacing)?)?;
            }
        }

        Ok(())
    }
}

fn check_duration_field(field: &str, value: &str) -> Result<Duration, ExpiryError> {
    parse_duration_string(value).ok_or_else(|| {
        ExpiryError::config(format!(
            "Invalid {} '{}'. Use format like '500ms', '5s', '2m'",
            field, value
        ))
    })
}

fn check_positive_duration(field: &str, value: &str) -> Result<Duration, ExpiryError> {
    let duration = check_duration_field(field, value)?;
    if duration.is_zero() {
        return Err(ExpiryError::config(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(duration)
}

/// Reject a pacing interval shorter than [`MIN_PACING_INTERVAL`].
pub fn check_pacing_interval(pacing: Duration) -> Result<Duration, ExpiryError> {
    if pacing < MIN_PACING_INTERVAL {
        return Err(ExpiryError::config(format!(
            "pacing interval must be at least {}s, got {:?}",
            MIN_PACING_INTERVAL.as_secs(),
            pacing
        )));
    }
    Ok(pacing)
}

/// One layer of explicit overrides (environment or command line).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen_addr: Option<String>,
    pub listen_port: Option<u16>,
    pub api_token: Option<String>,
    pub zones_url: Option<String>,
    /// Program followed by its leading arguments
    pub whois_command: Option<Vec<String>>,
    pub whois_timeout: Option<Duration>,
    pub pacing_interval: Option<Duration>,
}

/// Load overrides from the process environment.
///
/// Recognised variables: `LISTEN_ADDR`, `LISTEN_PORT`, `CF_TOKEN`,
/// `ZONES_URL`, `WHOIS_COMMAND`, `WHOIS_TIMEOUT`, `PACING_INTERVAL`.
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> ConfigOverrides {
    load_env_config_from(verbose, |key| env::var(key).ok())
}

/// Same as [`load_env_config`], reading variables through `lookup`.
pub fn load_env_config_from<F>(verbose: bool, lookup: F) -> ConfigOverrides
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = ConfigOverrides::default();
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    // LISTEN_ADDR - bind address
    if let Some(addr) = non_empty("LISTEN_ADDR") {
        if verbose {
            info!(LISTEN_ADDR = %addr, "using environment override");
        }
        env_config.listen_addr = Some(addr.trim().to_string());
    }

    // LISTEN_PORT - bind port
    if let Some(val) = non_empty("LISTEN_PORT") {
        match val.trim().parse::<u16>() {
            Ok(port) if port > 0 => {
                if verbose {
                    info!(LISTEN_PORT = port, "using environment override");
                }
                env_config.listen_port = Some(port);
            }
            _ => warn!("Invalid LISTEN_PORT='{}', must be 1-65535", val),
        }
    }

    // CF_TOKEN - zone API credential
    if let Some(token) = non_empty("CF_TOKEN") {
        if verbose {
            info!("using CF_TOKEN from environment");
        }
        env_config.api_token = Some(token.trim().to_string());
    }

    // ZONES_URL - zone-listing endpoint
    if let Some(url) = non_empty("ZONES_URL") {
        if verbose {
            info!(ZONES_URL = %url, "using environment override");
        }
        env_config.zones_url = Some(url.trim().to_string());
    }

    // WHOIS_COMMAND - program and leading arguments, whitespace separated
    if let Some(command) = non_empty("WHOIS_COMMAND") {
        if verbose {
            info!(WHOIS_COMMAND = %command, "using environment override");
        }
        env_config.whois_command = Some(split_command(&command));
    }

    // WHOIS_TIMEOUT - per-lookup timeout
    if let Some(val) = non_empty("WHOIS_TIMEOUT") {
        match parse_duration_string(&val) {
            Some(timeout) if !timeout.is_zero() => env_config.whois_timeout = Some(timeout),
            _ => warn!(
                "Invalid WHOIS_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            ),
        }
    }

    // PACING_INTERVAL - pause between lookups
    if let Some(val) = non_empty("PACING_INTERVAL") {
        match parse_duration_string(&val) {
            Some(pacing) => env_config.pacing_interval = Some(pacing),
            None => warn!(
                "Invalid PACING_INTERVAL='{}', use format like '500ms', '1s'",
                val
            ),
        }
    }

    env_config
}

/// Split a command line on whitespace. No quoting rules apply.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

/// Fully resolved exporter settings.
#[derive(Clone)]
pub struct ExporterConfig {
    pub listen_addr: String,
    pub listen_port: u16,
    pub api_token: String,
    pub zones_url: String,
    pub zones_timeout: Duration,
    pub whois_program: String,
    pub whois_args: Vec<String>,
    pub whois_timeout: Duration,
    pub pacing_interval: Duration,
}

impl ExporterConfig {
    /// Merge defaults, the file and each override layer (later wins).
    ///
    /// # Errors
    ///
    /// Returns [`ExpiryError::ConfigError`] when no API token is configured,
    /// a file value cannot be parsed, the WHOIS timeout is zero, or the
    /// pacing interval is below [`MIN_PACING_INTERVAL`].
    pub fn resolve(file: &FileConfig, layers: &[ConfigOverrides]) -> Result<Self, ExpiryError> {
        let mut listen_addr = DEFAULT_LISTEN_ADDR.to_string();
        let mut listen_port = DEFAULT_LISTEN_PORT;
        let mut api_token = None;
        let mut zones_url = DEFAULT_ZONES_URL.to_string();
        let mut zones_timeout = DEFAULT_ZONES_TIMEOUT;
        let mut whois_program = DEFAULT_WHOIS_PROGRAM.to_string();
        let mut whois_args = Vec::new();
        let mut whois_timeout = DEFAULT_WHOIS_TIMEOUT;
        let mut pacing_interval = DEFAULT_PACING_INTERVAL;

        if let Some(server) = &file.server {
            if let Some(addr) = &server.listen_addr {
                listen_addr = addr.clone();
            }
            if let Some(port) = server.listen_port {
                listen_port = port;
            }
        }

        if let Some(zones) = &file.zones {
            if let Some(url) = &zones.url {
                zones_url = url.clone();
            }
            if let Some(token) = &zones.api_token {
                api_token = Some(token.clone());
            }
            if let Some(timeout) = &zones.timeout {
                zones_timeout = check_positive_duration("zones.timeout", timeout)?;
            }
        }

        if let Some(whois) = &file.whois {
            if let Some(command) = &whois.command {
                whois_program = command.clone();
            }
            if let Some(args) = &whois.args {
                whois_args = args.clone();
            }
            if let Some(timeout) = &whois.timeout {
                whois_timeout = check_positive_duration("whois.timeout", timeout)?;
            }
            if let Some(pacing) = &whois.pacing {
                pacing_interval = check_duration_field("whois.pacing", pacing)?;
            }
        }

        for layer in layers {
            if let Some(addr) = &layer.listen_addr {
                listen_addr = addr.clone();
            }
            if let Some(port) = layer.listen_port {
                listen_port = port;
            }
            if let Some(token) = &layer.api_token {
                api_token = Some(token.clone());
            }
            if let Some(url) = &layer.zones_url {
                zones_url = url.clone();
            }
            if let Some((program, args)) = layer.whois_command.as_ref().and_then(|c| c.split_first()) {
                whois_program = program.clone();
                whois_args = args.to_vec();
            }
            if let Some(timeout) = layer.whois_timeout {
                whois_timeout = timeout;
            }
            if let Some(pacing) = layer.pacing_interval {
                pacing_interval = pacing;
            }
        }

        let api_token = api_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ExpiryError::config("CF_TOKEN environment variable is not set"))?;

        if listen_port == 0 {
            return Err(ExpiryError::config("listen_port must be between 1 and 65535"));
        }
        if whois_timeout.is_zero() {
            return Err(ExpiryError::config("whois timeout must be greater than zero"));
        }
        check_pacing_interval(pacing_interval)?;

        Ok(Self {
            listen_addr,
            listen_port,
            api_token,
            zones_url,
            zones_timeout,
            whois_program,
            whois_args,
            whois_timeout,
            pacing_interval,
        })
    }

    /// `addr:port` string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    pub fn whois_client(&self) -> WhoisClient {
        WhoisClient::with_command(
            self.whois_program.clone(),
            self.whois_args.clone(),
            self.whois_timeout,
        )
    }

    pub fn zone_client(&self) -> Result<ZoneClient, ExpiryError> {
        ZoneClient::new(
            self.zones_url.clone(),
            self.api_token.clone(),
            self.zones_timeout,
        )
    }

    pub fn pipeline(&self) -> ExpiryPipeline {
        ExpiryPipeline::new(Arc::new(self.whois_client())).with_pacing(self.pacing_interval)
    }
}

impl std::fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("listen_addr", &self.listen_addr)
            .field("listen_port", &self.listen_port)
            .field("api_token", &"<redacted>")
            .field("zones_url", &self.zones_url)
            .field("zones_timeout", &self.zones_timeout)
            .field("whois_program", &self.whois_program)
            .field("whois_args", &self.whois_args)
            .field("whois_timeout", &self.whois_timeout)
            .field("pacing_interval", &self.pacing_interval)
            .finish()
    }
}

/// Parse a duration string like "500ms", "5s", "2m".
///
/// A bare number is taken as seconds.
pub fn parse_duration_string(duration_str: &str) -> Option<Duration> {
    let duration_str = duration_str.trim().to_lowercase();

    if let Some(millis) = duration_str.strip_suffix("ms") {
        millis.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = duration_str.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = duration_str.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        duration_str.parse::<u64>().ok().map(Duration::from_secs)
    }
}
