use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tracing::{info, warn};

use crate::layout::LayoutConfig;
use crate::report::ReportOptions;
use crate::scene::SvgSceneCapture;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub persistence: PersistenceConfig,
    pub layout: LayoutSettings,
    pub report: ReportSettings,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            persistence: PersistenceConfig::from_env(),
            layout: LayoutSettings::from_env(),
            report: ReportSettings::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let (bind_ip, display_host) = match env_string("SEA_FREIGHT_API_HOST") {
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => (ip, raw),
                Err(err) => {
                    warn!(
                        "⚠️ Could not parse SEA_FREIGHT_API_HOST ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_HOST
                    );
                    (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string()),
        };

        let port = match env_string("SEA_FREIGHT_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "⚠️ SEA_FREIGHT_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "⚠️ Could not parse SEA_FREIGHT_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Indicates whether the host was left at its default.
    pub fn uses_default_host(&self) -> bool {
        self.bind_ip == Self::DEFAULT_HOST
    }
}

/// Configuration for the shipment persistence client.
#[derive(Clone, Debug)]
pub struct PersistenceConfig {
    base_url: Option<String>,
    timeout: Duration,
}

impl PersistenceConfig {
    const URL_VAR: &'static str = "SEA_FREIGHT_PERSISTENCE_URL";
    const TIMEOUT_VAR: &'static str = "SEA_FREIGHT_HTTP_TIMEOUT_SECS";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        Self { base_url, timeout }
    }

    fn from_env() -> Self {
        let base_url = env_string(Self::URL_VAR);
        if base_url.is_none() {
            info!(
                "ℹ️ {} not set, computed shipments will not be persisted.",
                Self::URL_VAR
            );
        }

        let timeout_secs = match env_string(Self::TIMEOUT_VAR) {
            Some(raw) => Self::parse_timeout_secs(&raw),
            None => Self::DEFAULT_TIMEOUT_SECS,
        };

        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    fn parse_timeout_secs(raw: &str) -> u64 {
        match raw.parse::<u64>() {
            Ok(value) if value > 0 => value,
            Ok(_) => {
                warn!(
                    "⚠️ {} must be greater than 0. Using default timeout {}s.",
                    Self::TIMEOUT_VAR,
                    Self::DEFAULT_TIMEOUT_SECS
                );
                Self::DEFAULT_TIMEOUT_SECS
            }
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}'): {}. Using default timeout {}s.",
                    Self::TIMEOUT_VAR,
                    raw,
                    err,
                    Self::DEFAULT_TIMEOUT_SECS
                );
                Self::DEFAULT_TIMEOUT_SECS
            }
        }
    }

    /// Base URL of the persistence service, `None` when disabled.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Configuration for the layout planner.
#[derive(Clone, Debug)]
pub struct LayoutSettings {
    layout: LayoutConfig,
}

impl LayoutSettings {
    const SPACING_VAR: &'static str = "SEA_FREIGHT_LAYOUT_SPACING";

    fn from_env() -> Self {
        let spacing = load_f64_with_warning(
            Self::SPACING_VAR,
            LayoutConfig::DEFAULT_SPACING,
            |value| value >= 0.0,
            "must not be negative",
            "Warning: Adjusted spacing changes every computed position",
        );

        Self {
            layout: LayoutConfig::builder().spacing(spacing).build(),
        }
    }

    /// Returns the configured LayoutConfig.
    pub fn layout_config(&self) -> LayoutConfig {
        self.layout
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
        }
    }
}

/// Configuration for report export and scene snapshots.
#[derive(Clone, Debug)]
pub struct ReportSettings {
    options: ReportOptions,
    px_per_meter: f64,
}

impl ReportSettings {
    const ITEMS_PER_PAGE_VAR: &'static str = "SEA_FREIGHT_REPORT_ITEMS_PER_PAGE";
    const PX_PER_METER_VAR: &'static str = "SEA_FREIGHT_REPORT_PX_PER_METER";

    fn from_env() -> Self {
        let items_per_page = match env_string(Self::ITEMS_PER_PAGE_VAR) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => {
                    warn!(
                        "⚠️ {} contains invalid value '{}': must be a positive integer. Using {}.",
                        Self::ITEMS_PER_PAGE_VAR,
                        raw,
                        ReportOptions::DEFAULT_ITEMS_PER_PAGE
                    );
                    ReportOptions::DEFAULT_ITEMS_PER_PAGE
                }
            },
            None => ReportOptions::DEFAULT_ITEMS_PER_PAGE,
        };

        let px_per_meter = load_f64_with_warning(
            Self::PX_PER_METER_VAR,
            SvgSceneCapture::DEFAULT_PX_PER_METER,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted snapshot scale changes the exported image size",
        );

        Self {
            options: ReportOptions { items_per_page },
            px_per_meter,
        }
    }

    /// Pagination options for reports.
    pub fn options(&self) -> ReportOptions {
        self.options
    }

    /// Scene capture configured with the snapshot scale.
    pub fn scene_capture(&self) -> SvgSceneCapture {
        SvgSceneCapture::new(self.px_per_meter)
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            options: ReportOptions::default(),
            px_per_meter: SvgSceneCapture::DEFAULT_PX_PER_METER,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_setting(var_name, &raw, default, validator, invalid_hint, warning),
        None => default,
    }
}

fn parse_f64_setting(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = (default.abs().max(1.0)) * 1e-9;
            if (value - default).abs() > tolerance {
                info!("⚠️ {} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Ok(_) => {
            warn!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}
