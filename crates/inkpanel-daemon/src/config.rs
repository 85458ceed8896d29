//! Configuration management.

use anyhow::{Context, Result};
use inkpanel_hw::{BusSettings, Orientation, PanelGeometry, PinAssignment, RefreshMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Panel wiring and bus
    #[serde(default)]
    pub panel: PanelConfig,

    /// Display behaviour
    #[serde(default)]
    pub display: DisplayConfig,

    /// Font files and sizes
    #[serde(default)]
    pub fonts: FontConfig,

    /// Icon bitmaps
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Connectivity probe
    #[serde(default)]
    pub status: StatusConfig,
}

/// Panel wiring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Native width in pixels (source lines)
    #[serde(default = "default_width")]
    pub width: u16,

    /// Native height in pixels (gate lines)
    #[serde(default = "default_height")]
    pub height: u16,

    /// SPI device node
    #[serde(default = "default_spi_device")]
    pub spi_device: String,

    /// SPI clock in Hz
    #[serde(default = "default_spi_speed")]
    pub spi_speed_hz: u32,

    /// SPI mode (0-3)
    #[serde(default)]
    pub spi_mode: u8,

    /// Reset line (BCM)
    #[serde(default = "default_reset_pin")]
    pub reset_pin: u64,

    /// Data/command line (BCM)
    #[serde(default = "default_dc_pin")]
    pub dc_pin: u64,

    /// Chip select line (BCM)
    #[serde(default = "default_cs_pin")]
    pub cs_pin: u64,

    /// Busy line (BCM), high while the controller is busy
    #[serde(default = "default_busy_pin")]
    pub busy_pin: u64,

    /// Power enable line (BCM)
    #[serde(default = "default_power_pin")]
    pub power_pin: u64,

    /// Busy wait deadline in milliseconds
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            spi_device: default_spi_device(),
            spi_speed_hz: default_spi_speed(),
            spi_mode: 0,
            reset_pin: default_reset_pin(),
            dc_pin: default_dc_pin(),
            cs_pin: default_cs_pin(),
            busy_pin: default_busy_pin(),
            power_pin: default_power_pin(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl PanelConfig {
    /// Builds the driver geometry.
    pub fn geometry(&self) -> PanelGeometry {
        PanelGeometry {
            width: self.width,
            height: self.height,
            pins: PinAssignment {
                reset: self.reset_pin,
                dc: self.dc_pin,
                cs: self.cs_pin,
                busy: self.busy_pin,
                power: self.power_pin,
            },
            bus: BusSettings {
                device: self.spi_device.clone(),
                speed_hz: self.spi_speed_hz,
                mode: self.spi_mode,
            },
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

/// Display behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Refresh mode ("full" or "partial")
    #[serde(default = "default_refresh_mode")]
    pub refresh_mode: String,

    /// Mounting orientation ("native", "rotate-90", "rotate-180", "rotate-270")
    #[serde(default = "default_orientation")]
    pub orientation: String,

    /// Hold time before the first real frame, in milliseconds
    #[serde(default = "default_settle")]
    pub settle_ms: u64,

    /// Initialization attempts on busy timeout
    #[serde(default = "default_init_retries")]
    pub init_retries: u32,

    /// Periodic status re-render in seconds (0 disables)
    #[serde(default)]
    pub status_refresh_secs: u64,

    /// Put the panel into deep sleep between pushes
    #[serde(default)]
    pub sleep_between_updates: bool,

    /// Render to PNG snapshots instead of the panel
    #[serde(default)]
    pub headless: bool,

    /// Snapshot path used in headless mode
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_mode: default_refresh_mode(),
            orientation: default_orientation(),
            settle_ms: default_settle(),
            init_retries: default_init_retries(),
            status_refresh_secs: 0,
            sleep_between_updates: false,
            headless: false,
            snapshot: default_snapshot(),
        }
    }
}

impl DisplayConfig {
    /// Parsed refresh mode.
    pub fn refresh_mode(&self) -> Result<RefreshMode> {
        self.refresh_mode
            .parse()
            .with_context(|| format!("Invalid refresh mode '{}'", self.refresh_mode))
    }

    /// Parsed orientation.
    pub fn orientation(&self) -> Result<Orientation> {
        self.orientation
            .parse()
            .with_context(|| format!("Invalid orientation '{}'", self.orientation))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Status refresh interval, if enabled.
    pub fn status_refresh(&self) -> Option<Duration> {
        (self.status_refresh_secs > 0).then(|| Duration::from_secs(self.status_refresh_secs))
    }
}

/// Font configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// TrueType/OpenType font file
    #[serde(default = "default_font_path")]
    pub path: PathBuf,

    /// Size used for the welcome and track lines
    #[serde(default = "default_title_size")]
    pub title_size: f32,

    /// Size used for the status line
    #[serde(default = "default_status_size")]
    pub status_size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: default_font_path(),
            title_size: default_title_size(),
            status_size: default_status_size(),
        }
    }
}

/// A single icon bitmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub path: PathBuf,

    /// Resampling factor applied to the decoded width
    #[serde(default = "default_asset_scale")]
    pub scale: f64,

    /// Anchor (icon centre) in logical coordinates
    #[serde(default = "default_asset_x")]
    pub x: f64,

    #[serde(default = "default_asset_y")]
    pub y: f64,
}

/// Icon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_wifi_on")]
    pub wifi_on: AssetConfig,

    #[serde(default = "default_wifi_off")]
    pub wifi_off: AssetConfig,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            wifi_on: default_wifi_on(),
            wifi_off: default_wifi_off(),
        }
    }
}

/// Connectivity probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Wired interface checked first
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Label shown when only the fallback check succeeds
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,

    /// ip:port used for the reachability check (no name lookup)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Reachability connect timeout in milliseconds
    #[serde(default = "default_probe_timeout")]
    pub timeout_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            fallback_label: default_fallback_label(),
            endpoint: default_endpoint(),
            timeout_ms: default_probe_timeout(),
        }
    }
}

impl StatusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Default value functions
fn default_width() -> u16 {
    inkpanel_hw::EPD_WIDTH
}

fn default_height() -> u16 {
    inkpanel_hw::EPD_HEIGHT
}

fn default_spi_device() -> String {
    "/dev/spidev0.0".to_string()
}

fn default_spi_speed() -> u32 {
    4_000_000
}

fn default_reset_pin() -> u64 {
    17
}

fn default_dc_pin() -> u64 {
    25
}

fn default_cs_pin() -> u64 {
    8
}

fn default_busy_pin() -> u64 {
    24
}

fn default_power_pin() -> u64 {
    18
}

fn default_busy_timeout() -> u64 {
    10_000
}

fn default_refresh_mode() -> String {
    "full".to_string()
}

fn default_orientation() -> String {
    "rotate-90".to_string()
}

fn default_settle() -> u64 {
    2000
}

fn default_init_retries() -> u32 {
    3
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("/tmp/inkpanel.png")
}

fn default_font_path() -> PathBuf {
    PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")
}

fn default_title_size() -> f32 {
    18.0
}

fn default_status_size() -> f32 {
    10.0
}

fn default_asset_scale() -> f64 {
    0.04
}

fn default_asset_x() -> f64 {
    240.0
}

fn default_asset_y() -> f64 {
    10.0
}

fn default_wifi_on() -> AssetConfig {
    AssetConfig {
        path: PathBuf::from("assets/wifi_connected.png"),
        scale: default_asset_scale(),
        x: default_asset_x(),
        y: default_asset_y(),
    }
}

fn default_wifi_off() -> AssetConfig {
    AssetConfig {
        path: PathBuf::from("assets/wifi_unconnected.png"),
        scale: default_asset_scale(),
        x: default_asset_x(),
        y: default_asset_y(),
    }
}

fn default_interface() -> String {
    "eth0".to_string()
}

fn default_fallback_label() -> String {
    "Wireless".to_string()
}

fn default_endpoint() -> String {
    "1.1.1.1:53".to_string()
}

fn default_probe_timeout() -> u64 {
    2000
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        let geometry = config.panel.geometry();
        assert_eq!(geometry, PanelGeometry::default());
        assert_eq!(config.display.refresh_mode().unwrap(), RefreshMode::FullUpdate);
        assert_eq!(config.display.orientation().unwrap(), Orientation::Rotate90);
        assert_eq!(config.display.init_retries, 3);
        assert!(config.display.status_refresh().is_none());
        assert_eq!(config.status.interface, "eth0");
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [display]
            refresh_mode = "partial"
            status_refresh_secs = 30

            [status]
            fallback_label = "Nokia 8110 4G"

            [assets.wifi_on]
            path = "/opt/icons/on.png"
            scale = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(
            config.display.refresh_mode().unwrap(),
            RefreshMode::PartialUpdate
        );
        assert_eq!(
            config.display.status_refresh(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(config.status.fallback_label, "Nokia 8110 4G");
        assert_eq!(config.assets.wifi_on.scale, 0.1);
        assert_eq!(config.assets.wifi_on.x, 240.0);
        assert_eq!(
            config.assets.wifi_off.path,
            PathBuf::from("assets/wifi_unconnected.png")
        );
    }

    #[test]
    fn test_invalid_refresh_mode() {
        let config: Config = toml::from_str("[display]\nrefresh_mode = \"fast\"").unwrap();
        assert!(config.display.refresh_mode().is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = Config::load(path).unwrap();
        assert!(config.display.refresh_mode().is_ok());
        assert!(config.display.orientation().is_ok());
    }
}
