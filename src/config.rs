//! Application-level configuration loading: device endpoint, selection rules,
//! lock colors and workflow timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    dto::validation::validate_animation_name,
    remote::DeviceConfig,
    state::{
        intents::Rgb,
        results::HorseId,
        selection::{Palette, SelectionRules},
    },
};

/// Default location on disk where the panel looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/panel.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TOTE_PANEL_CONFIG_PATH";
/// Environment variable that overrides the device controller URL.
const DEVICE_BASE_URL_ENV: &str = "DEVICE_BASE_URL";

const DEFAULT_DEVICE_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_MAX_HORSE: HorseId = 20;
const DEFAULT_NOTIFICATION_TTL_MS: u64 = 3_000;
const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
const DEFAULT_FINISH_FOLLOW_UP_MS: u64 = 60_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SELECTION_ANIMATION: &str = "heartbeat";
const DEFAULT_FINISH_ANIMATION: &str = "finish";
const DEFAULT_IDLE_ANIMATION: &str = "rainbow";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub device: DeviceConfig,
    pub rules: SelectionRules,
    /// How long the view keeps a notification on screen.
    pub notification_ttl: Duration,
    /// Fixed wait between two push-channel connection attempts.
    pub reconnect_delay: Duration,
    /// Delay between the finish animation and the idle pattern.
    pub finish_follow_up: Duration,
    pub selection_animation: String,
    pub finish_animation: String,
    pub idle_animation: String,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to
    /// built-in defaults when the file is missing or invalid.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        device = %app_config.device.base_url,
                        max_horse = app_config.rules.max_horse,
                        "loaded panel config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides(|key| env::var(key).ok())
    }

    /// Apply value overrides looked up through `lookup`.
    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(DEVICE_BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            info!(device = %url, "device controller URL overridden from environment");
            self.device.base_url = url;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    device_base_url: String,
    max_horse: HorseId,
    colors: RawColors,
    notification_ttl_ms: u64,
    reconnect_delay_ms: u64,
    finish_follow_up_ms: u64,
    request_timeout_ms: u64,
    selection_animation: String,
    finish_animation: String,
    idle_animation: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            device_base_url: DEFAULT_DEVICE_BASE_URL.into(),
            max_horse: DEFAULT_MAX_HORSE,
            colors: RawColors::default(),
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            finish_follow_up_ms: DEFAULT_FINISH_FOLLOW_UP_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            selection_animation: DEFAULT_SELECTION_ANIMATION.into(),
            finish_animation: DEFAULT_FINISH_ANIMATION.into(),
            idle_animation: DEFAULT_IDLE_ANIMATION.into(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let max_horse = if value.max_horse == 0 {
            warn!("max_horse must be at least 1; using {DEFAULT_MAX_HORSE}");
            DEFAULT_MAX_HORSE
        } else {
            value.max_horse
        };

        let palette: Palette = value.colors.into();
        let palette = if palette.is_distinct() {
            palette
        } else {
            warn!(?palette, "lock colors must differ per position; using gold/silver/bronze");
            Palette::default()
        };

        let reconnect_delay = if value.reconnect_delay_ms == 0 {
            warn!("reconnect_delay_ms must be positive; using {DEFAULT_RECONNECT_DELAY_MS}");
            Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS)
        } else {
            Duration::from_millis(value.reconnect_delay_ms)
        };

        Self {
            device: DeviceConfig::new(value.device_base_url)
                .with_request_timeout(Duration::from_millis(value.request_timeout_ms)),
            rules: SelectionRules { max_horse, palette },
            notification_ttl: Duration::from_millis(value.notification_ttl_ms),
            reconnect_delay,
            finish_follow_up: Duration::from_millis(value.finish_follow_up_ms),
            selection_animation: animation_or_default(
                "selection_animation",
                value.selection_animation,
                DEFAULT_SELECTION_ANIMATION,
            ),
            finish_animation: animation_or_default(
                "finish_animation",
                value.finish_animation,
                DEFAULT_FINISH_ANIMATION,
            ),
            idle_animation: animation_or_default(
                "idle_animation",
                value.idle_animation,
                DEFAULT_IDLE_ANIMATION,
            ),
        }
    }
}

/// Keep `name` when it is a valid animation name, otherwise log and use `default`.
fn animation_or_default(field: &str, name: String, default: &str) -> String {
    match validate_animation_name(&name) {
        Ok(()) => name,
        Err(err) => {
            warn!(field, name = %name, error = %err, "invalid animation name; using {default}");
            default.to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawColors {
    win: RawColor,
    place: RawColor,
    show: RawColor,
}

impl Default for RawColors {
    fn default() -> Self {
        Self {
            win: Rgb::GOLD.into(),
            place: Rgb::SILVER.into(),
            show: Rgb::BRONZE.into(),
        }
    }
}

impl From<RawColors> for Palette {
    fn from(value: RawColors) -> Self {
        Self {
            win: value.win.into(),
            place: value.place.into(),
            show: value.show.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single RGB entry inside the configuration file.
struct RawColor {
    r: u8,
    g: u8,
    b: u8,
}

impl From<RawColor> for Rgb {
    fn from(value: RawColor) -> Self {
        Rgb::new(value.r, value.g, value.b)
    }
}

impl From<Rgb> for RawColor {
    fn from(value: Rgb) -> Self {
        Self {
            r: value.r,
            g: value.g,
            b: value.b,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppConfig {
        serde_json::from_str::<RawConfig>(json).unwrap().into()
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("{}");

        assert_eq!(config.device.base_url, "http://localhost:5000");
        assert_eq!(config.rules.max_horse, 20);
        assert_eq!(config.rules.palette, Palette::default());
        assert_eq!(config.notification_ttl, Duration::from_millis(3_000));
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.finish_follow_up, Duration::from_secs(60));
        assert_eq!(config.selection_animation, "heartbeat");
        assert_eq!(config.finish_animation, "finish");
    }

    #[test]
    fn fields_override_defaults() {
        let config = parse(
            r#"{
                "device_base_url": "http://tote.local",
                "max_horse": 12,
                "reconnect_delay_ms": 250,
                "request_timeout_ms": 1500,
                "idle_animation": "sparkle",
                "colors": { "show": { "r": 1, "g": 2, "b": 3 } }
            }"#,
        );

        assert_eq!(config.device.base_url, "http://tote.local");
        assert_eq!(config.device.request_timeout, Duration::from_millis(1_500));
        assert_eq!(config.rules.max_horse, 12);
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.idle_animation, "sparkle");
        assert_eq!(config.rules.palette.win, Rgb::GOLD);
        assert_eq!(config.rules.palette.show, Rgb::new(1, 2, 3));
    }

    #[test]
    fn duplicate_colors_fall_back_to_default_palette() {
        let config = parse(
            r#"{ "colors": { "win": { "r": 9, "g": 9, "b": 9 }, "place": { "r": 9, "g": 9, "b": 9 } } }"#,
        );
        assert_eq!(config.rules.palette, Palette::default());
    }

    #[test]
    fn zero_bounds_are_rejected() {
        let config = parse(r#"{ "max_horse": 0, "reconnect_delay_ms": 0 }"#);
        assert_eq!(config.rules.max_horse, 20);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }

    #[test]
    fn invalid_animation_names_fall_back_to_defaults() {
        let config = parse(
            r#"{
                "selection_animation": "../reboot",
                "finish_animation": "",
                "idle_animation": "twinkle_2"
            }"#,
        );
        assert_eq!(config.selection_animation, "heartbeat");
        assert_eq!(config.finish_animation, "finish");
        assert_eq!(config.idle_animation, "twinkle_2");
    }

    #[test]
    fn device_url_can_be_overridden_from_environment() {
        let config = AppConfig::default().with_env_overrides(|key| {
            (key == DEVICE_BASE_URL_ENV).then(|| "http://10.0.0.5:5000".to_string())
        });
        assert_eq!(config.device.base_url, "http://10.0.0.5:5000");

        let untouched = AppConfig::default().with_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(untouched.device.base_url, "http://localhost:5000");
    }
}
