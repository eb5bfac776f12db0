use config::{Config, ConfigError, Environment, File};
use infrastructure::{HttpServerConfig, MonitoringConfig, MqttConfig};
use serde::Deserialize;

use crate::hub::HubTiming;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub harmony: HarmonySettings,
    pub mqtt: MqttConfig,
    pub http_server: HttpServerConfig,
    pub monitoring: MonitoringConfig,
    pub homebridge: crate::frontends::homebridge::Homebridge,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config.toml"))
            .add_source(Environment::default().separator("_").list_separator(","));

        let s = builder.build()?;
        s.try_deserialize()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HarmonySettings {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub hubs: Vec<HubSettings>,
    #[serde(default)]
    pub timing: HubTiming,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HubSettings {
    pub slug: String,
    pub label: Option<String>,
    /// Device labels exposed as switches. Empty exposes all toggle-only devices.
    #[serde(default)]
    pub devices: Vec<String>,
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;
    use crate::t;

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    const BASE: &str = r#"
        [mqtt]
        host = "localhost"
        port = 1883
        client_id = "harmony-bridge"

        [http_server]
        port = 8080

        [monitoring]
        service_name = "harmony-bridge"
        app_name = "harmony"

        [monitoring.logs]
        default_level = "info"

        [homebridge]
        base_topic = "homebridge"
    "#;

    #[test]
    fn test_parse_settings_with_defaults() {
        let settings = parse(&format!(
            r#"
            {BASE}

            [harmony]
            host = "harmony-api.local"
            port = 8282

            [[harmony.hubs]]
            slug = "living-room"
            "#
        ))
        .unwrap();

        assert_eq!(settings.harmony.host, "harmony-api.local");
        assert!(!settings.harmony.verbose);
        assert_eq!(settings.harmony.hubs.len(), 1);
        assert_eq!(settings.harmony.hubs[0].label, None);
        assert!(settings.harmony.hubs[0].devices.is_empty());
        assert_eq!(settings.harmony.timing.settle_window, t!(15 seconds));
        assert_eq!(settings.harmony.timing.volume_reset_delay, t!(200 millis));
        assert_eq!(settings.harmony.timing.default_volume, 50);
        assert_eq!(settings.http_server.bind_address, "0.0.0.0");
    }

    #[test]
    fn test_parse_timing_overrides() {
        let settings = parse(&format!(
            r#"
            {BASE}

            [harmony]
            host = "harmony-api.local"
            port = 8282
            verbose = true

            [[harmony.hubs]]
            slug = "living-room"
            label = "Living Room"
            devices = ["Fan", "Projector"]

            [harmony.timing]
            settle_window = "PT10S"
            volume_idle = "PT1M"
            volume_repeat_factor = 4
            "#
        ))
        .unwrap();

        let timing = &settings.harmony.timing;
        assert!(settings.harmony.verbose);
        assert_eq!(settings.harmony.hubs[0].label.as_deref(), Some("Living Room"));
        assert_eq!(settings.harmony.hubs[0].devices, vec!["Fan", "Projector"]);
        assert_eq!(timing.settle_window, t!(10 seconds));
        assert_eq!(timing.volume_idle, t!(1 minutes));
        assert_eq!(timing.volume_repeat_factor, 4);
        assert_eq!(timing.poll_interval, t!(5 seconds));
    }
}
