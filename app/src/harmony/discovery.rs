use crate::settings::HubSettings;

use super::{
    HarmonyApi, command,
    model::{DeviceCapabilities, Hub, parse_activities, parse_command_slugs, parse_devices, parse_hub_slugs},
    path,
};

/// Builds the hub model for every configured hub the API reports. Unknown hubs are ignored.
pub async fn discover_hubs<A: HarmonyApi>(api: &A, settings: &[HubSettings], verbose: bool) -> Vec<Hub> {
    let reported = parse_hub_slugs(&api.get("").await);
    let mut hubs = vec![];

    for slug in reported {
        let Some(hub_settings) = settings.iter().find(|s| s.slug == slug) else {
            tracing::info!("Ignoring unconfigured hub {}", slug);
            continue;
        };

        let hub = discover_hub(api, hub_settings).await;

        if verbose {
            tracing::info!(
                "Discovered hub {} with {} activities and {} devices",
                hub.slug,
                hub.activities.len(),
                hub.devices.len()
            );
        } else {
            tracing::debug!(
                "Discovered hub {} with {} activities and {} devices",
                hub.slug,
                hub.activities.len(),
                hub.devices.len()
            );
        }

        hubs.push(hub);
    }

    for missing in settings.iter().filter(|s| !hubs.iter().any(|h| h.slug == s.slug)) {
        tracing::warn!("Configured hub {} not reported by the API", missing.slug);
    }

    hubs
}

async fn discover_hub<A: HarmonyApi>(api: &A, settings: &HubSettings) -> Hub {
    let activities = parse_activities(&api.get(&path::activities(&settings.slug)).await);
    let devices = parse_devices(&api.get(&path::devices(&settings.slug)).await);

    let mut capabilities = DeviceCapabilities::default();
    for device in devices.iter() {
        let commands = parse_command_slugs(&api.get(&path::device_commands(&settings.slug, &device.slug)).await);

        for slug in commands {
            match slug.as_str() {
                command::POWER_ON => capabilities.power_on.insert(device.slug.clone()),
                command::POWER_OFF => capabilities.power_off.insert(device.slug.clone()),
                command::POWER_TOGGLE => capabilities.power_toggle.insert(device.slug.clone()),
                _ => false,
            };
        }
    }

    Hub {
        slug: settings.slug.clone(),
        label: settings.label.clone().unwrap_or_else(|| settings.slug.clone()),
        activities,
        devices,
        capabilities,
        exposed_device_labels: settings.devices.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::testing::RecordingApi;
    use serde_json::json;

    fn hub_settings(slug: &str, label: Option<&str>) -> HubSettings {
        HubSettings {
            slug: slug.to_string(),
            label: label.map(str::to_string),
            devices: vec![],
        }
    }

    #[tokio::test]
    async fn test_discovers_configured_hubs_only() {
        let api = RecordingApi::new();
        api.respond("", json!({"hubs": ["living-room", "bedroom"]}));
        api.respond(
            "living-room/activities",
            json!({"activities": [{"id": "7", "slug": "watch-tv", "label": "Watch TV", "isAVActivity": true}]}),
        );
        api.respond(
            "living-room/devices",
            json!({"devices": [{"id": "1", "slug": "tv", "label": "TV"}, {"id": "2", "slug": "fan", "label": "Fan"}]}),
        );
        api.respond(
            "living-room/devices/tv/commands",
            json!({"commands": [{"slug": "power-on"}, {"slug": "power-off"}, {"slug": "mute"}]}),
        );
        api.respond(
            "living-room/devices/fan/commands",
            json!({"commands": [{"slug": "power-toggle"}]}),
        );

        let hubs = discover_hubs(&api, &[hub_settings("living-room", Some("Living Room"))], false).await;

        assert_eq!(hubs.len(), 1);
        let hub = &hubs[0];
        assert_eq!(hub.label, "Living Room");
        assert_eq!(hub.activities.len(), 1);
        assert!(hub.capabilities.power_on.contains("tv"));
        assert!(hub.capabilities.power_off.contains("tv"));
        assert!(hub.capabilities.power_toggle.contains("fan"));
        assert_eq!(hub.switchable_devices().map(|d| d.slug.as_str()).collect::<Vec<_>>(), vec!["fan"]);
    }

    #[tokio::test]
    async fn test_label_falls_back_to_slug() {
        let api = RecordingApi::new();
        api.respond("", json!({"hubs": ["bedroom"]}));

        let hubs = discover_hubs(&api, &[hub_settings("bedroom", None)], true).await;

        assert_eq!(hubs.len(), 1);
        assert_eq!(hubs[0].label, "bedroom");
        assert!(hubs[0].activities.is_empty());
        assert!(hubs[0].devices.is_empty());
    }
}
