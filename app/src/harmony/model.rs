use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use super::NO_ACTIVITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub id: u32,
    pub slug: String,
    pub label: String,
    pub is_av: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub slug: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub power_on: BTreeSet<String>,
    pub power_off: BTreeSet<String>,
    pub power_toggle: BTreeSet<String>,
}

/// A hub as discovered at startup. Never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hub {
    pub slug: String,
    pub label: String,
    pub activities: Vec<Activity>,
    pub devices: Vec<Device>,
    pub capabilities: DeviceCapabilities,
    pub exposed_device_labels: Vec<String>,
}

impl Hub {
    pub fn av_activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(|a| a.is_av)
    }

    pub fn av_activity(&self, id: u32) -> Option<&Activity> {
        self.av_activities().find(|a| a.id == id)
    }

    /// Devices that can only be toggled, restricted to the configured labels (all if none configured).
    pub fn switchable_devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| {
            !self.capabilities.power_on.contains(&d.slug)
                && !self.capabilities.power_off.contains(&d.slug)
                && (self.exposed_device_labels.is_empty() || self.exposed_device_labels.contains(&d.label))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStatus {
    pub off: bool,
    pub current_activity: u32,
}

impl HubStatus {
    pub fn is_active(&self) -> bool {
        !self.off
    }
}

impl From<&Value> for HubStatus {
    fn from(value: &Value) -> Self {
        let off = value.get("off").and_then(Value::as_bool).unwrap_or(true);

        let current_activity = if off {
            NO_ACTIVITY
        } else {
            value
                .get("current_activity")
                .and_then(|a| a.get("id"))
                .and_then(parse_id)
                .unwrap_or(NO_ACTIVITY)
        };

        Self { off, current_activity }
    }
}

pub fn parse_activities(value: &Value) -> Vec<Activity> {
    list(value, "activities")
        .filter_map(|a| {
            let id = a.get("id").and_then(parse_id)?;
            let slug = a.get("slug").and_then(Value::as_str)?.to_owned();
            let label = a.get("label").and_then(Value::as_str).unwrap_or(&slug).to_owned();
            let is_av = a.get("isAVActivity").and_then(Value::as_bool).unwrap_or(false);

            Some(Activity { id, slug, label, is_av })
        })
        .collect()
}

pub fn parse_devices(value: &Value) -> Vec<Device> {
    list(value, "devices")
        .filter_map(|d| {
            let slug = d.get("slug").and_then(Value::as_str)?.to_owned();
            let label = d.get("label").and_then(Value::as_str).unwrap_or(&slug).to_owned();

            Some(Device { slug, label })
        })
        .collect()
}

pub fn parse_hub_slugs(value: &Value) -> Vec<String> {
    list(value, "hubs")
        .filter_map(|h| h.as_str().map(str::to_owned))
        .collect()
}

pub fn parse_command_slugs(value: &Value) -> Vec<String> {
    list(value, "commands")
        .filter_map(|c| c.get("slug").and_then(Value::as_str).map(str::to_owned))
        .collect()
}

fn list<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|a| a.as_slice())
        .unwrap_or_default()
        .iter()
}

//ids arrive as strings or numbers, non-positive ids are the hub's "off" pseudo-activity
fn parse_id(value: &Value) -> Option<u32> {
    let id = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    if id > 0 { u32::try_from(id).ok() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_on() {
        let status = HubStatus::from(&json!({"off": false, "current_activity": {"id": "31337"}}));

        assert_eq!(
            status,
            HubStatus {
                off: false,
                current_activity: 31337
            }
        );
    }

    #[test]
    fn test_status_off_normalizes_activity() {
        let status = HubStatus::from(&json!({"off": true, "current_activity": {"id": -1}}));

        assert!(status.off);
        assert_eq!(status.current_activity, NO_ACTIVITY);
    }

    #[test]
    fn test_status_empty_reads_as_off() {
        let status = HubStatus::from(&json!({}));

        assert!(status.off);
        assert_eq!(status.current_activity, NO_ACTIVITY);
    }

    #[test]
    fn test_parse_activities_skips_invalid_entries() {
        let activities = parse_activities(&json!({
            "activities": [
                {"id": "-1", "slug": "poweroff", "label": "PowerOff", "isAVActivity": false},
                {"id": "12", "slug": "watch-tv", "label": "Watch TV", "isAVActivity": true},
                {"id": 13, "slug": "listen-music", "label": "Listen to Music", "isAVActivity": true},
                {"id": "abc", "slug": "broken"},
                {"slug": "no-id"},
            ]
        }));

        assert_eq!(
            activities,
            vec![
                Activity {
                    id: 12,
                    slug: "watch-tv".to_string(),
                    label: "Watch TV".to_string(),
                    is_av: true,
                },
                Activity {
                    id: 13,
                    slug: "listen-music".to_string(),
                    label: "Listen to Music".to_string(),
                    is_av: true,
                },
            ]
        );
    }

    #[test]
    fn test_missing_lists_read_as_empty() {
        assert!(parse_activities(&json!({})).is_empty());
        assert!(parse_devices(&json!({"devices": "nope"})).is_empty());
        assert!(parse_hub_slugs(&json!({})).is_empty());
        assert!(parse_command_slugs(&json!({"commands": null})).is_empty());
    }

    #[test]
    fn test_switchable_devices() {
        let hub = Hub {
            slug: "living-room".to_string(),
            label: "Living Room".to_string(),
            activities: vec![],
            devices: vec![
                Device {
                    slug: "tv".to_string(),
                    label: "TV".to_string(),
                },
                Device {
                    slug: "projector".to_string(),
                    label: "Projector".to_string(),
                },
                Device {
                    slug: "fan".to_string(),
                    label: "Fan".to_string(),
                },
            ],
            capabilities: DeviceCapabilities {
                power_on: BTreeSet::from(["tv".to_string()]),
                power_off: BTreeSet::from(["tv".to_string()]),
                power_toggle: BTreeSet::from(["projector".to_string(), "fan".to_string()]),
            },
            exposed_device_labels: vec![],
        };

        let slugs: Vec<&str> = hub.switchable_devices().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["projector", "fan"]);

        let filtered = Hub {
            exposed_device_labels: vec!["Fan".to_string()],
            ..hub
        };
        let slugs: Vec<&str> = filtered.switchable_devices().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, vec!["fan"]);
        assert!(!filtered.switchable_devices().any(|d| d.slug == "projector"));
    }
}
