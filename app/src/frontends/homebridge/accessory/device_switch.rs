use serde_json::json;

use crate::{
    frontends::homebridge::{
        HomekitCharacteristic, HomekitEvent, HomekitService, HomekitTarget, HomekitTargetConfig, HubCommand,
        HubQuery,
    },
    harmony::Hub,
    hub::{AccessoryChange, HubSnapshot},
};

struct Switch {
    device: String,
    label: String,
}

/// One switch per toggle-only device, grouped in a single accessory.
pub struct DeviceSwitchGroup {
    hub: String,
    name: String,
    switches: Vec<Switch>,
}

impl DeviceSwitchGroup {
    pub fn new(hub: &Hub) -> Self {
        Self {
            hub: hub.slug.clone(),
            name: format!("{} Devices", hub.label),
            switches: hub
                .switchable_devices()
                .map(|d| Switch {
                    device: d.slug.clone(),
                    label: d.label.clone(),
                })
                .collect(),
        }
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub fn device_labels(&self) -> Vec<&str> {
        self.switches.iter().map(|s| s.label.as_str()).collect()
    }

    fn target(&self, switch: &Switch) -> HomekitTarget {
        HomekitTarget::new(&self.name, &switch.label, HomekitCharacteristic::On)
    }

    pub fn get_all_targets(&self) -> Vec<HomekitTargetConfig> {
        self.switches
            .iter()
            .map(|s| self.target(s).into_config(HomekitService::Switch))
            .collect()
    }

    pub fn export_change(&self, change: &AccessoryChange) -> Vec<HomekitEvent> {
        match change {
            AccessoryChange::DeviceOn { device, on } => self
                .switches
                .iter()
                .filter(|s| &s.device == device)
                .map(|s| HomekitEvent {
                    target: self.target(s),
                    value: json!(on),
                })
                .collect(),
            _ => vec![],
        }
    }

    pub fn export_snapshot(&self, snapshot: &HubSnapshot) -> Vec<HomekitEvent> {
        snapshot
            .switches
            .iter()
            .flat_map(|s| {
                self.export_change(&AccessoryChange::DeviceOn {
                    device: s.device.clone(),
                    on: s.on,
                })
            })
            .collect()
    }

    pub fn process_trigger(&self, trigger: &HomekitEvent) -> Option<HubCommand> {
        let switch = self.switches.iter().find(|s| trigger.target == self.target(s))?;
        let on = trigger.value.as_bool()?;

        Some(HubCommand::SetDeviceOn {
            device: switch.device.clone(),
            on,
        })
    }

    pub fn resolve_query(&self, target: &HomekitTarget) -> Option<HubQuery> {
        self.switches
            .iter()
            .find(|s| *target == self.target(s))
            .map(|s| HubQuery::DeviceOn(s.device.clone()))
    }
}
