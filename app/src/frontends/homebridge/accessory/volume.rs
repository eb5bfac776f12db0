use serde_json::json;

use crate::{
    frontends::homebridge::{
        HomekitCharacteristic, HomekitEvent, HomekitService, HomekitTarget, HomekitTargetConfig, HubCommand,
        HubQuery,
    },
    harmony::Hub,
    hub::{AccessoryChange, HubSnapshot},
};

/// Volume as a dimmable light. Brightness is relative to the fixed reference level.
pub struct VolumeDial {
    hub: String,
    name: String,
}

impl VolumeDial {
    pub fn new(hub: &Hub) -> Self {
        Self {
            hub: hub.slug.clone(),
            name: format!("{} Volume", hub.label),
        }
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    fn target(&self, characteristic: HomekitCharacteristic) -> HomekitTarget {
        HomekitTarget::new(&self.name, &self.name, characteristic)
    }

    pub fn get_all_targets(&self) -> Vec<HomekitTargetConfig> {
        vec![
            self.target(HomekitCharacteristic::On).into_config(HomekitService::Lightbulb),
            self.target(HomekitCharacteristic::Brightness)
                .into_config(HomekitService::Lightbulb),
        ]
    }

    pub fn export_change(&self, change: &AccessoryChange) -> Vec<HomekitEvent> {
        match change {
            AccessoryChange::VolumeOn(on) => vec![HomekitEvent {
                target: self.target(HomekitCharacteristic::On),
                value: json!(on),
            }],
            AccessoryChange::Volume(level) => vec![HomekitEvent {
                target: self.target(HomekitCharacteristic::Brightness),
                value: json!(level),
            }],
            _ => vec![],
        }
    }

    pub fn export_snapshot(&self, snapshot: &HubSnapshot) -> Vec<HomekitEvent> {
        let mut events = self.export_change(&AccessoryChange::VolumeOn(snapshot.volume.on));
        events.extend(self.export_change(&AccessoryChange::Volume(snapshot.volume.level)));
        events
    }

    pub fn process_trigger(&self, trigger: &HomekitEvent) -> Option<HubCommand> {
        if trigger.target == self.target(HomekitCharacteristic::On) {
            return trigger.value.as_bool().map(HubCommand::SetVolumeOn);
        }

        if trigger.target == self.target(HomekitCharacteristic::Brightness) {
            let level = trigger
                .value
                .as_u64()
                .or_else(|| trigger.value.as_f64().map(|v| v.round().max(0.0) as u64))?;
            return Some(HubCommand::SetVolume(level.min(100) as u8));
        }

        None
    }

    pub fn resolve_query(&self, target: &HomekitTarget) -> Option<HubQuery> {
        if *target == self.target(HomekitCharacteristic::On) {
            Some(HubQuery::VolumeOn)
        } else if *target == self.target(HomekitCharacteristic::Brightness) {
            Some(HubQuery::Volume)
        } else {
            None
        }
    }
}
