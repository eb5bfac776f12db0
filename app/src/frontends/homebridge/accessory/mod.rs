use crate::{
    frontends::homebridge::{
        HomekitEvent, HomekitTarget, HomekitTargetConfig, HubCommand, HubQuery,
        accessory::{device_switch::DeviceSwitchGroup, television::Television, volume::VolumeDial},
    },
    harmony::Hub,
    hub::{HubEvent, HubSnapshot},
};

mod device_switch;
mod television;
mod volume;

enum HomekitAccessory {
    Television(Television),
    DeviceSwitchGroup(DeviceSwitchGroup),
    VolumeDial(VolumeDial),
}

impl HomekitAccessory {
    fn hub(&self) -> &str {
        match self {
            HomekitAccessory::Television(tv) => tv.hub(),
            HomekitAccessory::DeviceSwitchGroup(switches) => switches.hub(),
            HomekitAccessory::VolumeDial(dial) => dial.hub(),
        }
    }
}

pub struct HomekitRegistry {
    accessories: Vec<HomekitAccessory>,
}

impl HomekitRegistry {
    pub fn new(hubs: &[Hub], verbose: bool) -> Self {
        let mut accessories = vec![];

        for hub in hubs {
            let tv = Television::new(hub);
            let switches = DeviceSwitchGroup::new(hub);

            if verbose {
                tracing::info!("Adding television {} with inputs {:?}", tv.name(), tv.input_labels());
                tracing::info!("Adding devices {:?} of hub {}", switches.device_labels(), hub.slug);
            } else {
                tracing::debug!("Adding television {} with inputs {:?}", tv.name(), tv.input_labels());
                tracing::debug!("Adding devices {:?} of hub {}", switches.device_labels(), hub.slug);
            }

            accessories.push(HomekitAccessory::Television(tv));
            accessories.push(HomekitAccessory::DeviceSwitchGroup(switches));
            accessories.push(HomekitAccessory::VolumeDial(VolumeDial::new(hub)));
        }

        Self { accessories }
    }

    pub fn get_device_config(&self) -> Vec<HomekitTargetConfig> {
        self.accessories
            .iter()
            .flat_map(|accessory| match accessory {
                HomekitAccessory::Television(tv) => tv.get_all_targets(),
                HomekitAccessory::DeviceSwitchGroup(switches) => switches.get_all_targets(),
                HomekitAccessory::VolumeDial(dial) => dial.get_all_targets(),
            })
            .collect()
    }

    pub fn export_event(&self, event: &HubEvent) -> Vec<HomekitEvent> {
        self.accessories
            .iter()
            .filter(|accessory| accessory.hub() == event.hub)
            .flat_map(|accessory| match accessory {
                HomekitAccessory::Television(tv) => tv.export_change(&event.change),
                HomekitAccessory::DeviceSwitchGroup(switches) => switches.export_change(&event.change),
                HomekitAccessory::VolumeDial(dial) => dial.export_change(&event.change),
            })
            .collect()
    }

    pub fn export_snapshot(&self, snapshot: &HubSnapshot) -> Vec<HomekitEvent> {
        self.accessories
            .iter()
            .filter(|accessory| accessory.hub() == snapshot.hub)
            .flat_map(|accessory| match accessory {
                HomekitAccessory::Television(tv) => tv.export_snapshot(snapshot),
                HomekitAccessory::DeviceSwitchGroup(switches) => switches.export_snapshot(snapshot),
                HomekitAccessory::VolumeDial(dial) => dial.export_snapshot(snapshot),
            })
            .collect()
    }

    pub fn process_trigger(&self, trigger: &HomekitEvent) -> Option<(String, HubCommand)> {
        self.accessories.iter().find_map(|accessory| {
            let command = match accessory {
                HomekitAccessory::Television(tv) => tv.process_trigger(trigger),
                HomekitAccessory::DeviceSwitchGroup(switches) => switches.process_trigger(trigger),
                HomekitAccessory::VolumeDial(dial) => dial.process_trigger(trigger),
            };

            command.map(|c| (accessory.hub().to_owned(), c))
        })
    }

    pub fn resolve_query(&self, target: &HomekitTarget) -> Option<(String, HubQuery)> {
        self.accessories.iter().find_map(|accessory| {
            let query = match accessory {
                HomekitAccessory::Television(tv) => tv.resolve_query(target),
                HomekitAccessory::DeviceSwitchGroup(switches) => switches.resolve_query(target),
                HomekitAccessory::VolumeDial(dial) => dial.resolve_query(target),
            };

            query.map(|q| (accessory.hub().to_owned(), q))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::*;
    use crate::{
        frontends::homebridge::hap::{HomekitCharacteristic, HomekitService},
        harmony::{Activity, Device, DeviceCapabilities},
        hub::{AccessoryChange, SwitchSnapshot, VolumeSnapshot},
    };

    fn registry() -> HomekitRegistry {
        let hub = Hub {
            slug: "living-room".to_string(),
            label: "Living Room".to_string(),
            activities: vec![
                Activity {
                    id: 7,
                    slug: "watch-tv".to_string(),
                    label: "Watch TV".to_string(),
                    is_av: true,
                },
                Activity {
                    id: 9,
                    slug: "lights".to_string(),
                    label: "Lights".to_string(),
                    is_av: false,
                },
            ],
            devices: vec![Device {
                slug: "fan".to_string(),
                label: "Fan".to_string(),
            }],
            capabilities: DeviceCapabilities {
                power_toggle: BTreeSet::from(["fan".to_string()]),
                ..Default::default()
            },
            exposed_device_labels: vec![],
        };

        HomekitRegistry::new(&[hub], false)
    }

    fn event(name: &str, service_name: &str, characteristic: HomekitCharacteristic, value: serde_json::Value) -> HomekitEvent {
        HomekitEvent {
            target: HomekitTarget::new(name, service_name, characteristic),
            value,
        }
    }

    #[test]
    fn test_device_config() {
        let config = registry().get_device_config();

        let services: Vec<(&str, &str, &HomekitService)> = config
            .iter()
            .map(|c| (c.target.name.as_str(), c.target.service_name.as_str(), &c.service))
            .collect();

        assert!(services.contains(&("Living Room", "Living Room", &HomekitService::Television)));
        assert!(services.contains(&("Living Room", "Watch TV", &HomekitService::InputSource)));
        assert!(!services.iter().any(|(_, service_name, _)| *service_name == "Lights"));
        assert!(services.contains(&("Living Room Devices", "Fan", &HomekitService::Switch)));
        assert!(services.contains(&("Living Room Volume", "Living Room Volume", &HomekitService::Lightbulb)));

        let identifier = config
            .iter()
            .find(|c| c.target.characteristic == HomekitCharacteristic::Identifier)
            .and_then(|c| c.config.clone());
        assert_eq!(identifier, Some(json!(7)));
    }

    #[test]
    fn test_process_trigger() {
        let registry = registry();

        assert_eq!(
            registry.process_trigger(&event("Living Room", "Living Room", HomekitCharacteristic::Active, json!(1))),
            Some(("living-room".to_string(), HubCommand::SetActive(true)))
        );
        assert_eq!(
            registry.process_trigger(&event(
                "Living Room",
                "Living Room",
                HomekitCharacteristic::ActiveIdentifier,
                json!(7)
            )),
            Some(("living-room".to_string(), HubCommand::SetActiveIdentifier(7)))
        );
        assert_eq!(
            registry.process_trigger(&event("Living Room Devices", "Fan", HomekitCharacteristic::On, json!(true))),
            Some((
                "living-room".to_string(),
                HubCommand::SetDeviceOn {
                    device: "fan".to_string(),
                    on: true
                }
            ))
        );
        assert_eq!(
            registry.process_trigger(&event(
                "Living Room Volume",
                "Living Room Volume",
                HomekitCharacteristic::Brightness,
                json!(80)
            )),
            Some(("living-room".to_string(), HubCommand::SetVolume(80)))
        );
        assert_eq!(
            registry.process_trigger(&event("Kitchen", "Kitchen", HomekitCharacteristic::Active, json!(1))),
            None
        );
    }

    #[test]
    fn test_resolve_query() {
        let registry = registry();

        assert_eq!(
            registry.resolve_query(&HomekitTarget::new("Living Room Devices", "Fan", HomekitCharacteristic::On)),
            Some(("living-room".to_string(), HubQuery::DeviceOn("fan".to_string())))
        );
        assert_eq!(
            registry.resolve_query(&HomekitTarget::new(
                "Living Room Volume",
                "Living Room Volume",
                HomekitCharacteristic::On
            )),
            Some(("living-room".to_string(), HubQuery::VolumeOn))
        );
    }

    #[test]
    fn test_export_event() {
        let registry = registry();

        let events = registry.export_event(&HubEvent {
            hub: "living-room".to_string(),
            change: AccessoryChange::Active(true),
        });
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target.characteristic, HomekitCharacteristic::Active);
        assert_eq!(events[0].value, json!(1));

        let other_hub = registry.export_event(&HubEvent {
            hub: "bedroom".to_string(),
            change: AccessoryChange::Active(true),
        });
        assert!(other_hub.is_empty());
    }

    #[test]
    fn test_export_snapshot() {
        let events = registry().export_snapshot(&HubSnapshot {
            hub: "living-room".to_string(),
            label: "Living Room".to_string(),
            active: false,
            active_identifier: 0,
            settling: false,
            volume: VolumeSnapshot { on: false, level: 50 },
            switches: vec![SwitchSnapshot {
                device: "fan".to_string(),
                label: "Fan".to_string(),
                on: false,
            }],
        });

        let values: Vec<(&str, HomekitCharacteristic, serde_json::Value)> = events
            .iter()
            .map(|e| (e.target.service_name.as_str(), e.target.characteristic.clone(), e.value.clone()))
            .collect();

        assert_eq!(
            values,
            vec![
                ("Living Room", HomekitCharacteristic::Active, json!(0)),
                ("Fan", HomekitCharacteristic::On, json!(false)),
                ("Living Room Volume", HomekitCharacteristic::On, json!(false)),
                ("Living Room Volume", HomekitCharacteristic::Brightness, json!(50)),
            ]
        );
    }
}
