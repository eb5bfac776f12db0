use serde_json::json;

use crate::{
    frontends::homebridge::{
        HomekitCharacteristic, HomekitEvent, HomekitService, HomekitTarget, HomekitTargetConfig, HubCommand,
        HubQuery, hap::value,
    },
    harmony::Hub,
    hub::{AccessoryChange, HubSnapshot},
};

struct Input {
    id: u32,
    label: String,
}

/// Hub power and activity selection, one input source per AV activity.
pub struct Television {
    hub: String,
    name: String,
    inputs: Vec<Input>,
}

impl Television {
    pub fn new(hub: &Hub) -> Self {
        Self {
            hub: hub.slug.clone(),
            name: hub.label.clone(),
            inputs: hub
                .av_activities()
                .map(|a| Input {
                    id: a.id,
                    label: a.label.clone(),
                })
                .collect(),
        }
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_labels(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.label.as_str()).collect()
    }

    fn target(&self, characteristic: HomekitCharacteristic) -> HomekitTarget {
        HomekitTarget::new(&self.name, &self.name, characteristic)
    }

    pub fn get_all_targets(&self) -> Vec<HomekitTargetConfig> {
        let mut targets = vec![
            self.target(HomekitCharacteristic::Active)
                .into_config(HomekitService::Television),
            self.target(HomekitCharacteristic::ActiveIdentifier)
                .into_config(HomekitService::Television),
        ];

        for input in self.inputs.iter() {
            let target = |characteristic| HomekitTarget::new(&self.name, &input.label, characteristic);

            targets.extend([
                target(HomekitCharacteristic::Identifier).with_config(HomekitService::InputSource, json!(input.id)),
                target(HomekitCharacteristic::ConfiguredName)
                    .with_config(HomekitService::InputSource, json!(input.label)),
                target(HomekitCharacteristic::IsConfigured)
                    .with_config(HomekitService::InputSource, json!(value::IS_CONFIGURED)),
                target(HomekitCharacteristic::InputSourceType)
                    .with_config(HomekitService::InputSource, json!(value::INPUT_SOURCE_TYPE_APPLICATION)),
                target(HomekitCharacteristic::CurrentVisibilityState)
                    .with_config(HomekitService::InputSource, json!(value::VISIBILITY_SHOWN)),
            ]);
        }

        targets
    }

    pub fn export_change(&self, change: &AccessoryChange) -> Vec<HomekitEvent> {
        match change {
            AccessoryChange::Active(active) => vec![HomekitEvent {
                target: self.target(HomekitCharacteristic::Active),
                value: json!(u8::from(*active)),
            }],
            AccessoryChange::ActiveIdentifier(id) => vec![HomekitEvent {
                target: self.target(HomekitCharacteristic::ActiveIdentifier),
                value: json!(id),
            }],
            _ => vec![],
        }
    }

    pub fn export_snapshot(&self, snapshot: &HubSnapshot) -> Vec<HomekitEvent> {
        let mut events = self.export_change(&AccessoryChange::Active(snapshot.active));

        if snapshot.active_identifier != crate::harmony::NO_ACTIVITY {
            events.extend(self.export_change(&AccessoryChange::ActiveIdentifier(snapshot.active_identifier)));
        }

        events
    }

    pub fn process_trigger(&self, trigger: &HomekitEvent) -> Option<HubCommand> {
        if trigger.target == self.target(HomekitCharacteristic::Active) {
            //Active is 0/1, some bridges send booleans
            let active = trigger
                .value
                .as_u64()
                .map(|v| v != 0)
                .or_else(|| trigger.value.as_bool())?;
            return Some(HubCommand::SetActive(active));
        }

        if trigger.target == self.target(HomekitCharacteristic::ActiveIdentifier) {
            let id = trigger.value.as_u64().and_then(|v| u32::try_from(v).ok())?;
            return Some(HubCommand::SetActiveIdentifier(id));
        }

        None
    }

    pub fn resolve_query(&self, target: &HomekitTarget) -> Option<HubQuery> {
        if *target == self.target(HomekitCharacteristic::Active) {
            Some(HubQuery::Active)
        } else if *target == self.target(HomekitCharacteristic::ActiveIdentifier) {
            Some(HubQuery::ActiveIdentifier)
        } else {
            None
        }
    }
}
