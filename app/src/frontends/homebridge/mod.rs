mod accessory;
mod hap;
mod runtime;

use std::collections::HashMap;

use infrastructure::EventListener;
use serde::Deserialize;
use serde_json::Value;

use self::{
    accessory::HomekitRegistry,
    hap::{HomekitCharacteristic, HomekitService},
    runtime::HomebridgeRunner,
};
use crate::{
    Infrastructure,
    hub::{HubClient, HubEvent},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct HomekitTarget {
    pub(crate) name: String,
    pub(crate) service_name: String,
    pub(crate) characteristic: HomekitCharacteristic,
}

impl HomekitTarget {
    fn new(name: &str, service_name: &str, characteristic: HomekitCharacteristic) -> Self {
        Self {
            name: name.to_owned(),
            service_name: service_name.to_owned(),
            characteristic,
        }
    }

    pub(crate) fn into_config(self, service: HomekitService) -> HomekitTargetConfig {
        HomekitTargetConfig {
            target: self,
            service,
            config: None,
        }
    }

    pub(crate) fn with_config(self, service: HomekitService, config: Value) -> HomekitTargetConfig {
        HomekitTargetConfig {
            target: self,
            service,
            config: Some(config),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HomekitTargetConfig {
    pub(crate) target: HomekitTarget,
    pub(crate) service: HomekitService,
    pub(crate) config: Option<Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct HomekitEvent {
    pub(crate) target: HomekitTarget,
    pub(crate) value: Value,
}

/// Write requests from Homekit, addressed to one hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HubCommand {
    SetActive(bool),
    SetActiveIdentifier(u32),
    SetVolumeOn(bool),
    SetVolume(u8),
    SetDeviceOn { device: String, on: bool },
}

/// Read requests from Homekit, addressed to one hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HubQuery {
    Active,
    ActiveIdentifier,
    VolumeOn,
    Volume,
    DeviceOn(String),
}

#[derive(Clone, Deserialize, Debug)]
pub struct Homebridge {
    pub base_topic: String,
}

impl Homebridge {
    pub async fn new_runner(
        &self,
        infrastructure: &mut Infrastructure,
        clients: &[HubClient],
        events: EventListener<HubEvent>,
        verbose: bool,
    ) -> HomebridgeRunner {
        let mqtt_receiver = infrastructure
            .mqtt_client
            .subscribe_all(&[
                format!("{}/from/set", &self.base_topic),
                format!("{}/from/get", &self.base_topic),
            ])
            .await
            .expect("Error subscribing to MQTT topic");

        let hubs = clients.iter().map(|c| c.hub().clone()).collect::<Vec<_>>();
        let clients = clients
            .iter()
            .map(|c| (c.hub().slug.clone(), c.clone()))
            .collect::<HashMap<_, _>>();

        HomebridgeRunner::new(
            HomekitRegistry::new(&hubs, verbose),
            clients,
            events,
            infrastructure.mqtt_client.sender(&self.base_topic),
            mqtt_receiver,
            self.base_topic.clone(),
        )
    }
}
