use std::collections::HashMap;

use infrastructure::{EventListener, MqttInMessage, MqttSender, MqttSubscription};
use serde::{Deserialize, Serialize};

use crate::{
    frontends::homebridge::{
        HomekitEvent, HomekitService, HomekitTarget, HomekitTargetConfig, HubCommand, HubQuery,
        accessory::HomekitRegistry, hap::HomekitCharacteristic,
    },
    hub::{AccessoryChange, CommandOutcome, HubClient, HubError, HubEvent},
};

pub struct HomebridgeRunner {
    registry: HomekitRegistry,
    clients: HashMap<String, HubClient>,
    events: EventListener<HubEvent>,
    sender: MqttSender,
    receiver: MqttSubscription,
    base_topic: String,
}

impl HomebridgeRunner {
    pub fn new(
        registry: HomekitRegistry,
        clients: HashMap<String, HubClient>,
        events: EventListener<HubEvent>,
        sender: MqttSender,
        receiver: MqttSubscription,
        base_topic: String,
    ) -> Self {
        Self {
            registry,
            clients,
            events,
            sender,
            receiver,
            base_topic,
        }
    }

    pub async fn run(mut self) {
        self.register_accessories().await;
        self.publish_snapshots().await;

        loop {
            tokio::select! {
                Some(msg) = self.receiver.recv() => {
                    self.handle_mqtt_message(msg).await;
                }

                event = self.events.recv() => {
                    let Some(event) = event else {
                        tracing::error!("Hub event channel closed, stopping Homebridge runner");
                        break;
                    };
                    self.handle_hub_event(&event).await;
                }
            }
        }
    }

    async fn handle_hub_event(&self, event: &HubEvent) {
        tracing::debug!("Exporting hub event to Homebridge: {:?}", event);
        self.publish(self.registry.export_event(event)).await;
    }

    async fn publish_snapshots(&self) {
        for client in self.clients.values() {
            match client.snapshot().await {
                Ok(snapshot) => self.publish(self.registry.export_snapshot(&snapshot)).await,
                Err(e) => tracing::error!("Error getting snapshot of hub {}: {}", client.hub().slug, e),
            }
        }
    }

    async fn publish(&self, events: Vec<HomekitEvent>) {
        //example
        // {"name": "Living Room", "service_name": "Living Room", "characteristic": "Active", "value": 1}
        #[derive(Debug, Serialize)]
        struct OutgoingMessage {
            name: String,
            service_name: String,
            characteristic: HomekitCharacteristic,
            value: serde_json::Value,
        }

        for event in events {
            let msg = OutgoingMessage {
                name: event.target.name,
                service_name: event.target.service_name,
                characteristic: event.target.characteristic,
                value: event.value,
            };

            let payload = match serde_json::to_string(&msg) {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!("Error serializing Homebridge outgoing message: {:?} -- {:?}", msg, e);
                    continue;
                }
            };

            if let Err(e) = self.sender.send_transient("to/set", payload).await {
                tracing::error!("Error sending MQTT message to Homebridge: {:?}", e);
            }
        }
    }

    async fn handle_mqtt_message(&self, msg: MqttInMessage) {
        //example
        // {"name": "Living Room", "service_name": "Living Room", "characteristic": "Active", "value": 1}
        #[derive(Deserialize, Debug)]
        struct IncomingMessage {
            name: String,
            service_name: String,
            characteristic: HomekitCharacteristic,
            #[serde(default)]
            value: serde_json::Value,
        }

        let incoming: IncomingMessage = match serde_json::from_str(&msg.payload) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!("Ignoring Homebridge message: {:?} -- {:?}", msg.payload, e);
                return;
            }
        };

        let target = HomekitTarget {
            name: incoming.name,
            service_name: incoming.service_name,
            characteristic: incoming.characteristic,
        };

        match msg.topic_suffix(&self.base_topic) {
            Some("from/set") => {
                self.handle_set(HomekitEvent {
                    target,
                    value: incoming.value,
                })
                .await
            }
            Some("from/get") => self.handle_get(target).await,
            _ => tracing::warn!("Unexpected Homebridge topic {}", msg.topic),
        }
    }

    async fn handle_set(&self, event: HomekitEvent) {
        tracing::debug!("Processing Homebridge MQTT event: {:?}", event);

        let Some((hub, command)) = self.registry.process_trigger(&event) else {
            tracing::debug!("No accessory for Homebridge target {:?}", event.target);
            return;
        };

        let Some(client) = self.clients.get(&hub) else {
            tracing::error!("No client for hub {}", hub);
            return;
        };

        tracing::info!("Received Homebridge command for hub {}: {:?}", hub, command);

        let result = match &command {
            HubCommand::SetActive(active) => client.set_active(*active).await,
            HubCommand::SetActiveIdentifier(id) => client.set_active_identifier(*id).await,
            HubCommand::SetVolumeOn(on) => client.set_volume_on(*on).await,
            HubCommand::SetVolume(level) => client.set_volume(*level).await,
            HubCommand::SetDeviceOn { device, on } => client.set_device_on(device, *on).await,
        };

        match result {
            Ok(CommandOutcome::Accepted) => {}
            Ok(CommandOutcome::NotPermitted) => {
                tracing::info!("Command {:?} not permitted while hub {} is off", command, hub);
            }
            Err(e @ HubError::ActivityNotFound { .. }) => {
                tracing::warn!("{}", e);
                //roll the rejected selection back in Homekit
                match client.get_active_identifier().await {
                    Ok(id) => self.answer(&hub, AccessoryChange::ActiveIdentifier(id)).await,
                    Err(e) => tracing::error!("Error reading active identifier: {}", e),
                }
            }
            Err(e) => tracing::error!("Error processing Homebridge command {:?}: {}", command, e),
        }
    }

    async fn handle_get(&self, target: HomekitTarget) {
        let Some((hub, query)) = self.registry.resolve_query(&target) else {
            tracing::debug!("No accessory for Homebridge query {:?}", target);
            return;
        };

        let Some(client) = self.clients.get(&hub) else {
            tracing::error!("No client for hub {}", hub);
            return;
        };

        let change = match query {
            HubQuery::Active => client.get_active().await.map(AccessoryChange::Active),
            HubQuery::ActiveIdentifier => client.get_active_identifier().await.map(AccessoryChange::ActiveIdentifier),
            HubQuery::VolumeOn => client.get_volume_on().await.map(AccessoryChange::VolumeOn),
            HubQuery::Volume => client.get_volume().await.map(AccessoryChange::Volume),
            HubQuery::DeviceOn(device) => client
                .get_device_on(&device)
                .await
                .map(|on| AccessoryChange::DeviceOn { device, on }),
        };

        match change {
            Ok(change) => self.answer(&hub, change).await,
            Err(e) => tracing::error!("Error answering Homebridge query {:?}: {}", target, e),
        }
    }

    async fn answer(&self, hub: &str, change: AccessoryChange) {
        let event = HubEvent {
            hub: hub.to_owned(),
            change,
        };

        self.publish(self.registry.export_event(&event)).await;
    }

    async fn register_accessories(&self) {
        let mut already_registered: Vec<String> = vec![];

        for ((name, service_name, service), characteristics) in self.get_bootstrap_data() {
            //make sure accessory is created before service is added
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;

            let suffix = if already_registered.contains(&name) {
                "to/add/service"
            } else {
                already_registered.push(name.clone());
                "to/add"
            };

            let payload = Self::service_registration_payload(&name, &service_name, service, &characteristics);

            if let Err(e) = self.sender.send_transient(suffix, payload.to_string()).await {
                tracing::error!("Error registering {} / {} with Homebridge: {:?}", name, service_name, e);
            }
        }
    }

    //ordered like the registry, the primary service of each accessory comes first
    fn get_bootstrap_data(&self) -> Vec<((String, String, HomekitService), Vec<HomekitTargetConfig>)> {
        let mut data: Vec<((String, String, HomekitService), Vec<HomekitTargetConfig>)> = vec![];

        for entry in self.registry.get_device_config() {
            let key = (
                entry.target.name.clone(),
                entry.target.service_name.clone(),
                entry.service.clone(),
            );

            match data.iter_mut().find(|(k, _)| *k == key) {
                Some((_, entries)) => entries.push(entry),
                None => data.push((key, vec![entry])),
            }
        }

        data
    }

    fn service_registration_payload(
        name: &str,
        service_name: &str,
        service: HomekitService,
        characteristics: &[HomekitTargetConfig],
    ) -> serde_json::Value {
        let mut payload = serde_json::Map::new();
        payload.insert("name".to_string(), serde_json::json!(name));
        payload.insert("service_name".to_string(), serde_json::json!(service_name));
        payload.insert("service".to_string(), serde_json::json!(service));

        for characteristic in characteristics.iter() {
            let value = characteristic
                .config
                .clone()
                .unwrap_or_else(|| serde_json::Value::String("default".to_string()));
            payload.insert(characteristic_name(&characteristic.target.characteristic), value);
        }

        serde_json::Value::Object(payload)
    }
}

fn characteristic_name(characteristic: &HomekitCharacteristic) -> String {
    match serde_json::to_value(characteristic) {
        Ok(serde_json::Value::String(name)) => name,
        _ => format!("{:?}", characteristic),
    }
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_eq;

    use super::*;

    #[test]
    fn test_service_registration_payload() {
        let characteristics = vec![
            HomekitTarget::new("Living Room", "Watch TV", HomekitCharacteristic::Identifier)
                .with_config(HomekitService::InputSource, serde_json::json!(7)),
            HomekitTarget::new("Living Room", "Watch TV", HomekitCharacteristic::ConfiguredName)
                .with_config(HomekitService::InputSource, serde_json::json!("Watch TV")),
        ];

        let payload = HomebridgeRunner::service_registration_payload(
            "Living Room",
            "Watch TV",
            HomekitService::InputSource,
            &characteristics,
        );

        assert_json_eq!(
            payload,
            serde_json::json!({
                "name": "Living Room",
                "service_name": "Watch TV",
                "service": "InputSource",
                "Identifier": 7,
                "ConfiguredName": "Watch TV"
            })
        );
    }

    #[test]
    fn test_service_registration_payload_defaults() {
        let characteristics = vec![
            HomekitTarget::new("Living Room Volume", "Living Room Volume", HomekitCharacteristic::On)
                .into_config(HomekitService::Lightbulb),
            HomekitTarget::new("Living Room Volume", "Living Room Volume", HomekitCharacteristic::Brightness)
                .into_config(HomekitService::Lightbulb),
        ];

        let payload = HomebridgeRunner::service_registration_payload(
            "Living Room Volume",
            "Living Room Volume",
            HomekitService::Lightbulb,
            &characteristics,
        );

        assert_json_eq!(
            payload,
            serde_json::json!({
                "name": "Living Room Volume",
                "service_name": "Living Room Volume",
                "service": "Lightbulb",
                "On": "default",
                "Brightness": "default"
            })
        );
    }
}
