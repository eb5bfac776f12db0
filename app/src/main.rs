use infrastructure::{EventBus, Mqtt};
use settings::Settings;

use crate::harmony::HarmonyHttpClient;
use crate::hub::{HubEvent, HubRunner};

mod adapter;
mod core;
mod frontends;
mod harmony;
mod hub;
mod settings;

pub struct Infrastructure {
    mqtt_client: Mqtt,
}

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    let mut infrastructure = Infrastructure::init(&settings)
        .await
        .expect("Error initializing infrastructure");

    let harmony_settings = &settings.harmony;
    let api = HarmonyHttpClient::new(
        &harmony_settings.host,
        harmony_settings.port,
        harmony_settings.timing.request_timeout.into(),
    )
    .expect("Error creating Harmony API client");

    tracing::info!("Discovering hubs at {}:{}", harmony_settings.host, harmony_settings.port);
    let hubs = harmony::discover_hubs(&api, &harmony_settings.hubs, harmony_settings.verbose).await;
    if hubs.is_empty() {
        tracing::warn!("No configured hub is available, only the admin API will be served");
    }

    let event_bus = EventBus::<HubEvent>::new(64);

    let (hub_runners, hub_clients): (Vec<_>, Vec<_>) = hubs
        .into_iter()
        .map(|hub| HubRunner::new(api.clone(), hub, harmony_settings.timing.clone(), event_bus.emitter()))
        .unzip();

    let homebridge_runner = settings
        .homebridge
        .new_runner(&mut infrastructure, &hub_clients, event_bus.subscribe(), harmony_settings.verbose)
        .await;

    let http_server_exec = {
        let clients = hub_clients.clone();

        async move {
            settings
                .http_server
                .run_server(move || vec![adapter::api::routes(clients.clone())])
                .await
                .expect("HTTP server execution failed");
        }
    };

    tracing::info!("Starting infrastructure processing");
    let process_infrastucture = infrastructure.process();

    tracing::info!("Starting {} hub controllers", hub_runners.len());
    let hubs_exec = async move {
        if hub_runners.is_empty() {
            return futures::future::pending().await;
        }

        futures::future::join_all(hub_runners.into_iter().map(|runner| runner.run())).await;
        tracing::error!("All hub controllers stopped");
    };

    tokio::select!(
        _ = process_infrastucture => {},
        _ = hubs_exec => {},
        _ = homebridge_runner.run() => {},
        _ = http_server_exec => {},
    );
}

impl Infrastructure {
    pub async fn init(settings: &Settings) -> anyhow::Result<Self> {
        settings.monitoring.init().expect("Error initializing monitoring");

        let mqtt_client = settings.mqtt.new_client();

        Ok(Self { mqtt_client })
    }

    async fn process(self) {
        tokio::select!(
            _ = self.mqtt_client.process() => {},
        )
    }
}
