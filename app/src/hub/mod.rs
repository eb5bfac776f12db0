mod controller;
mod devices;
mod poller;
mod reconciler;
mod television;
mod volume;


use std::sync::Arc;

use infrastructure::EventEmitter;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::{
    core::time::Duration,
    harmony::{HarmonyApi, Hub},
    t,
};

use controller::HubController;
use poller::StatusPoller;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubTiming {
    pub poll_interval: Duration,
    pub settle_window: Duration,
    pub device_power_delay: Duration,
    pub volume_reset_delay: Duration,
    pub volume_idle: Duration,
    pub toggle_reset_delay: Duration,
    pub volume_repeat_factor: u32,
    pub default_volume: u8,
    pub request_timeout: Duration,
}

impl Default for HubTiming {
    fn default() -> Self {
        Self {
            poll_interval: t!(5 seconds),
            settle_window: t!(15 seconds),
            device_power_delay: t!(10 seconds),
            volume_reset_delay: t!(200 millis),
            volume_idle: t!(30 seconds),
            toggle_reset_delay: t!(500 millis),
            volume_repeat_factor: 5,
            default_volume: 50,
            request_timeout: t!(5 seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum HubError {
    #[display("Activity {id} not found on hub {hub}")]
    ActivityNotFound { hub: String, id: u32 },
    #[display("Device {device} not found on hub {hub}")]
    DeviceNotFound { hub: String, device: String },
    #[display("Hub {hub} is not running")]
    Unavailable { hub: String },
}

/// Result of an accepted request. Remote commands may still be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Accepted,
    NotPermitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubEvent {
    pub hub: String,
    pub change: AccessoryChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessoryChange {
    Active(bool),
    ActiveIdentifier(u32),
    VolumeOn(bool),
    Volume(u8),
    DeviceOn { device: String, on: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubSnapshot {
    pub hub: String,
    pub label: String,
    pub active: bool,
    pub active_identifier: u32,
    pub settling: bool,
    pub volume: VolumeSnapshot,
    pub switches: Vec<SwitchSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeSnapshot {
    pub on: bool,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchSnapshot {
    pub device: String,
    pub label: String,
    pub on: bool,
}

type Reply<T> = oneshot::Sender<T>;

#[derive(Debug)]
enum HubRequest {
    GetActive(Reply<bool>),
    SetActive(bool, Reply<CommandOutcome>),
    GetActiveIdentifier(Reply<u32>),
    SetActiveIdentifier(u32, Reply<Result<CommandOutcome, HubError>>),
    GetVolumeOn(Reply<bool>),
    SetVolumeOn(bool, Reply<CommandOutcome>),
    GetVolume(Reply<u8>),
    SetVolume(u8, Reply<CommandOutcome>),
    GetDeviceOn(String, Reply<Result<bool, HubError>>),
    SetDeviceOn(String, bool, Reply<Result<CommandOutcome, HubError>>),
    Snapshot(Reply<HubSnapshot>),
}

pub struct HubRunner<A: HarmonyApi> {
    poller: StatusPoller<A>,
    controller: HubController<A>,
}

#[derive(Debug, Clone)]
pub struct HubClient {
    hub: Arc<Hub>,
    tx: mpsc::Sender<HubRequest>,
}

impl<A: HarmonyApi> HubRunner<A> {
    pub fn new(api: A, hub: Hub, timing: HubTiming, events: EventEmitter<HubEvent>) -> (Self, HubClient) {
        let hub = Arc::new(hub);
        let (request_tx, request_rx) = mpsc::channel(16);
        let (status_tx, status_rx) = mpsc::channel(1);

        let poller = StatusPoller::new(api.clone(), &hub.slug, timing.poll_interval.into(), status_tx);
        let controller = HubController::new(api, hub.clone(), timing, events, request_rx, status_rx);

        (Self { poller, controller }, HubClient { hub, tx: request_tx })
    }

    pub async fn run(self) {
        tracing::info!("Starting hub runner for {}", self.controller.hub_slug());

        tokio::select!(
            _ = self.poller.run() => {},
            _ = self.controller.run() => {},
        );
    }
}

impl HubClient {
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> HubRequest) -> Result<T, HubError> {
        let (tx, rx) = oneshot::channel();

        self.tx.send(build(tx)).await.map_err(|_| self.unavailable())?;
        rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> HubError {
        HubError::Unavailable {
            hub: self.hub.slug.clone(),
        }
    }

    pub async fn get_active(&self) -> Result<bool, HubError> {
        self.request(HubRequest::GetActive).await
    }

    pub async fn set_active(&self, active: bool) -> Result<CommandOutcome, HubError> {
        self.request(|tx| HubRequest::SetActive(active, tx)).await
    }

    pub async fn get_active_identifier(&self) -> Result<u32, HubError> {
        self.request(HubRequest::GetActiveIdentifier).await
    }

    pub async fn set_active_identifier(&self, id: u32) -> Result<CommandOutcome, HubError> {
        self.request(|tx| HubRequest::SetActiveIdentifier(id, tx)).await?
    }

    pub async fn get_volume_on(&self) -> Result<bool, HubError> {
        self.request(HubRequest::GetVolumeOn).await
    }

    pub async fn set_volume_on(&self, on: bool) -> Result<CommandOutcome, HubError> {
        self.request(|tx| HubRequest::SetVolumeOn(on, tx)).await
    }

    pub async fn get_volume(&self) -> Result<u8, HubError> {
        self.request(HubRequest::GetVolume).await
    }

    pub async fn set_volume(&self, level: u8) -> Result<CommandOutcome, HubError> {
        self.request(|tx| HubRequest::SetVolume(level, tx)).await
    }

    pub async fn get_device_on(&self, device: &str) -> Result<bool, HubError> {
        let device = device.to_owned();
        self.request(|tx| HubRequest::GetDeviceOn(device, tx)).await?
    }

    pub async fn set_device_on(&self, device: &str, on: bool) -> Result<CommandOutcome, HubError> {
        let device = device.to_owned();
        self.request(|tx| HubRequest::SetDeviceOn(device, on, tx)).await?
    }

    pub async fn snapshot(&self) -> Result<HubSnapshot, HubError> {
        self.request(HubRequest::Snapshot).await
    }
}
