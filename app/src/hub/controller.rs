use std::sync::Arc;

use infrastructure::EventEmitter;
use tokio::{sync::mpsc, time::Instant};

use crate::{
    core::time::Duration,
    harmony::{HarmonyApi, Hub, HubStatus, path},
};

use super::{
    AccessoryChange, HubEvent, HubRequest, HubSnapshot, HubTiming, Reply, SwitchSnapshot, VolumeSnapshot,
    devices::DeviceSwitches,
    reconciler::{Reconciliation, SettleWindowReconciler, TelevisionChange},
    volume::VolumeState,
};

/// Effects scheduled for later. Evaluated against the state at the time they fire.
#[derive(Debug)]
pub enum Deferred {
    StatusFetched { status: HubStatus, request: HubRequest },
    DevicePower { intent: PowerIntent },
    VolumeReset { restore_on: bool },
    VolumeIdleCheck,
    ToggleReset { device: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerIntent {
    pub on: bool,
    pub requested_at: Instant,
}

pub struct HubController<A: HarmonyApi> {
    pub(super) api: A,
    pub(super) hub: Arc<Hub>,
    pub(super) timing: HubTiming,
    pub(super) reconciler: SettleWindowReconciler,
    pub(super) power_intent: Option<PowerIntent>,
    pub(super) volume: VolumeState,
    pub(super) switches: DeviceSwitches,
    events: EventEmitter<HubEvent>,
    requests: mpsc::Receiver<HubRequest>,
    statuses: mpsc::Receiver<HubStatus>,
    deferred_tx: mpsc::Sender<Deferred>,
    deferred_rx: mpsc::Receiver<Deferred>,
}

impl<A: HarmonyApi> HubController<A> {
    pub fn new(
        api: A,
        hub: Arc<Hub>,
        timing: HubTiming,
        events: EventEmitter<HubEvent>,
        requests: mpsc::Receiver<HubRequest>,
        statuses: mpsc::Receiver<HubStatus>,
    ) -> Self {
        let (deferred_tx, deferred_rx) = mpsc::channel(64);

        Self {
            reconciler: SettleWindowReconciler::new(timing.settle_window.into()),
            volume: VolumeState::new(timing.default_volume),
            switches: DeviceSwitches::new(hub.switchable_devices()),
            power_intent: None,
            api,
            hub,
            timing,
            events,
            requests,
            statuses,
            deferred_tx,
            deferred_rx,
        }
    }

    pub fn hub_slug(&self) -> &str {
        &self.hub.slug
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                request = self.requests.recv() => {
                    let Some(request) = request else {
                        tracing::info!("All clients of hub {} dropped, stopping", self.hub.slug);
                        break;
                    };
                    self.handle_request(request);
                }
                Some(status) = self.statuses.recv() => {
                    self.handle_status(status);
                }
                Some(deferred) = self.deferred_rx.recv() => {
                    self.handle_deferred(deferred);
                }
            }
        }
    }

    #[tracing::instrument(skip_all, fields(hub = %self.hub.slug))]
    fn handle_request(&mut self, request: HubRequest) {
        tracing::debug!("Handling request {:?}", request);

        let now = Instant::now();

        match request {
            //hub status lags behind local changes while settling
            HubRequest::GetActive(reply) if self.reconciler.is_settling(now) => {
                respond(reply, self.reconciler.published().active)
            }
            HubRequest::GetActiveIdentifier(reply) if self.reconciler.is_settling(now) => {
                respond(reply, self.reconciler.published().active_identifier)
            }
            HubRequest::SetActiveIdentifier(id, reply) => respond(reply, self.set_active_identifier(id)),
            HubRequest::GetVolumeOn(reply) => respond(reply, self.get_volume_on()),
            HubRequest::GetVolume(reply) => respond(reply, self.get_volume()),
            HubRequest::GetDeviceOn(device, reply) => respond(reply, self.get_device_on(&device)),
            HubRequest::Snapshot(reply) => respond(reply, self.snapshot()),
            request => self.fetch_status_for(request),
        }
    }

    #[tracing::instrument(skip_all, fields(hub = %self.hub.slug))]
    fn handle_request_with_status(&mut self, status: HubStatus, request: HubRequest) {
        tracing::debug!("Handling request {:?} with {:?}", request, status);

        match request {
            HubRequest::GetActive(reply) => respond(reply, status.is_active()),
            HubRequest::SetActive(active, reply) => respond(reply, self.set_active(&status, active)),
            HubRequest::GetActiveIdentifier(reply) => respond(reply, status.current_activity),
            HubRequest::SetVolumeOn(on, reply) => respond(reply, self.set_volume_on(&status, on)),
            HubRequest::SetVolume(level, reply) => respond(reply, self.set_volume(&status, level)),
            HubRequest::SetDeviceOn(device, on, reply) => respond(reply, self.set_device_on(&status, &device, on)),
            request => self.handle_request(request),
        }
    }

    fn handle_status(&mut self, status: HubStatus) {
        let slug = self.hub.slug.clone();

        match self.reconciler.reconcile(&status, Instant::now()) {
            Reconciliation::Suppressed => {
                tracing::debug!("State change of hub {} in progress, ignoring {:?}", slug, status);
                infrastructure::meter::increment("harmony_polls", &[("hub", slug.as_str()), ("result", "suppressed")]);
            }
            Reconciliation::Unchanged => {
                tracing::trace!("Hub {} unchanged: {:?}", slug, status);
                infrastructure::meter::increment("harmony_polls", &[("hub", slug.as_str()), ("result", "unchanged")]);
            }
            Reconciliation::Publish(changes) => {
                tracing::info!("Hub {} changed to {:?}", slug, status);
                infrastructure::meter::increment("harmony_polls", &[("hub", slug.as_str()), ("result", "changed")]);
                self.publish_television(changes);

                let active = if self.reconciler.published().active { 1.0 } else { 0.0 };
                infrastructure::meter::set("harmony_hub_active", active, &[("hub", slug.as_str())]);
            }
        }
    }

    fn handle_deferred(&mut self, deferred: Deferred) {
        match deferred {
            Deferred::StatusFetched { status, request } => self.handle_request_with_status(status, request),
            Deferred::DevicePower { intent } => self.on_device_power(intent),
            Deferred::VolumeReset { restore_on } => self.on_volume_reset(restore_on),
            Deferred::VolumeIdleCheck => self.on_volume_idle_check(),
            Deferred::ToggleReset { device } => self.on_toggle_reset(&device),
        }
    }

    fn snapshot(&self) -> HubSnapshot {
        let published = self.reconciler.published();

        HubSnapshot {
            hub: self.hub.slug.clone(),
            label: self.hub.label.clone(),
            active: published.active,
            active_identifier: published.active_identifier,
            settling: self.reconciler.is_settling(Instant::now()),
            volume: VolumeSnapshot {
                on: self.get_volume_on(),
                level: self.get_volume(),
            },
            switches: self
                .hub
                .switchable_devices()
                .map(|d| SwitchSnapshot {
                    device: d.slug.clone(),
                    label: d.label.clone(),
                    on: self.switches.is_on(&d.slug),
                })
                .collect(),
        }
    }

    /// The owner task never waits for the hub. The request resumes once the status arrives.
    fn fetch_status_for(&self, request: HubRequest) {
        let api = self.api.clone();
        let path = path::status(&self.hub.slug);
        let tx = self.deferred_tx.clone();

        tokio::spawn(async move {
            let status = HubStatus::from(&api.get(&path).await);

            if let Err(e) = tx.send(Deferred::StatusFetched { status, request }).await {
                tracing::debug!("Hub stopped before status for {:?} arrived", e.0);
            }
        });
    }

    pub(super) fn emit(&self, change: AccessoryChange) {
        self.events.send(HubEvent {
            hub: self.hub.slug.clone(),
            change,
        });
    }

    pub(super) fn publish_television(&self, changes: Vec<TelevisionChange>) {
        for change in changes {
            self.emit(change.into());
        }
    }

    pub(super) fn defer(&self, delay: Duration, effect: Deferred) {
        let tx = self.deferred_tx.clone();
        let delay: std::time::Duration = delay.into();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = tx.send(effect).await {
                tracing::debug!("Hub stopped before deferred effect {:?} fired", e.0);
            }
        });
    }

    /// Fire and forget. The requests run one after the other in a single task.
    pub(super) fn post(&self, paths: Vec<String>, repeat: u32) {
        let api = self.api.clone();

        tokio::spawn(async move {
            for path in paths {
                api.post(&path, repeat).await;
            }
        });
    }

    pub(super) fn put(&self, path: String) {
        let api = self.api.clone();

        tokio::spawn(async move {
            api.put(&path, 1).await;
        });
    }
}

impl From<TelevisionChange> for AccessoryChange {
    fn from(change: TelevisionChange) -> Self {
        match change {
            TelevisionChange::Active(active) => AccessoryChange::Active(active),
            TelevisionChange::ActiveIdentifier(id) => AccessoryChange::ActiveIdentifier(id),
        }
    }
}

fn respond<T>(reply: Reply<T>, value: T) {
    if reply.send(value).is_err() {
        tracing::debug!("Requester went away before reply");
    }
}
