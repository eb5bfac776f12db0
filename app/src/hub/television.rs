use tokio::time::Instant;

use crate::harmony::{Activity, HarmonyApi, HubStatus, command, path};

use super::{
    CommandOutcome, HubError,
    controller::{Deferred, HubController, PowerIntent},
};

impl<A: HarmonyApi> HubController<A> {
    pub(super) fn set_active(&mut self, status: &HubStatus, active: bool) -> CommandOutcome {
        let now = Instant::now();

        //the last local request wins over a hub that has not caught up yet
        let current = if self.reconciler.is_settling(now) {
            self.reconciler.published().active
        } else {
            status.is_active()
        };

        if current == active {
            tracing::debug!("Hub {} already {}", self.hub.slug, if active { "on" } else { "off" });
            return CommandOutcome::Accepted;
        }

        let hub = self.hub.clone();

        let changes = if active {
            match self.activity_to_start() {
                Some(activity) => {
                    tracing::info!("Starting activity {} on hub {}", activity.label, hub.slug);
                    self.post(vec![path::activity(&hub.slug, &activity.slug)], 1);
                    self.reconciler.publish_local(now, Some(true), Some(activity.id))
                }
                None => {
                    tracing::warn!("Hub {} has no AV activity to start", hub.slug);
                    self.reconciler.publish_local(now, Some(true), None)
                }
            }
        } else {
            tracing::info!("Turning off hub {}", hub.slug);
            self.put(path::off(&hub.slug));
            self.reconciler.publish_local(now, Some(false), None)
        };

        self.publish_television(changes);

        let intent = PowerIntent {
            on: active,
            requested_at: now,
        };
        self.power_intent = Some(intent);
        self.defer(self.timing.device_power_delay, Deferred::DevicePower { intent });

        CommandOutcome::Accepted
    }

    pub(super) fn set_active_identifier(&mut self, id: u32) -> Result<CommandOutcome, HubError> {
        let hub = self.hub.clone();

        let Some(activity) = hub.av_activity(id) else {
            tracing::warn!("Activity {} not found on hub {}", id, hub.slug);
            return Err(HubError::ActivityNotFound {
                hub: hub.slug.clone(),
                id,
            });
        };

        tracing::info!("Switching hub {} to activity {}", hub.slug, activity.label);
        self.post(vec![path::activity(&hub.slug, &activity.slug)], 1);

        let changes = self.reconciler.publish_local(Instant::now(), None, Some(id));
        self.publish_television(changes);

        Ok(CommandOutcome::Accepted)
    }

    pub(super) fn on_device_power(&self, intent: PowerIntent) {
        if self.power_intent != Some(intent) {
            tracing::debug!("Device power {:?} of hub {} superseded", intent, self.hub.slug);
            return;
        }

        let (devices, command) = if intent.on {
            (&self.hub.capabilities.power_on, command::POWER_ON)
        } else {
            (&self.hub.capabilities.power_off, command::POWER_OFF)
        };

        let paths: Vec<String> = devices
            .iter()
            .map(|device| path::device_command(&self.hub.slug, device, command))
            .collect();

        tracing::info!("Sending {} to {} devices of hub {}", command, paths.len(), self.hub.slug);
        self.post(paths, 1);
    }

    //previously selected input if still known, otherwise the first one
    fn activity_to_start(&self) -> Option<Activity> {
        let selected = self.reconciler.published().active_identifier;

        self.hub
            .av_activity(selected)
            .or_else(|| self.hub.av_activities().next())
            .cloned()
    }
}
