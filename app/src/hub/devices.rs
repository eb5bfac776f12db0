use std::collections::HashMap;

use tokio::time::Instant;

use crate::harmony::{Device, HarmonyApi, HubStatus, command, path};

use super::{
    AccessoryChange, CommandOutcome, HubError,
    controller::{Deferred, HubController},
};

#[derive(Debug, Clone, Default)]
struct SwitchState {
    on: bool,
    toggled_at: Option<Instant>,
}

/// Switch indicators of toggle-only devices. The hub can't report their real power state.
#[derive(Debug, Clone)]
pub struct DeviceSwitches {
    states: HashMap<String, SwitchState>,
}

impl DeviceSwitches {
    pub fn new<'a>(devices: impl Iterator<Item = &'a Device>) -> Self {
        Self {
            states: devices.map(|d| (d.slug.clone(), SwitchState::default())).collect(),
        }
    }

    pub fn contains(&self, device: &str) -> bool {
        self.states.contains_key(device)
    }

    pub fn is_on(&self, device: &str) -> bool {
        self.states.get(device).is_some_and(|s| s.on)
    }

    /// Returns whether the indicator changed.
    pub fn toggle(&mut self, device: &str, on: bool, now: Instant) -> bool {
        let Some(state) = self.states.get_mut(device) else {
            return false;
        };

        let changed = state.on != on;
        state.on = on;
        state.toggled_at = Some(now);
        changed
    }

    /// Turns the indicator off unless a newer toggle happened within `delay`. Returns whether it changed.
    pub fn reset_if_settled(&mut self, device: &str, now: Instant, delay: std::time::Duration) -> bool {
        let Some(state) = self.states.get_mut(device) else {
            return false;
        };

        let settled = state
            .toggled_at
            .is_some_and(|at| now.saturating_duration_since(at) >= delay);

        if settled && state.on {
            state.on = false;
            true
        } else {
            false
        }
    }
}

impl<A: HarmonyApi> HubController<A> {
    pub(super) fn get_device_on(&self, device: &str) -> Result<bool, HubError> {
        if !self.switches.contains(device) {
            return Err(self.device_not_found(device));
        }

        Ok(self.switches.is_on(device))
    }

    pub(super) fn set_device_on(
        &mut self,
        status: &HubStatus,
        device: &str,
        on: bool,
    ) -> Result<CommandOutcome, HubError> {
        if !self.switches.contains(device) {
            tracing::warn!("Device {} not found on hub {}", device, self.hub.slug);
            return Err(self.device_not_found(device));
        }

        if !status.is_active() {
            tracing::debug!("Hub {} is off, not toggling {}", self.hub.slug, device);
            return Ok(CommandOutcome::NotPermitted);
        }

        tracing::info!("Toggling device {} of hub {}", device, self.hub.slug);
        self.post(
            vec![path::device_command(&self.hub.slug, device, command::POWER_TOGGLE)],
            1,
        );

        if self.switches.toggle(device, on, Instant::now()) {
            self.emit(AccessoryChange::DeviceOn {
                device: device.to_owned(),
                on,
            });
        }

        self.defer(
            self.timing.toggle_reset_delay,
            Deferred::ToggleReset {
                device: device.to_owned(),
            },
        );

        Ok(CommandOutcome::Accepted)
    }

    pub(super) fn on_toggle_reset(&mut self, device: &str) {
        let delay = self.timing.toggle_reset_delay.into();

        if self.switches.reset_if_settled(device, Instant::now(), delay) {
            self.emit(AccessoryChange::DeviceOn {
                device: device.to_owned(),
                on: false,
            });
        }
    }

    fn device_not_found(&self, device: &str) -> HubError {
        HubError::DeviceNotFound {
            hub: self.hub.slug.clone(),
            device: device.to_owned(),
        }
    }
}
