use tokio::time::Instant;

use crate::harmony::{HarmonyApi, HubStatus, VolumeCommand, path};

use super::{
    AccessoryChange, CommandOutcome,
    controller::{Deferred, HubController},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsePlan {
    pub command: VolumeCommand,
    pub repeat: u32,
}

/// Translates an absolute dial position into relative pulses, measured from the fixed reference.
pub fn plan_pulses(target: u8, reference: u8, factor: u32) -> Option<PulsePlan> {
    let delta = i32::from(target) - i32::from(reference);
    if delta == 0 || factor == 0 {
        return None;
    }

    let repeat = (f64::from(delta.unsigned_abs()) / f64::from(factor)).round() as u32;
    if repeat == 0 {
        return None;
    }

    Some(PulsePlan {
        command: if delta > 0 { VolumeCommand::Up } else { VolumeCommand::Down },
        repeat,
    })
}

#[derive(Debug, Clone)]
pub struct VolumeState {
    pub on: bool,
    pub level: u8,
    pub off_at: Option<Instant>,
}

impl VolumeState {
    pub fn new(reference: u8) -> Self {
        Self {
            on: false,
            level: reference,
            off_at: None,
        }
    }

    pub fn is_idle(&self, now: Instant) -> bool {
        self.off_at.is_none_or(|off_at| now >= off_at)
    }
}

impl<A: HarmonyApi> HubController<A> {
    pub(super) fn get_volume_on(&self) -> bool {
        self.reconciler.published().active && self.volume.on
    }

    pub(super) fn get_volume(&self) -> u8 {
        if self.reconciler.published().active {
            self.volume.level
        } else {
            self.timing.default_volume
        }
    }

    pub(super) fn set_volume_on(&mut self, status: &HubStatus, on: bool) -> CommandOutcome {
        if !status.is_active() {
            tracing::debug!("Hub {} is off, ignoring volume on {}", self.hub.slug, on);
            return CommandOutcome::NotPermitted;
        }

        self.set_volume_indicator(on);

        if on {
            self.volume.off_at = Some(Instant::now() + self.idle_window());
            self.defer(self.timing.volume_idle, Deferred::VolumeIdleCheck);
        }

        CommandOutcome::Accepted
    }

    pub(super) fn set_volume(&mut self, status: &HubStatus, target: u8) -> CommandOutcome {
        let target = target.min(100);

        let outcome = if status.is_active() {
            let plan = plan_pulses(target, self.timing.default_volume, self.timing.volume_repeat_factor);
            tracing::debug!("Volume of hub {} set to {}: {:?}", self.hub.slug, target, plan);

            if let Some(plan) = plan {
                self.post(vec![path::volume(&self.hub.slug, plan.command)], plan.repeat);
            }

            self.volume.level = target;
            self.volume.off_at = Some(Instant::now() + self.idle_window());
            if target > 0 {
                self.set_volume_indicator(true);
            }

            CommandOutcome::Accepted
        } else {
            tracing::debug!("Hub {} is off, ignoring volume {}", self.hub.slug, target);
            CommandOutcome::NotPermitted
        };

        self.defer(
            self.timing.volume_reset_delay,
            Deferred::VolumeReset {
                restore_on: target == 0,
            },
        );
        self.defer(self.timing.volume_idle, Deferred::VolumeIdleCheck);

        outcome
    }

    pub(super) fn on_volume_reset(&mut self, restore_on: bool) {
        self.volume.level = self.timing.default_volume;
        self.emit(AccessoryChange::Volume(self.timing.default_volume));

        //a dial dragged to zero reads as "off", bring it back
        if restore_on {
            self.volume.on = true;
            self.emit(AccessoryChange::VolumeOn(true));
        }
    }

    pub(super) fn on_volume_idle_check(&mut self) {
        if self.volume.on && self.volume.is_idle(Instant::now()) {
            tracing::debug!("Volume of hub {} idle, turning off", self.hub.slug);
            self.set_volume_indicator(false);
        }
    }

    fn idle_window(&self) -> std::time::Duration {
        self.timing.volume_idle.into()
    }

    fn set_volume_indicator(&mut self, on: bool) {
        if self.volume.on != on {
            self.volume.on = on;
            self.emit(AccessoryChange::VolumeOn(on));
        }
    }
}
