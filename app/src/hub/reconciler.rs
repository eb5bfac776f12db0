use std::time::Duration;

use tokio::time::Instant;

use crate::harmony::{HubStatus, NO_ACTIVITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelevisionState {
    pub active: bool,
    pub active_identifier: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelevisionChange {
    Active(bool),
    ActiveIdentifier(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Suppressed,
    Unchanged,
    Publish(Vec<TelevisionChange>),
}

/// Arbitrates between optimistic local state and polled hub status.
///
/// After a local mutation, polls are ignored until the settle window has elapsed. From then on the
/// polled status is authoritative again and only differences to the published state are reported.
#[derive(Debug)]
pub struct SettleWindowReconciler {
    settle_window: Duration,
    last_mutation_at: Option<Instant>,
    published: TelevisionState,
}

impl SettleWindowReconciler {
    pub fn new(settle_window: Duration) -> Self {
        Self {
            settle_window,
            last_mutation_at: None,
            published: TelevisionState {
                active: false,
                active_identifier: NO_ACTIVITY,
            },
        }
    }

    pub fn published(&self) -> TelevisionState {
        self.published
    }

    pub fn is_settling(&self, now: Instant) -> bool {
        self.last_mutation_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.settle_window)
    }

    /// Records a locally requested state. `None` keeps the published value.
    pub fn publish_local(
        &mut self,
        now: Instant,
        active: Option<bool>,
        active_identifier: Option<u32>,
    ) -> Vec<TelevisionChange> {
        self.last_mutation_at = Some(now);

        let target = TelevisionState {
            active: active.unwrap_or(self.published.active),
            active_identifier: active_identifier.unwrap_or(self.published.active_identifier),
        };

        self.apply(target)
    }

    pub fn reconcile(&mut self, status: &HubStatus, now: Instant) -> Reconciliation {
        if self.is_settling(now) {
            return Reconciliation::Suppressed;
        }

        self.last_mutation_at = None;

        let active = status.is_active();
        let target = TelevisionState {
            active,
            //identifier only follows the hub while an activity is running
            active_identifier: if active && status.current_activity != NO_ACTIVITY {
                status.current_activity
            } else {
                self.published.active_identifier
            },
        };

        let changes = self.apply(target);
        if changes.is_empty() {
            Reconciliation::Unchanged
        } else {
            Reconciliation::Publish(changes)
        }
    }

    fn apply(&mut self, target: TelevisionState) -> Vec<TelevisionChange> {
        let mut changes = vec![];

        if target.active != self.published.active {
            changes.push(TelevisionChange::Active(target.active));
        }

        if target.active_identifier != self.published.active_identifier {
            changes.push(TelevisionChange::ActiveIdentifier(target.active_identifier));
        }

        self.published = target;
        changes
    }
}
