use std::time::Duration;

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    time::MissedTickBehavior,
};

use crate::harmony::{HarmonyApi, HubStatus, path};

pub struct StatusPoller<A: HarmonyApi> {
    api: A,
    hub: String,
    interval: Duration,
    tx: mpsc::Sender<HubStatus>,
}

impl<A: HarmonyApi> StatusPoller<A> {
    pub fn new(api: A, hub: &str, interval: Duration, tx: mpsc::Sender<HubStatus>) -> Self {
        Self {
            api,
            hub: hub.to_owned(),
            interval,
            tx,
        }
    }

    pub async fn run(self) {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;

            let status = HubStatus::from(&self.api.get(&path::status(&self.hub)).await);

            match self.tx.try_send(status) {
                Ok(_) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::debug!("Hub {} still busy with previous status, dropping poll", self.hub);
                    infrastructure::meter::increment("harmony_polls_dropped", &[("hub", self.hub.as_str())]);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!("Status channel of hub {} closed, stopping poller", self.hub);
                    break;
                }
            }
        }
    }
}
