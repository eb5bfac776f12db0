mod client;
mod discovery;
mod model;

#[cfg(test)]
pub mod testing;

pub use client::HarmonyHttpClient;
pub use discovery::discover_hubs;
pub use model::{Activity, Device, DeviceCapabilities, Hub, HubStatus};

use serde_json::Value;

pub const NO_ACTIVITY: u32 = 0;

/// Access to the hub HTTP API. Paths are relative to the `/hubs` root.
///
/// Implementations never fail: `get` degrades to an empty JSON object and a failed
/// `put`/`post` pulse is dropped, so callers treat "no data" like "hub off".
pub trait HarmonyApi: Clone + Send + Sync + 'static {
    fn get(&self, path: &str) -> impl Future<Output = Value> + Send;

    /// Issues the request `repeat` times, one after the other.
    fn put(&self, path: &str, repeat: u32) -> impl Future<Output = ()> + Send;

    /// Issues the request `repeat` times, one after the other.
    fn post(&self, path: &str, repeat: u32) -> impl Future<Output = ()> + Send;
}

pub mod path {
    use super::VolumeCommand;

    pub fn status(hub: &str) -> String {
        format!("{}/status", hub)
    }

    pub fn activities(hub: &str) -> String {
        format!("{}/activities", hub)
    }

    pub fn activity(hub: &str, activity: &str) -> String {
        format!("{}/activities/{}", hub, activity)
    }

    pub fn devices(hub: &str) -> String {
        format!("{}/devices", hub)
    }

    pub fn device_commands(hub: &str, device: &str) -> String {
        format!("{}/devices/{}/commands", hub, device)
    }

    pub fn device_command(hub: &str, device: &str, command: &str) -> String {
        format!("{}/devices/{}/commands/{}", hub, device, command)
    }

    pub fn off(hub: &str) -> String {
        format!("{}/off", hub)
    }

    pub fn volume(hub: &str, command: VolumeCommand) -> String {
        format!("{}/commands/{}", hub, command)
    }
}

pub mod command {
    pub const POWER_ON: &str = "power-on";
    pub const POWER_OFF: &str = "power-off";
    pub const POWER_TOGGLE: &str = "power-toggle";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum VolumeCommand {
    #[display("volume-up")]
    Up,
    #[display("volume-down")]
    Down,
}
