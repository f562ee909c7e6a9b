//! Registry records — devices and the actions they can run.
//!
//! Definitions refer to devices and actions by *name*; these records are
//! what those names resolve to.

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::id::{ActionId, DeviceId};

/// A physical device reachable over the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(default)]
    pub chip: String,
    #[serde(default)]
    pub board: String,
    /// Host or `host:port` of the device's RPC endpoint.
    #[serde(default)]
    pub ip: String,
    /// Actions this device is allowed to run.
    #[serde(default)]
    pub actions: Vec<ActionId>,
}

/// A named RPC call a device can be asked to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAction {
    pub id: ActionId,
    pub name: String,
    /// RPC method path, e.g. `"sensor.read"`.
    #[serde(default)]
    pub path: String,
    /// JSON-encoded parameters, or empty.
    #[serde(default)]
    pub params: String,
}

impl Device {
    #[must_use]
    pub fn supports(&self, action: ActionId) -> bool {
        self.actions.contains(&action)
    }
}

impl DeviceAction {
    /// `params` must be empty or valid JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidParams`] when `params` does not parse.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.params.is_empty() {
            return Ok(());
        }
        serde_json::from_str::<serde_json::Value>(&self.params)
            .map(|_| ())
            .map_err(|_| RegistryError::InvalidParams(self.name.clone()))
    }
}

/// Names of the actions `device` may run, in registry order.
#[must_use]
pub fn actions_for_device<'a>(device: &Device, actions: &'a [DeviceAction]) -> Vec<&'a str> {
    actions
        .iter()
        .filter(|a| device.supports(a.id))
        .map(|a| a.name.as_str())
        .collect()
}
