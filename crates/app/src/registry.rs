//! In-memory registry — a loaded snapshot of devices and actions.
//!
//! Useful wherever the registry is small enough to hold in full: the
//! command-line tool loads one from a JSON file, and tests build one inline.

use serde::Deserialize;

use devdash_domain::error::DevDashError;
use devdash_domain::registry::{Device, DeviceAction};

use crate::ports::Registry;

/// Devices and actions as listed by the CRUD backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InMemoryRegistry {
    devices: Vec<Device>,
    actions: Vec<DeviceAction>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new(devices: Vec<Device>, actions: Vec<DeviceAction>) -> Self {
        Self { devices, actions }
    }

    /// Load a `{"devices": [...], "actions": [...]}` document.
    ///
    /// # Errors
    ///
    /// Returns [`DevDashError::Storage`] when the document does not match
    /// that shape, or a [`DevDashError::Registry`] naming the first action
    /// whose `params` is not JSON.
    pub fn from_json(json: &str) -> Result<Self, DevDashError> {
        let registry: Self =
            serde_json::from_str(json).map_err(|err| DevDashError::Storage(Box::new(err)))?;
        for action in &registry.actions {
            action.validate()?;
        }
        Ok(registry)
    }

    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }
}

impl Registry for InMemoryRegistry {
    fn device_by_name(&self, name: &str) -> Result<Option<Device>, DevDashError> {
        Ok(self.devices.iter().find(|d| d.name == name).cloned())
    }

    fn action_by_name(&self, name: &str) -> Result<Option<DeviceAction>, DevDashError> {
        Ok(self.actions.iter().find(|a| a.name == name).cloned())
    }

    fn actions(&self) -> Result<Vec<DeviceAction>, DevDashError> {
        Ok(self.actions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdash_domain::error::RegistryError;

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::from_json(
            r#"{
                "devices": [
                    {"id": 1, "name": "Thermostat", "type": "sensor", "ip": "192.168.1.20", "actions": [10]},
                    {"id": 2, "name": "Fan", "type": "switch", "ip": "192.168.1.21", "actions": [11]}
                ],
                "actions": [
                    {"id": 10, "name": "ReadTemp", "path": "sensor.read", "params": ""},
                    {"id": 11, "name": "TurnOn", "path": "switch.on", "params": "{}"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn should_reject_snapshot_with_malformed_params() {
        let err = InMemoryRegistry::from_json(
            r#"{"actions": [{"id": 10, "name": "Dim", "path": "light.dim", "params": "{level"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DevDashError::Registry(RegistryError::InvalidParams(name)) if name == "Dim"
        ));
    }

    #[test]
    fn should_report_malformed_snapshot_as_storage_error() {
        let err = InMemoryRegistry::from_json("{\"devices\": 3}").unwrap_err();
        assert!(matches!(err, DevDashError::Storage(_)));
    }

    #[test]
    fn should_resolve_assigned_pair() {
        let (device, action) = registry().resolve("Fan", "TurnOn").unwrap();
        assert_eq!(device.id.get(), 2);
        assert_eq!(action.id.get(), 11);
    }

    #[test]
    fn should_report_unknown_device() {
        let err = registry().resolve("Heater", "TurnOn").unwrap_err();
        assert!(matches!(
            err,
            DevDashError::Registry(RegistryError::DeviceNotFound(name)) if name == "Heater"
        ));
    }

    #[test]
    fn should_report_unknown_action() {
        let err = registry().resolve("Fan", "Spin").unwrap_err();
        assert!(matches!(
            err,
            DevDashError::Registry(RegistryError::ActionNotFound(_))
        ));
    }

    #[test]
    fn should_report_unassigned_action() {
        let err = registry().resolve("Fan", "ReadTemp").unwrap_err();
        match err {
            DevDashError::Registry(inner) => assert_eq!(
                inner.to_string(),
                "action 'ReadTemp' is not assigned to device 'Fan'"
            ),
            other => panic!("expected registry error, got {other:?}"),
        }
    }
}
