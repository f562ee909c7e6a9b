//! Registry port — resolves the device and action names a definition uses.

use devdash_domain::error::{DevDashError, RegistryError};
use devdash_domain::registry::{Device, DeviceAction};

/// Read access to registered devices and actions, keyed by name.
pub trait Registry {
    fn device_by_name(&self, name: &str) -> Result<Option<Device>, DevDashError>;

    fn action_by_name(&self, name: &str) -> Result<Option<DeviceAction>, DevDashError>;

    /// All registered actions, in registry order.
    fn actions(&self) -> Result<Vec<DeviceAction>, DevDashError>;

    /// Resolve a device/action name pair and check the action is assigned
    /// to the device.
    ///
    /// # Errors
    ///
    /// Returns [`DevDashError::Registry`] when either name is unknown or the
    /// action is not assigned to the device, or any lookup error.
    fn resolve(&self, device: &str, action: &str) -> Result<(Device, DeviceAction), DevDashError> {
        let found_device = self
            .device_by_name(device)?
            .ok_or_else(|| RegistryError::DeviceNotFound(device.to_string()))?;
        let found_action = self
            .action_by_name(action)?
            .ok_or_else(|| RegistryError::ActionNotFound(action.to_string()))?;
        if !found_device.supports(found_action.id) {
            return Err(RegistryError::NotAssigned {
                device: device.to_string(),
                action: action.to_string(),
            }
            .into());
        }
        Ok((found_device, found_action))
    }
}
