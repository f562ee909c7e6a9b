//! Executor port — runs one registered action on one registered device.

use devdash_domain::error::DevDashError;
use devdash_domain::id::{ActionId, DeviceId};

/// Sends an action to a device and returns the device's reply.
///
/// The reply payload is implementation-defined; trigger conditions read
/// numeric fields out of it by dotted path.
pub trait ActionExecutor {
    fn execute(
        &self,
        device: DeviceId,
        action: ActionId,
    ) -> Result<serde_json::Value, DevDashError>;
}
