//! Automation repository port — persistence for automation records.

use devdash_domain::automation::Automation;
use devdash_domain::error::DevDashError;
use devdash_domain::id::AutomationId;

/// Repository for persisting and querying [`Automation`]s.
pub trait AutomationRepository {
    /// Store a new automation; the returned record carries its assigned id.
    fn create(&self, automation: Automation) -> Result<Automation, DevDashError>;

    /// Get an automation by its unique identifier.
    fn get_by_id(&self, id: AutomationId) -> Result<Option<Automation>, DevDashError>;

    /// Get all automations.
    fn get_all(&self) -> Result<Vec<Automation>, DevDashError>;

    /// Replace the stored automation with the same id.
    fn update(&self, automation: Automation) -> Result<Automation, DevDashError>;

    /// Delete an automation by its unique identifier.
    fn delete(&self, id: AutomationId) -> Result<(), DevDashError>;
}
