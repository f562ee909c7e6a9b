//! Automation service — use-cases for managing automations.

use devdash_domain::automation::Automation;
use devdash_domain::definition::AutomationDefinition;
use devdash_domain::error::{DevDashError, NotFoundError};
use devdash_domain::id::AutomationId;
use devdash_domain::time::now;

use crate::ports::{AutomationRepository, Registry};

/// Application service for automation CRUD operations.
///
/// Writes are validated twice: structurally, by the record's own rules, and
/// against the registry, so every referenced device exists and runs the
/// referenced action.
pub struct AutomationService<R, G> {
    repo: R,
    registry: G,
}

impl<R: AutomationRepository, G: Registry> AutomationService<R, G> {
    /// Create a new service backed by the given repository and registry.
    pub fn new(repo: R, registry: G) -> Self {
        Self { repo, registry }
    }

    /// Create a new automation after validating it.
    ///
    /// Stamps `updated_at`, and `created_at` when the caller left it unset.
    ///
    /// # Errors
    ///
    /// Returns [`DevDashError::Validation`] or [`DevDashError::Registry`] if
    /// the record is rejected, or a storage error from the repository.
    #[tracing::instrument(skip(self, automation), fields(automation_name = %automation.name))]
    pub fn create_automation(
        &self,
        mut automation: Automation,
    ) -> Result<Automation, DevDashError> {
        self.check(&automation)?;
        let ts = now();
        automation.created_at.get_or_insert(ts);
        automation.updated_at = Some(ts);
        let created = self.repo.create(automation)?;
        tracing::info!(id = ?created.id, "automation created");
        Ok(created)
    }

    /// Look up an automation by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DevDashError::NotFound`] when no automation with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub fn get_automation(&self, id: AutomationId) -> Result<Automation, DevDashError> {
        self.repo.get_by_id(id)?.ok_or_else(|| {
            NotFoundError {
                entity: "Automation",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all automations.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub fn list_automations(&self) -> Result<Vec<Automation>, DevDashError> {
        self.repo.get_all()
    }

    /// Get all enabled automations.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub fn list_enabled(&self) -> Result<Vec<Automation>, DevDashError> {
        Ok(self
            .repo
            .get_all()?
            .into_iter()
            .filter(|a| a.enabled)
            .collect())
    }

    /// Update an existing automation, stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DevDashError::NotFound`] when the record has no id or the id
    /// is unknown, a validation or registry error if the record is rejected,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self, automation), fields(automation_id = ?automation.id))]
    pub fn update_automation(
        &self,
        mut automation: Automation,
    ) -> Result<Automation, DevDashError> {
        let id = automation.id.ok_or_else(|| NotFoundError {
            entity: "Automation",
            id: String::from("<unsaved>"),
        })?;
        self.get_automation(id)?;
        self.check(&automation)?;
        automation.updated_at = Some(now());
        self.repo.update(automation)
    }

    /// Delete an automation by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub fn delete_automation(&self, id: AutomationId) -> Result<(), DevDashError> {
        self.repo.delete(id)
    }

    /// Run every check a write goes through, without writing.
    ///
    /// # Errors
    ///
    /// Returns the first validation or registry error.
    pub fn check(&self, automation: &Automation) -> Result<AutomationDefinition, DevDashError> {
        let def = automation.checked_definition()?;
        check_references(&self.registry, &def)?;
        Ok(def)
    }
}

/// Check every trigger and action reference against the registry, in
/// definition order.
///
/// # Errors
///
/// Returns [`DevDashError::Registry`] for the first unresolvable pair.
pub fn check_references<G: Registry>(
    registry: &G,
    def: &AutomationDefinition,
) -> Result<(), DevDashError> {
    let pairs = def
        .triggers
        .iter()
        .map(|t| (t.device.as_str(), t.action.as_str()))
        .chain(def.actions.iter().map(|a| (a.device.as_str(), a.action.as_str())));
    for (device, action) in pairs {
        registry.resolve(device, action)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use devdash_domain::definition::{Action, Condition, Operator, Trigger};
    use devdash_domain::error::RegistryError;
    use devdash_domain::validation::ValidationError;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryAutomationRepo {
        store: Mutex<BTreeMap<AutomationId, Automation>>,
    }

    impl AutomationRepository for InMemoryAutomationRepo {
        fn create(&self, mut automation: Automation) -> Result<Automation, DevDashError> {
            let mut store = self.store.lock().unwrap();
            let next = store.keys().last().map_or(1, |id| id.get() + 1);
            automation.id = Some(AutomationId::new(next));
            store.insert(AutomationId::new(next), automation.clone());
            Ok(automation)
        }

        fn get_by_id(&self, id: AutomationId) -> Result<Option<Automation>, DevDashError> {
            Ok(self.store.lock().unwrap().get(&id).cloned())
        }

        fn get_all(&self) -> Result<Vec<Automation>, DevDashError> {
            Ok(self.store.lock().unwrap().values().cloned().collect())
        }

        fn update(&self, automation: Automation) -> Result<Automation, DevDashError> {
            let id = automation.id.unwrap();
            self.store.lock().unwrap().insert(id, automation.clone());
            Ok(automation)
        }

        fn delete(&self, id: AutomationId) -> Result<(), DevDashError> {
            self.store.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::from_json(
            r#"{
                "devices": [
                    {"id": 1, "name": "Thermostat", "ip": "192.168.1.20", "actions": [10]},
                    {"id": 2, "name": "Fan", "ip": "192.168.1.21", "actions": [11]}
                ],
                "actions": [
                    {"id": 10, "name": "ReadTemp", "path": "sensor.read"},
                    {"id": 11, "name": "TurnOn", "path": "switch.on"}
                ]
            }"#,
        )
        .unwrap()
    }

    fn make_service() -> AutomationService<InMemoryAutomationRepo, InMemoryRegistry> {
        AutomationService::new(InMemoryAutomationRepo::default(), registry())
    }

    fn valid_definition() -> AutomationDefinition {
        AutomationDefinition::new("5m")
            .trigger(
                Trigger::new("Thermostat", "ReadTemp")
                    .condition(Condition::new("temperature", Operator::Gt, 30.0)),
            )
            .action(Action::new("Fan", "TurnOn"))
    }

    fn valid_automation() -> Automation {
        Automation::builder()
            .name("Cool down")
            .definition(&valid_definition())
            .build()
            .unwrap()
    }

    #[test]
    fn should_create_automation_when_valid() {
        let svc = make_service();
        let created = svc.create_automation(valid_automation()).unwrap();
        let id = created.id.unwrap();

        let fetched = svc.get_automation(id).unwrap();
        assert_eq!(fetched.name, "Cool down");
        assert_eq!(fetched.parse_definition(), valid_definition());
        assert!(fetched.created_at.is_some());
        assert_eq!(fetched.updated_at, fetched.created_at);
    }

    #[test]
    fn should_keep_caller_created_at_on_create() {
        use chrono::{TimeZone, Utc};

        let svc = make_service();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut auto = valid_automation();
        auto.created_at = Some(start);

        let created = svc.create_automation(auto).unwrap();
        assert_eq!(created.created_at, Some(start));
        assert!(created.updated_at.is_some_and(|ts| ts > start));
    }

    #[test]
    fn should_reject_create_when_definition_is_invalid() {
        let svc = make_service();
        let mut auto = valid_automation();
        auto.definition = "interval: \"0s\"".to_string();

        let result = svc.create_automation(auto);
        assert!(matches!(
            result,
            Err(DevDashError::Validation(ValidationError::IntervalTooShort))
        ));
        assert!(svc.list_automations().unwrap().is_empty());
    }

    #[test]
    fn should_reject_create_when_device_is_unknown() {
        let svc = make_service();
        let def = valid_definition().action(Action::new("Heater", "TurnOn"));
        let auto = Automation::builder()
            .name("Warm up")
            .definition(&def)
            .build()
            .unwrap();

        let result = svc.create_automation(auto);
        assert!(matches!(
            result,
            Err(DevDashError::Registry(RegistryError::DeviceNotFound(name))) if name == "Heater"
        ));
    }

    #[test]
    fn should_reject_create_when_action_not_assigned() {
        let svc = make_service();
        let def = AutomationDefinition::new("5m").action(Action::new("Fan", "ReadTemp"));
        let auto = Automation::builder()
            .name("Wrong pairing")
            .definition(&def)
            .build()
            .unwrap();

        let result = svc.create_automation(auto);
        assert!(matches!(
            result,
            Err(DevDashError::Registry(RegistryError::NotAssigned { .. }))
        ));
    }

    #[test]
    fn should_return_not_found_when_automation_missing() {
        let svc = make_service();
        let result = svc.get_automation(AutomationId::new(99));
        assert!(matches!(result, Err(DevDashError::NotFound(_))));
    }

    #[test]
    fn should_list_only_enabled_automations() {
        let svc = make_service();
        svc.create_automation(valid_automation()).unwrap();

        let mut disabled = valid_automation();
        disabled.name = "Disabled".to_string();
        disabled.enabled = false;
        svc.create_automation(disabled).unwrap();

        let enabled = svc.list_enabled().unwrap();
        assert_eq!(enabled.len(), 1);
        assert!(enabled[0].enabled);
        assert_eq!(svc.list_automations().unwrap().len(), 2);
    }

    #[test]
    fn should_update_automation() {
        let svc = make_service();
        let created = svc.create_automation(valid_automation()).unwrap();

        let mut updated = created.clone();
        updated.name = "Updated name".to_string();
        let saved = svc.update_automation(updated).unwrap();
        assert_eq!(saved.name, "Updated name");
        assert_eq!(saved.created_at, created.created_at);
        assert!(saved.updated_at >= created.updated_at);
        assert_eq!(svc.get_automation(created.id.unwrap()).unwrap().name, "Updated name");
    }

    #[test]
    fn should_reject_update_of_unsaved_automation() {
        let svc = make_service();
        let result = svc.update_automation(valid_automation());
        assert!(matches!(result, Err(DevDashError::NotFound(_))));
    }

    #[test]
    fn should_delete_automation() {
        let svc = make_service();
        let id = svc.create_automation(valid_automation()).unwrap().id.unwrap();

        svc.delete_automation(id).unwrap();

        let result = svc.get_automation(id);
        assert!(matches!(result, Err(DevDashError::NotFound(_))));
    }
}
