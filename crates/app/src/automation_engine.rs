//! Automation engine — polls enabled automations and runs the ones that are due.
//!
//! For each due automation the engine runs every trigger's device action,
//! evaluates the trigger's conditions against the device reply, combines the
//! per-trigger results with the definition's condition logic and, when the
//! combination holds, executes the automation's actions in order.

use serde_json::Value;

use devdash_domain::automation::Automation;
use devdash_domain::definition::{AutomationDefinition, Trigger};
use devdash_domain::error::{DevDashError, ExecutionError};
use devdash_domain::id::AutomationId;
use devdash_domain::time::Timestamp;

use crate::ports::{ActionExecutor, AutomationRepository, Registry};

/// Polling automation engine.
pub struct AutomationEngine<AR, RG, EX> {
    automation_repo: AR,
    registry: RG,
    executor: EX,
}

impl<AR, RG, EX> AutomationEngine<AR, RG, EX>
where
    AR: AutomationRepository,
    RG: Registry,
    EX: ActionExecutor,
{
    /// Create a new engine.
    pub fn new(automation_repo: AR, registry: RG, executor: EX) -> Self {
        Self {
            automation_repo,
            registry,
            executor,
        }
    }

    /// Run every enabled automation that is due at `now`.
    ///
    /// A failing automation is logged and skipped; the others still run.
    /// Returns the ids of the automations whose actions were executed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if loading automations fails.
    #[tracing::instrument(skip(self))]
    pub fn process_due(&self, now: Timestamp) -> Result<Vec<AutomationId>, DevDashError> {
        let automations = self.automation_repo.get_all()?;
        let mut fired = Vec::new();

        for mut automation in automations.into_iter().filter(|a| a.enabled) {
            tracing::debug!(automation = %automation.name, "processing automation");
            match self.process_one(&mut automation, now) {
                Ok(true) => {
                    if let Some(id) = automation.id {
                        fired.push(id);
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(
                        automation = %automation.name,
                        error = %err,
                        "automation failed"
                    );
                }
            }
        }

        Ok(fired)
    }

    fn process_one(
        &self,
        automation: &mut Automation,
        now: Timestamp,
    ) -> Result<bool, DevDashError> {
        automation.last_check = Some(now);
        if let Err(err) = self.automation_repo.update(automation.clone()) {
            tracing::warn!(
                automation = %automation.name,
                error = %err,
                "failed to record last check"
            );
        }

        if !automation.is_due(now)? {
            return Ok(false);
        }

        let def = automation.parse_definition();
        let results = self.run_triggers(&def)?;

        automation.last_triggers_run = Some(now);
        self.automation_repo.update(automation.clone())?;

        if !apply_condition_logic(&results, &def.condition_logic) {
            return Ok(false);
        }

        for action in &def.actions {
            let reply = self.execute(&action.device, &action.action)?;
            automation.last_action_run = Some(now);
            self.automation_repo.update(automation.clone())?;
            tracing::info!(
                automation = %automation.name,
                device = %action.device,
                action = %action.action,
                %reply,
                "executed automation action"
            );
        }

        Ok(true)
    }

    fn run_triggers(&self, def: &AutomationDefinition) -> Result<Vec<bool>, DevDashError> {
        let mut results = Vec::with_capacity(def.triggers.len());
        for trigger in &def.triggers {
            let reply = self.execute(&trigger.device, &trigger.action)?;
            if !reply.is_object() {
                return Err(ExecutionError::InvalidResponse {
                    device: trigger.device.clone(),
                    action: trigger.action.clone(),
                }
                .into());
            }
            let met = evaluate_conditions(&reply, trigger)?;
            tracing::debug!(
                device = %trigger.device,
                action = %trigger.action,
                met,
                "trigger evaluated"
            );
            results.push(met);
        }
        Ok(results)
    }

    fn execute(&self, device: &str, action: &str) -> Result<Value, DevDashError> {
        let (device, action) = self.registry.resolve(device, action)?;
        self.executor.execute(device.id, action.id)
    }
}

/// Whether every condition of `trigger` holds for the device `response`.
///
/// Conditions read numbers out of the response by dotted path, so
/// `"sensor.temp"` looks up `response["sensor"]["temp"]`. A trigger without
/// conditions holds.
///
/// # Errors
///
/// Returns [`ExecutionError::FieldNotFound`], [`ExecutionError::NotAnObject`]
/// or [`ExecutionError::NotANumber`] when a path does not lead to a number.
pub fn evaluate_conditions(response: &Value, trigger: &Trigger) -> Result<bool, DevDashError> {
    for condition in &trigger.conditions {
        let value = field_value(response, &condition.field)?;
        if !condition.holds_for(value) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Combine per-trigger results: `"or"` needs any, anything else needs all.
/// No results at all counts as holding.
#[must_use]
pub fn apply_condition_logic(results: &[bool], logic: &str) -> bool {
    if results.is_empty() {
        return true;
    }
    if logic == "or" {
        results.iter().any(|met| *met)
    } else {
        results.iter().all(|met| *met)
    }
}

fn field_value(data: &Value, field: &str) -> Result<f64, ExecutionError> {
    let mut current = data;
    for part in field.split('.') {
        let object = current
            .as_object()
            .ok_or_else(|| ExecutionError::NotAnObject(part.to_string()))?;
        current = object
            .get(part)
            .ok_or_else(|| ExecutionError::FieldNotFound(part.to_string()))?;
    }
    current
        .as_f64()
        .ok_or_else(|| ExecutionError::NotANumber(field.to_string()))
}
