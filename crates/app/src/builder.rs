//! Builder session — the structured editor behind one definition.
//!
//! A session holds form state the way an operator edits it: selected device
//! and action names, condition rows whose threshold is still raw text, and
//! slot ids for every trigger, condition, and action. Slot ids come from
//! counters owned by the session, so two sessions never share numbering.
//!
//! The session converts to an [`AutomationDefinition`] on demand
//! ([`BuilderSession::definition`]), renders the text preview from it, and
//! can be hydrated back from persisted text ([`BuilderSession::from_text`]).

use std::fmt;

use devdash_domain::definition::{
    self, Action, AutomationDefinition, Condition, Operator, Trigger,
};
use devdash_domain::error::DevDashError;
use devdash_domain::registry::actions_for_device;
use devdash_domain::validation::{self, ValidationError};

use crate::ports::Registry;

/// Session-local handle for a trigger, condition, or action slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
    /// One-based display number, e.g. `Trigger #1`.
    #[must_use]
    pub fn number(self) -> u32 {
        self.0 + 1
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.number())
    }
}

/// Edit addressed to a slot that is not (or no longer) in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no slot {0} in this session")]
pub struct UnknownSlot(pub SlotId);

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSlot {
    id: SlotId,
    pub device: String,
    pub action: String,
    conditions: Vec<ConditionRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRow {
    id: SlotId,
    pub field: String,
    pub operator: Operator,
    /// Threshold as typed; converted when the definition is built.
    pub threshold: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSlot {
    id: SlotId,
    pub device: String,
    pub action: String,
}

impl TriggerSlot {
    #[must_use]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[must_use]
    pub fn conditions(&self) -> &[ConditionRow] {
        &self.conditions
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("Trigger {}", self.id)
    }
}

impl ConditionRow {
    #[must_use]
    pub fn id(&self) -> SlotId {
        self.id
    }
}

impl ActionSlot {
    #[must_use]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("Action {}", self.id)
    }
}

/// Form state for one new or edited automation.
#[derive(Debug, Clone, Default)]
pub struct BuilderSession {
    pub interval: String,
    pub condition_logic: String,
    triggers: Vec<TriggerSlot>,
    actions: Vec<ActionSlot>,
    next_trigger: u32,
    next_condition: u32,
    next_action: u32,
}

impl BuilderSession {
    /// Start an empty session for a new automation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session pre-filled from persisted definition text.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::from_definition(&definition::parse(text))
    }

    /// Start a session pre-filled from a definition.
    #[must_use]
    pub fn from_definition(def: &AutomationDefinition) -> Self {
        let mut session = Self {
            interval: def.interval.clone(),
            condition_logic: def.condition_logic.clone(),
            ..Self::default()
        };
        for trigger in &def.triggers {
            session.add_trigger(Some(trigger));
        }
        for action in &def.actions {
            session.add_action(Some(action));
        }
        tracing::debug!(
            triggers = session.triggers.len(),
            actions = session.actions.len(),
            "hydrated builder session"
        );
        session
    }

    #[must_use]
    pub fn triggers(&self) -> &[TriggerSlot] {
        &self.triggers
    }

    #[must_use]
    pub fn actions(&self) -> &[ActionSlot] {
        &self.actions
    }

    pub fn set_interval(&mut self, interval: impl Into<String>) {
        self.interval = interval.into();
    }

    pub fn set_condition_logic(&mut self, logic: impl Into<String>) {
        self.condition_logic = logic.into();
    }

    /// Append a trigger, copying `data` when given.
    ///
    /// A trigger added without data starts with one blank condition row;
    /// one added from data gets exactly the data's conditions.
    pub fn add_trigger(&mut self, data: Option<&Trigger>) -> SlotId {
        let id = SlotId(self.next_trigger);
        self.next_trigger += 1;
        self.triggers.push(TriggerSlot {
            id,
            device: data.map(|t| t.device.clone()).unwrap_or_default(),
            action: data.map(|t| t.action.clone()).unwrap_or_default(),
            conditions: Vec::new(),
        });
        match data {
            Some(trigger) => {
                for condition in &trigger.conditions {
                    self.push_condition(id, Some(condition));
                }
            }
            None => {
                self.push_condition(id, None);
            }
        }
        id
    }

    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when `id` is not a trigger of this session.
    pub fn remove_trigger(&mut self, id: SlotId) -> Result<(), UnknownSlot> {
        let index = self
            .triggers
            .iter()
            .position(|t| t.id == id)
            .ok_or(UnknownSlot(id))?;
        self.triggers.remove(index);
        Ok(())
    }

    /// Select a device; the selected action is cleared since the new
    /// device may not offer it.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when `id` is not a trigger of this session.
    pub fn set_trigger_device(
        &mut self,
        id: SlotId,
        device: impl Into<String>,
    ) -> Result<(), UnknownSlot> {
        let slot = self.trigger_mut(id)?;
        slot.device = device.into();
        slot.action.clear();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when `id` is not a trigger of this session.
    pub fn set_trigger_action(
        &mut self,
        id: SlotId,
        action: impl Into<String>,
    ) -> Result<(), UnknownSlot> {
        self.trigger_mut(id)?.action = action.into();
        Ok(())
    }

    /// Append a condition row to a trigger.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when `trigger` is not a trigger of this session.
    pub fn add_condition(
        &mut self,
        trigger: SlotId,
        data: Option<&Condition>,
    ) -> Result<SlotId, UnknownSlot> {
        self.trigger_mut(trigger)?;
        Ok(self.push_condition(trigger, data))
    }

    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when no trigger holds a condition with `id`.
    pub fn remove_condition(&mut self, id: SlotId) -> Result<(), UnknownSlot> {
        for trigger in &mut self.triggers {
            if let Some(index) = trigger.conditions.iter().position(|c| c.id == id) {
                trigger.conditions.remove(index);
                return Ok(());
            }
        }
        Err(UnknownSlot(id))
    }

    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when no trigger holds a condition with `id`.
    pub fn set_condition_field(
        &mut self,
        id: SlotId,
        field: impl Into<String>,
    ) -> Result<(), UnknownSlot> {
        self.condition_mut(id)?.field = field.into();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when no trigger holds a condition with `id`.
    pub fn set_condition_operator(
        &mut self,
        id: SlotId,
        operator: Operator,
    ) -> Result<(), UnknownSlot> {
        self.condition_mut(id)?.operator = operator;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when no trigger holds a condition with `id`.
    pub fn set_condition_threshold(
        &mut self,
        id: SlotId,
        threshold: impl Into<String>,
    ) -> Result<(), UnknownSlot> {
        self.condition_mut(id)?.threshold = threshold.into();
        Ok(())
    }

    /// Append an action, copying `data` when given.
    pub fn add_action(&mut self, data: Option<&Action>) -> SlotId {
        let id = SlotId(self.next_action);
        self.next_action += 1;
        self.actions.push(ActionSlot {
            id,
            device: data.map(|a| a.device.clone()).unwrap_or_default(),
            action: data.map(|a| a.action.clone()).unwrap_or_default(),
        });
        id
    }

    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when `id` is not an action of this session.
    pub fn remove_action(&mut self, id: SlotId) -> Result<(), UnknownSlot> {
        let index = self
            .actions
            .iter()
            .position(|a| a.id == id)
            .ok_or(UnknownSlot(id))?;
        self.actions.remove(index);
        Ok(())
    }

    /// Select a device; the selected action is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when `id` is not an action of this session.
    pub fn set_action_device(
        &mut self,
        id: SlotId,
        device: impl Into<String>,
    ) -> Result<(), UnknownSlot> {
        let slot = self.action_mut(id)?;
        slot.device = device.into();
        slot.action.clear();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`UnknownSlot`] when `id` is not an action of this session.
    pub fn set_action_action(
        &mut self,
        id: SlotId,
        action: impl Into<String>,
    ) -> Result<(), UnknownSlot> {
        self.action_mut(id)?.action = action.into();
        Ok(())
    }

    /// Build the definition to serialize and submit.
    ///
    /// A threshold is read up to its first non-numeric character; one that
    /// does not start with a number becomes `0`.
    #[must_use]
    pub fn definition(&self) -> AutomationDefinition {
        self.build(|raw| definition::leading_number(raw).unwrap_or(0.0))
    }

    /// Text preview of [`Self::definition`].
    #[must_use]
    pub fn preview(&self) -> String {
        definition::serialize(&self.definition())
    }

    /// Check the form, returning the first violated rule.
    ///
    /// Unlike [`Self::definition`], a threshold that does not start with a
    /// number is reported rather than defaulted.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] in checking order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(&self.build(|raw| {
            definition::leading_number(raw).unwrap_or(f64::NAN)
        }))
    }

    fn build(&self, threshold: impl Fn(&str) -> f64) -> AutomationDefinition {
        AutomationDefinition {
            interval: self.interval.clone(),
            condition_logic: self.condition_logic.clone(),
            triggers: self
                .triggers
                .iter()
                .map(|slot| Trigger {
                    device: slot.device.clone(),
                    action: slot.action.clone(),
                    conditions: slot
                        .conditions
                        .iter()
                        .map(|row| Condition {
                            field: row.field.clone(),
                            operator: row.operator,
                            threshold: threshold(&row.threshold),
                        })
                        .collect(),
                })
                .collect(),
            actions: self
                .actions
                .iter()
                .map(|slot| Action::new(slot.device.clone(), slot.action.clone()))
                .collect(),
        }
    }

    fn push_condition(&mut self, trigger: SlotId, data: Option<&Condition>) -> SlotId {
        let id = SlotId(self.next_condition);
        self.next_condition += 1;
        let row = ConditionRow {
            id,
            field: data.map(|c| c.field.clone()).unwrap_or_default(),
            operator: data.map(|c| c.operator).unwrap_or_default(),
            threshold: data.map(|c| c.threshold.to_string()).unwrap_or_default(),
        };
        if let Some(slot) = self.triggers.iter_mut().find(|t| t.id == trigger) {
            slot.conditions.push(row);
        }
        id
    }

    fn trigger_mut(&mut self, id: SlotId) -> Result<&mut TriggerSlot, UnknownSlot> {
        self.triggers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(UnknownSlot(id))
    }

    fn condition_mut(&mut self, id: SlotId) -> Result<&mut ConditionRow, UnknownSlot> {
        self.triggers
            .iter_mut()
            .flat_map(|t| t.conditions.iter_mut())
            .find(|c| c.id == id)
            .ok_or(UnknownSlot(id))
    }

    fn action_mut(&mut self, id: SlotId) -> Result<&mut ActionSlot, UnknownSlot> {
        self.actions
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(UnknownSlot(id))
    }
}

/// Action names a device offers, for the action selector.
///
/// An empty or unknown device yields no options.
///
/// # Errors
///
/// Propagates lookup errors from the registry.
pub fn action_options<R: Registry>(
    registry: &R,
    device: &str,
) -> Result<Vec<String>, DevDashError> {
    if device.is_empty() {
        return Ok(Vec::new());
    }
    let Some(found) = registry.device_by_name(device)? else {
        return Ok(Vec::new());
    };
    let actions = registry.actions()?;
    Ok(actions_for_device(&found, &actions)
        .into_iter()
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use devdash_domain::id::{ActionId, DeviceId};
    use devdash_domain::registry::{Device, DeviceAction};

    const SCENARIO: &str = "interval: \"5m\"\ntriggers:\n  - device: \"Thermostat\"\n    action: \"ReadTemp\"\n    conditions:\n      - field: \"temperature\"\n        operator: \">\"\n        threshold: 30\nactions:\n  - device: \"Fan\"\n    action: \"TurnOn\"";

    #[test]
    fn should_reproduce_text_after_hydration() {
        let session = BuilderSession::from_text(SCENARIO);
        assert_eq!(session.preview(), SCENARIO);
        assert_eq!(session.validate(), Ok(()));
    }

    #[test]
    fn should_start_fresh_trigger_with_one_blank_condition() {
        let mut session = BuilderSession::new();
        let id = session.add_trigger(None);
        assert_eq!(session.triggers()[0].id(), id);
        assert_eq!(session.triggers()[0].conditions().len(), 1);
        assert_eq!(session.triggers()[0].conditions()[0].field, "");
    }

    #[test]
    fn should_number_slots_per_session() {
        let mut first = BuilderSession::new();
        first.add_trigger(None);
        first.add_trigger(None);

        let mut second = BuilderSession::new();
        second.add_trigger(None);
        assert_eq!(second.triggers()[0].label(), "Trigger #1");
        assert_eq!(first.triggers()[1].label(), "Trigger #2");
    }

    #[test]
    fn should_not_reuse_numbers_after_removal() {
        let mut session = BuilderSession::new();
        let a = session.add_action(None);
        session.add_action(None);
        session.remove_action(a).unwrap();
        let c = session.add_action(None);
        assert_eq!(session.actions().len(), 2);
        assert_eq!(c.number(), 3);
    }

    #[test]
    fn should_reset_numbering_when_hydrated() {
        let session = BuilderSession::from_text(SCENARIO);
        assert_eq!(session.triggers()[0].label(), "Trigger #1");
        assert_eq!(session.actions()[0].label(), "Action #1");
    }

    #[test]
    fn should_clear_action_when_device_changes() {
        let mut session = BuilderSession::from_text(SCENARIO);
        let trigger = session.triggers()[0].id();
        session.set_trigger_device(trigger, "Hygrometer").unwrap();
        assert_eq!(session.triggers()[0].action, "");
        assert_eq!(
            session.validate(),
            Err(ValidationError::TriggerActionMissing { trigger: 0 })
        );

        let action = session.actions()[0].id();
        session.set_action_device(action, "Heater").unwrap();
        assert_eq!(session.actions()[0].action, "");
    }

    #[test]
    fn should_collapse_bad_threshold_to_zero_in_definition() {
        let mut session = BuilderSession::from_text(SCENARIO);
        let row = session.triggers()[0].conditions()[0].id();
        session.set_condition_threshold(row, "warm").unwrap();
        let def = session.definition();
        assert!(def.triggers[0].conditions[0].threshold.abs() < f64::EPSILON);
        assert!(session.preview().contains("threshold: 0"));
    }

    #[test]
    fn should_read_threshold_up_to_trailing_text() {
        let mut session = BuilderSession::from_text(SCENARIO);
        let row = session.triggers()[0].conditions()[0].id();
        session.set_condition_threshold(row, "30 # hot").unwrap();
        assert_eq!(session.validate(), Ok(()));
        let threshold = session.definition().triggers[0].conditions[0].threshold;
        assert!((threshold - 30.0).abs() < f64::EPSILON);

        session.set_condition_threshold(row, "12abc").unwrap();
        assert!(session.preview().contains("threshold: 12"));
    }

    #[test]
    fn should_report_bad_threshold_when_validating() {
        let mut session = BuilderSession::from_text(SCENARIO);
        let row = session.triggers()[0].conditions()[0].id();
        session.set_condition_threshold(row, "").unwrap();
        let err = session.validate().unwrap_err();
        session.set_condition_threshold(row, "abc").unwrap();
        assert_eq!(session.validate(), Err(err.clone()));
        assert_eq!(err.to_string(), "Condition threshold is required");
        assert_eq!(
            err,
            ValidationError::MissingThreshold {
                trigger: 0,
                condition: 0
            }
        );
    }

    #[test]
    fn should_require_condition_after_removing_last_row() {
        let mut session = BuilderSession::from_text(SCENARIO);
        let row = session.triggers()[0].conditions()[0].id();
        session.remove_condition(row).unwrap();
        assert!(!session.preview().contains("conditions:"));
        assert_eq!(
            session.validate(),
            Err(ValidationError::TriggerWithoutConditions { trigger: 0 })
        );
    }

    #[test]
    fn should_edit_condition_fields() {
        let mut session = BuilderSession::new();
        session.set_interval("30s");
        let trigger = session.add_trigger(None);
        session.set_trigger_action(trigger, "ReadTemp").unwrap();
        let row = session.triggers()[0].conditions()[0].id();
        session.set_condition_field(row, "humidity").unwrap();
        session.set_condition_operator(row, Operator::Le).unwrap();
        session.set_condition_threshold(row, " 40.5 ").unwrap();
        let extra = session.add_condition(trigger, None).unwrap();
        session.remove_condition(extra).unwrap();

        let def = session.definition();
        assert_eq!(
            def.triggers[0].conditions,
            vec![Condition::new("humidity", Operator::Le, 40.5)]
        );
    }

    #[test]
    fn should_reject_edits_to_unknown_slots() {
        let mut session = BuilderSession::new();
        let trigger = session.add_trigger(None);
        session.remove_trigger(trigger).unwrap();
        assert_eq!(session.remove_trigger(trigger), Err(UnknownSlot(trigger)));
        assert!(session.add_condition(trigger, None).is_err());
        assert!(session.set_action_action(SlotId(9), "On").is_err());
    }

    #[test]
    fn should_emit_logic_only_when_set() {
        let mut session = BuilderSession::from_text(SCENARIO);
        assert!(!session.preview().contains("condition_logic"));
        session.set_condition_logic("or");
        assert!(session.preview().contains("condition_logic: \"or\""));
    }

    #[test]
    fn should_list_action_options_for_device() {
        let registry = InMemoryRegistry::new(
            vec![Device {
                id: DeviceId::new(1),
                name: "Fan".to_string(),
                device_type: "switch".to_string(),
                chip: String::new(),
                board: String::new(),
                ip: "192.168.1.21".to_string(),
                actions: vec![ActionId::new(2)],
            }],
            vec![
                DeviceAction {
                    id: ActionId::new(1),
                    name: "ReadTemp".to_string(),
                    path: "sensor.read".to_string(),
                    params: String::new(),
                },
                DeviceAction {
                    id: ActionId::new(2),
                    name: "TurnOn".to_string(),
                    path: "switch.on".to_string(),
                    params: String::new(),
                },
            ],
        );
        assert_eq!(action_options(&registry, "Fan").unwrap(), ["TurnOn"]);
        assert!(action_options(&registry, "").unwrap().is_empty());
        assert!(action_options(&registry, "Ghost").unwrap().is_empty());
    }
}
