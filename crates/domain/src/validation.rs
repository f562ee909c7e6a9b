//! Validation — structural rules a definition must satisfy before submission.
//!
//! [`validate`] stops at the first violated rule, checking in this order:
//! 1. interval present, well formed, and at least one second
//! 2. each trigger in order: device, action, at least one condition, then
//!    each condition's field and threshold
//! 3. at least one action
//! 4. each action in order: device and action
//!
//! Device and action names are only checked for presence here; whether they
//! exist in the registry is the application layer's concern.
//!
//! Stored records are held to a few extra rules on top of [`validate`],
//! gathered in [`validate_record_rules`].

use std::time::Duration;

use crate::definition::{
    self, AutomationDefinition, Condition, OperatorError, Trigger, UnknownOperator,
};
use crate::interval::{Interval, IntervalError};

/// Shortest interval a stored automation may poll at.
pub const MIN_RECORD_INTERVAL: Duration = Duration::from_secs(1);

/// The first rule a definition breaks. Messages are meant for operators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Interval is required")]
    IntervalRequired,

    #[error("Interval must be a valid duration (e.g. '5m', '1h', '30s')")]
    InvalidInterval(#[source] IntervalError),

    #[error("Interval must be at least 1s")]
    IntervalTooShort,

    #[error("Each trigger must have a device selected")]
    TriggerDeviceMissing { trigger: usize },

    #[error("Each trigger must have an action selected")]
    TriggerActionMissing { trigger: usize },

    #[error("Each trigger must have at least one condition")]
    TriggerWithoutConditions { trigger: usize },

    #[error("Condition field cannot be empty")]
    EmptyConditionField { trigger: usize, condition: usize },

    #[error("Condition threshold is required")]
    MissingThreshold { trigger: usize, condition: usize },

    #[error("{source}")]
    InvalidOperator {
        trigger: usize,
        condition: usize,
        #[source]
        source: UnknownOperator,
    },

    #[error("At least one action is required")]
    NoActions,

    #[error("Each action must have a device selected")]
    ActionDeviceMissing { action: usize },

    #[error("Each action must have an action selected")]
    ActionActionMissing { action: usize },

    #[error("condition_logic must be 'and' or 'or'")]
    InvalidConditionLogic(String),

    #[error("Name is required")]
    EmptyName,
}

/// Which input a [`ValidationError`] points at, for highlighting.
///
/// Indices are positions in the definition's `triggers`, a trigger's
/// `conditions`, or `actions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef {
    Name,
    Interval,
    ConditionLogic,
    TriggerDevice(usize),
    TriggerAction(usize),
    TriggerConditions(usize),
    ConditionField { trigger: usize, condition: usize },
    ConditionOperator { trigger: usize, condition: usize },
    ConditionThreshold { trigger: usize, condition: usize },
    Actions,
    ActionDevice(usize),
    ActionAction(usize),
}

/// Renders as a path into the definition, e.g. `triggers[0].conditions[1].threshold`.
impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Interval => f.write_str("interval"),
            Self::ConditionLogic => f.write_str("condition_logic"),
            Self::TriggerDevice(i) => write!(f, "triggers[{i}].device"),
            Self::TriggerAction(i) => write!(f, "triggers[{i}].action"),
            Self::TriggerConditions(i) => write!(f, "triggers[{i}].conditions"),
            Self::ConditionField { trigger, condition } => {
                write!(f, "triggers[{trigger}].conditions[{condition}].field")
            }
            Self::ConditionOperator { trigger, condition } => {
                write!(f, "triggers[{trigger}].conditions[{condition}].operator")
            }
            Self::ConditionThreshold { trigger, condition } => {
                write!(f, "triggers[{trigger}].conditions[{condition}].threshold")
            }
            Self::Actions => f.write_str("actions"),
            Self::ActionDevice(i) => write!(f, "actions[{i}].device"),
            Self::ActionAction(i) => write!(f, "actions[{i}].action"),
        }
    }
}

impl ValidationError {
    #[must_use]
    pub fn field(&self) -> FieldRef {
        match *self {
            Self::IntervalRequired | Self::InvalidInterval(_) | Self::IntervalTooShort => {
                FieldRef::Interval
            }
            Self::TriggerDeviceMissing { trigger } => FieldRef::TriggerDevice(trigger),
            Self::TriggerActionMissing { trigger } => FieldRef::TriggerAction(trigger),
            Self::TriggerWithoutConditions { trigger } => FieldRef::TriggerConditions(trigger),
            Self::EmptyConditionField { trigger, condition } => {
                FieldRef::ConditionField { trigger, condition }
            }
            Self::MissingThreshold { trigger, condition } => {
                FieldRef::ConditionThreshold { trigger, condition }
            }
            Self::InvalidOperator {
                trigger, condition, ..
            } => FieldRef::ConditionOperator { trigger, condition },
            Self::NoActions => FieldRef::Actions,
            Self::ActionDeviceMissing { action } => FieldRef::ActionDevice(action),
            Self::ActionActionMissing { action } => FieldRef::ActionAction(action),
            Self::InvalidConditionLogic(_) => FieldRef::ConditionLogic,
            Self::EmptyName => FieldRef::Name,
        }
    }
}

impl From<OperatorError> for ValidationError {
    fn from(err: OperatorError) -> Self {
        Self::InvalidOperator {
            trigger: err.trigger,
            condition: err.condition,
            source: err.source,
        }
    }
}

/// Check a definition, returning the first violated rule.
///
/// # Errors
///
/// Returns the [`ValidationError`] for the first rule, in checking order,
/// that `def` breaks.
pub fn validate(def: &AutomationDefinition) -> Result<(), ValidationError> {
    validate_interval(&def.interval)?;

    for (index, trigger) in def.triggers.iter().enumerate() {
        validate_trigger(index, trigger)?;
    }

    if def.actions.is_empty() {
        return Err(ValidationError::NoActions);
    }
    for (index, action) in def.actions.iter().enumerate() {
        if action.device.is_empty() {
            return Err(ValidationError::ActionDeviceMissing { action: index });
        }
        if action.action.is_empty() {
            return Err(ValidationError::ActionActionMissing { action: index });
        }
    }

    Ok(())
}

/// Check an interval literal on its own.
///
/// # Errors
///
/// Returns one of the interval variants of [`ValidationError`].
pub fn validate_interval(raw: &str) -> Result<Interval, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::IntervalRequired);
    }
    let interval: Interval = raw.parse().map_err(ValidationError::InvalidInterval)?;
    interval
        .check_minimum()
        .map_err(|_| ValidationError::IntervalTooShort)
}

/// Rules a stored record must meet besides [`validate`], in this order:
/// condition logic label, interval minimum in every unit, then operator
/// tokens as written in `text` (which `def` was parsed from).
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_record_rules(
    text: &str,
    def: &AutomationDefinition,
) -> Result<(), ValidationError> {
    validate_condition_logic(&def.condition_logic)?;
    validate_record_interval(&def.interval)?;
    definition::parse_strict(text)?;
    Ok(())
}

/// Check an interval the way stored records are checked: well formed, and
/// at least [`MIN_RECORD_INTERVAL`] whatever the unit, so `0m` is refused.
///
/// # Errors
///
/// Returns one of the interval variants of [`ValidationError`].
pub fn validate_record_interval(raw: &str) -> Result<Interval, ValidationError> {
    let interval = validate_interval(raw)?;
    if interval.as_duration() < MIN_RECORD_INTERVAL {
        return Err(ValidationError::IntervalTooShort);
    }
    Ok(interval)
}

/// Accept an empty label, `and`, or `or`.
///
/// Combinator labels are free text in the editor; the automation record
/// enforces this narrower set before persisting.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidConditionLogic`] for any other label.
pub fn validate_condition_logic(logic: &str) -> Result<(), ValidationError> {
    match logic {
        "" | "and" | "or" => Ok(()),
        other => Err(ValidationError::InvalidConditionLogic(other.to_string())),
    }
}

fn validate_trigger(index: usize, trigger: &Trigger) -> Result<(), ValidationError> {
    if trigger.device.is_empty() {
        return Err(ValidationError::TriggerDeviceMissing { trigger: index });
    }
    if trigger.action.is_empty() {
        return Err(ValidationError::TriggerActionMissing { trigger: index });
    }
    if trigger.conditions.is_empty() {
        return Err(ValidationError::TriggerWithoutConditions { trigger: index });
    }
    for (position, condition) in trigger.conditions.iter().enumerate() {
        validate_condition(index, position, condition)?;
    }
    Ok(())
}

fn validate_condition(
    trigger: usize,
    position: usize,
    condition: &Condition,
) -> Result<(), ValidationError> {
    if condition.field.trim().is_empty() {
        return Err(ValidationError::EmptyConditionField {
            trigger,
            condition: position,
        });
    }
    if !condition.threshold.is_finite() {
        return Err(ValidationError::MissingThreshold {
            trigger,
            condition: position,
        });
    }
    Ok(())
}
