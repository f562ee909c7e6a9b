//! Definition — the structured form of one automation rule.
//!
//! A definition carries the evaluation [`interval`](AutomationDefinition::interval),
//! an optional condition-logic label, an ordered list of [`Trigger`]s (each
//! gated by [`Condition`]s) and an ordered list of [`Action`]s.
//!
//! The persisted representation is a small indentation-based text format,
//! produced by [`serialize`] and read back by [`parse`]:
//!
//! ```text
//! interval: "5m"
//! triggers:
//!   - device: "Thermostat"
//!     action: "ReadTemp"
//!     conditions:
//!       - field: "temperature"
//!         operator: ">"
//!         threshold: 30
//! actions:
//!   - device: "Fan"
//!     action: "TurnOn"
//! ```

mod operator;
mod parser;
mod serializer;

pub use operator::{Operator, UnknownOperator};
pub use parser::{OperatorError, leading_number, parse, parse_strict};
pub use serializer::serialize;

use serde::{Deserialize, Serialize};

/// Root of a definition. Order of `triggers` and `actions` is significant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationDefinition {
    /// Duration literal, e.g. `"5m"`.
    pub interval: String,
    /// Combinator label for trigger results, e.g. `"and"`, `"or"`.
    pub condition_logic: String,
    pub triggers: Vec<Trigger>,
    pub actions: Vec<Action>,
}

/// A device/action pair whose response is tested against conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    /// Device name, as known to the registry.
    pub device: String,
    /// Action name, as known to the registry.
    pub action: String,
    pub conditions: Vec<Condition>,
}

/// A `field <operator> threshold` comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    /// Dotted path into the trigger's response, e.g. `"sensor.temperature"`.
    pub field: String,
    pub operator: Operator,
    pub threshold: f64,
}

/// A device/action pair to run when the rule fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub device: String,
    pub action: String,
}

impl AutomationDefinition {
    /// Create an empty definition with the given interval.
    #[must_use]
    pub fn new(interval: impl Into<String>) -> Self {
        Self {
            interval: interval.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_condition_logic(mut self, logic: impl Into<String>) -> Self {
        self.condition_logic = logic.into();
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

impl Trigger {
    #[must_use]
    pub fn new(device: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            action: action.into(),
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

impl Condition {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, threshold: f64) -> Self {
        Self {
            field: field.into(),
            operator,
            threshold,
        }
    }

    /// Compare an observed value against this condition's threshold.
    #[must_use]
    pub fn holds_for(&self, value: f64) -> bool {
        self.operator.evaluate(value, self.threshold)
    }
}

impl Action {
    #[must_use]
    pub fn new(device: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            action: action.into(),
        }
    }
}

impl std::fmt::Display for AutomationDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&serialize(self))
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> AutomationDefinition {
        AutomationDefinition::new("5m")
            .trigger(
                Trigger::new("Thermostat", "ReadTemp")
                    .condition(Condition::new("temperature", Operator::Gt, 30.0)),
            )
            .action(Action::new("Fan", "TurnOn"))
    }

    #[test]
    fn should_default_to_empty_model() {
        let def = AutomationDefinition::default();
        assert_eq!(def.interval, "");
        assert_eq!(def.condition_logic, "");
        assert!(def.triggers.is_empty());
        assert!(def.actions.is_empty());
    }

    #[test]
    fn should_reproduce_model_after_serialize_then_parse() {
        let def = scenario_a();
        assert_eq!(parse(&serialize(&def)), def);
    }

    #[test]
    fn should_be_stable_under_repeated_reserialization() {
        let def = AutomationDefinition::new("30s")
            .with_condition_logic("or")
            .trigger(
                Trigger::new("Thermostat", "ReadTemp")
                    .condition(Condition::new("temperature", Operator::Ge, 21.5))
                    .condition(Condition::new("humidity", Operator::Lt, -3.0)),
            )
            .trigger(Trigger::new("Door", "Status"))
            .action(Action::new("Fan", "TurnOn"))
            .action(Action::new("Light", "Off"));
        let once = serialize(&def);
        let twice = serialize(&parse(&once));
        assert_eq!(once, twice);
        assert_eq!(parse(&once), def);
    }

    #[test]
    fn should_preserve_trigger_and_action_order() {
        let def = AutomationDefinition::new("1h")
            .trigger(Trigger::new("B", "b").condition(Condition::new("x", Operator::Eq, 1.0)))
            .trigger(Trigger::new("A", "a").condition(Condition::new("y", Operator::Ne, 2.0)))
            .action(Action::new("Z", "z"))
            .action(Action::new("Y", "y"));
        let parsed = parse(&serialize(&def));
        let devices: Vec<_> = parsed.triggers.iter().map(|t| t.device.as_str()).collect();
        assert_eq!(devices, ["B", "A"]);
        let actions: Vec<_> = parsed.actions.iter().map(|a| a.device.as_str()).collect();
        assert_eq!(actions, ["Z", "Y"]);
    }

    #[test]
    fn should_roundtrip_model_through_serde_json() {
        let def = scenario_a().with_condition_logic("and");
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["condition_logic"], "and");
        assert_eq!(json["triggers"][0]["conditions"][0]["operator"], ">");
        let parsed: AutomationDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, def);
    }

    #[test]
    fn should_evaluate_condition_against_value() {
        let c = Condition::new("temperature", Operator::Gt, 30.0);
        assert!(c.holds_for(31.0));
        assert!(!c.holds_for(30.0));
        assert_eq!(c.to_string(), "temperature > 30");
    }
}
