//! Definition → text.
//!
//! Scalars are written double-quoted and verbatim. Nothing is escaped: an
//! embedded `"` still reads back because the parser strips only the outer
//! pair, but an embedded newline splits the value. Thresholds are bare
//! numbers.
//! Container keys are emitted only for non-empty sequences.

use super::{Action, AutomationDefinition, Condition, Trigger};

const INDENT: &str = "  ";

/// Render a definition in its canonical text form.
///
/// Lines are joined with `\n`; there is no trailing newline.
#[must_use]
pub fn serialize(def: &AutomationDefinition) -> String {
    let mut out = Emitter::default();

    out.scalar(0, "interval", &def.interval);
    if !def.condition_logic.is_empty() {
        out.scalar(0, "condition_logic", &def.condition_logic);
    }
    if !def.triggers.is_empty() {
        out.key(0, "triggers");
        for trigger in &def.triggers {
            emit_trigger(&mut out, trigger);
        }
    }
    if !def.actions.is_empty() {
        out.key(0, "actions");
        for action in &def.actions {
            emit_action(&mut out, action);
        }
    }

    out.finish()
}

fn emit_trigger(out: &mut Emitter, trigger: &Trigger) {
    out.item_scalar(1, "device", &trigger.device);
    out.scalar(2, "action", &trigger.action);
    if !trigger.conditions.is_empty() {
        out.key(2, "conditions");
        for condition in &trigger.conditions {
            emit_condition(out, condition);
        }
    }
}

fn emit_condition(out: &mut Emitter, condition: &Condition) {
    out.item_scalar(3, "field", &condition.field);
    out.scalar(4, "operator", condition.operator.as_str());
    out.line(4, &format!("threshold: {}", condition.threshold));
}

fn emit_action(out: &mut Emitter, action: &Action) {
    out.item_scalar(1, "device", &action.device);
    out.scalar(2, "action", &action.action);
}

/// Output lines, each prefixed with its indent.
#[derive(Default)]
struct Emitter {
    lines: Vec<String>,
}

impl Emitter {
    fn line(&mut self, depth: usize, content: &str) {
        self.lines.push(format!("{}{content}", INDENT.repeat(depth)));
    }

    fn key(&mut self, depth: usize, key: &str) {
        self.line(depth, &format!("{key}:"));
    }

    fn scalar(&mut self, depth: usize, key: &str, value: &str) {
        self.line(depth, &format!("{key}: \"{value}\""));
    }

    /// A scalar that opens a new list item (`- key: "value"`).
    fn item_scalar(&mut self, depth: usize, key: &str, value: &str) {
        self.line(depth, &format!("- {key}: \"{value}\""));
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}
