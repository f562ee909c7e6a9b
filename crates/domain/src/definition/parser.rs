//! Text → definition, best effort.
//!
//! The parser never fails. Lines it does not recognise are skipped and
//! fields it never sees keep their defaults. Blocks are closed by dedent:
//! a list at nesting depth `d` consumes lines indented by at least `2 * d`
//! spaces and stops at the first line that is not.
//!
//! [`parse_strict`] reads the same grammar but refuses operator tokens that
//! [`parse`] would quietly replace with the default.

use super::{Action, AutomationDefinition, Condition, Operator, Trigger, UnknownOperator};

const INDENT_WIDTH: usize = 2;

/// A condition's operator line is missing or holds an unknown token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("triggers[{trigger}].conditions[{condition}]: {source}")]
pub struct OperatorError {
    pub trigger: usize,
    pub condition: usize,
    #[source]
    pub source: UnknownOperator,
}

/// Parse definition text, returning whatever could be recovered.
#[must_use]
pub fn parse(text: &str) -> AutomationDefinition {
    parse_document(&mut Cursor::new(text))
}

/// Parse definition text, keeping operator tokens as written.
///
/// # Errors
///
/// Returns [`OperatorError`] for the first condition, in document order,
/// whose `operator:` line is absent or not one of the six comparison symbols.
pub fn parse_strict(text: &str) -> Result<AutomationDefinition, OperatorError> {
    let mut cursor = Cursor::new(text);
    let def = parse_document(&mut cursor);

    let mut tokens = cursor.operators.into_iter();
    for (trigger, item) in def.triggers.iter().enumerate() {
        for condition in 0..item.conditions.len() {
            let token = tokens.next().flatten().unwrap_or_default();
            token
                .parse::<Operator>()
                .map_err(|source| OperatorError {
                    trigger,
                    condition,
                    source,
                })?;
        }
    }

    Ok(def)
}

/// Numeric prefix of `raw`, read the way a form's number input reads it.
///
/// Leading whitespace is skipped, then the longest `[+-]digits[.digits]`
/// prefix is taken, with an exponent only when digits follow the `e`.
/// Anything after the prefix is ignored, so `"30 # hot"` reads as `30`.
/// Returns `None` when no digit starts the text or the value is not finite.
#[must_use]
pub fn leading_number(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole = count_digits(&bytes[end..]);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = count_digits(&bytes[end + 1..]);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole + fraction == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let digits = count_digits(&bytes[exponent..]);
        if digits > 0 {
            end = exponent + digits;
        }
    }

    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn parse_document(cursor: &mut Cursor<'_>) -> AutomationDefinition {
    let mut def = AutomationDefinition::default();

    while let Some(line) = cursor.peek() {
        let trimmed = line.trim();
        if trimmed.starts_with("interval:") {
            def.interval = extract_value(trimmed).to_string();
            cursor.advance();
        } else if trimmed.starts_with("condition_logic:") {
            def.condition_logic = extract_value(trimmed).to_string();
            cursor.advance();
        } else if trimmed == "triggers:" {
            cursor.advance();
            def.triggers
                .extend(parse_list(cursor, 1, "- device:", parse_trigger));
        } else if trimmed == "actions:" {
            cursor.advance();
            def.actions
                .extend(parse_list(cursor, 1, "- device:", parse_action));
        } else {
            cursor.advance();
        }
    }

    def
}

/// Collect the items of a list block opened at `depth`.
///
/// Lines inside the block that do not start an item are skipped.
fn parse_list<T>(
    cursor: &mut Cursor<'_>,
    depth: usize,
    item_marker: &str,
    parse_item: fn(&mut Cursor<'_>) -> T,
) -> Vec<T> {
    let mut items = Vec::new();
    while let Some(line) = cursor.peek_indented(depth) {
        if line.trim().starts_with(item_marker) {
            items.push(parse_item(cursor));
        } else {
            cursor.advance();
        }
    }
    items
}

/// Item at depth 1 under `triggers:`. The cursor sits on its `- device:` line.
fn parse_trigger(cursor: &mut Cursor<'_>) -> Trigger {
    let mut trigger = Trigger {
        device: cursor.take_item_value(),
        ..Trigger::default()
    };

    while let Some(line) = cursor.peek_indented(2) {
        let trimmed = line.trim();
        if trimmed.starts_with("- device:") {
            break;
        }
        if trimmed.starts_with("action:") {
            trigger.action = extract_value(trimmed).to_string();
            cursor.advance();
        } else if trimmed == "conditions:" {
            cursor.advance();
            trigger
                .conditions
                .extend(parse_list(cursor, 3, "- field:", parse_condition));
        } else {
            cursor.advance();
        }
    }

    trigger
}

/// Item at depth 3 under `conditions:`. The cursor sits on its `- field:` line.
///
/// The raw operator token is recorded on the cursor, one entry per condition.
fn parse_condition(cursor: &mut Cursor<'_>) -> Condition {
    let mut condition = Condition {
        field: cursor.take_item_value(),
        ..Condition::default()
    };
    let mut operator = None;

    while let Some(line) = cursor.peek_indented(4) {
        let trimmed = line.trim();
        if trimmed.starts_with("- ") {
            break;
        }
        if trimmed.starts_with("operator:") {
            operator = Some(extract_value(trimmed));
        } else if trimmed.starts_with("threshold:") {
            condition.threshold = leading_number(extract_value(trimmed)).unwrap_or(0.0);
        }
        cursor.advance();
    }

    condition.operator = operator
        .and_then(|token| token.parse().ok())
        .unwrap_or_default();
    cursor.operators.push(operator);
    condition
}

/// Item at depth 1 under `actions:`. The cursor sits on its `- device:` line.
fn parse_action(cursor: &mut Cursor<'_>) -> Action {
    let mut action = Action {
        device: cursor.take_item_value(),
        ..Action::default()
    };

    while let Some(line) = cursor.peek_indented(2) {
        let trimmed = line.trim();
        if trimmed.starts_with("- ") {
            break;
        }
        if trimmed.starts_with("action:") {
            action.action = extract_value(trimmed).to_string();
        }
        cursor.advance();
    }

    action
}

/// Value part of a `key: value` line.
///
/// Everything after the first `:` is kept, so colons inside the value
/// survive. One leading and one trailing quote (`"` or `'`) are removed.
fn extract_value(line: &str) -> &str {
    let value = line.split_once(':').map_or("", |(_, rest)| rest).trim();
    let value = value
        .strip_prefix(['"', '\''])
        .unwrap_or(value);
    value.strip_suffix(['"', '\'']).unwrap_or(value)
}

/// Line cursor over the input. Each parse function advances it past what it
/// consumed, so nesting is expressed by the call stack.
struct Cursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    /// Operator token of every condition read so far, `None` when absent.
    operators: Vec<Option<&'a str>>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
            pos: 0,
            operators: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// Current line, if it is indented at least `depth` levels.
    fn peek_indented(&self, depth: usize) -> Option<&'a str> {
        self.peek()
            .filter(|line| leading_spaces(line) >= depth * INDENT_WIDTH)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Consume a `- key: value` line and return its value.
    fn take_item_value(&mut self) -> String {
        let line = self.peek().unwrap_or_default().trim();
        self.advance();
        let entry = line.strip_prefix("- ").unwrap_or(line);
        extract_value(entry).to_string()
    }
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}
