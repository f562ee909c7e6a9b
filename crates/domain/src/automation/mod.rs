//! Automation — a named, switchable rule whose definition travels as text.
//!
//! The [`Automation`] record is what the CRUD backend stores and returns.
//! Its `definition` field holds the serialized
//! [`AutomationDefinition`](crate::definition::AutomationDefinition); run
//! markers record when the rule was last checked, when its triggers last
//! ran, and when an action last fired.

mod timestamp;

use serde::{Deserialize, Serialize};

use crate::definition::{self, AutomationDefinition};
use crate::error::DevDashError;
use crate::id::AutomationId;
use crate::time::{self, Timestamp};
use crate::validation::{self, ValidationError};

/// A rule record as exchanged with the CRUD backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    /// Assigned by storage on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AutomationId>,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    /// Serialized definition text.
    #[serde(default)]
    pub definition: String,
    #[serde(default, with = "timestamp")]
    pub last_check: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub last_triggers_run: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub last_action_run: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<Timestamp>,
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// Read the definition text. Never fails; see [`definition::parse`].
    #[must_use]
    pub fn parse_definition(&self) -> AutomationDefinition {
        definition::parse(&self.definition)
    }

    /// Parse the definition and check it against the record rules.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for an unnamed record,
    /// [`ValidationError::InvalidConditionLogic`] for a label other than
    /// `and`/`or`, [`ValidationError::IntervalTooShort`] for an interval under
    /// one second in any unit, [`ValidationError::InvalidOperator`] for an
    /// operator token outside the six comparison symbols, or the first
    /// violation reported by [`validation::validate`].
    pub fn checked_definition(&self) -> Result<AutomationDefinition, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let def = self.parse_definition();
        validation::validate_record_rules(&self.definition, &def)?;
        validation::validate(&def)?;
        Ok(def)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DevDashError::Validation`] when [`Self::checked_definition`] fails.
    pub fn validate(&self) -> Result<(), DevDashError> {
        self.checked_definition()?;
        Ok(())
    }

    /// Whether the definition's interval has elapsed since triggers last ran.
    ///
    /// Falls back to `created_at` when the triggers never ran; a record with
    /// neither marker is always due.
    ///
    /// # Errors
    ///
    /// Returns an interval [`ValidationError`] when the stored interval does
    /// not parse.
    pub fn is_due(&self, now: Timestamp) -> Result<bool, ValidationError> {
        let interval = validation::validate_interval(&self.parse_definition().interval)?;
        let Some(since) = self.last_triggers_run.or(self.created_at) else {
            return Ok(true);
        };
        Ok(since
            .checked_add_signed(time::to_chrono(interval.as_duration()))
            .is_some_and(|due| due <= now))
    }
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    id: Option<AutomationId>,
    name: Option<String>,
    enabled: Option<bool>,
    definition: Option<String>,
    created_at: Option<Timestamp>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn id(mut self, id: AutomationId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Store `def` in its serialized form.
    #[must_use]
    pub fn definition(mut self, def: &AutomationDefinition) -> Self {
        self.definition = Some(definition::serialize(def));
        self
    }

    /// Store definition text as-is.
    #[must_use]
    pub fn definition_text(mut self, text: impl Into<String>) -> Self {
        self.definition = Some(text.into());
        self
    }

    #[must_use]
    pub fn created_at(mut self, ts: Timestamp) -> Self {
        self.created_at = Some(ts);
        self
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// # Errors
    ///
    /// Returns [`DevDashError::Validation`] if the name is empty or the
    /// definition is invalid.
    pub fn build(self) -> Result<Automation, DevDashError> {
        let automation = Automation {
            id: self.id,
            name: self.name.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            definition: self.definition.unwrap_or_default(),
            last_check: None,
            last_triggers_run: None,
            last_action_run: None,
            created_at: self.created_at,
            updated_at: None,
        };
        automation.validate()?;
        Ok(automation)
    }
}
