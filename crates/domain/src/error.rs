//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`DevDashError`] via `#[from]`.

use crate::validation::ValidationError;

/// Top-level error for devdash operations.
#[derive(Debug, thiserror::Error)]
pub enum DevDashError {
    /// A definition or record failed a structural rule.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A record looked up by id does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A definition references a device or action the registry rejects.
    #[error("registry error")]
    Registry(#[from] RegistryError),

    /// Running a device action failed.
    #[error("execution error")]
    Execution(#[from] ExecutionError),

    /// Backend failure behind a port (storage, transport, ...).
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A record with the given id could not be found.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of record, e.g. `"Automation"`.
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}

/// A device/action reference that does not resolve against the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("device '{0}' not found")]
    DeviceNotFound(String),

    #[error("action '{0}' not found")]
    ActionNotFound(String),

    #[error("action '{action}' is not assigned to device '{device}'")]
    NotAssigned { device: String, action: String },

    #[error("params of action '{0}' must be valid JSON")]
    InvalidParams(String),
}

/// Failure while running a trigger or action against a device.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The device answered, but the reply carried no usable payload.
    #[error("device '{device}' returned an invalid response to '{action}'")]
    InvalidResponse { device: String, action: String },

    /// A condition's field path does not resolve in the response.
    #[error("field '{0}' not found")]
    FieldNotFound(String),

    /// A path segment resolved to something that is not an object.
    #[error("field '{0}' is not an object")]
    NotAnObject(String),

    /// The resolved value is not a number.
    #[error("field '{0}' is not a number")]
    NotANumber(String),

    /// The executor itself failed (transport, device offline, ...).
    #[error("executing action '{action}' on device '{device}' failed")]
    Failed {
        device: String,
        action: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
