//! # devdash-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationRepository` — CRUD for automation records
//!   - `Registry` — name lookup for devices and their actions
//!   - `ActionExecutor` — run one action on one device
//! - Define **driving/inbound ports** as use-case structs:
//!   - `BuilderSession` — the structured editor behind a definition
//!   - `AutomationService` — validate and persist automations
//!   - `AutomationEngine` — evaluate due automations and fire their actions
//! - Provide **in-process infrastructure** (in-memory registry) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `devdash-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod builder;
pub mod ports;
pub mod registry;
pub mod services;
