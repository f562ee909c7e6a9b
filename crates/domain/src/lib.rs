//! # devdash-domain
//!
//! Pure domain model for the devdash device dashboard.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Definitions** (interval, condition logic, triggers, actions) and
//!   their line-oriented text format (serializer + lenient parser)
//! - Define **Intervals** (duration literals such as `5m`, `1h`, `1500ms`)
//! - Define the **Validator** that gates a definition before submission
//! - Define **Registry records** (devices and the actions they can run)
//! - Define the **Automation record** that carries a definition as text
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app` or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod definition;
pub mod interval;
pub mod registry;
pub mod validation;
