//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.
//!
//! Every port is synchronous: the definition core does no IO of its own and
//! callers decide how to schedule the work.

pub mod automation_repo;
pub mod executor;
pub mod registry;

pub use automation_repo::AutomationRepository;
pub use executor::ActionExecutor;
pub use registry::Registry;
