//! Match configuration.
//!
//! Loads and validates the YAML file describing match length, challenge
//! counts, tier budgets, and provider settings.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{CONFIG_ENV, ConfigLoader, MAX_CONFIG_SIZE};
pub use schema::{MatchConfig, ProviderSettings};
pub use validation::validate;
