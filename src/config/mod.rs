//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), named by --config or TUNNEL_LIFECYCLE_CONFIG
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ControllerConfig (validated, immutable)
//!     → Controller::from_config, logging and metrics setup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, parse_config, ConfigError, CONFIG_ENV_VAR};
pub use schema::ControllerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServiceConfig;
pub use schema::WorkerConfig;
