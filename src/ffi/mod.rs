//! Foreign control surface.
//!
//! # Data Flow
//! ```text
//! host process (C ABI)
//!     → exports.rs (#[no_mangle] functions, panic guard, pointer handling)
//!     → surface.rs (status codes over a &Controller)
//!     → Controller → LifecycleState / WorkerInvoker
//! ```
//!
//! # Design Decisions
//! - One process-global controller, built lazily from configuration unless
//!   an embedding Rust host installs its own first
//! - Strings returned to the host are owned by the host until passed back
//!   to `tunnel_free_string`; absent values are null
//! - Misuse (stop before init, run before init) is a status code, never a fault

pub mod exports;
pub mod strings;
pub mod surface;

pub use exports::{controller, install};
